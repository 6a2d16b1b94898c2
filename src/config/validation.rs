use crate::config::types::{AcquisitionConfig, Config, DiscoveryConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_discovery_config(&config.discovery)?;
    validate_acquisition_config(&config.acquisition)?;
    Ok(())
}

/// Validates discovery-stage configuration
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.handle.is_empty() {
        return Err(ConfigError::Validation("handle cannot be empty".to_string()));
    }

    if !config
        .handle
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "handle must contain only alphanumeric characters and underscores, got '{}'",
            config.handle
        )));
    }

    if config.threshold_count < 1 {
        return Err(ConfigError::Validation(format!(
            "threshold_count must be >= 1, got {}",
            config.threshold_count
        )));
    }

    if config.settle_delay_secs <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "settle_delay_secs must be positive, got {}",
            config.settle_delay_secs
        )));
    }

    if config.fast_jiggle_strikes >= config.fast_finish_strikes {
        return Err(ConfigError::Validation(format!(
            "fast_jiggle_strikes ({}) must be below fast_finish_strikes ({})",
            config.fast_jiggle_strikes, config.fast_finish_strikes
        )));
    }

    if config.deep_jiggle_strikes >= config.deep_finish_strikes {
        return Err(ConfigError::Validation(format!(
            "deep_jiggle_strikes ({}) must be below deep_finish_strikes ({})",
            config.deep_jiggle_strikes, config.deep_finish_strikes
        )));
    }

    if config.max_iterations < config.fast_finish_strikes {
        return Err(ConfigError::Validation(format!(
            "max_iterations ({}) must be at least fast_finish_strikes ({})",
            config.max_iterations, config.fast_finish_strikes
        )));
    }

    if config.jitter_min_secs < 0.0 || config.jitter_min_secs > config.jitter_max_secs {
        return Err(ConfigError::Validation(format!(
            "jitter range [{}, {}] is not a valid non-negative interval",
            config.jitter_min_secs, config.jitter_max_secs
        )));
    }

    if config.max_consecutive_crashes < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_crashes must be >= 1, got {}",
            config.max_consecutive_crashes
        )));
    }

    if config.start_year > config.end_year {
        return Err(ConfigError::Validation(format!(
            "start_year ({}) must not be after end_year ({})",
            config.start_year, config.end_year
        )));
    }

    if config.start_year < 2000 || config.end_year > 2100 {
        return Err(ConfigError::Validation(format!(
            "year range [{}, {}] is outside the supported 2000-2100 span",
            config.start_year, config.end_year
        )));
    }

    Ok(())
}

/// Validates acquisition-stage configuration
fn validate_acquisition_config(config: &AcquisitionConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.connect_timeout_secs < 1 || config.read_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got connect {}s / read {}s",
            config.connect_timeout_secs, config.read_timeout_secs
        )));
    }

    if config.failure_log.is_empty() {
        return Err(ConfigError::Validation(
            "failure_log cannot be empty".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::sample_config;

    #[test]
    fn test_valid_config_passes() {
        let config = sample_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_handle_rejected() {
        let mut config = sample_config();
        config.discovery.handle = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_handle_with_punctuation_rejected() {
        let mut config = sample_config();
        config.discovery.handle = "@someone".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_jiggle_must_precede_finish() {
        let mut config = sample_config();
        config.discovery.fast_jiggle_strikes = 5;
        config.discovery.fast_finish_strikes = 5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_jitter_range_rejected() {
        let mut config = sample_config();
        config.discovery.jitter_min_secs = 6.0;
        config.discovery.jitter_max_secs = 3.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_year_range_rejected() {
        let mut config = sample_config();
        config.discovery.start_year = 2024;
        config.discovery.end_year = 2020;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = sample_config();
        config.acquisition.concurrency = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_excessive_concurrency_rejected() {
        let mut config = sample_config();
        config.acquisition.concurrency = 500;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = sample_config();
        config.acquisition.max_attempts = 0;
        assert!(validate(&config).is_err());
    }
}
