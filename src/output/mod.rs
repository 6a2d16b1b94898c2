//! Durable append-only outputs
//!
//! Both pipeline stages persist through this module:
//! - the discovery stage streams links into a [`LinkSink`]
//! - the acquisition stage journals permanent failures into a
//!   [`FailureJournal`]

mod journal;
mod link_sink;

pub use journal::FailureJournal;
pub use link_sink::{unique_path, LinkSink};
