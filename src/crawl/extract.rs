//! Media extraction from captured API responses
//!
//! Timeline responses are deeply nested trees whose exact shape shifts
//! between endpoints and rollouts. Rather than chase the schema, the
//! extractor walks every node and reacts to two stable leaf markers:
//! a raw image URL field, and a video variant list.

use crate::crawl::session::{CrawlSession, MediaKind};
use crate::crawl::MediaCandidate;
use crate::Result;
use serde_json::{Map, Value};

/// Field carrying a raw media URL on image (and thumbnail) nodes.
const IMAGE_MARKER: &str = "media_url_https";

/// Field carrying the encoding variant list on video nodes.
const VIDEO_MARKER: &str = "video_info";

/// Extension that marks a raw URL as a video asset rather than an image.
const VIDEO_EXTENSION: &str = ".mp4";

/// Media marker recognized on a single object node
///
/// One node can carry both markers (a video node's thumbnail is an image
/// marker), so classification yields zero, one, or two of these.
#[derive(Debug)]
enum Marker<'a> {
    /// Raw image URL, still missing its format/size parameters
    Image(&'a str),
    /// Video encoding variants to pick the best mp4 from
    Video(&'a [Value]),
}

/// Walks a response tree and admits every media candidate found
///
/// Traversal continues into every container value regardless of whether a
/// marker matched at the current node; markers and nested containers
/// coexist freely in timeline payloads.
pub fn extract_media(session: &mut CrawlSession, tree: &Value) -> Result<()> {
    match tree {
        Value::Object(map) => {
            for marker in image_marker(map).into_iter().chain(video_marker(map)) {
                if let Some(candidate) = canonicalize(&marker) {
                    session.admit(&candidate.url, candidate.kind)?;
                }
            }
            for child in map.values() {
                extract_media(session, child)?;
            }
        }
        Value::Array(items) => {
            for child in items {
                extract_media(session, child)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Reads the probed media count out of a profile-stats response
pub fn probe_media_count(tree: &Value) -> Option<u64> {
    tree.get("data")?
        .get("user")?
        .get("result")?
        .get("legacy")?
        .get("media_count")?
        .as_u64()
}

/// Classifies the image marker on one object node, if present
fn image_marker<'a>(map: &'a Map<String, Value>) -> Option<Marker<'a>> {
    map.get(IMAGE_MARKER).and_then(Value::as_str).map(Marker::Image)
}

/// Classifies the video marker on one object node, if present
fn video_marker<'a>(map: &'a Map<String, Value>) -> Option<Marker<'a>> {
    map.get(VIDEO_MARKER)
        .and_then(|info| info.get("variants"))
        .and_then(Value::as_array)
        .map(|variants| Marker::Video(variants.as_slice()))
}

/// Turns a marker into the canonical candidate it denotes, if any
fn canonicalize(marker: &Marker<'_>) -> Option<MediaCandidate> {
    match marker {
        Marker::Image(raw) => {
            // Video assets surface their own URL through this field too;
            // those are handled by the variant list instead.
            if raw.ends_with(VIDEO_EXTENSION) {
                return None;
            }
            Some(MediaCandidate {
                url: format!("{}?format=jpg&name=orig", raw),
                kind: MediaKind::Image,
            })
        }
        Marker::Video(variants) => best_mp4_variant(variants).map(|url| MediaCandidate {
            url: url.to_string(),
            kind: MediaKind::Video,
        }),
    }
}

/// Picks the mp4 variant with the highest bitrate
///
/// Strict-greater comparison: on equal bitrates the first-seen variant
/// wins. Variants without a bitrate count as zero.
fn best_mp4_variant(variants: &[Value]) -> Option<&str> {
    let mut best_bitrate = 0u64;
    let mut best_url = None;

    for variant in variants {
        if variant.get("content_type").and_then(Value::as_str) != Some("video/mp4") {
            continue;
        }
        let bitrate = variant.get("bitrate").and_then(Value::as_u64).unwrap_or(0);
        let url = variant.get("url").and_then(Value::as_str);
        if url.is_some() && (best_url.is_none() || bitrate > best_bitrate) {
            best_bitrate = bitrate;
            best_url = url;
        }
    }

    best_url
}
