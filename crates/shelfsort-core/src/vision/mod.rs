//! Vision Integration
//!
//! Boundary to the external image-description capability used for
//! escalation. The classifier only depends on [`VisionCapability`]; how
//! tags are produced (HTTP API, local model, external program) is up to
//! the implementation.
//!
//! ## Usage
//!
//! ```rust
//! use shelfsort_core::vision::parse_vision_tags;
//!
//! let tags = parse_vision_tags("```json\n[\"stroller\", \"pram\"]\n```");
//! assert_eq!(tags, vec!["stroller", "pram"]);
//! ```

mod command;

use async_trait::async_trait;

use crate::error::{Result, ShelfsortError};

pub use command::{CommandVision, VISION_API_KEY_ENV};

/// Image-description capability
#[async_trait]
pub trait VisionCapability: Send + Sync {
    /// Describe an image with a handful of short tags.
    ///
    /// # Arguments
    /// * `image_url` - absolute `http(s)` URL of the image
    /// * `api_key` - credential supplied by the caller
    ///
    /// # Returns
    /// Zero or more tag strings. Any error is treated by the classifier
    /// the same as an empty list.
    async fn describe_image(&self, image_url: &str, api_key: &str) -> Result<Vec<String>>;
}

/// Vision capability that is never available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVision;

#[async_trait]
impl VisionCapability for NoopVision {
    async fn describe_image(&self, _image_url: &str, _api_key: &str) -> Result<Vec<String>> {
        Err(ShelfsortError::vision("vision not available (noop capability)"))
    }
}

/// Extract a JSON array of tags from model output.
///
/// Accepts a bare array or one wrapped in markdown code fences.
/// Non-string elements and blank strings are dropped. Unparsable output
/// yields an empty list.
pub fn parse_vision_tags(output: &str) -> Vec<String> {
    let json_str = extract_json_array(output);

    let values: Vec<serde_json::Value> = match serde_json::from_str(json_str) {
        Ok(values) => values,
        Err(e) => {
            tracing::debug!(error = %e, "vision output is not a JSON array");
            return Vec::new();
        }
    };

    values
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn extract_json_array(output: &str) -> &str {
    if let Some(start) = output.find("```json") {
        let start = start + 7;
        if let Some(end) = output[start..].find("```") {
            return output[start..start + end].trim();
        }
    }
    if let Some(start) = output.find("```") {
        let start = start + 3;
        if let Some(end) = output[start..].find("```") {
            return output[start..start + end].trim();
        }
    }
    if let Some(start) = output.find('[') {
        if let Some(end) = output.rfind(']') {
            if end > start {
                return &output[start..=end];
            }
        }
    }
    output.trim()
}
