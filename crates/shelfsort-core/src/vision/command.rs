//! External program vision adapter
//!
//! Runs a configured program with the image URL as its last argument and
//! reads a JSON array of tags from stdout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Result, ShelfsortError};

use super::{parse_vision_tags, VisionCapability};

/// Environment variable through which the API key reaches the program
pub const VISION_API_KEY_ENV: &str = "SHELFSORT_VISION_API_KEY";

/// [`VisionCapability`] backed by an external program
///
/// Invoked as `program args... <image_url>`. The child is killed if the
/// request future is dropped.
#[derive(Debug, Clone)]
pub struct CommandVision {
    program: String,
    args: Vec<String>,
}

impl CommandVision {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl VisionCapability for CommandVision {
    async fn describe_image(&self, image_url: &str, api_key: &str) -> Result<Vec<String>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_url)
            .env(VISION_API_KEY_ENV, api_key)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ShelfsortError::vision(format!("Failed to spawn {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ShelfsortError::vision(format!(
                "{} exited with error: {}",
                self.program,
                stderr.trim()
            )));
        }

        Ok(parse_vision_tags(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandVision {
        CommandVision::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_reads_tags_from_stdout() {
        let vision = sh(r#"printf '```json\n["stroller", "pram"]\n```\n'"#);
        let tags = vision
            .describe_image("https://cdn.example/a.jpg", "key")
            .await
            .unwrap();
        assert_eq!(tags, vec!["stroller", "pram"]);
    }

    #[tokio::test]
    async fn test_passes_image_url_and_key() {
        // With `sh -c`, the first trailing argument becomes $0.
        let vision = sh(r#"printf '["%s", "%s"]' "$0" "$SHELFSORT_VISION_API_KEY""#);
        let tags = vision
            .describe_image("https://cdn.example/a.jpg", "secret")
            .await
            .unwrap();
        assert_eq!(tags, vec!["https://cdn.example/a.jpg", "secret"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let vision = sh("echo boom >&2; exit 3");
        let err = vision
            .describe_image("https://cdn.example/a.jpg", "key")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_program_is_error() {
        let vision = CommandVision::new("shelfsort-no-such-program", Vec::new());
        let result = vision.describe_image("https://cdn.example/a.jpg", "key").await;
        assert!(matches!(result, Err(ShelfsortError::Vision { .. })));
    }
}
