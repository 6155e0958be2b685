use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::category::{RuleRegistry, RulesConfig, MIN_CONFIDENCE};
use crate::error::{Result, ShelfsortError};
use crate::vision::CommandVision;

const CONFIG_FILE: &str = "config.toml";

/// Environment variable holding the vision API key unless configured otherwise
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# shelfsort configuration file
# Location: ~/.shelfsort/config.toml

[rules]
# Extra category rules (TOML, [[rule]] tables). Relative paths are
# resolved against this directory.
# Example: file = "rules.toml"

# Use only the rules file, ignoring the builtin rules
# Default: false
replace_builtin = false

[vision]
# Environment variable holding the vision API key
# Default: "OPENAI_API_KEY"
api_key_env = "OPENAI_API_KEY"

# Program that describes an image. Called as `command args... <image_url>`
# with the key in SHELFSORT_VISION_API_KEY; must print a JSON array of tags.
# Example: command = "describe-image"
args = []

[reclassify]
# Minimum confidence required to apply a new category in batch runs
# Default: 5
min_confidence = 5
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesSettings,

    #[serde(default)]
    pub vision: VisionSettings,

    #[serde(default)]
    pub reclassify: ReclassifySettings,
}

/// Rule registry source
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RulesSettings {
    /// Rules file merged over (or replacing) the builtin rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub replace_builtin: bool,
}

/// Vision escalation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisionSettings {
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            command: None,
            args: Vec::new(),
        }
    }
}

/// Batch reclassification settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReclassifySettings {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: i64,
}

fn default_min_confidence() -> i64 {
    MIN_CONFIDENCE
}

impl Default for ReclassifySettings {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| ShelfsortError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "rules.file" => {
                let value = value.trim();
                self.rules.file = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "rules.replace_builtin" => {
                self.rules.replace_builtin = parse_bool(key, value)?;
            }
            "vision.api_key_env" => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(ShelfsortError::InvalidConfigValue {
                        key: key.to_string(),
                        message: "must not be empty".to_string(),
                    });
                }
                self.vision.api_key_env = value.to_string();
            }
            "vision.command" => {
                let value = value.trim();
                self.vision.command = (!value.is_empty()).then(|| value.to_string());
            }
            "vision.args" => {
                self.vision.args = parse_string_list(value)?;
            }
            "reclassify.min_confidence" => {
                self.reclassify.min_confidence =
                    value
                        .trim()
                        .parse()
                        .map_err(|e: std::num::ParseIntError| {
                            ShelfsortError::InvalidConfigValue {
                                key: key.to_string(),
                                message: e.to_string(),
                            }
                        })?;
            }
            _ => {
                return Err(ShelfsortError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            (
                "rules.file".to_string(),
                self.rules
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            (
                "rules.replace_builtin".to_string(),
                self.rules.replace_builtin.to_string(),
            ),
            (
                "vision.api_key_env".to_string(),
                self.vision.api_key_env.clone(),
            ),
            (
                "vision.command".to_string(),
                self.vision.command.clone().unwrap_or_default(),
            ),
            ("vision.args".to_string(), format!("{:?}", self.vision.args)),
            (
                "reclassify.min_confidence".to_string(),
                self.reclassify.min_confidence.to_string(),
            ),
        ]
    }

    /// Build the rule registry described by this config
    pub fn build_registry(&self, base_dir: &Path) -> Result<RuleRegistry> {
        let Some(file) = &self.rules.file else {
            if self.rules.replace_builtin {
                tracing::warn!(
                    "rules.replace_builtin is set without rules.file; using builtin rules"
                );
            }
            return Ok(RuleRegistry::builtin());
        };

        let path = if file.is_absolute() {
            file.clone()
        } else {
            base_dir.join(file)
        };
        let rules = RulesConfig::load(&path)?;
        tracing::debug!(path = %path.display(), count = rules.rules.len(), "loaded rules file");

        if self.rules.replace_builtin {
            RuleRegistry::from_config(&rules)
        } else {
            RuleRegistry::builtin().with_config(&rules)
        }
    }

    /// Configured vision program, if any
    pub fn vision_command(&self) -> Option<CommandVision> {
        self.vision
            .command
            .as_ref()
            .map(|program| CommandVision::new(program.clone(), self.vision.args.clone()))
    }

    /// Vision API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.vision.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => Err(ShelfsortError::InvalidConfigValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}

/// Parse a comma-separated or JSON-like list string
fn parse_string_list(value: &str) -> Result<Vec<String>> {
    let trimmed = value.trim();

    // Try JSON array format first: ["a", "b"]
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return Ok(items);
        }
        let inner = &trimmed[1..trimmed.len() - 1];
        return Ok(split_list(inner));
    }

    // Comma-separated format: a,b,c or "a","b"
    Ok(split_list(trimmed))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
