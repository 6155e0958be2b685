use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShelfsortError {
    #[error("Rule id must not be empty")]
    EmptyRuleId,

    #[error("Rule id '{id}' is reserved")]
    ReservedRuleId { id: String },

    #[error("Duplicate rule id: {id}")]
    DuplicateRuleId { id: String },

    #[error("Rule '{id}' has no keywords")]
    EmptyKeywords { id: String },

    #[error("Rule '{id}' contains a blank keyword")]
    BlankKeyword { id: String },

    #[error("Rule '{id}' must have a positive weight")]
    InvalidWeight { id: String },

    #[error("Rule not found: {id}")]
    RuleNotFound { id: String },

    #[error("Rules file not found: {path}")]
    RulesFileNotFound { path: PathBuf },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidConfigValue { key: String, message: String },

    #[error("Failed to parse products from {path}: {message}")]
    ProductParse { path: PathBuf, message: String },

    #[error("Vision request failed: {message}")]
    Vision { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ShelfsortError>;

impl ShelfsortError {
    pub fn vision(message: impl Into<String>) -> Self {
        Self::Vision {
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RuleNotFound { .. } => 2,
            Self::RulesFileNotFound { .. } => 3,
            Self::EmptyRuleId
            | Self::ReservedRuleId { .. }
            | Self::DuplicateRuleId { .. }
            | Self::EmptyKeywords { .. }
            | Self::BlankKeyword { .. }
            | Self::InvalidWeight { .. } => 4,
            Self::ConfigParse { .. }
            | Self::ConfigKeyNotFound { .. }
            | Self::InvalidConfigValue { .. } => 5,
            Self::ProductParse { .. } => 6,
            _ => 1,
        }
    }
}
