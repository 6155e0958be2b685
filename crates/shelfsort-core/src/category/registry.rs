//! Rule Registry
//!
//! Ordered, read-only table of category rules. Built once (from the
//! builtin table, optionally merged with a rules file) and shared by
//! reference for the rest of the process.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfsortError};

use super::builtin::{CategoryRule, BUILTIN_RULES};

static SHARED_BUILTIN: Lazy<Arc<RuleRegistry>> = Lazy::new(|| Arc::new(RuleRegistry::builtin()));

/// Ordered category rule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRegistry {
    rules: Vec<CategoryRule>,
}

impl RuleRegistry {
    /// Build a registry from rules in declaration order.
    ///
    /// Every rule is normalized and validated; ids must be unique.
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rules.len());

        for rule in rules {
            let rule = rule.normalized()?;
            if !seen.insert(rule.id.clone()) {
                return Err(ShelfsortError::DuplicateRuleId { id: rule.id });
            }
            normalized.push(rule);
        }

        Ok(Self { rules: normalized })
    }

    /// Builtin rules only
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN_RULES.iter().map(CategoryRule::from).collect(),
        }
    }

    /// Process-wide builtin registry, built on first use.
    pub fn shared_builtin() -> Arc<Self> {
        Arc::clone(&SHARED_BUILTIN)
    }

    /// Merge rules from a rules file.
    ///
    /// - an entry with an existing id replaces that rule in place
    /// - an entry with a new id is appended
    ///
    /// Ids repeated within the file are rejected, as in [`from_config`](Self::from_config).
    pub fn with_config(self, config: &RulesConfig) -> Result<Self> {
        config.check_unique_ids()?;

        let mut rules = self.rules;
        for entry in &config.rules {
            match rules.iter_mut().find(|r| r.id == entry.id) {
                Some(existing) => *existing = entry.clone(),
                None => rules.push(entry.clone()),
            }
        }
        Self::new(rules)
    }

    /// Registry defined by a rules file alone.
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        Self::new(config.rules.clone())
    }

    /// Look up a rule by id
    pub fn get(&self, id: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rules in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    /// Rule ids in declaration order
    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a RuleRegistry {
    type Item = &'a CategoryRule;
    type IntoIter = std::slice::Iter<'a, CategoryRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Rules file contents
///
/// ```toml
/// [[rule]]
/// id = "strollers-gear"
/// keywords = ["stroller", "pram"]
/// weak_keywords = ["travel"]
/// weight = 10
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default, rename = "rule")]
    pub rules: Vec<CategoryRule>,
}

impl RulesConfig {
    /// Load a rules file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ShelfsortError::RulesFileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ShelfsortError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(ShelfsortError::DuplicateRuleId {
                    id: rule.id.clone(),
                });
            }
        }
        Ok(())
    }
}
