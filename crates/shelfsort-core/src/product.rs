//! Product Input
//!
//! Product records handed to the classifier. Every field except `name` is
//! optional at the source; missing values default to the empty string or
//! empty list so that scoring never has to special-case them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ShelfsortError};

/// A single product record as seen by the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    /// Primary (usually English) product name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Arabic product name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name_ar: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Category trail from the source site, outermost first
    #[serde(default, deserialize_with = "null_skipping_list")]
    pub breadcrumbs: Vec<String>,

    /// Source page URL
    #[serde(default, alias = "source_url", deserialize_with = "null_as_default")]
    pub url: String,

    /// Product image URLs, primary image first
    #[serde(
        default,
        rename = "imageUrls",
        alias = "image_urls",
        alias = "images",
        deserialize_with = "null_skipping_list"
    )]
    pub image_urls: Vec<String>,
}

impl ProductInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_name_ar(mut self, name_ar: impl Into<String>) -> Self {
        self.name_ar = name_ar.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_breadcrumbs<I, S>(mut self, breadcrumbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.breadcrumbs = breadcrumbs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_image_urls<I, S>(mut self, image_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_urls = image_urls.into_iter().map(Into::into).collect();
        self
    }

    /// Image reference to send for escalation.
    ///
    /// The first image URL when any exist, otherwise the source URL.
    /// Returns `None` when the chosen reference is empty.
    pub fn image_candidate(&self) -> Option<&str> {
        let candidate = match self.image_urls.first() {
            Some(first) => first.as_str(),
            None => self.url.as_str(),
        };
        (!candidate.is_empty()).then_some(candidate)
    }
}

/// Load products from a JSON file.
///
/// Accepts either a single JSON array of products or JSON Lines (one
/// product object per line, blank lines ignored).
pub fn load_products(path: &Path) -> Result<Vec<ProductInput>> {
    let content = fs::read_to_string(path)?;
    parse_products(&content).map_err(|e| ShelfsortError::ProductParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse_products(content: &str) -> std::result::Result<Vec<ProductInput>, serde_json::Error> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content);
    }

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<ProductInput>)
        .collect()
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A missing or `null` list is empty; `null` elements are dropped.
fn null_skipping_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(items.into_iter().flatten().flatten().collect())
}
