//! Scoring Engine
//!
//! Scores a product against every rule of a registry and picks a winner.
//! Pure and synchronous; safe to call from any number of threads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::product::ProductInput;

use super::builtin::{CategoryRule, UNCATEGORIZED};
use super::registry::RuleRegistry;

/// Subtracted once per negative keyword found in the name
pub const NEGATIVE_PENALTY: i64 = 50;
pub const NAME_MULTIPLIER: i64 = 3;
/// Breadcrumbs are the most trusted channel
pub const BREADCRUMB_MULTIPLIER: i64 = 5;
pub const URL_MULTIPLIER: i64 = 2;
/// Applied once per matching image URL
pub const IMAGE_MULTIPLIER: i64 = 2;
pub const DESCRIPTION_MULTIPLIER: i64 = 1;
/// Flat score of a weak keyword, independent of rule weight
pub const WEAK_KEYWORD_SCORE: i64 = 1;
/// Winner margins below this are ambiguous
pub const AMBIGUITY_MARGIN: i64 = 5;
/// Winners scoring below this are reported as uncategorized
pub const MIN_CONFIDENCE: i64 = 5;

/// Outcome of scoring one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Winning rule id, or `"uncategorized"`
    pub category_id: String,
    /// Raw score of the winning rule (not a probability)
    pub confidence: i64,
    /// Winner and runner-up are within [`AMBIGUITY_MARGIN`]
    #[serde(rename = "isAmbiguous")]
    pub is_ambiguous: bool,
    /// Score of every rule in the registry
    #[serde(rename = "allScores")]
    pub all_scores: BTreeMap<String, i64>,
}

impl ClassificationResult {
    pub fn is_uncategorized(&self) -> bool {
        self.category_id == UNCATEGORIZED
    }

    /// Scores sorted highest first; equal scores keep id order.
    pub fn ranked_scores(&self) -> Vec<(&str, i64)> {
        let mut ranked: Vec<(&str, i64)> = self
            .all_scores
            .iter()
            .map(|(id, score)| (id.as_str(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Case-folded text channels of a product
struct Channels {
    name: String,
    desc: String,
    bread: String,
    url: String,
    images: Vec<String>,
}

impl Channels {
    fn from_product(product: &ProductInput) -> Self {
        Self {
            name: format!("{} {}", product.name, product.name_ar).to_lowercase(),
            desc: product.description.to_lowercase(),
            bread: product.breadcrumbs.join(" ").to_lowercase(),
            url: product.url.to_lowercase(),
            images: product.image_urls.iter().map(|u| u.to_lowercase()).collect(),
        }
    }
}

/// Score a product against every rule and pick the winner.
pub fn classify_product(product: &ProductInput, registry: &RuleRegistry) -> ClassificationResult {
    let channels = Channels::from_product(product);

    let mut all_scores = BTreeMap::new();
    let mut best = UNCATEGORIZED;
    let mut max_score = 0;
    let mut second_score = 0;

    for rule in registry {
        let score = score_rule(rule, &channels);
        all_scores.insert(rule.id.clone(), score);

        if score > max_score {
            second_score = max_score;
            max_score = score;
            best = rule.id.as_str();
        } else if score > second_score {
            second_score = score;
        }
    }

    // Computed against the raw winner, before the floor below.
    let is_ambiguous = (max_score - second_score) < AMBIGUITY_MARGIN && max_score > 0;

    if max_score < MIN_CONFIDENCE {
        best = UNCATEGORIZED;
    }

    ClassificationResult {
        category_id: best.to_string(),
        confidence: max_score,
        is_ambiguous,
        all_scores,
    }
}

/// Score of a single rule for a product.
pub fn rule_score(rule: &CategoryRule, product: &ProductInput) -> i64 {
    score_rule(rule, &Channels::from_product(product))
}

fn score_rule(rule: &CategoryRule, channels: &Channels) -> i64 {
    let weight = i64::from(rule.weight);
    let mut score = 0;

    // Negative keywords only look at the name.
    for negative in &rule.negative {
        if channels.name.contains(negative.as_str()) {
            score -= NEGATIVE_PENALTY;
        }
    }

    for keyword in &rule.keywords {
        let keyword = keyword.as_str();
        if channels.name.contains(keyword) {
            score += weight * NAME_MULTIPLIER;
        }
        if channels.bread.contains(keyword) {
            score += weight * BREADCRUMB_MULTIPLIER;
        }
        if channels.url.contains(keyword) {
            score += weight * URL_MULTIPLIER;
        }
        for image in &channels.images {
            if image.contains(keyword) {
                score += weight * IMAGE_MULTIPLIER;
            }
        }
    }

    for keyword in &rule.keywords {
        if channels.desc.contains(keyword.as_str()) {
            score += weight * DESCRIPTION_MULTIPLIER;
        }
    }

    for weak in &rule.weak_keywords {
        if channels.desc.contains(weak.as_str()) {
            score += WEAK_KEYWORD_SCORE;
        }
    }

    score
}
