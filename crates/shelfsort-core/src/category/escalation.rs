//! Escalation Coordinator
//!
//! Decides whether a local classification should be escalated to the
//! vision capability, and builds the enriched product for the second
//! scoring pass.

use serde::{Deserialize, Serialize};

use crate::product::ProductInput;

use super::scoring::ClassificationResult;

/// Local results at or above this confidence are never escalated
pub const ESCALATION_THRESHOLD: i64 = 10;

/// Which pass produced the final result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Keyword scoring on the product as given
    Local,
    /// Keyword scoring on the product enriched with vision tags
    Escalated,
}

/// Why a classification stayed on the local tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalReason {
    /// Local confidence reached [`ESCALATION_THRESHOLD`]
    Confident,
    NoApiKey,
    /// No image reference starting with `http`
    NoImage,
    /// Vision answered with zero tags
    NoTags,
    VisionFailed,
    Cancelled,
}

/// Escalation decision for a local result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationPlan<'a> {
    Stay(LocalReason),
    Escalate { image_url: &'a str, api_key: &'a str },
}

/// Decide whether to call the vision capability.
///
/// Checks, in order: local confidence, API key presence, then the image
/// reference (first image URL, else the source URL) must start with
/// `http`. An empty API key counts as absent.
pub fn plan_escalation<'a>(
    local: &ClassificationResult,
    product: &'a ProductInput,
    api_key: Option<&'a str>,
) -> EscalationPlan<'a> {
    if local.confidence >= ESCALATION_THRESHOLD {
        return EscalationPlan::Stay(LocalReason::Confident);
    }

    let api_key = match api_key {
        Some(key) if !key.is_empty() => key,
        _ => return EscalationPlan::Stay(LocalReason::NoApiKey),
    };

    match product.image_candidate() {
        Some(image_url) if image_url.starts_with("http") => {
            EscalationPlan::Escalate { image_url, api_key }
        }
        _ => EscalationPlan::Stay(LocalReason::NoImage),
    }
}

/// Copy of `product` with the vision tags appended to its description.
pub fn enrich_product(product: &ProductInput, tags: &[String]) -> ProductInput {
    ProductInput {
        description: format!("{} {}", product.description, tags.join(" ")),
        ..product.clone()
    }
}

/// Result of a classification that may have been escalated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionOutcome {
    pub result: ClassificationResult,
    pub tier: Tier,
    /// Set when `tier` is [`Tier::Local`]
    pub local_reason: Option<LocalReason>,
    /// Tags returned by the vision capability, if it was called
    pub tags: Vec<String>,
}

impl VisionOutcome {
    pub fn local(result: ClassificationResult, reason: LocalReason) -> Self {
        Self {
            result,
            tier: Tier::Local,
            local_reason: Some(reason),
            tags: Vec::new(),
        }
    }

    pub fn escalated(result: ClassificationResult, tags: Vec<String>) -> Self {
        Self {
            result,
            tier: Tier::Escalated,
            local_reason: None,
            tags,
        }
    }

    pub fn is_escalated(&self) -> bool {
        self.tier == Tier::Escalated
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn local(confidence: i64) -> ClassificationResult {
        ClassificationResult {
            category_id: "uncategorized".to_string(),
            confidence,
            is_ambiguous: false,
            all_scores: BTreeMap::new(),
        }
    }

    fn product_with_image(image: &str) -> ProductInput {
        ProductInput::new("Thing").with_image_urls([image])
    }

    #[test]
    fn test_confident_result_stays_local() {
        let product = product_with_image("https://cdn.example/a.jpg");
        assert_eq!(
            plan_escalation(&local(10), &product, Some("key")),
            EscalationPlan::Stay(LocalReason::Confident)
        );
        assert_eq!(
            plan_escalation(&local(250), &product, Some("key")),
            EscalationPlan::Stay(LocalReason::Confident)
        );
    }

    #[test]
    fn test_missing_or_empty_key_stays_local() {
        let product = product_with_image("https://cdn.example/a.jpg");
        assert_eq!(
            plan_escalation(&local(3), &product, None),
            EscalationPlan::Stay(LocalReason::NoApiKey)
        );
        assert_eq!(
            plan_escalation(&local(3), &product, Some("")),
            EscalationPlan::Stay(LocalReason::NoApiKey)
        );
    }

    #[test]
    fn test_non_http_image_stays_local() {
        for image in ["ftp://cdn.example/a.jpg", "/images/a.jpg", "data:image/png;base64,AA"] {
            let product = product_with_image(image);
            assert_eq!(
                plan_escalation(&local(0), &product, Some("key")),
                EscalationPlan::Stay(LocalReason::NoImage),
                "{image}"
            );
        }

        let bare = ProductInput::new("Thing");
        assert_eq!(
            plan_escalation(&local(0), &bare, Some("key")),
            EscalationPlan::Stay(LocalReason::NoImage)
        );
    }

    #[test]
    fn test_first_image_wins_over_url() {
        let product = ProductInput::new("Thing")
            .with_url("https://shop.example/p")
            .with_image_urls(["/relative.jpg", "https://cdn.example/b.jpg"]);
        // The first image is chosen even when it is unusable.
        assert_eq!(
            plan_escalation(&local(0), &product, Some("key")),
            EscalationPlan::Stay(LocalReason::NoImage)
        );
    }

    #[test]
    fn test_escalates_with_url_when_no_images() {
        let product = ProductInput::new("Thing").with_url("https://shop.example/p");
        assert_eq!(
            plan_escalation(&local(9), &product, Some("key")),
            EscalationPlan::Escalate {
                image_url: "https://shop.example/p",
                api_key: "key"
            }
        );
    }

    #[test]
    fn test_enrich_appends_tags_to_description() {
        let product = ProductInput::new("Thing")
            .with_description("Soft")
            .with_breadcrumbs(["Home"]);
        let tags = vec!["plush".to_string(), "teddy bear".to_string()];

        let enriched = enrich_product(&product, &tags);
        assert_eq!(enriched.description, "Soft plush teddy bear");
        assert_eq!(enriched.name, product.name);
        assert_eq!(enriched.breadcrumbs, product.breadcrumbs);

        let enriched = enrich_product(&ProductInput::new("Thing"), &tags);
        assert_eq!(enriched.description, " plush teddy bear");
    }
}
