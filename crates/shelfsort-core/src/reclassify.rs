//! Batch reclassification
//!
//! Runs the classifier over a batch of products and decides, per product,
//! whether its new category should be applied. Escalations run one at a
//! time so that a batch never issues concurrent vision calls.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::category::{ClassificationResult, Classifier, Tier, MIN_CONFIDENCE};
use crate::product::ProductInput;

/// What to do with a product's new classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReclassifyDecision {
    Apply { category_id: String },
    Skip { reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Uncategorized,
    LowConfidence,
}

/// Per-product result of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclassifyEntry {
    /// Position in the input batch
    pub index: usize,
    pub name: String,
    pub result: ClassificationResult,
    pub tier: Tier,
    pub decision: ReclassifyDecision,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclassifySummary {
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub escalated: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclassifyReport {
    pub entries: Vec<ReclassifyEntry>,
    pub summary: ReclassifySummary,
}

impl ReclassifyReport {
    fn push(&mut self, entry: ReclassifyEntry) {
        self.summary.processed += 1;
        match entry.decision {
            ReclassifyDecision::Apply { .. } => self.summary.updated += 1,
            ReclassifyDecision::Skip { .. } => self.summary.skipped += 1,
        }
        if entry.tier == Tier::Escalated {
            self.summary.escalated += 1;
        }
        self.entries.push(entry);
    }
}

/// Batch reclassifier
#[derive(Debug, Clone)]
pub struct Reclassifier {
    classifier: Classifier,
    min_confidence: i64,
}

impl Reclassifier {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            min_confidence: MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: i64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Apply only categorized results at or above the minimum confidence.
    pub fn decide(&self, result: &ClassificationResult) -> ReclassifyDecision {
        if result.is_uncategorized() {
            ReclassifyDecision::Skip {
                reason: SkipReason::Uncategorized,
            }
        } else if result.confidence < self.min_confidence {
            ReclassifyDecision::Skip {
                reason: SkipReason::LowConfidence,
            }
        } else {
            ReclassifyDecision::Apply {
                category_id: result.category_id.clone(),
            }
        }
    }

    /// Classify a batch with keyword scoring only.
    pub fn run_local(&self, products: &[ProductInput]) -> ReclassifyReport {
        let mut report = ReclassifyReport::default();
        for (index, product) in products.iter().enumerate() {
            let result = self.classifier.classify(product);
            report.push(self.entry(index, product, result, Tier::Local));
        }
        tracing::debug!(summary = ?report.summary, "local reclassification finished");
        report
    }

    /// Classify a batch, escalating low-confidence products one by one.
    ///
    /// After `cancel` fires, the remaining products are classified locally.
    pub async fn run_with_vision(
        &self,
        products: &[ProductInput],
        api_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> ReclassifyReport {
        let mut report = ReclassifyReport::default();
        for (index, product) in products.iter().enumerate() {
            let outcome = self
                .classifier
                .classify_with_vision_cancellable(product, api_key, cancel)
                .await;
            report.push(self.entry(index, product, outcome.result, outcome.tier));
        }
        tracing::info!(summary = ?report.summary, "reclassification finished");
        report
    }

    fn entry(
        &self,
        index: usize,
        product: &ProductInput,
        result: ClassificationResult,
        tier: Tier,
    ) -> ReclassifyEntry {
        ReclassifyEntry {
            index,
            name: product.name.clone(),
            decision: self.decide(&result),
            result,
            tier,
        }
    }
}
