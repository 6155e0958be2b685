//! # Category Module
//!
//! Assigns a single category to a product record with weighted keyword
//! scoring, optionally escalating low-confidence results to a vision
//! capability.
//!
//! ## Channels
//!
//! Each product is split into case-folded channels, each with its own
//! multiplier on the rule weight:
//!
//! - **name** (name + Arabic name): ×3, also the only channel checked for
//!   negative keywords
//! - **breadcrumbs**: ×5
//! - **url**: ×2
//! - **image URLs**: ×2 per matching URL
//! - **description**: ×1, plus a flat +1 per weak keyword
//!
//! ## Module layout
//!
//! - `builtin`: builtin rule table and the runtime rule type
//! - `registry`: ordered rule registry and rules file loading
//! - `scoring`: scoring engine
//! - `escalation`: escalation decision and enrichment
//! - `classifier`: classifier facade
//!
//! ## Usage
//!
//! ```rust
//! use shelfsort_core::category::Classifier;
//! use shelfsort_core::ProductInput;
//!
//! let classifier = Classifier::builtin();
//! let product = ProductInput::new("Baby Stroller Travel System")
//!     .with_breadcrumbs(["Strollers & Gear"]);
//!
//! let result = classifier.classify(&product);
//! assert_eq!(result.category_id, "strollers-gear");
//! assert!(!result.is_ambiguous);
//! ```
//!
//! ### With vision escalation
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shelfsort_core::category::Classifier;
//! use shelfsort_core::vision::CommandVision;
//!
//! let classifier = Classifier::builtin()
//!     .with_vision(Arc::new(CommandVision::new("describe-image", vec![])));
//! let result = classifier.classify_with_vision(&product, Some(&api_key)).await;
//! ```

mod builtin;
mod classifier;
mod escalation;
mod registry;
mod scoring;

// Re-exports
pub use builtin::{BuiltinRule, CategoryRule, BUILTIN_RULES, DEFAULT_RULE_WEIGHT, UNCATEGORIZED};
pub use classifier::Classifier;
pub use escalation::{
    enrich_product, plan_escalation, EscalationPlan, LocalReason, Tier, VisionOutcome,
    ESCALATION_THRESHOLD,
};
pub use registry::{RuleRegistry, RulesConfig};
pub use scoring::{
    classify_product, rule_score, ClassificationResult, AMBIGUITY_MARGIN, BREADCRUMB_MULTIPLIER,
    DESCRIPTION_MULTIPLIER, IMAGE_MULTIPLIER, MIN_CONFIDENCE, NAME_MULTIPLIER, NEGATIVE_PENALTY,
    URL_MULTIPLIER, WEAK_KEYWORD_SCORE,
};
