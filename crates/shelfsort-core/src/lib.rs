pub mod category;
pub mod config;
pub mod error;
pub mod product;
pub mod reclassify;
pub mod vision;

pub use category::{
    ClassificationResult, Classifier, CategoryRule, LocalReason, RuleRegistry, RulesConfig, Tier,
    VisionOutcome, UNCATEGORIZED,
};
pub use config::Config;
pub use error::{Result, ShelfsortError};
pub use product::{load_products, ProductInput};
pub use reclassify::{
    ReclassifyDecision, ReclassifyEntry, ReclassifyReport, ReclassifySummary, Reclassifier,
    SkipReason,
};
pub use vision::{parse_vision_tags, CommandVision, NoopVision, VisionCapability};
