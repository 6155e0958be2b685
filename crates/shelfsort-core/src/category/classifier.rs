//! Category Classifier
//!
//! Facade over the scoring engine. `classify` is the local fast path;
//! `classify_with_vision` adds the optional escalation tier.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::product::ProductInput;
use crate::vision::{NoopVision, VisionCapability};

use super::escalation::{enrich_product, plan_escalation, EscalationPlan, LocalReason, VisionOutcome};
use super::registry::RuleRegistry;
use super::scoring::{classify_product, ClassificationResult};

/// Product classifier
#[derive(Clone)]
pub struct Classifier {
    registry: Arc<RuleRegistry>,
    vision: Arc<dyn VisionCapability>,
}

impl Classifier {
    pub fn new(registry: Arc<RuleRegistry>, vision: Arc<dyn VisionCapability>) -> Self {
        Self { registry, vision }
    }

    /// Classifier without a vision capability
    pub fn local(registry: Arc<RuleRegistry>) -> Self {
        Self::new(registry, Arc::new(NoopVision))
    }

    /// Classifier over the shared builtin registry
    pub fn builtin() -> Self {
        Self::local(RuleRegistry::shared_builtin())
    }

    /// Replace the vision capability
    pub fn with_vision(mut self, vision: Arc<dyn VisionCapability>) -> Self {
        self.vision = vision;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Classify with keyword scoring only.
    pub fn classify(&self, product: &ProductInput) -> ClassificationResult {
        classify_product(product, &self.registry)
    }

    /// Classify, escalating low-confidence results to vision.
    ///
    /// Never fails: any vision problem yields the local result.
    pub async fn classify_with_vision(
        &self,
        product: &ProductInput,
        api_key: Option<&str>,
    ) -> ClassificationResult {
        self.classify_with_vision_detailed(product, api_key)
            .await
            .result
    }

    /// Like [`classify_with_vision`](Self::classify_with_vision), also
    /// reporting which tier produced the result.
    pub async fn classify_with_vision_detailed(
        &self,
        product: &ProductInput,
        api_key: Option<&str>,
    ) -> VisionOutcome {
        self.classify_with_vision_cancellable(product, api_key, &CancellationToken::new())
            .await
    }

    /// Escalating classification that gives up on vision when `cancel`
    /// fires, returning the local result.
    pub async fn classify_with_vision_cancellable(
        &self,
        product: &ProductInput,
        api_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> VisionOutcome {
        let local = self.classify(product);

        let (image_url, api_key) = match plan_escalation(&local, product, api_key) {
            EscalationPlan::Stay(reason) => {
                tracing::debug!(
                    category = %local.category_id,
                    confidence = local.confidence,
                    ?reason,
                    "keeping local classification"
                );
                return VisionOutcome::local(local, reason);
            }
            EscalationPlan::Escalate { image_url, api_key } => (image_url, api_key),
        };

        tracing::info!(
            confidence = local.confidence,
            image_url,
            "low confidence, asking vision"
        );

        // A panicking capability counts as a failed request.
        let request =
            AssertUnwindSafe(self.vision.describe_image(image_url, api_key)).catch_unwind();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            response = request => Some(response),
        };

        let tags = match response {
            None => {
                tracing::warn!(image_url, "vision request cancelled");
                return VisionOutcome::local(local, LocalReason::Cancelled);
            }
            Some(Err(_)) => {
                tracing::error!(image_url, "vision capability panicked");
                return VisionOutcome::local(local, LocalReason::VisionFailed);
            }
            Some(Ok(Err(e))) => {
                tracing::warn!(image_url, error = %e, "vision request failed");
                return VisionOutcome::local(local, LocalReason::VisionFailed);
            }
            Some(Ok(Ok(tags))) if tags.is_empty() => {
                tracing::debug!(image_url, "vision returned no tags");
                return VisionOutcome::local(local, LocalReason::NoTags);
            }
            Some(Ok(Ok(tags))) => tags,
        };

        tracing::info!(tags = %tags.join(", "), "vision tags found");
        let result = self.classify(&enrich_product(product, &tags));
        VisionOutcome::escalated(result, tags)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.registry.ids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::category::builtin::{CategoryRule, UNCATEGORIZED};
    use crate::category::escalation::Tier;
    use crate::error::{Result, ShelfsortError};

    /// Records calls and answers with fixed tags
    #[derive(Default)]
    struct MockVision {
        tags: Vec<String>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl MockVision {
        fn answering(tags: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VisionCapability for MockVision {
        async fn describe_image(&self, image_url: &str, api_key: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((image_url.to_string(), api_key.to_string()));
            Ok(self.tags.clone())
        }
    }

    struct FailingVision;

    #[async_trait]
    impl VisionCapability for FailingVision {
        async fn describe_image(&self, _image_url: &str, _api_key: &str) -> Result<Vec<String>> {
            Err(ShelfsortError::vision("HTTP 500"))
        }
    }

    struct PanickingVision;

    #[async_trait]
    impl VisionCapability for PanickingVision {
        async fn describe_image(&self, _image_url: &str, _api_key: &str) -> Result<Vec<String>> {
            panic!("vision sdk bug")
        }
    }

    /// Never answers
    struct HangingVision;

    #[async_trait]
    impl VisionCapability for HangingVision {
        async fn describe_image(&self, _image_url: &str, _api_key: &str) -> Result<Vec<String>> {
            std::future::pending().await
        }
    }

    const NONE: [&str; 0] = [];

    /// `gear` wins weakly on the name, `toys` only through the description
    fn registry() -> Arc<RuleRegistry> {
        let gear = CategoryRule::new("gear", ["widget"], NONE, NONE, 2).unwrap();
        let toys = CategoryRule::new("toys", ["plush", "teddy"], NONE, NONE, 10).unwrap();
        Arc::new(RuleRegistry::new(vec![gear, toys]).unwrap())
    }

    fn weak_product() -> ProductInput {
        ProductInput::new("Widget").with_image_urls(["https://cdn.example/item.jpg"])
    }

    #[test]
    fn test_classify_builtin() {
        let classifier = Classifier::builtin();
        let product = ProductInput::new("Baby Stroller Travel System")
            .with_breadcrumbs(["Strollers & Gear"]);

        let result = classifier.classify(&product);
        assert_eq!(result.category_id, "strollers-gear");
        assert!(result.confidence >= 50);
        assert!(!result.is_ambiguous);
    }

    #[test]
    fn test_registry_accessor() {
        let classifier = Classifier::local(registry());
        assert_eq!(classifier.registry().ids(), vec!["gear", "toys"]);
        assert_eq!(Classifier::builtin().registry().len(), 8);
    }

    #[test]
    fn test_classify_empty_product() {
        let result = Classifier::builtin().classify(&ProductInput::default());
        assert_eq!(result.category_id, UNCATEGORIZED);
        assert_eq!(result.confidence, 0);
        assert!(!result.is_ambiguous);
    }

    #[tokio::test]
    async fn test_confident_result_never_calls_vision() {
        let vision = MockVision::answering(&["plush"]);
        let classifier = Classifier::local(registry()).with_vision(vision.clone());

        let product = ProductInput::new("Widget widget")
            .with_breadcrumbs(["Widgets"])
            .with_image_urls(["https://cdn.example/item.jpg"]);
        let outcome = classifier
            .classify_with_vision_detailed(&product, Some("key"))
            .await;

        assert_eq!(vision.calls(), 0);
        assert_eq!(outcome.tier, Tier::Local);
        assert_eq!(outcome.local_reason, Some(LocalReason::Confident));
        assert_eq!(outcome.result, classifier.classify(&product));
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_vision() {
        let vision = MockVision::answering(&["plush"]);
        let classifier = Classifier::local(registry()).with_vision(vision.clone());

        let result = classifier.classify_with_vision(&weak_product(), None).await;

        assert_eq!(vision.calls(), 0);
        assert_eq!(result.category_id, "gear");
    }

    #[tokio::test]
    async fn test_unusable_image_never_calls_vision() {
        let vision = MockVision::answering(&["plush"]);
        let classifier = Classifier::local(registry()).with_vision(vision.clone());

        let product = ProductInput::new("Widget").with_image_urls(["images/item.jpg"]);
        let outcome = classifier
            .classify_with_vision_detailed(&product, Some("key"))
            .await;

        assert_eq!(vision.calls(), 0);
        assert_eq!(outcome.local_reason, Some(LocalReason::NoImage));
    }

    #[tokio::test]
    async fn test_vision_tags_change_the_winner() {
        let vision = MockVision::answering(&["plush", "teddy"]);
        let classifier = Classifier::local(registry()).with_vision(vision.clone());
        let product = weak_product();

        let local = classifier.classify(&product);
        assert_eq!(local.category_id, "gear");
        assert!(local.confidence < 10);

        let outcome = classifier
            .classify_with_vision_detailed(&product, Some("sk-test"))
            .await;

        assert_eq!(vision.calls(), 1);
        assert_eq!(
            vision.seen.lock().unwrap().as_slice(),
            &[("https://cdn.example/item.jpg".to_string(), "sk-test".to_string())]
        );
        assert!(outcome.is_escalated());
        assert_eq!(outcome.tags, vec!["plush", "teddy"]);
        assert_eq!(outcome.result.category_id, "toys");
        assert_eq!(outcome.result.all_scores["toys"], 20);
        assert_ne!(outcome.result.category_id, local.category_id);
    }

    #[tokio::test]
    async fn test_escalated_result_replaces_local() {
        // Tags that match nothing still produce the second-pass result.
        let vision = MockVision::answering(&["lamp"]);
        let classifier = Classifier::local(registry()).with_vision(vision.clone());
        let product = weak_product().with_description("small");

        let outcome = classifier
            .classify_with_vision_detailed(&product, Some("key"))
            .await;

        let expected = classifier.classify(&product.clone().with_description("small lamp"));
        assert_eq!(outcome.tier, Tier::Escalated);
        assert_eq!(outcome.result, expected);
    }

    #[tokio::test]
    async fn test_empty_tags_keep_local_result() {
        let vision = MockVision::answering(&[]);
        let classifier = Classifier::local(registry()).with_vision(vision.clone());
        let product = weak_product();

        let outcome = classifier
            .classify_with_vision_detailed(&product, Some("key"))
            .await;

        assert_eq!(vision.calls(), 1);
        assert_eq!(outcome.local_reason, Some(LocalReason::NoTags));
        assert_eq!(outcome.result, classifier.classify(&product));
    }

    #[tokio::test]
    async fn test_vision_failure_keeps_local_result() {
        let classifier = Classifier::local(registry()).with_vision(Arc::new(FailingVision));
        let product = weak_product();

        let outcome = classifier
            .classify_with_vision_detailed(&product, Some("key"))
            .await;

        assert_eq!(outcome.local_reason, Some(LocalReason::VisionFailed));
        assert_eq!(outcome.result, classifier.classify(&product));
    }

    #[tokio::test]
    async fn test_vision_panic_keeps_local_result() {
        let classifier = Classifier::local(registry()).with_vision(Arc::new(PanickingVision));
        let product = weak_product();

        let handle = tokio::spawn({
            let classifier = classifier.clone();
            let product = product.clone();
            async move {
                classifier
                    .classify_with_vision_detailed(&product, Some("key"))
                    .await
            }
        });

        let outcome = handle.await.expect("classification task must not panic");
        assert_eq!(outcome.tier, Tier::Local);
        assert_eq!(outcome.local_reason, Some(LocalReason::VisionFailed));
        assert_eq!(outcome.result, classifier.classify(&product));
    }

    #[tokio::test]
    async fn test_noop_vision_keeps_local_result() {
        let classifier = Classifier::local(registry());
        let product = weak_product();

        let result = classifier.classify_with_vision(&product, Some("key")).await;
        assert_eq!(result, classifier.classify(&product));
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let classifier = Classifier::local(registry()).with_vision(Arc::new(HangingVision));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = classifier
            .classify_with_vision_cancellable(&weak_product(), Some("key"), &cancel)
            .await;

        assert_eq!(outcome.local_reason, Some(LocalReason::Cancelled));
        assert_eq!(outcome.result.category_id, "gear");
    }

    #[tokio::test]
    async fn test_cancelled_while_waiting() {
        let classifier = Classifier::local(registry()).with_vision(Arc::new(HangingVision));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let outcome = classifier
            .classify_with_vision_cancellable(&weak_product(), Some("key"), &cancel)
            .await;

        handle.await.unwrap();
        assert_eq!(outcome.tier, Tier::Local);
        assert_eq!(outcome.local_reason, Some(LocalReason::Cancelled));
    }

    #[test]
    fn test_classifier_is_shareable_across_threads() {
        let classifier = Classifier::builtin();
        let product = ProductInput::new("Feeding bottle");
        let expected = classifier.classify(&product);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| classifier.classify(&product)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
