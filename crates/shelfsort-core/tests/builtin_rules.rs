use shelfsort_core::{Classifier, ProductInput, UNCATEGORIZED};

fn classify(product: ProductInput) -> shelfsort_core::ClassificationResult {
    Classifier::builtin().classify(&product)
}

#[test]
fn stroller_with_breadcrumb() {
    let result = classify(
        ProductInput::new("Baby Stroller Travel System").with_breadcrumbs(["Strollers & Gear"]),
    );

    assert_eq!(result.category_id, "strollers-gear");
    // "stroller" in name and breadcrumbs, "travel system" in name
    assert_eq!(result.confidence, 110);
    assert!(!result.is_ambiguous);
    assert_eq!(result.all_scores.len(), 8);
}

#[test]
fn arabic_name_matches() {
    let result = classify(ProductInput::new("Item").with_name_ar("عربة أطفال"));
    assert_eq!(result.category_id, "strollers-gear");
    assert_eq!(result.confidence, 30);
}

#[test]
fn full_product_record() {
    let result = classify(
        ProductInput::new("Feeding Bottle with Nipple")
            .with_description("BPA free bottle for travel")
            .with_breadcrumbs(["Feeding", "Bottles"])
            .with_image_urls(["https://cdn.example/bottle.jpg"]),
    );

    assert_eq!(result.category_id, "feeding");
    assert_eq!(result.confidence, 220);
    assert_eq!(result.all_scores["maternity"], 30);
    // weak keyword "travel" only
    assert_eq!(result.all_scores["strollers-gear"], 1);
}

#[test]
fn close_call_between_overlapping_rules() {
    let result = classify(ProductInput::new("Baby Shampoo").with_description("gentle bath wash"));
    assert_eq!(result.category_id, "bathing");
    assert_eq!(result.confidence, 45);
    assert_eq!(result.all_scores["baby-care"], 40);
    assert!(!result.is_ambiguous);
}

#[test]
fn negative_keywords_sink_rules() {
    let result = classify(ProductInput::new("Doll Dress"));

    assert_eq!(result.all_scores["baby-care"], -100);
    assert_eq!(result.all_scores["clothing"], -20);
    // toys and maternity tie at 30; toys is declared first
    assert_eq!(result.all_scores["toys"], 30);
    assert_eq!(result.all_scores["maternity"], 30);
    assert_eq!(result.category_id, "toys");
    assert!(result.is_ambiguous);
}

#[test]
fn unknown_product_is_uncategorized() {
    let result = classify(ProductInput::new("Product 123"));
    assert_eq!(result.category_id, UNCATEGORIZED);
    assert_eq!(result.confidence, 0);
    assert!(!result.is_ambiguous);
}

#[test]
fn weak_signal_below_floor() {
    let result = classify(ProductInput::new("Zzz").with_description("fun play learn educational"));
    assert_eq!(result.category_id, UNCATEGORIZED);
    assert_eq!(result.confidence, 4);
    assert!(result.is_ambiguous);
    assert_eq!(result.all_scores["toys"], 4);
}
