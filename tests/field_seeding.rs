//! Integration tests for seeding, rendering and validating the default field definitions

use channel_lister::config::Config;
use channel_lister::fields::layout::build_form;
use channel_lister::fields::render::{InputSpec, RenderContext};
use channel_lister::fields::seed::{canonical_definitions, seed_fields, SeedOutcome};
use channel_lister::fields::{FieldDefinition, InputType};
use channel_lister::listing::{ListingStatus, ProductDraft};
use serde_json::json;

/// Seeding an empty database loads every canonical definition
#[tokio::test]
async fn test_seed_empty_database() {
    let config = Config::new_test().await.unwrap();
    let expected = canonical_definitions().unwrap().len();

    let outcome = seed_fields(config.pool(), false).await.unwrap();
    assert_eq!(outcome, SeedOutcome::Seeded { inserted: expected });
    assert_eq!(config.count_fields().await.unwrap(), expected as i64);
}

/// A second unforced run leaves the table alone
#[tokio::test]
async fn test_seed_is_idempotent() {
    let config = Config::new_test().await.unwrap();
    seed_fields(config.pool(), false).await.unwrap();
    let before = config.list_fields().await.unwrap();

    let outcome = seed_fields(config.pool(), false).await.unwrap();
    assert!(matches!(outcome, SeedOutcome::Skipped { .. }));
    assert_eq!(outcome.inserted(), 0);
    assert_eq!(config.list_fields().await.unwrap(), before);
}

/// Forced seeding drops local edits and reloads exactly the defaults
#[tokio::test]
async fn test_forced_seed_replaces_local_definitions() {
    let config = Config::new_test().await.unwrap();
    seed_fields(config.pool(), false).await.unwrap();

    let local = FieldDefinition::new("local_only_field", "ebay", InputType::Text);
    config.add_field(&local).await.unwrap();
    let with_local = config.count_fields().await.unwrap();

    let outcome = seed_fields(config.pool(), true).await.unwrap();
    let expected = canonical_definitions().unwrap().len();
    assert_eq!(
        outcome,
        SeedOutcome::Replaced {
            removed: with_local,
            inserted: expected
        }
    );
    assert!(config.get_field("local_only_field").await.unwrap().is_none());
    assert_eq!(config.count_fields().await.unwrap(), expected as i64);
}

/// Seeded definitions render into tabs, with disabled marketplaces left out
#[tokio::test]
async fn test_render_seeded_form() {
    let config = Config::new_test().await.unwrap();
    seed_fields(config.pool(), false).await.unwrap();
    let definitions = config.list_fields().await.unwrap();

    let ctx = RenderContext {
        disabled_marketplaces: vec!["Wish".to_string()],
        ..Default::default()
    };
    let tabs = build_form(&definitions, &ctx).unwrap();

    assert_eq!(tabs[0].marketplace, "common");
    assert!(tabs.iter().all(|t| t.marketplace != "wish"));
    assert!(tabs.iter().any(|t| t.marketplace == "amazon"));

    let color = tabs[0]
        .sections
        .iter()
        .flat_map(|s| s.fields.iter())
        .find(|f| f.field_name == "color")
        .unwrap();
    match &color.input {
        InputSpec::Select { options, editable } => {
            assert!(*editable);
            assert!(!options.contains_value("__OTHER__"));
        }
        other => panic!("unexpected input {:?}", other),
    }
}

/// A draft validated against the seeded definitions
#[tokio::test]
async fn test_draft_validation_against_seeded_fields() {
    let config = Config::new_test().await.unwrap();
    seed_fields(config.pool(), false).await.unwrap();
    let definitions = config.list_fields().await.unwrap();
    let ctx = RenderContext::default();

    let mut draft = ProductDraft::new(Some("Blue mug".to_string()));
    draft.set_value("common", "inventory_number", json!("MUG-BLU-12OZ"));
    draft.set_value("common", "auction_title", json!("Blue Ceramic Coffee Mug"));
    draft.set_value("ebay", "ebay_subtitle", json!("Holds 12 oz"));

    let report = draft.validate(&definitions, &ctx).unwrap();
    assert!(!report.is_ok());
    assert_eq!(report.field_errors("brand"), ["Brand is required."]);
    // eBay is active, so its required fields count
    assert!(!report.field_errors("ebay_category_id").is_empty());
    // Walmart is not
    assert!(report.field_errors("walmart_category").is_empty());
    assert_eq!(draft.status(), ListingStatus::Error);
}
