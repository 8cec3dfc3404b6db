//! Integration tests for persisting drafts and Amazon listings

use channel_lister::api::amazon::ListingRequirements;
use channel_lister::config::repository::listings;
use channel_lister::config::Config;
use channel_lister::fields::render::RenderContext;
use channel_lister::fields::{FieldDefinition, InputType, COMMON_MARKETPLACE};
use channel_lister::listing::{AmazonListing, ListingStatus, ProductDraft};
use serde_json::json;

fn requirements() -> ListingRequirements {
    ListingRequirements::from_schema(
        "MUG",
        "ATVPDKIKX0DER",
        &json!({
            "required": ["item_name", "brand"],
            "properties": {
                "item_name": {"title": "Item Name"},
                "brand": {"title": "Brand Name"}
            }
        }),
    )
    .unwrap()
}

/// Drafts keep their form data and validation errors across a save
#[tokio::test]
async fn test_draft_round_trip() {
    let config = Config::new_test().await.unwrap();
    let definitions = vec![FieldDefinition::new("sku", COMMON_MARKETPLACE, InputType::Text).required()];

    let mut draft = ProductDraft::new(Some("Mug".to_string()));
    draft.set_value("ebay", "ebay_subtitle", json!("Blue"));
    draft.validate(&definitions, &RenderContext::default()).unwrap();
    listings::save_draft(config.pool(), &draft).await.unwrap();

    let loaded = listings::get_draft(config.pool(), &draft.id).await.unwrap().unwrap();
    assert_eq!(loaded.status(), ListingStatus::Error);
    assert_eq!(loaded.validation_errors().field_errors("sku"), ["Sku is required."]);
    assert_eq!(loaded.value("ebay", "ebay_subtitle"), Some(&json!("Blue")));
    assert_eq!(loaded.title.as_deref(), Some("Mug"));

    // Drafts are not visible as Amazon listings
    assert!(listings::get_amazon(config.pool(), &draft.id).await.unwrap().is_none());
}

/// Saving again updates the same row
#[tokio::test]
async fn test_draft_upsert() {
    let config = Config::new_test().await.unwrap();
    let mut draft = ProductDraft::new(None);
    listings::save_draft(config.pool(), &draft).await.unwrap();

    draft.set_value("common", "sku", json!("MUG-1"));
    listings::save_draft(config.pool(), &draft).await.unwrap();

    let drafts = listings::list_drafts(config.pool()).await.unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].value("common", "sku"), Some(&json!("MUG-1")));
}

/// Amazon listings keep requirements and submission state
#[tokio::test]
async fn test_amazon_listing_lifecycle() {
    let config = Config::new_test().await.unwrap();

    let mut listing = AmazonListing::new("MUG", "ATVPDKIKX0DER");
    listing.attach_requirements(requirements());
    listing.set_attribute("item_name", json!("Blue Mug"));
    listing.set_attribute("brand", json!("Acme"));
    assert!(listing.validate().unwrap().is_ok());
    listings::save_amazon(config.pool(), &listing).await.unwrap();

    let validated = listings::list_amazon_by_status(config.pool(), ListingStatus::Validated)
        .await
        .unwrap();
    assert_eq!(validated.len(), 1);
    assert_eq!(validated[0].requirements.as_ref().unwrap().required, vec!["item_name", "brand"]);

    listing.mark_as_submitted("sub-42").unwrap();
    listings::save_amazon(config.pool(), &listing).await.unwrap();

    let loaded = listings::get_amazon(config.pool(), &listing.id).await.unwrap().unwrap();
    assert_eq!(loaded.status(), ListingStatus::Submitted);
    assert_eq!(loaded.lifecycle.submission_id.as_deref(), Some("sub-42"));
    assert!(loaded.lifecycle.submitted_at.is_some());
    assert!(listings::list_amazon_by_status(config.pool(), ListingStatus::Validated)
        .await
        .unwrap()
        .is_empty());

    assert!(listings::delete(config.pool(), &listing.id).await.unwrap());
    assert!(!listings::delete(config.pool(), &listing.id).await.unwrap());
}
