use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{InvalidTransition, Lifecycle, ListingError, ListingStatus};
use crate::fields::definition::{FieldDefinition, COMMON_MARKETPLACE};
use crate::fields::render::RenderContext;
use crate::fields::validate::{validate_submission, FormData, ValidationReport};

/// A multi-marketplace product being prepared for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub id: String,
    pub title: Option<String>,
    pub form_data: FormData,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductDraft {
    pub fn new(title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            form_data: FormData::new(),
            lifecycle: Lifecycle::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ListingStatus {
        self.lifecycle.status
    }

    pub fn validation_errors(&self) -> &ValidationReport {
        &self.lifecycle.validation_errors
    }

    pub fn set_value(&mut self, marketplace: &str, field_name: &str, value: Value) {
        self.form_data
            .entry(marketplace.to_string())
            .or_default()
            .insert(field_name.to_string(), value);
        self.updated_at = Utc::now();
    }

    pub fn value(&self, marketplace: &str, field_name: &str) -> Option<&Value> {
        self.form_data.get(marketplace)?.get(field_name)
    }

    /// Channels with at least one submitted value
    pub fn active_marketplaces(&self) -> Vec<&str> {
        self.form_data
            .iter()
            .filter(|(marketplace, values)| {
                !marketplace.eq_ignore_ascii_case(COMMON_MARKETPLACE) && !values.is_empty()
            })
            .map(|(marketplace, _)| marketplace.as_str())
            .collect()
    }

    /// Validate the form data and move to `validated` or `error`.
    ///
    /// A broken definition is reported before any transition, so the status is unchanged.
    pub fn validate(
        &mut self,
        definitions: &[FieldDefinition],
        ctx: &RenderContext,
    ) -> Result<&ValidationReport, ListingError> {
        let from = self.status();
        if !from.can_transition_to(ListingStatus::Validating) {
            return Err(InvalidTransition { from, to: ListingStatus::Validating }.into());
        }

        let report = validate_submission(definitions, &self.form_data, &self.active_marketplaces(), ctx)?;
        self.lifecycle.mark_as_validating()?;
        self.lifecycle.apply_report(report)?;
        self.updated_at = Utc::now();

        Ok(&self.lifecycle.validation_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::definition::InputType;
    use serde_json::json;

    fn definitions() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("title", "common", InputType::Text).required(),
            FieldDefinition::new("walmart_category", "walmart", InputType::Text).required(),
        ]
    }

    #[test]
    fn test_validate_moves_to_error_then_validated() {
        let mut draft = ProductDraft::new(Some("Mug".to_string()));
        draft.set_value("walmart", "walmart_sku", json!("W-1"));

        let report = draft.validate(&definitions(), &RenderContext::default()).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(draft.status(), ListingStatus::Error);

        draft.set_value("common", "title", json!("Mug"));
        draft.set_value("walmart", "walmart_category", json!("Kitchen"));
        let report = draft.validate(&definitions(), &RenderContext::default()).unwrap();
        assert!(report.is_ok());
        assert_eq!(draft.status(), ListingStatus::Validated);
    }

    #[test]
    fn test_broken_definition_leaves_status_unchanged() {
        let mut draft = ProductDraft::new(Some("Mug".to_string()));
        draft.set_value("common", "title", json!("Mug"));
        draft.set_value("walmart", "walmart_category", json!("Kitchen"));

        let broken = vec![
            FieldDefinition::new("title", "common", InputType::Text).with_aux("([a-z"),
            FieldDefinition::new("walmart_category", "walmart", InputType::Text).required(),
        ];
        let err = draft.validate(&broken, &RenderContext::default()).unwrap_err();
        assert!(matches!(err, ListingError::Render(_)));
        assert_eq!(draft.status(), ListingStatus::Draft);

        let report = draft.validate(&definitions(), &RenderContext::default()).unwrap();
        assert!(report.is_ok());
        assert_eq!(draft.status(), ListingStatus::Validated);
    }

    #[test]
    fn test_submitted_draft_is_not_revalidated() {
        let mut draft = ProductDraft::new(None);
        draft.set_value("common", "title", json!("Mug"));
        draft.set_value("walmart", "walmart_category", json!("Kitchen"));
        draft.validate(&definitions(), &RenderContext::default()).unwrap();
        draft.lifecycle.mark_as_submitted("sub-1").unwrap();

        let err = draft.validate(&definitions(), &RenderContext::default()).unwrap_err();
        assert!(matches!(err, ListingError::Transition(_)));
        assert_eq!(draft.status(), ListingStatus::Submitted);
    }

    #[test]
    fn test_active_marketplaces_skip_common_and_empty() {
        let mut draft = ProductDraft::new(None);
        draft.set_value("common", "title", json!("Mug"));
        draft.set_value("ebay", "ebay_title", json!("Mug"));
        draft.form_data.insert("etsy".to_string(), Default::default());

        assert_eq!(draft.active_marketplaces(), vec!["ebay"]);
        assert_eq!(draft.value("ebay", "ebay_title"), Some(&json!("Mug")));
    }
}
