use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{InvalidTransition, Lifecycle, ListingStatus};
use crate::api::amazon::requirements::{missing_requirements, ListingRequirements};
use crate::fields::validate::ValidationReport;

/// A listing for one Amazon product type in one marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmazonListing {
    pub id: String,
    pub product_type: String,
    pub marketplace_id: String,
    /// Attribute name -> submitted value
    pub form_data: BTreeMap<String, Value>,
    pub requirements: Option<ListingRequirements>,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AmazonListing {
    pub fn new(product_type: impl Into<String>, marketplace_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            product_type: product_type.into(),
            marketplace_id: marketplace_id.into(),
            form_data: BTreeMap::new(),
            requirements: None,
            lifecycle: Lifecycle::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ListingStatus {
        self.lifecycle.status
    }

    pub fn set_attribute(&mut self, name: &str, value: Value) {
        self.form_data.insert(name.to_string(), value);
        self.updated_at = Utc::now();
    }

    pub fn attach_requirements(&mut self, requirements: ListingRequirements) {
        self.requirements = Some(requirements);
        self.updated_at = Utc::now();
    }

    /// Required attributes still missing; empty until requirements are attached
    pub fn missing_attributes(&self) -> Vec<String> {
        match &self.requirements {
            Some(requirements) => missing_requirements(requirements, &self.form_data),
            None => Vec::new(),
        }
    }

    /// Check the form data against the attached requirements and move to `validated` or `error`
    pub fn validate(&mut self) -> Result<&ValidationReport, InvalidTransition> {
        self.lifecycle.mark_as_validating()?;

        let mut report = ValidationReport::new();
        match &self.requirements {
            None => report.add("product_type", "Listing requirements have not been loaded."),
            Some(requirements) => {
                for attribute in missing_requirements(requirements, &self.form_data) {
                    report.add(
                        &attribute,
                        format!(
                            "{} is required for product type {}.",
                            requirements.label(&attribute),
                            self.product_type
                        ),
                    );
                }
            }
        }

        self.lifecycle.apply_report(report)?;
        self.updated_at = Utc::now();
        Ok(&self.lifecycle.validation_errors)
    }

    pub fn mark_as_submitted(&mut self, submission_id: impl Into<String>) -> Result<(), InvalidTransition> {
        self.lifecycle.mark_as_submitted(submission_id)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn requirements() -> ListingRequirements {
        ListingRequirements::from_schema(
            "LUGGAGE",
            "ATVPDKIKX0DER",
            &json!({
                "required": ["item_name", "brand"],
                "properties": {"brand": {"title": "Brand Name"}}
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_without_requirements_is_error() {
        let mut listing = AmazonListing::new("LUGGAGE", "ATVPDKIKX0DER");
        let report = listing.validate().unwrap();
        assert_eq!(report.field_errors("product_type").len(), 1);
        assert_eq!(listing.status(), ListingStatus::Error);
    }

    #[test]
    fn test_validate_and_submit() {
        let mut listing = AmazonListing::new("LUGGAGE", "ATVPDKIKX0DER");
        listing.attach_requirements(requirements());
        listing.set_attribute("item_name", json!("Carry-on"));

        assert_eq!(listing.missing_attributes(), vec!["brand"]);
        let report = listing.validate().unwrap();
        assert_eq!(report.field_errors("brand"), ["Brand Name is required for product type LUGGAGE."]);
        assert!(listing.mark_as_submitted("sub-1").is_err());

        listing.set_attribute("brand", json!("Acme"));
        assert!(listing.validate().unwrap().is_ok());
        listing.mark_as_submitted("sub-1").unwrap();
        assert_eq!(listing.status(), ListingStatus::Submitted);
    }
}
