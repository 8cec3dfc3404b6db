//! Listing lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::fields::validate::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Validating,
    Validated,
    Submitted,
    Error,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Validating => "validating",
            ListingStatus::Validated => "validated",
            ListingStatus::Submitted => "submitted",
            ListingStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ListingStatus::Submitted)
    }

    pub fn can_transition_to(&self, to: ListingStatus) -> bool {
        use ListingStatus::*;
        match to {
            Validating => matches!(self, Draft | Validated | Error),
            Validated => matches!(self, Validating),
            Submitted => matches!(self, Validated),
            Error => !self.is_terminal(),
            Draft => false,
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ListingStatus::Draft),
            "validating" => Ok(ListingStatus::Validating),
            "validated" => Ok(ListingStatus::Validated),
            "submitted" => Ok(ListingStatus::Submitted),
            "error" => Ok(ListingStatus::Error),
            other => anyhow::bail!("Unknown listing status '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move listing from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ListingStatus,
    pub to: ListingStatus,
}

/// Status, validation outcome and submission receipt shared by every listing kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub status: ListingStatus,
    #[serde(default)]
    pub validation_errors: ValidationReport,
    #[serde(default)]
    pub submission_id: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            status: ListingStatus::Draft,
            validation_errors: ValidationReport::new(),
            submission_id: None,
            submitted_at: None,
        }
    }
}

impl Lifecycle {
    fn transition(&mut self, to: ListingStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(to) {
            return Err(InvalidTransition { from: self.status, to });
        }
        log::debug!("Listing status {} -> {}", self.status, to);
        self.status = to;
        Ok(())
    }

    pub fn mark_as_validating(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ListingStatus::Validating)
    }

    /// Passing validation clears earlier errors
    pub fn mark_as_validated(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ListingStatus::Validated)?;
        self.validation_errors = ValidationReport::new();
        Ok(())
    }

    pub fn mark_as_error(&mut self, errors: ValidationReport) -> Result<(), InvalidTransition> {
        self.transition(ListingStatus::Error)?;
        self.validation_errors = errors;
        Ok(())
    }

    pub fn mark_as_submitted(&mut self, submission_id: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(ListingStatus::Submitted)?;
        self.submission_id = Some(submission_id.into());
        self.submitted_at = Some(Utc::now());
        Ok(())
    }

    /// Record a validation outcome: validated when the report is clean, error otherwise
    pub fn apply_report(&mut self, report: ValidationReport) -> Result<(), InvalidTransition> {
        if report.is_ok() {
            self.mark_as_validated()
        } else {
            self.mark_as_error(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.mark_as_validating().unwrap();
        lifecycle.mark_as_validated().unwrap();
        lifecycle.mark_as_submitted("sub-1").unwrap();

        assert_eq!(lifecycle.status, ListingStatus::Submitted);
        assert_eq!(lifecycle.submission_id.as_deref(), Some("sub-1"));
        assert!(lifecycle.submitted_at.is_some());
    }

    #[test]
    fn test_submitted_is_terminal() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.mark_as_validating().unwrap();
        lifecycle.mark_as_validated().unwrap();
        lifecycle.mark_as_submitted("sub-1").unwrap();

        let err = lifecycle.mark_as_error(ValidationReport::new()).unwrap_err();
        assert_eq!(err, InvalidTransition { from: ListingStatus::Submitted, to: ListingStatus::Error });
        assert!(lifecycle.mark_as_validating().is_err());
    }

    #[test]
    fn test_cannot_submit_unvalidated() {
        let mut lifecycle = Lifecycle::default();
        let err = lifecycle.mark_as_submitted("sub-1").unwrap_err();
        assert_eq!(err.to_string(), "cannot move listing from draft to submitted");
        assert_eq!(lifecycle.status, ListingStatus::Draft);
    }

    #[test]
    fn test_error_then_revalidate_clears_errors() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.mark_as_validating().unwrap();

        let mut report = ValidationReport::new();
        report.add("title", "Title is required.");
        lifecycle.apply_report(report).unwrap();
        assert_eq!(lifecycle.status, ListingStatus::Error);
        assert_eq!(lifecycle.validation_errors.len(), 1);

        lifecycle.mark_as_validating().unwrap();
        lifecycle.apply_report(ValidationReport::new()).unwrap();
        assert_eq!(lifecycle.status, ListingStatus::Validated);
        assert!(lifecycle.validation_errors.is_empty());
    }

    #[test]
    fn test_status_parsing() {
        for status in [
            ListingStatus::Draft,
            ListingStatus::Validating,
            ListingStatus::Validated,
            ListingStatus::Submitted,
            ListingStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<ListingStatus>().unwrap(), status);
        }
        assert!("pending".parse::<ListingStatus>().is_err());
    }
}
