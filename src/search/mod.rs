//! Marketplace category search
//!
//! A `CategorySource` answers category queries; `plan_selection` decides what a
//! chosen category does to the form; `CategorySearch` carries the plan out
//! against a `SearchSession`.

pub mod selection;
pub mod session;
pub mod source;

pub use selection::{plan_selection, Assignment, DependentFetch, SelectionPlan};
pub use session::{CategorySearch, ReplacementDiff, SearchSession, SearsCheckbox, SelectionOutcome};
pub use source::{AttributeBlock, CategorySource, HttpCategorySource, SearchError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMarketplace {
    Amazon,
    Newegg,
    Sears,
    Walmart,
}

impl SearchMarketplace {
    pub const ALL: [SearchMarketplace; 4] = [
        SearchMarketplace::Amazon,
        SearchMarketplace::Newegg,
        SearchMarketplace::Sears,
        SearchMarketplace::Walmart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMarketplace::Amazon => "amazon",
            SearchMarketplace::Newegg => "newegg",
            SearchMarketplace::Sears => "sears",
            SearchMarketplace::Walmart => "walmart",
        }
    }

    /// Form field that receives the selected category id
    pub fn category_field(&self) -> String {
        format!("{}_category", self.as_str())
    }
}

impl fmt::Display for SearchMarketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMarketplace {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        SearchMarketplace::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Marketplace '{}' has no category search", s))
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHit {
    pub id: String,
    pub display_path: String,
}

impl CategoryHit {
    pub fn new(id: impl Into<String>, display_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_path: display_path.into(),
        }
    }
}
