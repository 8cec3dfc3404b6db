//! Static reference data used to populate select options
//!
//! Prop 65 chemicals and the Wish brand directory are read-only from the
//! point of view of the form pipeline. Display helpers are plain functions
//! over the records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::fields::codec::{title_case, AuxOption, OptionList};

/// A chemical listed under California Proposition 65
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Prop65Chemical {
    pub chemical_name: String,
    pub toxicity_type: Option<String>,
    pub listing_mechanism: Option<String>,
    pub cas_number: Option<String>,
    pub date_listed: Option<String>,
}

impl Prop65Chemical {
    pub fn new(chemical_name: impl Into<String>) -> Self {
        Self {
            chemical_name: chemical_name.into(),
            toxicity_type: None,
            listing_mechanism: None,
            cas_number: None,
            date_listed: None,
        }
    }

    /// Option label with the toxicity type appended when known
    pub fn option_label(&self) -> String {
        match self.toxicity_type.as_deref().map(str::trim) {
            Some(toxicity) if !toxicity.is_empty() => {
                format!("{} ({})", self.chemical_name, toxicity)
            }
            _ => self.chemical_name.clone(),
        }
    }
}

/// A brand entry in the Wish brand directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WishBrand {
    pub brand_name: String,
    pub brand_website: Option<String>,
}

impl WishBrand {
    pub fn new(brand_name: impl Into<String>) -> Self {
        Self {
            brand_name: brand_name.into(),
            brand_website: None,
        }
    }

    /// The stored brand name, title-cased
    pub fn display_name(&self) -> String {
        title_case(self.brand_name.trim())
    }

    /// Website with a scheme and without a trailing slash; `None` when blank
    pub fn normalized_website(&self) -> Option<String> {
        self.brand_website.as_deref().and_then(normalize_url)
    }
}

pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches("//"))
    };

    Some(with_scheme.trim_end_matches('/').to_string())
}

/// Select options for a list of chemicals, keyed by chemical name
pub fn chemical_options(chemicals: &[Prop65Chemical]) -> OptionList {
    chemicals
        .iter()
        .map(|c| AuxOption::labeled(c.chemical_name.as_str(), c.option_label()))
        .collect()
}

/// Select options for the brand directory, sorted by display name
pub fn brand_options(brands: &[WishBrand]) -> OptionList {
    let mut sorted: Vec<&WishBrand> = brands.iter().collect();
    sorted.sort_by_key(|b| b.display_name().to_lowercase());
    sorted
        .into_iter()
        .map(|b| AuxOption::labeled(b.brand_name.as_str(), b.display_name()))
        .collect()
}
