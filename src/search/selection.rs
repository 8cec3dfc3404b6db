//! What selecting a category does to the form

use serde::{Deserialize, Serialize};

use super::{CategoryHit, SearchMarketplace};

/// Id meaning "no specific category"; selecting it never touches dependent fields
pub const NO_CATEGORY_ID: &str = "-1";

pub const NEWEGG_HIDDEN_FIELDS: [&str; 3] = [
    "newegg_category_id",
    "newegg_subcategory_id",
    "newegg_product_type",
];
pub const SEARS_STYLE_FIELD: &str = "sears_style_type";
pub const WALMART_SUBCATEGORY_FIELD: &str = "walmart_subcategory";

/// A hidden form field and the value it receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub field: String,
    pub value: String,
}

impl Assignment {
    fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Follow-up request that loads the fields depending on the category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fetch", rename_all = "snake_case")]
pub enum DependentFetch {
    /// Browse node path for the display, then the node's attributes
    AmazonNodeAndAttributes { node_id: String },
    Attributes { marketplace: SearchMarketplace, key: String },
    SearsCheckboxes { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum SelectionPlan {
    /// Nothing was selected; search again
    Retry,
    AssignOnly {
        assignments: Vec<Assignment>,
    },
    AssignAndFetch {
        assignments: Vec<Assignment>,
        clear: Vec<String>,
        fetch: DependentFetch,
    },
}

/// Decide the effect of selecting `selected` in `marketplace`'s category search
pub fn plan_selection(marketplace: SearchMarketplace, selected: Option<&CategoryHit>) -> SelectionPlan {
    let Some(hit) = selected else {
        return SelectionPlan::Retry;
    };
    let id = hit.id.trim();
    let mut assignments = vec![Assignment::new(marketplace.category_field(), id)];

    match marketplace {
        SearchMarketplace::Amazon if id == NO_CATEGORY_ID => SelectionPlan::AssignOnly { assignments },
        SearchMarketplace::Amazon => SelectionPlan::AssignAndFetch {
            assignments,
            clear: Vec::new(),
            fetch: DependentFetch::AmazonNodeAndAttributes { node_id: id.to_string() },
        },
        SearchMarketplace::Newegg => {
            for (field, part) in NEWEGG_HIDDEN_FIELDS.iter().zip(id.splitn(3, '/')) {
                assignments.push(Assignment::new(*field, part));
            }
            SelectionPlan::AssignAndFetch {
                assignments,
                clear: Vec::new(),
                fetch: DependentFetch::Attributes {
                    marketplace,
                    key: id.to_string(),
                },
            }
        }
        SearchMarketplace::Sears if id == NO_CATEGORY_ID => SelectionPlan::AssignOnly { assignments },
        SearchMarketplace::Sears => SelectionPlan::AssignAndFetch {
            assignments,
            clear: vec![SEARS_STYLE_FIELD.to_string()],
            fetch: DependentFetch::SearsCheckboxes { key: id.to_string() },
        },
        SearchMarketplace::Walmart => match hit.display_path.split_once('|') {
            Some((sub, _title)) => {
                let sub = sub.trim();
                assignments.push(Assignment::new(WALMART_SUBCATEGORY_FIELD, sub));
                SelectionPlan::AssignAndFetch {
                    assignments,
                    clear: Vec::new(),
                    fetch: DependentFetch::Attributes {
                        marketplace,
                        key: sub.to_string(),
                    },
                }
            }
            None => SelectionPlan::AssignOnly { assignments },
        },
    }
}
