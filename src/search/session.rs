//! Client-side state of one category search and the driver that mutates it

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::selection::{plan_selection, Assignment, DependentFetch, SelectionPlan, SEARS_STYLE_FIELD};
use super::source::{AttributeBlock, CategorySource, SearchError};
use super::{CategoryHit, SearchMarketplace};
use crate::fields::custom::MIN_SEARCH_QUERY_LENGTH;
use crate::fields::definition::{FieldDefinition, InputType};

/// Main-form fields shown again and hidden by one replacement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementDiff {
    pub restored: Vec<String>,
    pub hidden: Vec<String>,
}

impl ReplacementDiff {
    pub fn is_empty(&self) -> bool {
        self.restored.is_empty() && self.hidden.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearsCheckbox {
    pub value: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SelectionOutcome {
    Retry,
    Assigned,
    Replaced { diff: ReplacementDiff },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchSession {
    hidden_values: BTreeMap<String, String>,
    removed_fields: BTreeSet<String>,
    container: Vec<FieldDefinition>,
    sears_checkboxes: Vec<SearsCheckbox>,
    display: Option<String>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hidden_value(&self, field: &str) -> Option<&str> {
        self.hidden_values.get(field).map(String::as_str)
    }

    pub fn hidden_values(&self) -> &BTreeMap<String, String> {
        &self.hidden_values
    }

    pub fn set_hidden(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.hidden_values.insert(field.into(), value.into());
    }

    pub fn clear_hidden(&mut self, field: &str) {
        if let Some(value) = self.hidden_values.get_mut(field) {
            value.clear();
        }
    }

    pub fn removed_fields(&self) -> &BTreeSet<String> {
        &self.removed_fields
    }

    /// Fields currently shown in the dependent container
    pub fn container(&self) -> &[FieldDefinition] {
        &self.container
    }

    /// Text shown in the search box for the current selection
    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn sears_checkboxes(&self) -> &[SearsCheckbox] {
        &self.sears_checkboxes
    }

    /// Swap the container for `fields` and hide `remove` from the main form.
    ///
    /// Fields hidden by the previous replacement but not by this one come back.
    pub fn replace_fields<I, S>(&mut self, remove: I, fields: Vec<FieldDefinition>) -> ReplacementDiff
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let remove: BTreeSet<String> = remove.into_iter().map(Into::into).collect();

        let diff = ReplacementDiff {
            restored: self.removed_fields.difference(&remove).cloned().collect(),
            hidden: remove.difference(&self.removed_fields).cloned().collect(),
        };

        log::debug!(
            "Replacing {} dependent fields: {} restored, {} hidden",
            fields.len(),
            diff.restored.len(),
            diff.hidden.len()
        );

        self.removed_fields = remove;
        self.container = fields;
        diff
    }

    /// Take the checkboxes of the current container as the Sears style block
    pub fn load_sears_checkboxes(&mut self) {
        self.sears_checkboxes = self
            .container
            .iter()
            .filter(|def| def.input_type == InputType::Checkbox)
            .map(|def| SearsCheckbox {
                value: def.field_name.clone(),
                checked: def.aux().is_some(),
            })
            .collect();
        self.sync_sears_style();
    }

    /// Check or uncheck one Sears style; false when no such checkbox is shown
    pub fn toggle_sears_checkbox(&mut self, value: &str, checked: bool) -> bool {
        let Some(checkbox) = self.sears_checkboxes.iter_mut().find(|c| c.value == value) else {
            return false;
        };
        checkbox.checked = checked;
        self.sync_sears_style();
        true
    }

    fn sync_sears_style(&mut self) {
        let styles: Vec<&str> = self
            .sears_checkboxes
            .iter()
            .filter(|c| c.checked)
            .map(|c| c.value.as_str())
            .collect();
        let joined = styles.join(",");
        self.set_hidden(SEARS_STYLE_FIELD, joined);
    }

    fn apply(&mut self, assignments: Vec<Assignment>) {
        for assignment in assignments {
            self.set_hidden(assignment.field, assignment.value);
        }
    }
}

/// Runs searches and applies selections to a session
pub struct CategorySearch {
    source: Arc<dyn CategorySource>,
}

impl CategorySearch {
    pub fn new(source: Arc<dyn CategorySource>) -> Self {
        Self { source }
    }

    /// Queries shorter than the minimum return nothing without asking the source
    pub async fn search(&self, marketplace: SearchMarketplace, query: &str) -> Result<Vec<CategoryHit>, SearchError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LENGTH {
            log::debug!("Query '{}' too short for {} category search", query, marketplace);
            return Ok(Vec::new());
        }
        self.source.search(marketplace, query).await
    }

    pub async fn select(
        &self,
        session: &mut SearchSession,
        marketplace: SearchMarketplace,
        selected: Option<&CategoryHit>,
    ) -> Result<SelectionOutcome, SearchError> {
        let plan = plan_selection(marketplace, selected);
        if let Some(hit) = selected {
            session.display = Some(hit.display_path.clone());
        }

        match plan {
            SelectionPlan::Retry => Ok(SelectionOutcome::Retry),
            SelectionPlan::AssignOnly { assignments } => {
                session.apply(assignments);
                Ok(SelectionOutcome::Assigned)
            }
            SelectionPlan::AssignAndFetch {
                assignments,
                clear,
                fetch,
            } => {
                session.apply(assignments);
                for field in &clear {
                    session.clear_hidden(field);
                }

                let diff = match fetch {
                    DependentFetch::AmazonNodeAndAttributes { node_id } => {
                        let path = self.source.node_path(&node_id).await?;
                        session.display = Some(path);
                        let block = self.source.attributes(SearchMarketplace::Amazon, &node_id).await?;
                        Self::replace(session, block)
                    }
                    DependentFetch::Attributes { marketplace, key } => {
                        let block = self.source.attributes(marketplace, &key).await?;
                        Self::replace(session, block)
                    }
                    DependentFetch::SearsCheckboxes { key } => {
                        let block = self.source.attributes(SearchMarketplace::Sears, &key).await?;
                        let diff = Self::replace(session, block);
                        session.load_sears_checkboxes();
                        diff
                    }
                };

                Ok(SelectionOutcome::Replaced { diff })
            }
        }
    }

    fn replace(session: &mut SearchSession, block: AttributeBlock) -> ReplacementDiff {
        session.replace_fields(block.remove_fields, block.fields)
    }
}
