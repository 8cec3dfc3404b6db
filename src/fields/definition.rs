//! Field definition model
//!
//! One row per form field per marketplace. `input_type` decides how the
//! auxiliary configuration in `input_type_aux` is read and rendered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::codec::title_case;

/// Marketplace tag for fields shown on every listing
pub const COMMON_MARKETPLACE: &str = "common";

/// Input widget family of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    Alert,
    Checkbox,
    CommaSeparated,
    Currency,
    Custom,
    Decimal,
    Integer,
    Select,
    Text,
    Textarea,
    Url,
}

impl InputType {
    pub const ALL: [InputType; 11] = [
        InputType::Alert,
        InputType::Checkbox,
        InputType::CommaSeparated,
        InputType::Currency,
        InputType::Custom,
        InputType::Decimal,
        InputType::Integer,
        InputType::Select,
        InputType::Text,
        InputType::Textarea,
        InputType::Url,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Alert => "alert",
            InputType::Checkbox => "checkbox",
            InputType::CommaSeparated => "comma-separated",
            InputType::Currency => "currency",
            InputType::Custom => "custom",
            InputType::Decimal => "decimal",
            InputType::Integer => "integer",
            InputType::Select => "select",
            InputType::Text => "text",
            InputType::Textarea => "textarea",
            InputType::Url => "url",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        InputType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Unknown input type '{}'", s))
    }
}

/// Whether a field maps to a built-in platform attribute or a package-defined one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Custom,
    ChannelAdvisorDefault,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Custom => "custom",
            FieldType::ChannelAdvisorDefault => "channel-advisor-default",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "custom" => Ok(FieldType::Custom),
            "channel-advisor-default" | "channeladvisor" | "default" => {
                Ok(FieldType::ChannelAdvisorDefault)
            }
            other => anyhow::bail!("Unknown field type '{}'", other),
        }
    }
}

/// A persisted field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(default)]
    pub id: Option<i64>,
    pub ordering: i64,
    pub field_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    pub marketplace: String,
    pub input_type: InputType,
    #[serde(default)]
    pub input_type_aux: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub grouping: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDefinition {
    pub fn new(
        field_name: impl Into<String>,
        marketplace: impl Into<String>,
        input_type: InputType,
    ) -> Self {
        Self {
            id: None,
            ordering: 0,
            field_name: field_name.into(),
            display_name: None,
            tooltip: None,
            example: None,
            marketplace: marketplace.into(),
            input_type,
            input_type_aux: None,
            required: false,
            grouping: "General".to_string(),
            field_type: FieldType::Custom,
        }
    }

    pub fn with_aux(mut self, aux: impl Into<String>) -> Self {
        self.input_type_aux = Some(aux.into());
        self
    }

    pub fn with_grouping(mut self, grouping: impl Into<String>) -> Self {
        self.grouping = grouping.into();
        self
    }

    pub fn with_ordering(mut self, ordering: i64) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Label shown to the user; falls back to the title-cased field name
    pub fn label(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => title_case(&self.field_name),
        }
    }

    pub fn is_common(&self) -> bool {
        self.marketplace.eq_ignore_ascii_case(COMMON_MARKETPLACE)
    }

    /// Auxiliary configuration with surrounding whitespace removed, `None` when blank
    pub fn aux(&self) -> Option<&str> {
        self.input_type_aux
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Required regardless of which marketplaces are being listed to
    pub fn is_globally_required(&self) -> bool {
        self.required && self.is_common()
    }

    /// Required for a listing that targets the given marketplaces
    pub fn is_required_for<S: AsRef<str>>(&self, active_marketplaces: &[S]) -> bool {
        if !self.required {
            return false;
        }
        if self.is_common() {
            return true;
        }
        active_marketplaces
            .iter()
            .any(|m| m.as_ref().eq_ignore_ascii_case(&self.marketplace))
    }
}
