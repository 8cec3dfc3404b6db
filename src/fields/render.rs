//! Field rendering
//!
//! Maps a [`FieldDefinition`] to a presentation-ready [`RenderedField`]. The
//! input type picks the strategy; each strategy decides how the aux payload is
//! read and which client-side constraints it emits.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::{DecodeError, OptionList, OTHER_SENTINEL};
use super::custom::CustomWidget;
use super::definition::{FieldDefinition, InputType};
use crate::reference::{Prop65Chemical, WishBrand};
use crate::settings::Settings;

/// Step used by decimal inputs without a numeric aux
pub const DEFAULT_DECIMAL_STEP: &str = "0.001";

/// Step used by currency inputs
pub const CURRENCY_STEP: &str = "0.01";

static BRACE_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"));
static TRAILING_QUANTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(?:\d*,)?(\d+)\}\$$").expect("valid regex"));

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid configuration for field '{field}': {reason}")]
    Configuration { field: String, reason: String },
    #[error("could not decode aux options for field '{field}': {source}")]
    Decode {
        field: String,
        #[source]
        source: DecodeError,
    },
}

impl RenderError {
    pub fn configuration(field: &str, reason: impl Into<String>) -> Self {
        RenderError::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn decode(field: &str, source: DecodeError) -> Self {
        RenderError::Decode {
            field: field.to_string(),
            source,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            RenderError::Configuration { field, .. } => field,
            RenderError::Decode { field, .. } => field,
        }
    }
}

/// Inputs the renderer needs besides the definition itself
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub upc_prefixes: Vec<String>,
    pub disabled_marketplaces: Vec<String>,
    pub prop65_chemicals: Vec<Prop65Chemical>,
    pub wish_brands: Vec<WishBrand>,
}

impl RenderContext {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            upc_prefixes: settings.upc_prefixes.clone(),
            disabled_marketplaces: settings.disabled_marketplaces.clone(),
            ..Default::default()
        }
    }

    pub fn with_reference_data(mut self, chemicals: Vec<Prop65Chemical>, brands: Vec<WishBrand>) -> Self {
        self.prop65_chemicals = chemicals;
        self.wish_brands = brands;
        self
    }

    pub fn is_disabled(&self, marketplace: &str) -> bool {
        self.disabled_marketplaces
            .iter()
            .any(|m| m.eq_ignore_ascii_case(marketplace))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

impl Severity {
    /// Case-insensitive; blank means `info`, anything else unknown is rejected
    pub fn parse(aux: Option<&str>) -> Option<Self> {
        match aux.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") => Some(Severity::Info),
            Some("success") => Some(Severity::Success),
            Some("info") => Some(Severity::Info),
            Some("warning") => Some(Severity::Warning),
            Some("danger") => Some(Severity::Danger),
            Some(_) => None,
        }
    }
}

/// When a field must be filled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Requirement {
    Optional,
    Always,
    WhenListing { marketplace: String },
}

impl Requirement {
    pub fn of(def: &FieldDefinition) -> Self {
        match (def.required, def.is_common()) {
            (false, _) => Requirement::Optional,
            (true, true) => Requirement::Always,
            (true, false) => Requirement::WhenListing {
                marketplace: def.marketplace.clone(),
            },
        }
    }
}

/// Concrete widget plus the constraints it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum InputSpec {
    Alert {
        severity: Severity,
        message: String,
    },
    Checkbox {
        checked: bool,
    },
    CommaSeparated {
        legend: OptionList,
    },
    Currency {
        step: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Custom {
        custom: CustomWidget,
    },
    Decimal {
        step: String,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Select {
        options: OptionList,
        editable: bool,
    },
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Textarea {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Url {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
}

impl InputSpec {
    /// Regex the submitted value must fully match, if any
    pub fn pattern(&self) -> Option<&str> {
        match self {
            InputSpec::Currency { pattern, .. }
            | InputSpec::Integer { pattern, .. }
            | InputSpec::Text { pattern, .. }
            | InputSpec::Textarea { pattern, .. }
            | InputSpec::Url { pattern, .. } => pattern.as_deref(),
            _ => None,
        }
    }

    pub fn max_length(&self) -> Option<usize> {
        match self {
            InputSpec::Currency { max_length, .. }
            | InputSpec::Integer { max_length, .. }
            | InputSpec::Text { max_length, .. }
            | InputSpec::Textarea { max_length, .. }
            | InputSpec::Url { max_length, .. } => *max_length,
            _ => None,
        }
    }
}

/// A field ready for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedField {
    pub field_name: String,
    pub label: String,
    pub marketplace: String,
    pub grouping: String,
    pub ordering: i64,
    pub required: Requirement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub input: InputSpec,
}

/// Best-effort max length from a trailing `{N}$` or `{M,N}$` quantifier.
/// Patterns with more than one brace group give no hint.
pub fn max_length_hint(pattern: &str) -> Option<usize> {
    if BRACE_GROUP.find_iter(pattern).count() != 1 {
        return None;
    }
    TRAILING_QUANTIFIER
        .captures(pattern)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn decimal_step(aux: Option<&str>) -> String {
    match aux {
        Some(raw) => match raw.parse::<f64>() {
            Ok(step) if step.is_finite() && step > 0.0 => raw.to_string(),
            _ => DEFAULT_DECIMAL_STEP.to_string(),
        },
        None => DEFAULT_DECIMAL_STEP.to_string(),
    }
}

fn pattern_constraints(aux: Option<&str>) -> (Option<String>, Option<usize>) {
    match aux {
        Some(pattern) => (Some(pattern.to_string()), max_length_hint(pattern)),
        None => (None, None),
    }
}

/// Build the input spec for one definition
pub fn render_input(def: &FieldDefinition, ctx: &RenderContext) -> Result<InputSpec, RenderError> {
    let aux = def.aux();

    let input = match def.input_type {
        InputType::Select => {
            let mut options = aux.map(OptionList::decode).unwrap_or_default();
            let editable = options.remove_value(OTHER_SENTINEL);
            InputSpec::Select { options, editable }
        }
        InputType::CommaSeparated => InputSpec::CommaSeparated {
            legend: aux.map(OptionList::decode).unwrap_or_default(),
        },
        InputType::Decimal => InputSpec::Decimal {
            step: decimal_step(aux),
        },
        InputType::Currency => {
            let (pattern, max_length) = pattern_constraints(aux);
            InputSpec::Currency {
                step: CURRENCY_STEP.to_string(),
                pattern,
                max_length,
            }
        }
        InputType::Integer => {
            let (pattern, max_length) = pattern_constraints(aux);
            InputSpec::Integer { pattern, max_length }
        }
        InputType::Text => {
            let (pattern, max_length) = pattern_constraints(aux);
            InputSpec::Text { pattern, max_length }
        }
        InputType::Textarea => {
            let (pattern, max_length) = pattern_constraints(aux);
            InputSpec::Textarea { pattern, max_length }
        }
        InputType::Url => {
            let (pattern, max_length) = pattern_constraints(aux);
            InputSpec::Url { pattern, max_length }
        }
        InputType::Checkbox => InputSpec::Checkbox {
            checked: aux.is_some(),
        },
        InputType::Alert => {
            let severity = Severity::parse(aux).ok_or_else(|| {
                RenderError::configuration(
                    &def.field_name,
                    format!(
                        "alert severity '{}' must be one of success, info, warning, danger",
                        aux.unwrap_or_default()
                    ),
                )
            })?;
            InputSpec::Alert {
                severity,
                message: def.tooltip.clone().unwrap_or_else(|| def.label()),
            }
        }
        InputType::Custom => InputSpec::Custom {
            custom: CustomWidget::resolve(&def.field_name, aux, ctx)?,
        },
    };

    Ok(input)
}

/// Render one definition
pub fn render_field(def: &FieldDefinition, ctx: &RenderContext) -> Result<RenderedField, RenderError> {
    let input = render_input(def, ctx)?;
    log::debug!(
        "Rendered field '{}' ({}) for marketplace '{}'",
        def.field_name,
        def.input_type,
        def.marketplace
    );

    Ok(RenderedField {
        field_name: def.field_name.clone(),
        label: def.label(),
        marketplace: def.marketplace.clone(),
        grouping: def.grouping.clone(),
        ordering: def.ordering,
        required: Requirement::of(def),
        tooltip: def.tooltip.clone(),
        example: def.example.clone(),
        input,
    })
}
