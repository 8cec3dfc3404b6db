//! Server-side validation of submitted listing data against field definitions

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::definition::{FieldDefinition, COMMON_MARKETPLACE};
use super::render::{render_input, InputSpec, RenderContext, RenderError};

/// Submitted values: marketplace -> field name -> value
pub type FormData = BTreeMap<String, BTreeMap<String, Value>>;

/// Per-field validation failures; empty means the submission passed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no validation errors");
        }
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Text form of a submitted value; `None` when blank
pub fn value_as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => return None,
        Value::Array(items) => items
            .iter()
            .filter_map(value_as_text)
            .collect::<Vec<String>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

fn full_match(field: &str, pattern: &str) -> Result<Regex, RenderError> {
    Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|e| RenderError::configuration(field, format!("invalid pattern '{}': {}", pattern, e)))
}

fn is_http_url(text: &str) -> bool {
    match reqwest::Url::parse(text) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Validate one field value; configuration problems in the definition are errors, not report entries
fn check_value(
    def: &FieldDefinition,
    input: &InputSpec,
    text: &str,
    report: &mut ValidationReport,
) -> Result<(), RenderError> {
    let label = def.label();

    if let Some(pattern) = input.pattern() {
        if !full_match(&def.field_name, pattern)?.is_match(text) {
            report.add(&def.field_name, format!("{} does not match the required format.", label));
        }
    }

    if let Some(max) = input.max_length() {
        if text.chars().count() > max {
            report.add(&def.field_name, format!("{} must be at most {} characters.", label, max));
        }
    }

    match input {
        InputSpec::Integer { .. } => {
            if text.parse::<i64>().is_err() {
                report.add(&def.field_name, format!("{} must be a whole number.", label));
            }
        }
        InputSpec::Decimal { .. } | InputSpec::Currency { .. } => {
            let numeric = text.trim_start_matches('$').replace(',', "");
            if !numeric.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                report.add(&def.field_name, format!("{} must be a number.", label));
            }
        }
        InputSpec::Url { .. } => {
            if !is_http_url(text) {
                report.add(&def.field_name, format!("{} must be a valid http(s) URL.", label));
            }
        }
        InputSpec::Select { options, editable: false } if !options.is_empty() => {
            if !options.contains_value(text) {
                report.add(&def.field_name, format!("{} has an invalid selection '{}'.", label, text));
            }
        }
        InputSpec::Custom { custom } => {
            if let Some(allowed) = custom.allowed_values() {
                if !allowed.contains(&text) {
                    report.add(&def.field_name, format!("{} has an invalid selection '{}'.", label, text));
                }
            }
        }
        _ => {}
    }

    Ok(())
}

/// Validate submitted form data. Every marketplace key other than `common`
/// counts as actively listed to.
pub fn validate_form_data(
    definitions: &[FieldDefinition],
    form_data: &FormData,
    ctx: &RenderContext,
) -> Result<ValidationReport, RenderError> {
    let active: Vec<&str> = form_data
        .keys()
        .map(String::as_str)
        .filter(|m| !m.eq_ignore_ascii_case(COMMON_MARKETPLACE))
        .collect();
    validate_submission(definitions, form_data, &active, ctx)
}

/// Validate submitted form data for an explicit set of active marketplaces
pub fn validate_submission<S: AsRef<str>>(
    definitions: &[FieldDefinition],
    form_data: &FormData,
    active_marketplaces: &[S],
    ctx: &RenderContext,
) -> Result<ValidationReport, RenderError> {
    let mut report = ValidationReport::new();

    for def in definitions {
        let in_scope = def.is_common()
            || active_marketplaces
                .iter()
                .any(|m| m.as_ref().eq_ignore_ascii_case(&def.marketplace));
        if !in_scope {
            continue;
        }

        let text = form_data
            .iter()
            .find(|(marketplace, _)| marketplace.eq_ignore_ascii_case(&def.marketplace))
            .and_then(|(_, values)| values.get(&def.field_name))
            .and_then(value_as_text);

        let Some(text) = text else {
            if def.is_required_for(active_marketplaces) {
                report.add(&def.field_name, format!("{} is required.", def.label()));
            }
            continue;
        };

        let input = render_input(def, ctx)?;
        check_value(def, &input, &text, &mut report)?;
    }

    if !report.is_ok() {
        log::debug!("Submission failed validation for {} fields", report.len());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::definition::InputType;
    use serde_json::json;

    fn form(entries: &[(&str, &str, Value)]) -> FormData {
        let mut data = FormData::new();
        for (marketplace, field, value) in entries {
            data.entry(marketplace.to_string())
                .or_default()
                .insert(field.to_string(), value.clone());
        }
        data
    }

    fn definitions() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("title", "common", InputType::Text)
                .with_aux("^.{1,10}$")
                .required(),
            FieldDefinition::new("quantity", "common", InputType::Integer),
            FieldDefinition::new("price", "common", InputType::Currency),
            FieldDefinition::new("condition", "common", InputType::Select).with_aux("new||used"),
            FieldDefinition::new("color", "common", InputType::Select).with_aux("red||__OTHER__"),
            FieldDefinition::new("website", "common", InputType::Url),
            FieldDefinition::new("bullet_point", "amazon", InputType::Text).required(),
        ]
    }

    #[test]
    fn test_valid_submission() {
        let data = form(&[
            ("common", "title", json!("Mug")),
            ("common", "quantity", json!(4)),
            ("common", "price", json!("12.50")),
            ("common", "condition", json!("new")),
            ("common", "color", json!("teal")),
            ("common", "website", json!("https://example.com/mug")),
        ]);
        let report = validate_form_data(&definitions(), &data, &RenderContext::default()).unwrap();
        assert!(report.is_ok(), "unexpected errors: {}", report);
    }

    #[test]
    fn test_required_scope_follows_active_marketplaces() {
        let data = form(&[("common", "title", json!("Mug"))]);
        let report = validate_form_data(&definitions(), &data, &RenderContext::default()).unwrap();
        assert!(report.is_ok());

        let data = form(&[("common", "title", json!("Mug")), ("amazon", "other", json!("x"))]);
        let report = validate_form_data(&definitions(), &data, &RenderContext::default()).unwrap();
        assert_eq!(report.field_errors("bullet_point"), ["Bullet Point is required."]);
    }

    #[test]
    fn test_type_and_pattern_failures() {
        let data = form(&[
            ("common", "title", json!("A title that is far too long")),
            ("common", "quantity", json!("four")),
            ("common", "price", json!("cheap")),
            ("common", "condition", json!("broken")),
            ("common", "website", json!("ftp://example.com")),
        ]);
        let report = validate_form_data(&definitions(), &data, &RenderContext::default()).unwrap();
        assert_eq!(report.len(), 5);
        assert!(report.field_errors("title").iter().any(|m| m.contains("format")));
        assert!(report.field_errors("title").iter().any(|m| m.contains("at most 10")));
        assert!(!report.field_errors("quantity").is_empty());
        assert!(!report.field_errors("price").is_empty());
        assert!(!report.field_errors("condition").is_empty());
        assert!(!report.field_errors("website").is_empty());
    }

    #[test]
    fn test_missing_common_required_field() {
        let report = validate_form_data(&definitions(), &FormData::new(), &RenderContext::default()).unwrap();
        assert_eq!(report.field_errors("title"), ["Title is required."]);
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let defs = vec![FieldDefinition::new("sku", "common", InputType::Text).with_aux("([a-z")];
        let data = form(&[("common", "sku", json!("abc"))]);
        let err = validate_form_data(&defs, &data, &RenderContext::default()).unwrap_err();
        assert!(matches!(err, RenderError::Configuration { .. }));
    }

    #[test]
    fn test_value_as_text() {
        assert_eq!(value_as_text(&json!("  ")), None);
        assert_eq!(value_as_text(&json!(false)), None);
        assert_eq!(value_as_text(&json!(["a", "b"])), Some("a,b".to_string()));
        assert_eq!(value_as_text(&json!(2.5)), Some("2.5".to_string()));
    }
}
