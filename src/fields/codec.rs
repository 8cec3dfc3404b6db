//! Codec for the `input_type_aux` mini-language
//!
//! Field definitions keep their type-specific configuration in one text column:
//!
//! - option lists: `value||value==Label||value`
//! - composite payloads: `payloadA&&payloadB`, each payload an option list
//! - JSON payloads for tag-style and refinement fields
//!
//! Everything is parsed into typed structures here; renderers never look at
//! the raw string.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const OPTION_SEPARATOR: &str = "||";
pub const LABEL_SEPARATOR: &str = "==";
pub const COMPOSITE_SEPARATOR: &str = "&&";

/// Select option value that turns a closed dropdown into an editable one
pub const OTHER_SENTINEL: &str = "__OTHER__";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON in aux payload '{payload}': {source}")]
    MalformedJson {
        payload: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected aux payload shape '{payload}': {reason}")]
    InvalidShape { payload: String, reason: String },
}

impl DecodeError {
    /// The raw payload that failed to decode
    pub fn payload(&self) -> &str {
        match self {
            DecodeError::MalformedJson { payload, .. } => payload,
            DecodeError::InvalidShape { payload, .. } => payload,
        }
    }

    fn shape(payload: &str, reason: impl Into<String>) -> Self {
        DecodeError::InvalidShape {
            payload: payload.to_string(),
            reason: reason.into(),
        }
    }
}

/// Capitalise each word, treating `_`, `-` and spaces as word breaks.
/// The rest of each word is kept as-is so acronyms like `XL` survive.
pub fn title_case(input: &str) -> String {
    input
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// One `value` or `value==Label` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxOption {
    pub value: String,
    pub label: String,
    #[serde(skip)]
    explicit_label: bool,
}

impl AuxOption {
    /// Option whose label is derived from the value
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: title_case(&value),
            value,
            explicit_label: false,
        }
    }

    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            explicit_label: true,
        }
    }

    pub fn has_explicit_label(&self) -> bool {
        self.explicit_label
    }

    fn decode(segment: &str) -> Self {
        match segment.split_once(LABEL_SEPARATOR) {
            Some((value, label)) => AuxOption::labeled(value, label),
            None => AuxOption::new(segment),
        }
    }

    fn encode(&self) -> String {
        if self.explicit_label {
            format!("{}{}{}", self.value, LABEL_SEPARATOR, self.label)
        } else {
            self.value.clone()
        }
    }
}

/// Ordered list of options decoded from `a||b==B||c`.
///
/// Options with an empty value are never stored, since `||` around an empty
/// value cannot be told apart from a stray separator. Every list therefore
/// survives `decode(encode(list))` unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OptionList(Vec<AuxOption>);

impl OptionList {
    /// Splitting never fails; empty segments and empty values are skipped
    pub fn decode(raw: &str) -> Self {
        raw.split(OPTION_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(AuxOption::decode)
            .collect()
    }

    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(AuxOption::encode)
            .collect::<Vec<String>>()
            .join(OPTION_SEPARATOR)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AuxOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.0.iter().any(|o| o.value == value)
    }

    pub fn values(&self) -> Vec<&str> {
        self.0.iter().map(|o| o.value.as_str()).collect()
    }

    /// Remove every option with the given value, reporting whether any was present
    pub fn remove_value(&mut self, value: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|o| o.value != value);
        self.0.len() != before
    }

    /// View a `key==value||key==value` payload as a keyed map
    pub fn as_map(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|o| (o.value.clone(), o.label.clone()))
            .collect()
    }

}

impl FromIterator<AuxOption> for OptionList {
    fn from_iter<I: IntoIterator<Item = AuxOption>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|o| !o.value.is_empty()).collect())
    }
}

impl<'de> Deserialize<'de> for OptionList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<AuxOption>::deserialize(deserializer)?.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a AuxOption;
    type IntoIter = std::slice::Iter<'a, AuxOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// `payloadA&&payloadB`, each payload an independent option list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositePayload {
    parts: Vec<OptionList>,
}

impl CompositePayload {
    pub fn decode(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        Self {
            parts: raw.split(COMPOSITE_SEPARATOR).map(OptionList::decode).collect(),
        }
    }

    pub fn encode(&self) -> String {
        self.parts
            .iter()
            .map(OptionList::encode)
            .collect::<Vec<String>>()
            .join(COMPOSITE_SEPARATOR)
    }

    pub fn part(&self, index: usize) -> Option<&OptionList> {
        self.parts.get(index)
    }

    pub fn parts(&self) -> &[OptionList] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Split `head&&rest` once; used by custom widgets whose first payload names the widget
pub fn split_head(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once(COMPOSITE_SEPARATOR) {
        Some((head, rest)) => (head.trim(), Some(rest)),
        None => (raw.trim(), None),
    }
}

/// Parse a payload that must be JSON
pub fn decode_json(raw: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(raw).map_err(|source| DecodeError::MalformedJson {
        payload: raw.to_string(),
        source,
    })
}

/// One named refinement and its selectable values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementGroup {
    pub name: String,
    pub options: OptionList,
}

/// Amazon special refinements: `{"limit": 5, "Color": {"red": "Red"}, "Size": ["S", "M"]}`
///
/// `limit` is the only reserved top-level key; every other key names a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementSpec {
    pub limit: Option<u32>,
    pub groups: Vec<RefinementGroup>,
}

impl RefinementSpec {
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let value = decode_json(raw)?;
        let object = value
            .as_object()
            .ok_or_else(|| DecodeError::shape(raw, "expected a JSON object"))?;

        let mut spec = RefinementSpec::default();
        for (key, entry) in object {
            if key == "limit" {
                let limit = entry
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| DecodeError::shape(raw, "limit must be a non-negative integer"))?;
                spec.limit = Some(limit);
                continue;
            }

            let options = match entry {
                Value::Object(map) => map
                    .iter()
                    .map(|(value, label)| match label.as_str() {
                        Some(label) => Ok(AuxOption::labeled(value.as_str(), label)),
                        None => Err(DecodeError::shape(
                            raw,
                            format!("label for '{}' in '{}' must be a string", value, key),
                        )),
                    })
                    .collect::<Result<OptionList, DecodeError>>()?,
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(AuxOption::new(s.as_str())),
                        Value::Number(n) => Ok(AuxOption::new(n.to_string())),
                        _ => Err(DecodeError::shape(
                            raw,
                            format!("values of '{}' must be strings or numbers", key),
                        )),
                    })
                    .collect::<Result<OptionList, DecodeError>>()?,
                _ => {
                    return Err(DecodeError::shape(
                        raw,
                        format!("refinement '{}' must be an object or an array", key),
                    ));
                }
            };

            spec.groups.push(RefinementGroup {
                name: key.clone(),
                options,
            });
        }

        Ok(spec)
    }

    pub fn group(&self, name: &str) -> Option<&RefinementGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Tag picker configuration: a JSON array of tags or `{"tags": [...], "max_tags": N}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSpec {
    pub tags: Vec<String>,
    pub max_tags: Option<u32>,
}

impl TagSpec {
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        match decode_json(raw)? {
            Value::Array(items) => Ok(Self {
                tags: Self::tags_from(raw, &items)?,
                max_tags: None,
            }),
            Value::Object(map) => {
                let tags = match map.get("tags") {
                    Some(Value::Array(items)) => Self::tags_from(raw, items)?,
                    Some(_) => return Err(DecodeError::shape(raw, "tags must be an array")),
                    None => Vec::new(),
                };
                let max_tags = match map.get("max_tags") {
                    Some(v) => Some(
                        v.as_u64()
                            .and_then(|n| u32::try_from(n).ok())
                            .ok_or_else(|| DecodeError::shape(raw, "max_tags must be a non-negative integer"))?,
                    ),
                    None => None,
                };
                Ok(Self { tags, max_tags })
            }
            _ => Err(DecodeError::shape(raw, "expected a JSON array or object")),
        }
    }

    fn tags_from(raw: &str, items: &[Value]) -> Result<Vec<String>, DecodeError> {
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| DecodeError::shape(raw, "tags must be strings"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(list: &OptionList) -> Vec<(&str, &str)> {
        list.iter().map(|o| (o.value.as_str(), o.label.as_str())).collect()
    }

    #[test]
    fn test_decode_with_default_labels() {
        let list = OptionList::decode("a||b==Label B||c");
        assert_eq!(pairs(&list), vec![("a", "A"), ("b", "Label B"), ("c", "C")]);
    }

    #[test]
    fn test_decode_empty_string() {
        assert!(OptionList::decode("").is_empty());
        assert!(CompositePayload::decode("").is_empty());
    }

    #[test]
    fn test_round_trip() {
        for raw in [
            "a||b==Label B||c",
            "new==New||used_good==Used - Good||refurbished",
            "XL||xx_large==XXL",
            "single",
            "",
        ] {
            let decoded = OptionList::decode(raw);
            assert_eq!(decoded.encode(), raw);
            assert_eq!(OptionList::decode(&decoded.encode()), decoded);
        }
    }

    #[test]
    fn test_explicit_label_matching_default_survives_round_trip() {
        let list = OptionList::decode("a==A||b");
        assert!(list.iter().next().unwrap().has_explicit_label());
        assert!(!list.iter().nth(1).unwrap().has_explicit_label());
        assert_eq!(list.encode(), "a==A||b");
    }

    #[test]
    fn test_empty_values_are_dropped() {
        let list: OptionList = vec![
            AuxOption::new("a"),
            AuxOption::new(""),
            AuxOption::labeled("", "Blank"),
            AuxOption::new("b"),
        ]
        .into_iter()
        .collect();
        assert_eq!(list.values(), vec!["a", "b"]);
        assert_eq!(list.encode(), "a||b");
        assert_eq!(OptionList::decode(&list.encode()), list);

        assert_eq!(OptionList::decode("a||||==Blank||b").values(), vec!["a", "b"]);

        let list: OptionList =
            serde_json::from_str(r#"[{"value":"","label":"Blank"},{"value":"x","label":"X"}]"#).unwrap();
        assert_eq!(list.values(), vec!["x"]);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("item_weight"), "Item Weight");
        assert_eq!(title_case("ships-from"), "Ships From");
        assert_eq!(title_case("XL"), "XL");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_composite_payload() {
        let composite = CompositePayload::decode("yes==Yes||no==No&&lead||bpa==BPA");
        assert_eq!(composite.len(), 2);
        assert_eq!(pairs(composite.part(0).unwrap()), vec![("yes", "Yes"), ("no", "No")]);
        assert_eq!(pairs(composite.part(1).unwrap()), vec![("lead", "Lead"), ("bpa", "BPA")]);
        assert_eq!(composite.encode(), "yes==Yes||no==No&&lead||bpa==BPA");
    }

    #[test]
    fn test_keyed_map_view() {
        let map = OptionList::decode("color==Red||size==Large").as_map();
        assert_eq!(map.get("color").map(String::as_str), Some("Red"));
        assert_eq!(map.get("size").map(String::as_str), Some("Large"));
    }

    #[test]
    fn test_split_head() {
        assert_eq!(split_head("upc&&012||345"), ("upc", Some("012||345")));
        assert_eq!(split_head(" sku_bundle "), ("sku_bundle", None));
    }

    #[test]
    fn test_refinements() {
        let spec = RefinementSpec::decode(
            r#"{"limit": 2, "Color": {"red": "Red", "blue": "Blue"}, "Size": ["small", 10]}"#,
        )
        .unwrap();
        assert_eq!(spec.limit, Some(2));
        assert_eq!(spec.groups.len(), 2);
        let size = spec.group("Size").unwrap();
        assert_eq!(pairs(&size.options), vec![("small", "Small"), ("10", "10")]);
        let color = spec.group("Color").unwrap();
        assert!(color.options.contains_value("red"));
    }

    #[test]
    fn test_refinements_without_limit() {
        let spec = RefinementSpec::decode(r#"{"Material": ["cotton"]}"#).unwrap();
        assert_eq!(spec.limit, None);
    }

    #[test]
    fn test_malformed_json_carries_payload() {
        let err = RefinementSpec::decode("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson { .. }));
        assert_eq!(err.payload(), "{not json");

        let err = TagSpec::decode("[\"a\",").unwrap_err();
        assert_eq!(err.payload(), "[\"a\",");
    }

    #[test]
    fn test_refinement_shape_errors() {
        assert!(matches!(
            RefinementSpec::decode("[1, 2]"),
            Err(DecodeError::InvalidShape { .. })
        ));
        assert!(matches!(
            RefinementSpec::decode(r#"{"limit": -1}"#),
            Err(DecodeError::InvalidShape { .. })
        ));
        assert!(matches!(
            RefinementSpec::decode(r#"{"Color": "red"}"#),
            Err(DecodeError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_tag_spec() {
        let tags = TagSpec::decode(r#"["gift", "sale"]"#).unwrap();
        assert_eq!(tags.tags, vec!["gift", "sale"]);
        assert_eq!(tags.max_tags, None);

        let tags = TagSpec::decode(r#"{"tags": ["gift"], "max_tags": 3}"#).unwrap();
        assert_eq!(tags.max_tags, Some(3));
    }
}
