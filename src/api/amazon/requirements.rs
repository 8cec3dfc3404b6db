//! Product types and listing requirements from the Product Type Definitions API

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::error::SpApiError;
use crate::fields::validate::value_as_text;

/// One match from a product type search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTypeSummary {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub marketplace_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductTypeList {
    #[serde(default)]
    pub product_types: Vec<ProductTypeSummary>,
}

/// Link to the JSON schema of a product type definition
#[derive(Debug, Deserialize)]
pub(crate) struct DefinitionResponse {
    pub schema: SchemaLink,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SchemaLink {
    pub link: SchemaResource,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SchemaResource {
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub value_type: Option<String>,
}

impl PropertySchema {
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Attributes Amazon expects for one product type in one marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRequirements {
    pub product_type: String,
    pub marketplace_id: String,
    pub required: Vec<String>,
    pub properties: BTreeMap<String, PropertySchema>,
}

impl ListingRequirements {
    /// Read the required attribute names and property schemas from a product type JSON schema
    pub fn from_schema(product_type: &str, marketplace_id: &str, schema: &Value) -> Result<Self, SpApiError> {
        let object = schema
            .as_object()
            .ok_or_else(|| SpApiError::malformed("product type schema is not a JSON object"))?;

        let required = match object.get("required") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| SpApiError::malformed("schema 'required' entries must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(SpApiError::malformed("schema 'required' must be an array")),
        };

        let mut properties = BTreeMap::new();
        if let Some(props) = object.get("properties").and_then(Value::as_object) {
            for (name, prop) in props {
                let text = |key: &str| prop.get(key).and_then(Value::as_str).map(str::to_string);
                properties.insert(
                    name.clone(),
                    PropertySchema {
                        name: name.clone(),
                        title: text("title"),
                        description: text("description"),
                        value_type: text("type"),
                    },
                );
            }
        }

        Ok(Self {
            product_type: product_type.to_string(),
            marketplace_id: marketplace_id.to_string(),
            required,
            properties,
        })
    }

    pub fn is_required(&self, attribute: &str) -> bool {
        self.required.iter().any(|r| r == attribute)
    }

    pub fn label(&self, attribute: &str) -> String {
        self.properties
            .get(attribute)
            .map(|p| p.label().to_string())
            .unwrap_or_else(|| attribute.to_string())
    }
}

/// Required attributes that are absent or blank in `form_data`, in schema order
pub fn missing_requirements(requirements: &ListingRequirements, form_data: &BTreeMap<String, Value>) -> Vec<String> {
    requirements
        .required
        .iter()
        .filter(|name| form_data.get(name.as_str()).and_then(value_as_text).is_none())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "$schema": "https://schemas.amazon.com/selling-partners/definitions/product-types/meta-schema/v1",
            "required": ["item_name", "brand", "bullet_point"],
            "properties": {
                "item_name": {"title": "Item Name", "type": "array"},
                "brand": {"title": "Brand Name", "description": "Max. 50 characters", "type": "array"},
                "bullet_point": {"type": "array"},
                "color": {"title": "Colour", "type": "array"}
            }
        })
    }

    #[test]
    fn test_from_schema() {
        let requirements = ListingRequirements::from_schema("LUGGAGE", "ATVPDKIKX0DER", &schema()).unwrap();
        assert_eq!(requirements.required, vec!["item_name", "brand", "bullet_point"]);
        assert_eq!(requirements.properties.len(), 4);
        assert!(requirements.is_required("brand"));
        assert!(!requirements.is_required("color"));
        assert_eq!(requirements.label("brand"), "Brand Name");
        assert_eq!(requirements.label("bullet_point"), "bullet_point");
    }

    #[test]
    fn test_malformed_schema() {
        assert!(ListingRequirements::from_schema("X", "M", &json!([1, 2])).is_err());
        assert!(ListingRequirements::from_schema("X", "M", &json!({"required": "brand"})).is_err());
        assert!(ListingRequirements::from_schema("X", "M", &json!({"required": [1]})).is_err());
    }

    #[test]
    fn test_missing_requirements() {
        let requirements = ListingRequirements::from_schema("LUGGAGE", "ATVPDKIKX0DER", &schema()).unwrap();
        let form_data: BTreeMap<String, Value> = BTreeMap::from([
            ("item_name".to_string(), json!([{"value": "Carry-on"}])),
            ("brand".to_string(), json!("  ")),
            ("color".to_string(), json!("red")),
        ]);

        assert_eq!(missing_requirements(&requirements, &form_data), vec!["brand", "bullet_point"]);
    }

    #[test]
    fn test_product_type_list_parsing() {
        let body = json!({
            "productTypes": [
                {"name": "LUGGAGE", "displayName": "Luggage", "marketplaceIds": ["ATVPDKIKX0DER"]},
                {"name": "SUITCASE", "marketplaceIds": []}
            ],
            "productTypeVersion": "UHqSqmb4FNUk="
        });
        let list: ProductTypeList = serde_json::from_value(body).unwrap();
        assert_eq!(list.product_types.len(), 2);
        assert_eq!(list.product_types[0].display_name.as_deref(), Some("Luggage"));
        assert_eq!(list.product_types[1].display_name, None);
    }
}
