//! Grouping of rendered fields into panels and marketplace tabs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::definition::{FieldDefinition, COMMON_MARKETPLACE};
use super::render::{render_field, RenderContext, RenderError, RenderedField};

/// One collapsible panel of fields sharing a grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub grouping: String,
    pub fields: Vec<RenderedField>,
}

impl Section {
    pub fn min_ordering(&self) -> i64 {
        self.fields.iter().map(|f| f.ordering).min().unwrap_or(i64::MAX)
    }
}

/// All sections rendered for one marketplace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceTab {
    pub marketplace: String,
    pub sections: Vec<Section>,
}

impl MarketplaceTab {
    pub fn field_names(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.field_name.as_str()))
            .collect()
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }
}

/// Bucket fields by grouping in first-seen order, then order buckets by their
/// smallest member ordering. Ties keep first-seen order.
pub fn group_fields(fields: Vec<RenderedField>) -> Vec<Section> {
    let mut sorted = fields;
    sorted.sort_by_key(|f| f.ordering);

    let mut sections: Vec<Section> = Vec::new();
    for field in sorted {
        match sections.iter_mut().find(|s| s.grouping == field.grouping) {
            Some(section) => section.fields.push(field),
            None => sections.push(Section {
                grouping: field.grouping.clone(),
                fields: vec![field],
            }),
        }
    }

    sections.sort_by_key(Section::min_ordering);
    sections
}

/// Render the tab for one marketplace from the definitions scoped to it
pub fn build_tab(
    marketplace: &str,
    definitions: &[FieldDefinition],
    ctx: &RenderContext,
) -> Result<MarketplaceTab, RenderError> {
    let fields = definitions
        .iter()
        .filter(|d| d.marketplace.eq_ignore_ascii_case(marketplace))
        .map(|d| render_field(d, ctx))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Built tab '{}' with {} fields", marketplace, fields.len());

    Ok(MarketplaceTab {
        marketplace: marketplace.to_string(),
        sections: group_fields(fields),
    })
}

/// Render every enabled marketplace: `common` first, then channels alphabetically
pub fn build_form(definitions: &[FieldDefinition], ctx: &RenderContext) -> Result<Vec<MarketplaceTab>, RenderError> {
    let mut marketplaces: BTreeMap<String, String> = BTreeMap::new();
    for def in definitions {
        marketplaces
            .entry(def.marketplace.to_ascii_lowercase())
            .or_insert_with(|| def.marketplace.clone());
    }

    let mut tabs = Vec::new();
    if let Some(common) = marketplaces.remove(COMMON_MARKETPLACE) {
        tabs.push(build_tab(&common, definitions, ctx)?);
    }

    for marketplace in marketplaces.into_values() {
        if ctx.is_disabled(&marketplace) {
            log::info!("Skipping disabled marketplace '{}'", marketplace);
            continue;
        }
        tabs.push(build_tab(&marketplace, definitions, ctx)?);
    }

    Ok(tabs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::definition::InputType;

    fn def(name: &str, marketplace: &str, grouping: &str, ordering: i64) -> FieldDefinition {
        FieldDefinition::new(name, marketplace, InputType::Text)
            .with_grouping(grouping)
            .with_ordering(ordering)
    }

    #[test]
    fn test_sections_ordered_by_min_ordering() {
        let defs = vec![
            def("shipping_weight", "amazon", "Shipping", 20),
            def("title", "amazon", "Basics", 5),
            def("package_length", "amazon", "Shipping", 2),
            def("brand", "amazon", "Basics", 10),
        ];
        let tab = build_tab("amazon", &defs, &RenderContext::default()).unwrap();

        let groupings: Vec<&str> = tab.sections.iter().map(|s| s.grouping.as_str()).collect();
        assert_eq!(groupings, vec!["Shipping", "Basics"]);
        assert_eq!(tab.field_names(), vec!["package_length", "shipping_weight", "title", "brand"]);
    }

    #[test]
    fn test_tie_keeps_first_seen_order() {
        let defs = vec![
            def("b", "ebay", "Second", 1),
            def("a", "ebay", "First", 1),
        ];
        let tab = build_tab("ebay", &defs, &RenderContext::default()).unwrap();
        let groupings: Vec<&str> = tab.sections.iter().map(|s| s.grouping.as_str()).collect();
        assert_eq!(groupings, vec!["Second", "First"]);
    }

    #[test]
    fn test_form_skips_disabled_marketplaces() {
        let defs = vec![
            def("walmart_sku", "walmart", "Basics", 1),
            def("title", "common", "Basics", 1),
            def("etsy_tags", "etsy", "Basics", 1),
            def("amazon_asin", "amazon", "Basics", 1),
        ];
        let ctx = RenderContext {
            disabled_marketplaces: vec!["Etsy".to_string()],
            ..Default::default()
        };
        let tabs = build_form(&defs, &ctx).unwrap();
        let names: Vec<&str> = tabs.iter().map(|t| t.marketplace.as_str()).collect();
        assert_eq!(names, vec!["common", "amazon", "walmart"]);
    }

    #[test]
    fn test_render_error_propagates() {
        let defs = vec![FieldDefinition::new("warn", "amazon", InputType::Alert).with_aux("loud")];
        assert!(build_tab("amazon", &defs, &RenderContext::default()).is_err());
    }
}
