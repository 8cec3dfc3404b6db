//! Registry of named custom widgets
//!
//! A `custom` field's aux names the widget in its first `&&` payload; whatever
//! follows is that widget's own configuration.

use serde::{Deserialize, Serialize};

use super::codec::{self, CompositePayload, OptionList, RefinementSpec, TagSpec};
use super::render::{RenderContext, RenderError};
use crate::reference;
use crate::search::SearchMarketplace;

/// Minimum query length accepted by the search-backed widgets
pub const MIN_SEARCH_QUERY_LENGTH: usize = 3;

const DEFAULT_CARRIERS: &str = "usps==USPS||ups==UPS||fedex==FedEx";
const DEFAULT_PROP65_WARNINGS: &str =
    "cancer==Cancer||reproductive==Reproductive Harm||both==Cancer and Reproductive Harm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomWidget {
    AmazonProductTypeSearch {
        min_query_length: usize,
    },
    Upc {
        prefixes: Vec<String>,
    },
    SkuBundle {
        max_rows: Option<u32>,
    },
    ShippingCostCalculator {
        carriers: OptionList,
    },
    Prop65 {
        warnings: OptionList,
        chemicals: OptionList,
    },
    WishBrand {
        brands: OptionList,
    },
    CategorySearch {
        marketplace: SearchMarketplace,
        min_query_length: usize,
    },
    CloneSiteCategories {
        categories: OptionList,
    },
    CloneSiteTags {
        tags: TagSpec,
    },
    AmazonSpecialRefinements {
        refinements: RefinementSpec,
    },
}

impl CustomWidget {
    pub const NAMES: [&'static str; 13] = [
        "amazon_product_type_search",
        "upc",
        "sku_bundle",
        "shipping_cost_calculator",
        "prop65",
        "wish_brand",
        "category_search_amazon",
        "category_search_newegg",
        "category_search_sears",
        "category_search_walmart",
        "clone_site_categories",
        "clone_site_tags",
        "amazon_special_refinements",
    ];

    /// Resolve the widget named by `aux` for the given field
    pub fn resolve(field_name: &str, aux: Option<&str>, ctx: &RenderContext) -> Result<Self, RenderError> {
        let raw = aux.ok_or_else(|| RenderError::configuration(field_name, "custom field has no widget name"))?;
        let (name, config) = codec::split_head(raw);
        let config = config.map(str::trim).filter(|c| !c.is_empty());
        let decode = |source: codec::DecodeError| RenderError::decode(field_name, source);

        let widget = match name.to_ascii_lowercase().as_str() {
            "amazon_product_type_search" => CustomWidget::AmazonProductTypeSearch {
                min_query_length: MIN_SEARCH_QUERY_LENGTH,
            },
            "upc" => {
                let prefixes: Vec<String> = config
                    .map(|c| OptionList::decode(c).values().into_iter().map(str::to_string).collect())
                    .unwrap_or_default();
                CustomWidget::Upc {
                    prefixes: if prefixes.is_empty() {
                        ctx.upc_prefixes.clone()
                    } else {
                        prefixes
                    },
                }
            }
            "sku_bundle" => {
                let max_rows = match config {
                    Some(c) => Some(c.parse::<u32>().map_err(|_| {
                        RenderError::configuration(field_name, format!("sku_bundle row limit '{}' is not a number", c))
                    })?),
                    None => None,
                };
                CustomWidget::SkuBundle { max_rows }
            }
            "shipping_cost_calculator" => CustomWidget::ShippingCostCalculator {
                carriers: OptionList::decode(config.unwrap_or(DEFAULT_CARRIERS)),
            },
            "prop65" => {
                let composite = CompositePayload::decode(config.unwrap_or(DEFAULT_PROP65_WARNINGS));
                let warnings = composite
                    .part(0)
                    .filter(|p| !p.is_empty())
                    .cloned()
                    .unwrap_or_else(|| OptionList::decode(DEFAULT_PROP65_WARNINGS));
                let chemicals = composite
                    .part(1)
                    .filter(|p| !p.is_empty())
                    .cloned()
                    .unwrap_or_else(|| reference::chemical_options(&ctx.prop65_chemicals));
                CustomWidget::Prop65 { warnings, chemicals }
            }
            "wish_brand" => CustomWidget::WishBrand {
                brands: reference::brand_options(&ctx.wish_brands),
            },
            "category_search_amazon" => Self::category_search(SearchMarketplace::Amazon),
            "category_search_newegg" => Self::category_search(SearchMarketplace::Newegg),
            "category_search_sears" => Self::category_search(SearchMarketplace::Sears),
            "category_search_walmart" => Self::category_search(SearchMarketplace::Walmart),
            "clone_site_categories" => CustomWidget::CloneSiteCategories {
                categories: config.map(OptionList::decode).unwrap_or_default(),
            },
            "clone_site_tags" => CustomWidget::CloneSiteTags {
                tags: match config {
                    Some(c) => TagSpec::decode(c).map_err(decode)?,
                    None => TagSpec::default(),
                },
            },
            "amazon_special_refinements" => CustomWidget::AmazonSpecialRefinements {
                refinements: match config {
                    Some(c) => RefinementSpec::decode(c).map_err(decode)?,
                    None => RefinementSpec::default(),
                },
            },
            other => {
                return Err(RenderError::configuration(
                    field_name,
                    format!("unknown custom widget '{}'", other),
                ));
            }
        };

        Ok(widget)
    }

    fn category_search(marketplace: SearchMarketplace) -> Self {
        CustomWidget::CategorySearch {
            marketplace,
            min_query_length: MIN_SEARCH_QUERY_LENGTH,
        }
    }

    /// Closed value set a submitted value must belong to, if the widget has one
    pub fn allowed_values(&self) -> Option<Vec<&str>> {
        match self {
            CustomWidget::WishBrand { brands } if !brands.is_empty() => Some(brands.values()),
            CustomWidget::CloneSiteCategories { categories } if !categories.is_empty() => {
                Some(categories.values())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Prop65Chemical, WishBrand};

    fn ctx() -> RenderContext {
        RenderContext {
            upc_prefixes: vec!["0123".to_string(), "0456".to_string()],
            prop65_chemicals: vec![Prop65Chemical::new("Lead")],
            wish_brands: vec![WishBrand::new("acme")],
            ..Default::default()
        }
    }

    #[test]
    fn test_every_registered_name_resolves() {
        for name in CustomWidget::NAMES {
            assert!(
                CustomWidget::resolve("field", Some(name), &ctx()).is_ok(),
                "widget {} should resolve",
                name
            );
        }
    }

    #[test]
    fn test_unknown_widget_is_configuration_error() {
        let err = CustomWidget::resolve("field", Some("hologram"), &ctx()).unwrap_err();
        assert!(matches!(err, RenderError::Configuration { .. }));
        assert!(err.to_string().contains("hologram"));

        let err = CustomWidget::resolve("field", None, &ctx()).unwrap_err();
        assert!(matches!(err, RenderError::Configuration { .. }));
    }

    #[test]
    fn test_upc_prefixes() {
        let from_settings = CustomWidget::resolve("upc", Some("upc"), &ctx()).unwrap();
        assert_eq!(
            from_settings,
            CustomWidget::Upc { prefixes: vec!["0123".to_string(), "0456".to_string()] }
        );

        let from_aux = CustomWidget::resolve("upc", Some("upc&&0789||0999"), &ctx()).unwrap();
        assert_eq!(
            from_aux,
            CustomWidget::Upc { prefixes: vec!["0789".to_string(), "0999".to_string()] }
        );
    }

    #[test]
    fn test_sku_bundle_limit() {
        let widget = CustomWidget::resolve("bundle", Some("sku_bundle&&5"), &ctx()).unwrap();
        assert_eq!(widget, CustomWidget::SkuBundle { max_rows: Some(5) });
        assert!(CustomWidget::resolve("bundle", Some("sku_bundle&&many"), &ctx()).is_err());
    }

    #[test]
    fn test_prop65_uses_reference_chemicals() {
        match CustomWidget::resolve("prop65", Some("prop65"), &ctx()).unwrap() {
            CustomWidget::Prop65 { warnings, chemicals } => {
                assert!(warnings.contains_value("cancer"));
                assert_eq!(chemicals.values(), vec!["Lead"]);
            }
            other => panic!("unexpected widget {:?}", other),
        }
    }

    #[test]
    fn test_category_search_marketplace() {
        let widget = CustomWidget::resolve("cat", Some("category_search_walmart"), &ctx()).unwrap();
        assert_eq!(
            widget,
            CustomWidget::CategorySearch {
                marketplace: SearchMarketplace::Walmart,
                min_query_length: 3
            }
        );
    }

    #[test]
    fn test_malformed_tag_json_is_decode_error() {
        let err = CustomWidget::resolve("tags", Some("clone_site_tags&&[broken"), &ctx()).unwrap_err();
        match err {
            RenderError::Decode { source, .. } => assert_eq!(source.payload(), "[broken"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
