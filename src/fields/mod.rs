//! Field definitions and the pipeline that turns them into forms
//!
//! definition -> codec (aux decoding) -> render -> layout, with `validate`
//! checking submitted values against the same rendered constraints.

pub mod codec;
pub mod custom;
pub mod definition;
pub mod layout;
pub mod render;
pub mod seed;
pub mod validate;

pub use codec::{AuxOption, CompositePayload, DecodeError, OptionList};
pub use custom::CustomWidget;
pub use definition::{FieldDefinition, FieldType, InputType, COMMON_MARKETPLACE};
pub use layout::{build_form, build_tab, MarketplaceTab, Section};
pub use render::{render_field, render_input, InputSpec, RenderContext, RenderError, RenderedField};
pub use seed::{canonical_definitions, seed_fields, SeedOutcome};
pub use validate::{validate_form_data, validate_submission, FormData, ValidationReport};
