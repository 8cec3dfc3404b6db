//! Product drafts and Amazon listings with their validation lifecycle

pub mod amazon;
pub mod draft;
pub mod status;

pub use amazon::AmazonListing;
pub use draft::ProductDraft;
pub use status::{InvalidTransition, Lifecycle, ListingStatus};

use thiserror::Error;

use crate::fields::render::RenderError;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Discriminator stored alongside each listing row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Draft,
    Amazon,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Draft => "draft",
            ListingKind::Amazon => "amazon",
        }
    }
}
