//! Multi-marketplace product listing forms
//!
//! Field definitions stored in SQLite are decoded and rendered into
//! per-marketplace tabs, submitted values are validated against them, and
//! Amazon listings are checked against live SP-API requirements.

pub mod api;
pub mod cli;
pub mod config;
pub mod fields;
pub mod listing;
pub mod reference;
pub mod search;
pub mod settings;
