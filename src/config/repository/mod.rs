//! Repository layer for database operations

pub mod fields;
pub mod listings;
pub mod reference;
pub mod tokens;
