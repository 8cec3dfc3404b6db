//! Remote APIs: Amazon Selling Partner API and shared resilience helpers

pub mod amazon;
pub mod resilience;
