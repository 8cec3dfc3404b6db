pub mod retry;

pub use retry::{RetryConfig, RetryPolicy, Retryable};
