pub mod spinner;

pub use spinner::{with_spinner, Spinner};
