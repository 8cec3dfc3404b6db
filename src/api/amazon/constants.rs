//! Selling Partner API endpoints and defaults

/// Login with Amazon token endpoint
pub const LWA_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";

/// A token is treated as expired this many seconds before its real expiry
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 300;

/// Lifetime assumed when the token response omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

pub const DEFINITIONS_VERSION: &str = "2020-09-01";

pub const ACCESS_TOKEN_HEADER: &str = "x-amz-access-token";
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";

/// Timeout applied to every SP-API request
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub fn product_types_path() -> String {
    format!("/definitions/{}/productTypes", DEFINITIONS_VERSION)
}

pub fn product_type_definition_path(product_type: &str) -> String {
    format!(
        "/definitions/{}/productTypes/{}",
        DEFINITIONS_VERSION,
        urlencoding::encode(product_type)
    )
}
