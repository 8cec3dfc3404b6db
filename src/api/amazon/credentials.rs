//! SP-API application credentials and regional endpoints

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::settings::AmazonSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpApiConfigError {
    #[error("Amazon SP-API {0} is not configured")]
    Missing(&'static str),

    #[error("unknown Amazon SP-API region '{0}' (expected na, eu or fe)")]
    InvalidRegion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    NorthAmerica,
    Europe,
    FarEast,
}

impl Region {
    pub fn code(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "na",
            Region::Europe => "eu",
            Region::FarEast => "fe",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "https://sellingpartnerapi-na.amazon.com",
            Region::Europe => "https://sellingpartnerapi-eu.amazon.com",
            Region::FarEast => "https://sellingpartnerapi-fe.amazon.com",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = SpApiConfigError;

    /// Accepts region codes and the AWS region names SP-API documents for each
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "na" | "north-america" | "us-east-1" => Ok(Region::NorthAmerica),
            "eu" | "europe" | "eu-west-1" => Ok(Region::Europe),
            "fe" | "far-east" | "us-west-2" => Ok(Region::FarEast),
            other => Err(SpApiConfigError::InvalidRegion(other.to_string())),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SpApiCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub region: Region,
    pub marketplace_id: String,
}

impl fmt::Debug for SpApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpApiCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("region", &self.region)
            .field("marketplace_id", &self.marketplace_id)
            .finish()
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, SpApiConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(SpApiConfigError::Missing(name))
}

impl SpApiCredentials {
    pub fn from_settings(settings: &AmazonSettings) -> Result<Self, SpApiConfigError> {
        let marketplace_id = settings.marketplace_id.trim();
        if marketplace_id.is_empty() {
            return Err(SpApiConfigError::Missing("marketplace id"));
        }

        Ok(Self {
            client_id: required(&settings.client_id, "client id")?,
            client_secret: required(&settings.client_secret, "client secret")?,
            refresh_token: required(&settings.refresh_token, "refresh token")?,
            region: settings.region.parse()?,
            marketplace_id: marketplace_id.to_string(),
        })
    }

    /// Key under which this application's token is persisted
    pub fn cache_key(&self) -> String {
        format!("sp-api:{}:{}", self.region, self.client_id)
    }
}
