//! Selling Partner API client

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::constants::{
    product_type_definition_path, product_types_path, ACCESS_TOKEN_HEADER, REQUEST_ID_HEADER,
};
use super::credentials::SpApiCredentials;
use super::error::{SpApiError, SpApiErrorKind};
use super::requirements::{self, DefinitionResponse, ListingRequirements, ProductTypeList, ProductTypeSummary};
use super::token::TokenManager;
use crate::api::resilience::RetryPolicy;

pub struct SpApiClient {
    http: reqwest::Client,
    tokens: Arc<TokenManager>,
    endpoint: String,
    marketplace_id: String,
    retry: RetryPolicy,
}

impl SpApiClient {
    pub fn new(
        tokens: Arc<TokenManager>,
        endpoint: impl Into<String>,
        marketplace_id: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            tokens,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            marketplace_id: marketplace_id.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_credentials(credentials: &SpApiCredentials, tokens: Arc<TokenManager>, http: reqwest::Client) -> Self {
        Self::new(tokens, credentials.region.endpoint(), &credentials.marketplace_id, http)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn marketplace_id(&self) -> &str {
        &self.marketplace_id
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Product types matching `keywords` in the client's marketplace
    pub async fn search_product_types(&self, keywords: &str) -> Result<Vec<ProductTypeSummary>, SpApiError> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let query = [
            ("keywords", keywords.to_string()),
            ("marketplaceIds", self.marketplace_id.clone()),
        ];
        let list: ProductTypeList = self.get_json(&product_types_path(), &query).await?;

        debug!("Found {} product types for '{}'", list.product_types.len(), keywords);
        Ok(list.product_types)
    }

    /// Fetch the definition of `product_type`, then the JSON schema it links to
    pub async fn get_listing_requirements(&self, product_type: &str) -> Result<ListingRequirements, SpApiError> {
        let query = [
            ("marketplaceIds", self.marketplace_id.clone()),
            ("requirements", "LISTING".to_string()),
            ("requirementsEnforced", "ENFORCED".to_string()),
            ("locale", "DEFAULT".to_string()),
        ];
        let definition: DefinitionResponse = self
            .get_json(&product_type_definition_path(product_type), &query)
            .await?;

        let schema: Value = self
            .retry
            .execute(|| self.fetch_schema(&definition.schema.link.resource))
            .await?;

        ListingRequirements::from_schema(product_type, &self.marketplace_id, &schema)
    }

    pub fn missing_requirements(
        &self,
        requirements: &ListingRequirements,
        form_data: &BTreeMap<String, Value>,
    ) -> Vec<String> {
        requirements::missing_requirements(requirements, form_data)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, SpApiError> {
        self.retry.execute(|| self.get_once(path, query)).await
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, SpApiError> {
        let token = self.tokens.get_access_token().await?;
        let url = format!("{}{}", self.endpoint, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(query)
            .header(ACCESS_TOKEN_HEADER, token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SpApiError::transport(&e))?;

        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| SpApiError::transport(&e))?;

        if !(200..300).contains(&status) {
            let error = SpApiError::from_response(status, &body, request_id);
            if error.kind() == SpApiErrorKind::Auth {
                // Force a new token on the next call
                self.tokens.invalidate_token().await;
            }
            return Err(error);
        }

        serde_json::from_str(&body).map_err(|e| SpApiError::malformed(format!("unexpected response from {}: {}", path, e)))
    }

    /// Schema documents are pre-signed links and need no access token
    async fn fetch_schema(&self, url: &str) -> Result<Value, SpApiError> {
        let response = self.http.get(url).send().await.map_err(|e| SpApiError::transport(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SpApiError::transport(&e))?;

        if !(200..300).contains(&status) {
            return Err(SpApiError::from_response(status, &body, None));
        }

        serde_json::from_str(&body).map_err(|e| SpApiError::malformed(format!("invalid product type schema: {}", e)))
    }
}
