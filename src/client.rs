//! HTTP client for the solution REST API (v2, bearer-token auth).

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::error::{Result, SolmapError};

const API_PREFIX: &str = "/api/v2";

/// Thin JSON GET client with the platform's auth and error conventions.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Build a client for `base_url` (scheme + host, no trailing slash
    /// needed) authenticating with `token`.
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// GET a path under the API prefix and parse the JSON body.
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.get_with_params(path, &[]).await
    }

    /// GET with query parameters.
    pub async fn get_with_params(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut request = self
            .client
            .get(self.endpoint(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/json");
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response(response: Response) -> Result<Value> {
        match response.status() {
            StatusCode::UNAUTHORIZED => {
                Err(SolmapError::Auth("Invalid or expired token".to_string()))
            }
            StatusCode::FORBIDDEN => Err(SolmapError::Auth(
                "Access denied - check token permissions".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(SolmapError::NotFound(format!(
                "Resource not found: {}",
                response.url()
            ))),
            status if !status.is_success() => Err(SolmapError::Api(format!(
                "HTTP {} from {}",
                status,
                response.url()
            ))),
            _ => Ok(response.json().await?),
        }
    }
}
