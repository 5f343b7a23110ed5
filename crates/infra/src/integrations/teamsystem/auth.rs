//! Authentication endpoints of the Alyante webservice

use std::time::Duration;

use alyante_core::AuthApi;
use alyante_domain::constants::{LOGIN_ENDPOINT, REFRESH_ENDPOINT, VALIDATE_ENDPOINT};
use alyante_domain::{AlyanteError, Result, WebserviceConfig};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{base_url, http_client};
use crate::errors::InfraError;
use crate::http::HttpClient;

const JSON: &str = "application/json";

/// [`AuthApi`] over HTTP.
///
/// Every call uses the authentication timeout from the webservice config,
/// independent of the bulk call timeout.
pub struct HttpAuthApi {
    http: HttpClient,
    base_url: String,
}

impl HttpAuthApi {
    /// # Errors
    /// `AlyanteError::Config` when the webservice URL is missing or invalid.
    pub fn new(config: &WebserviceConfig) -> Result<Self> {
        let base_url = base_url(config)?;
        let http = http_client(config, Duration::from_secs(config.auth_timeout_seconds))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<Value> {
        let request = self
            .http
            .request(Method::POST, self.endpoint(LOGIN_ENDPOINT))
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .json(&json!({ "username": username, "password": password }));

        let response = self.http.send(request).await?;
        expect_ok(response, "login").await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<Value> {
        let request = self
            .http
            .request(Method::POST, self.endpoint(REFRESH_ENDPOINT))
            .header(ACCEPT, JSON)
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)]);

        let response = self.http.send(request).await?;
        expect_ok(response, "refresh").await
    }

    #[instrument(skip_all)]
    async fn validate(&self, access_token: &str) -> Result<Option<Value>> {
        let request = self
            .http
            .request(Method::GET, self.endpoint(VALIDATE_ENDPOINT))
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .header(AUTHORIZATION, format!("Bearer {access_token}"));

        let response = self.http.send(request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Access token rejected by validate endpoint");
            return Ok(None);
        }

        expect_ok(response, "validate").await.map(Some)
    }
}

async fn expect_ok(response: Response, operation: &str) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.map_err(|err| AlyanteError::from(InfraError::from(err)))?;

    if status != StatusCode::OK {
        return Err(AlyanteError::Auth(format!(
            "Error during {operation} ~ response code:{} ~ body:{body}",
            status.as_u16()
        )));
    }

    serde_json::from_str(&body).map_err(|err| {
        AlyanteError::Auth(format!("Invalid JSON from {operation} endpoint: {err} ~ body:{body}"))
    })
}
