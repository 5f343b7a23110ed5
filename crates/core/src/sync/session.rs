//! Authenticated webservice session for a single sync run
//!
//! The session owns the cached access token. Every call carries it as a
//! bearer header; a 401 answer triggers one forced re-authentication and one
//! replay of the same request. Whatever the replay returns is handed back to
//! the caller, including a second 401.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alyante_domain::{HttpMethod, Result, WebserviceConfig};
use tracing::{debug, info, instrument, warn};

use super::ports::{CallRequest, CallResponse, SyncTransport};
use crate::auth::TokenProvider;

const UNAUTHORIZED: u16 = 401;

/// Per-run client state. Not meant to be shared across concurrent runs.
pub struct SyncSession {
    tokens: Arc<TokenProvider>,
    transport: Arc<dyn SyncTransport>,
    base_url: String,
    compressed: bool,
    timeout: Duration,
    token: Option<String>,
}

impl SyncSession {
    pub fn new(
        tokens: Arc<TokenProvider>,
        transport: Arc<dyn SyncTransport>,
        config: &WebserviceConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            transport,
            base_url: config.base_url().to_string(),
            compressed: config.response_compressed,
            timeout,
            token: None,
        }
    }

    /// Webservice base URL without trailing slash; empty when unset.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a call, re-authenticating once on 401.
    #[instrument(skip(self, body))]
    pub async fn call(
        &mut self,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
    ) -> Result<CallResponse> {
        let token = self.access_token(false).await?;
        let mut request = self.build_request(method, url, body, &token);

        let started = Instant::now();
        let response = self.transport.send(&request).await?;
        debug!(status = response.status, elapsed_secs = started.elapsed().as_secs(), "Call finished");

        if response.status != UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Webservice answered 401, re-authenticating");
        let token = self.access_token(true).await?;
        request.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("Authorization"));
        request.headers.push(("Authorization".to_string(), bearer(&token)));

        let retried = self.transport.send(&request).await?;
        if retried.status == UNAUTHORIZED {
            warn!("Still unauthorized after re-authentication");
        } else {
            info!(status = retried.status, "Retry after re-authentication succeeded");
        }
        Ok(retried)
    }

    async fn access_token(&mut self, force: bool) -> Result<String> {
        if !force {
            if let Some(token) = &self.token {
                return Ok(token.clone());
            }
        }
        let token = self.tokens.get_access_token(force).await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
        token: &str,
    ) -> CallRequest {
        let mut headers = vec![
            ("Authorization".to_string(), bearer(token)),
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        if self.compressed {
            headers.push(("Accept-Encoding".to_string(), "gzip, compress".to_string()));
        }

        CallRequest { method, url: url.to_string(), headers, body, timeout: self.timeout }
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
