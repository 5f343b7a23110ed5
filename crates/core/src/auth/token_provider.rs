//! Access token lifecycle
//!
//! Tokens live in the credential store as three records (`access_token`,
//! `refresh_token`, `expiration_token`). Each call decides between reusing the
//! stored token, refreshing it, or logging in again:
//! - forced, or no usable expiration stored → login
//! - expired (with a 120s safety margin) → refresh, or login when no refresh
//!   token is stored
//! - otherwise → stored token, no network call
//!
//! A failed refresh is surfaced as an error; it never silently falls back to
//! login.

use std::sync::Arc;

use alyante_domain::constants::{
    ACCESS_TOKEN_KEY, EXPIRATION_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_MARGIN_SECS,
};
use alyante_domain::{parse_expiration, Result, TokenState, WebserviceConfig};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::ports::{AuthApi, CredentialStore};
use crate::clock::{Clock, SystemClock};

/// Obtains, caches and renews the webservice access token
pub struct TokenProvider {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    username: String,
    password: String,
    margin: Duration,
}

impl TokenProvider {
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn CredentialStore>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            api,
            store,
            clock: Arc::new(SystemClock),
            username: username.into(),
            password: password.into(),
            margin: Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS),
        }
    }

    /// Build a provider using the credentials from the webservice settings.
    pub fn from_config(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn CredentialStore>,
        config: &WebserviceConfig,
    ) -> Self {
        Self::new(api, store, config.username.clone(), config.password.clone())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return a usable access token, renewing it when needed.
    ///
    /// With `force` set the stored token is ignored and a fresh login is
    /// performed.
    ///
    /// # Errors
    /// `AlyanteError::Auth` when the login or refresh call fails or the
    /// response lacks `access_token`, `refresh_token` or `expires_in`.
    #[instrument(skip(self))]
    pub async fn get_access_token(&self, force: bool) -> Result<String> {
        let now = self.clock.now();

        let renewed = if force {
            debug!("Forced re-authentication requested");
            Some(self.login(now).await?)
        } else {
            match self.stored_expiration().await? {
                None => {
                    debug!("No token expiration stored");
                    Some(self.login(now).await?)
                }
                Some(expires_at) if TokenState::is_expired_at(expires_at, now, self.margin) => {
                    debug!(%expires_at, "Access token expired");
                    Some(self.refresh_or_login(now).await?)
                }
                Some(_) => None,
            }
        };

        if let Some(state) = renewed {
            return Ok(state.access_token);
        }

        match self.load_value(ACCESS_TOKEN_KEY).await? {
            Some(token) => Ok(token),
            None => {
                warn!("Access token missing from credential store");
                Ok(self.login(now).await?.access_token)
            }
        }
    }

    /// Ask the webservice whether `access_token` is still accepted.
    ///
    /// Returns `None` when the server rejects the token.
    #[instrument(skip_all)]
    pub async fn validate(&self, access_token: &str) -> Result<Option<Value>> {
        self.api.validate(access_token).await
    }

    async fn stored_expiration(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.load_value(EXPIRATION_TOKEN_KEY).await? else {
            return Ok(None);
        };

        let parsed = parse_expiration(&raw);
        if parsed.is_none() {
            warn!(value = %raw, "Unparsable token expiration, treating token as absent");
        }
        Ok(parsed)
    }

    async fn load_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.store.load(key).await?.map(|record| record.value).filter(|v| !v.trim().is_empty()))
    }

    async fn login(&self, now: DateTime<Utc>) -> Result<TokenState> {
        info!(username = %self.username, "Logging in to webservice");
        let response = self.api.login(&self.username, &self.password).await?;
        self.persist(&response, now).await
    }

    async fn refresh_or_login(&self, now: DateTime<Utc>) -> Result<TokenState> {
        match self.load_value(REFRESH_TOKEN_KEY).await? {
            Some(refresh_token) => {
                info!("Refreshing access token");
                let response = self.api.refresh(&refresh_token).await?;
                self.persist(&response, now).await
            }
            None => {
                info!("No refresh token stored, logging in instead");
                self.login(now).await
            }
        }
    }

    /// Validate the response, then write all three records.
    async fn persist(&self, response: &Value, now: DateTime<Utc>) -> Result<TokenState> {
        let state = TokenState::from_response(response, now)?;
        for (key, value) in state.to_records() {
            self.store.save(key, &value).await?;
        }
        debug!(expires_at = %state.expires_at, "Stored new token state");
        Ok(state)
    }
}
