//! Wiring helpers

use std::sync::Arc;
use std::time::Duration;

use alyante_core::{FixedClock, SyncSession, TokenProvider, WatermarkTracker};
use alyante_domain::constants::{ACCESS_TOKEN_KEY, EXPIRATION_TOKEN_KEY, REFRESH_TOKEN_KEY};
use alyante_domain::WebserviceConfig;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde_json::{json, Value};

use super::mocks::{InMemoryCredentialStore, MockAuthApi, ScriptedTransport};

pub const BASE_URL: &str = "https://erp.example.com/ws";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn token_response(access: &str, refresh: &str, expires_in: Value) -> Value {
    json!({"access_token": access, "refresh_token": refresh, "expires_in": expires_in})
}

pub fn webservice_config() -> WebserviceConfig {
    WebserviceConfig {
        url: format!("{BASE_URL}/"),
        username: "connector".into(),
        password: "secret".into(),
        ..Default::default()
    }
}

/// Credential store already holding a token valid for another hour.
pub fn store_with_valid_token(access: &str) -> InMemoryCredentialStore {
    let expires = (now() + ChronoDuration::hours(1)).timestamp().to_string();
    InMemoryCredentialStore::with_values(&[
        (ACCESS_TOKEN_KEY, access),
        (REFRESH_TOKEN_KEY, "R0"),
        (EXPIRATION_TOKEN_KEY, &expires),
    ])
}

/// Everything a download/upload test needs around the unit under test.
pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub store: Arc<InMemoryCredentialStore>,
    pub auth: Arc<MockAuthApi>,
    pub transport: Arc<ScriptedTransport>,
    pub tokens: Arc<TokenProvider>,
    pub watermarks: Arc<WatermarkTracker>,
    pub config: WebserviceConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(store_with_valid_token("A0"))
    }

    pub fn with_store(store: InMemoryCredentialStore) -> Self {
        let clock = Arc::new(FixedClock::new(now()));
        let store = Arc::new(store);
        let auth = Arc::new(MockAuthApi::default());
        let config = webservice_config();

        let tokens = Arc::new(
            TokenProvider::from_config(auth.clone(), store.clone(), &config)
                .with_clock(clock.clone()),
        );
        let watermarks = Arc::new(
            WatermarkTracker::from_config(store.clone(), &config).with_clock(clock.clone()),
        );

        Self {
            clock,
            store,
            auth,
            transport: Arc::new(ScriptedTransport::default()),
            tokens,
            watermarks,
            config,
        }
    }

    pub fn session(&self) -> SyncSession {
        SyncSession::new(
            self.tokens.clone(),
            self.transport.clone(),
            &self.config,
            Duration::from_secs(30),
        )
    }
}
