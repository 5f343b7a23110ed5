#![allow(dead_code)]

use std::io::Write;

use alyante_core::CredentialStore;
use alyante_domain::{CallConfig, Config, DatabaseConfig, WebserviceConfig};
use alyante_infra::ConnectorContext;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FALLBACK_LAST_CHANGE: &str = "2024-01-01 00:00:00";
pub const FALLBACK_FILTER: &str = "20240101000000";

/// Connector wired against a mock webservice and a temporary database that
/// lives as long as the value.
pub struct TestConnector {
    pub context: ConnectorContext,
    pub server: MockServer,
    _temp_dir: TempDir,
}

impl TestConnector {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut Config)) -> Self {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().expect("temp dir should be created");

        let mut config = Config {
            database: DatabaseConfig {
                path: temp_dir.path().join("alyante.db").display().to_string(),
                pool_size: 2,
            },
            webservice: WebserviceConfig {
                url: format!("{}/", server.uri()),
                username: "connector".into(),
                password: "secret".into(),
                fallback_last_change: Some(FALLBACK_LAST_CHANGE.into()),
                auth_timeout_seconds: 5,
                ..Default::default()
            },
            call: CallConfig { timeout_seconds: 5, ..Default::default() },
        };
        customize(&mut config);

        let context = ConnectorContext::new(config).expect("context should be created");
        Self { context, server, _temp_dir: temp_dir }
    }

    /// Answer every login with `access_token`.
    pub async fn mount_login(&self, access_token: &str) {
        login_mock(access_token).mount(&self.server).await;
    }

    /// Value stored in the credential store under `key`.
    pub async fn stored(&self, key: &str) -> Option<String> {
        self.context.credentials.load(key).await.expect("credential load").map(|r| r.value)
    }
}

pub fn token_body(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": format!("refresh-{access_token}"),
        "expires_in": 3600
    })
}

pub fn login_mock(access_token: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access_token)))
}

pub fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).expect("gzip write");
    encoder.finish().expect("gzip finish")
}
