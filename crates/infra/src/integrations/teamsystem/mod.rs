//! TeamSystem Alyante webservice adapters
//!
//! - [`HttpAuthApi`]: login, refresh and validate endpoints
//! - [`ReqwestTransport`]: executes prepared bulk resource calls and decodes
//!   compressed bodies

pub mod auth;
pub mod transport;

pub use auth::HttpAuthApi;
pub use transport::ReqwestTransport;

use std::time::Duration;

use alyante_domain::{AlyanteError, Result, WebserviceConfig};
use url::Url;

use crate::http::HttpClient;

/// Validated webservice base URL without a trailing slash.
pub(crate) fn base_url(config: &WebserviceConfig) -> Result<String> {
    let base = config.base_url();
    if base.is_empty() {
        return Err(AlyanteError::Config("Missing webservice_url".into()));
    }

    Url::parse(base)
        .map_err(|err| AlyanteError::Config(format!("Invalid webservice_url '{base}': {err}")))?;

    Ok(base.to_string())
}

/// HTTP client honouring the certificate policy of `config`.
pub(crate) fn http_client(config: &WebserviceConfig, timeout: Duration) -> Result<HttpClient> {
    HttpClient::builder()
        .timeout(timeout)
        .user_agent(concat!("alyante-connector/", env!("CARGO_PKG_VERSION")))
        .accept_invalid_certs(config.insecure_certificate)
        .build()
}
