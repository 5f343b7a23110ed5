//! Executes prepared bulk calls against the webservice

use std::io::Read;
use std::time::Duration;

use alyante_core::{CallRequest, CallResponse, SyncTransport};
use alyante_domain::{AlyanteError, HttpMethod, Result, WebserviceConfig};
use async_trait::async_trait;
use flate2::read::{GzDecoder, ZlibDecoder};
use reqwest::header::CONTENT_ENCODING;
use reqwest::Method;
use tracing::debug;

use super::http_client;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// [`SyncTransport`] backed by reqwest.
///
/// The per-request timeout from [`CallRequest`] overrides the client default.
/// Bodies announced as `gzip` or `deflate` are decompressed here since the
/// client does not negotiate encodings itself.
pub struct ReqwestTransport {
    http: HttpClient,
}

impl ReqwestTransport {
    pub fn new(config: &WebserviceConfig) -> Result<Self> {
        let http = http_client(config, Duration::from_secs(config.auth_timeout_seconds))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl SyncTransport for ReqwestTransport {
    async fn send(&self, request: &CallRequest) -> Result<CallResponse> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.http.request(method, &request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = self.http.send(builder).await?;
        let status = response.status().as_u16();
        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        let bytes =
            response.bytes().await.map_err(|err| AlyanteError::from(InfraError::from(err)))?;
        debug!(status, bytes = bytes.len(), encoding = ?encoding, "Response body received");

        let body = decode_body(&bytes, encoding.as_deref())?;
        Ok(CallResponse::new(status, body))
    }
}

/// Decode a response body according to its `Content-Encoding`.
fn decode_body(bytes: &[u8], encoding: Option<&str>) -> Result<String> {
    let mut body = String::new();
    let outcome = match encoding {
        Some(enc) if enc.contains("gzip") => GzDecoder::new(bytes).read_to_string(&mut body),
        Some(enc) if enc.contains("deflate") => ZlibDecoder::new(bytes).read_to_string(&mut body),
        _ => return Ok(String::from_utf8_lossy(bytes).into_owned()),
    };

    outcome.map_err(|err| AlyanteError::Transport(format!("Failed to decode response body: {err}")))?;
    Ok(body)
}
