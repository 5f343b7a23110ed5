//! Session headers and the single re-authentication on 401

mod support;

use alyante_domain::constants::ACCESS_TOKEN_KEY;
use alyante_domain::{AlyanteError, HttpMethod};
use serde_json::json;
use support::fixtures::{token_response, Harness, BASE_URL};

#[tokio::test]
async fn attaches_bearer_and_json_headers() {
    let harness = Harness::new();
    harness.transport.push(200, "[]");
    let mut session = harness.session();

    let response = session.call(HttpMethod::Get, &format!("{BASE_URL}/articoli"), None).await.unwrap();

    assert_eq!(response.status, 200);
    let request = &harness.transport.requests()[0];
    assert_eq!(request.header("authorization"), Some("Bearer A0"));
    assert_eq!(request.header("Accept"), Some("application/json"));
    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert_eq!(request.header("Accept-Encoding"), None);
}

#[tokio::test]
async fn compressed_flag_requests_gzip() {
    let mut harness = Harness::new();
    harness.config.response_compressed = true;
    harness.transport.push(200, "[]");
    let mut session = harness.session();

    session.call(HttpMethod::Get, BASE_URL, None).await.unwrap();

    assert_eq!(harness.transport.requests()[0].header("Accept-Encoding"), Some("gzip, compress"));
}

#[tokio::test]
async fn token_is_cached_for_the_session() {
    let harness = Harness::new();
    harness.transport.push(200, "[]");
    harness.transport.push(200, "[]");
    let mut session = harness.session();

    session.call(HttpMethod::Get, BASE_URL, None).await.unwrap();
    harness.store.overwrite(ACCESS_TOKEN_KEY, "CHANGED");
    session.call(HttpMethod::Get, BASE_URL, None).await.unwrap();

    let requests = harness.transport.requests();
    assert_eq!(requests[1].header("Authorization"), Some("Bearer A0"));
}

#[tokio::test]
async fn unauthorized_forces_login_and_replays_once() {
    let harness = Harness::new();
    harness.auth.push_login(Ok(token_response("A1", "R1", json!(3600))));
    harness.transport.push(401, "expired");
    harness.transport.push(201, "created");
    let mut session = harness.session();

    let response = session
        .call(HttpMethod::Post, &format!("{BASE_URL}/ordini"), Some(r#"{"n":1}"#.into()))
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(harness.auth.login_count(), 1);

    let requests = harness.transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].header("Authorization"), Some("Bearer A1"));
    assert_eq!(requests[1].body.as_deref(), Some(r#"{"n":1}"#));
    assert_eq!(
        requests[1].headers.iter().filter(|(k, _)| k == "Authorization").count(),
        1
    );
}

#[tokio::test]
async fn second_unauthorized_is_returned_to_caller() {
    let harness = Harness::new();
    harness.auth.push_login(Ok(token_response("A1", "R1", json!(3600))));
    harness.transport.push(401, "expired");
    harness.transport.push(401, "still expired");
    let mut session = harness.session();

    let response = session.call(HttpMethod::Get, BASE_URL, None).await.unwrap();

    assert_eq!(response.status, 401);
    assert_eq!(response.body, "still expired");
    assert_eq!(harness.transport.requests().len(), 2);
}

#[tokio::test]
async fn failed_reauthentication_surfaces_auth_error() {
    let harness = Harness::new();
    harness.auth.push_login(Err(AlyanteError::Auth("login rejected".into())));
    harness.transport.push(401, "expired");
    let mut session = harness.session();

    let err = session.call(HttpMethod::Get, BASE_URL, None).await.unwrap_err();

    assert!(matches!(err, AlyanteError::Auth(_)));
    assert_eq!(harness.transport.requests().len(), 1);
}
