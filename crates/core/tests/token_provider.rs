//! Token lifecycle against scripted auth endpoints

mod support;

use std::sync::Arc;

use alyante_core::{Clock, FixedClock, TokenProvider};
use alyante_domain::constants::{ACCESS_TOKEN_KEY, EXPIRATION_TOKEN_KEY, REFRESH_TOKEN_KEY};
use alyante_domain::AlyanteError;
use chrono::Duration;
use serde_json::json;
use support::fixtures::{now, store_with_valid_token, token_response};
use support::mocks::{InMemoryCredentialStore, MockAuthApi};

fn provider(
    store: Arc<InMemoryCredentialStore>,
    auth: Arc<MockAuthApi>,
    clock: Arc<FixedClock>,
) -> TokenProvider {
    TokenProvider::new(auth, store, "connector", "secret").with_clock(clock)
}

#[tokio::test]
async fn login_on_empty_store_then_reuses_token() {
    let store = Arc::new(InMemoryCredentialStore::default());
    let auth = Arc::new(MockAuthApi::default());
    let clock = Arc::new(FixedClock::new(now()));
    auth.push_login(Ok(token_response("A", "R", json!("3600"))));

    let tokens = provider(store.clone(), auth.clone(), clock.clone());

    assert_eq!(tokens.get_access_token(false).await.unwrap(), "A");
    assert_eq!(
        store.value(EXPIRATION_TOKEN_KEY),
        Some((now() + Duration::seconds(3600)).timestamp().to_string())
    );
    assert_eq!(store.value(REFRESH_TOKEN_KEY).as_deref(), Some("R"));

    clock.advance(Duration::minutes(30));
    assert_eq!(tokens.get_access_token(false).await.unwrap(), "A");
    assert_eq!(auth.login_count(), 1);
    assert_eq!(auth.refresh_count(), 0);
    assert_eq!(
        auth.login_calls.lock().unwrap()[0],
        ("connector".to_string(), "secret".to_string())
    );
}

#[tokio::test]
async fn force_always_logs_in() {
    let store = Arc::new(store_with_valid_token("OLD"));
    let auth = Arc::new(MockAuthApi::default());
    auth.push_login(Ok(token_response("NEW", "R1", json!(600))));

    let tokens = provider(store.clone(), auth.clone(), Arc::new(FixedClock::new(now())));

    assert_eq!(tokens.get_access_token(true).await.unwrap(), "NEW");
    assert_eq!(store.value(ACCESS_TOKEN_KEY).as_deref(), Some("NEW"));
    assert_eq!(auth.login_count(), 1);
}

#[tokio::test]
async fn expired_token_is_refreshed() {
    let store = Arc::new(store_with_valid_token("OLD"));
    let auth = Arc::new(MockAuthApi::default());
    let clock = Arc::new(FixedClock::new(now()));
    auth.push_refresh(Ok(token_response("A2", "R2", json!(3600))));

    let tokens = provider(store.clone(), auth.clone(), clock.clone());
    clock.advance(Duration::hours(2));

    assert_eq!(tokens.get_access_token(false).await.unwrap(), "A2");
    assert_eq!(auth.refresh_calls.lock().unwrap().as_slice(), ["R0".to_string()]);
    assert_eq!(auth.login_count(), 0);
    assert_eq!(store.value(REFRESH_TOKEN_KEY).as_deref(), Some("R2"));
}

#[tokio::test]
async fn token_inside_safety_margin_counts_as_expired() {
    let store = Arc::new(store_with_valid_token("OLD"));
    let auth = Arc::new(MockAuthApi::default());
    let clock = Arc::new(FixedClock::new(now()));
    auth.push_refresh(Ok(token_response("A2", "R2", json!(3600))));

    let tokens = provider(store, auth.clone(), clock.clone());

    clock.advance(Duration::minutes(60) + Duration::seconds(119));
    assert_eq!(tokens.get_access_token(false).await.unwrap(), "OLD");
    assert_eq!(auth.refresh_count(), 0);

    clock.advance(Duration::seconds(2));
    assert_eq!(tokens.get_access_token(false).await.unwrap(), "A2");
    assert_eq!(auth.refresh_count(), 1);
}

#[tokio::test]
async fn expired_without_refresh_token_logs_in() {
    let expired = (now() - Duration::hours(1)).timestamp().to_string();
    let store = Arc::new(InMemoryCredentialStore::with_values(&[
        (ACCESS_TOKEN_KEY, "OLD"),
        (EXPIRATION_TOKEN_KEY, &expired),
    ]));
    let auth = Arc::new(MockAuthApi::default());
    auth.push_login(Ok(token_response("A", "R", json!(3600))));

    let tokens = provider(store, auth.clone(), Arc::new(FixedClock::new(now())));

    assert_eq!(tokens.get_access_token(false).await.unwrap(), "A");
    assert_eq!(auth.refresh_count(), 0);
    assert_eq!(auth.login_count(), 1);
}

#[tokio::test]
async fn failed_refresh_does_not_fall_back_to_login() {
    let store = Arc::new(store_with_valid_token("OLD"));
    let auth = Arc::new(MockAuthApi::default());
    let clock = Arc::new(FixedClock::new(now()));
    auth.push_refresh(Err(AlyanteError::Auth("refresh rejected with status 400".into())));

    let tokens = provider(store.clone(), auth.clone(), clock.clone());
    clock.advance(Duration::hours(2));

    let err = tokens.get_access_token(false).await.unwrap_err();
    assert!(matches!(err, AlyanteError::Auth(_)));
    assert_eq!(auth.login_count(), 0);
    assert_eq!(store.value(ACCESS_TOKEN_KEY).as_deref(), Some("OLD"));
}

#[tokio::test]
async fn incomplete_login_response_stores_nothing() {
    let store = Arc::new(InMemoryCredentialStore::default());
    let auth = Arc::new(MockAuthApi::default());
    auth.push_login(Ok(json!({"access_token": "A", "expires_in": 60})));

    let tokens = provider(store.clone(), auth, Arc::new(FixedClock::new(now())));

    let err = tokens.get_access_token(false).await.unwrap_err();
    match err {
        AlyanteError::Auth(msg) => assert!(msg.contains("refresh_token")),
        other => panic!("expected auth error, got {other:?}"),
    }
    assert_eq!(store.value(ACCESS_TOKEN_KEY), None);
    assert_eq!(store.value(EXPIRATION_TOKEN_KEY), None);
}

#[tokio::test]
async fn unparsable_expires_in_falls_back_to_five_minutes() {
    let store = Arc::new(InMemoryCredentialStore::default());
    let auth = Arc::new(MockAuthApi::default());
    let clock = Arc::new(FixedClock::new(now()));
    auth.push_login(Ok(token_response("A", "R", json!("later"))));

    let tokens = provider(store.clone(), auth, clock.clone());
    tokens.get_access_token(false).await.unwrap();

    assert_eq!(
        store.value(EXPIRATION_TOKEN_KEY),
        Some((clock.now() + Duration::seconds(300)).timestamp().to_string())
    );
}

#[tokio::test]
async fn huge_expires_in_falls_back_to_five_minutes() {
    let store = Arc::new(InMemoryCredentialStore::default());
    let auth = Arc::new(MockAuthApi::default());
    let clock = Arc::new(FixedClock::new(now()));
    auth.push_login(Ok(token_response("A", "R", json!("99999999999999"))));

    let tokens = provider(store.clone(), auth, clock.clone());
    assert_eq!(tokens.get_access_token(false).await.unwrap(), "A");

    assert_eq!(
        store.value(EXPIRATION_TOKEN_KEY),
        Some((clock.now() + Duration::seconds(300)).timestamp().to_string())
    );
}

#[tokio::test]
async fn empty_expiration_record_forces_login() {
    let store = Arc::new(InMemoryCredentialStore::with_values(&[
        (ACCESS_TOKEN_KEY, "OLD"),
        (EXPIRATION_TOKEN_KEY, ""),
    ]));
    let auth = Arc::new(MockAuthApi::default());
    auth.push_login(Ok(token_response("A", "R", json!(3600))));

    let tokens = provider(store, auth.clone(), Arc::new(FixedClock::new(now())));

    assert_eq!(tokens.get_access_token(false).await.unwrap(), "A");
    assert_eq!(auth.login_count(), 1);
}

#[tokio::test]
async fn validate_passes_through_rejection_as_none() {
    let auth = Arc::new(MockAuthApi::default());
    let tokens = provider(
        Arc::new(InMemoryCredentialStore::default()),
        auth.clone(),
        Arc::new(FixedClock::new(now())),
    );

    assert_eq!(tokens.validate("A").await.unwrap(), None);

    auth.set_validate(Some(json!({"user": "connector"})));
    assert_eq!(tokens.validate("A").await.unwrap(), Some(json!({"user": "connector"})));
}
