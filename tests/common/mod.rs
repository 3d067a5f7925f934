#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use cosmos::principals::{InMemoryPrincipalStore, RoleLookup};
use cosmos::router::init_router;
use cosmos::state::AppState;
use cosmos_auth::{KeyRing, ManualClock, TokenPair};
use cosmos_config::AuthConfig;
use cosmos_core::permissions;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const OLD_KID: &str = "26eus0rt3e3Abor12Y60VqgCEXR";
pub const NEW_KID: &str = "26eutHCBAmtGZzeQB7WVZD28l0F";

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PLAYER_EMAIL: &str = "player@example.com";
pub const PASSWORD: &str = "supersecretsquirrel";

pub struct TestApp {
    pub state: AppState,
    pub clock: ManualClock,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(String::from)
            .collect()
    }

    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.set_cookies().into_iter().find(|c| c.starts_with(&prefix))
    }

    pub fn token_pair(&self) -> TokenPair {
        serde_json::from_value(self.body.clone()).unwrap()
    }
}

fn fixture_keys() -> BTreeMap<String, PathBuf> {
    let testdata = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("crates/cosmos-auth/testdata");
    [OLD_KID, NEW_KID]
        .iter()
        .map(|kid| (kid.to_string(), testdata.join(format!("{kid}.pem"))))
        .collect()
}

/// App with both fixture keys loaded, an admin allowed to list keys and a
/// player who is not.
pub async fn setup_test_app() -> TestApp {
    let store = InMemoryPrincipalStore::with_cost(4);
    store.add_role("Admin", &[permissions::KEYS_READ]).await;
    store.add_role("Player", &["games:read"]).await;
    for (name, email, role) in [
        ("Ada Admin", ADMIN_EMAIL, "Admin"),
        ("Pat Player", PLAYER_EMAIL, "Player"),
    ] {
        store
            .add_account(name, email, PASSWORD, &RoleLookup::ByTitle(role.to_string()))
            .await
            .unwrap();
    }

    let config = AuthConfig::default();
    let keys = KeyRing::load(&fixture_keys(), config.audience.clone()).unwrap();
    let clock = ManualClock::starting_now();
    let state =
        AppState::with_clock(keys, config, Arc::new(store), Arc::new(clock.clone())).unwrap();

    TestApp { state, clock }
}

impl TestApp {
    pub fn router(&self) -> Router {
        init_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, headers, body }
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "email": email, "password": password }).to_string(),
            ))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&self, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn login_pair(&self, email: &str) -> TokenPair {
        let response = self.login(email, PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK);
        response.token_pair()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn with_cookies(method: &str, uri: &str, pair: &TokenPair) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::COOKIE,
            format!(
                "access_token={}; refresh_token={}",
                pair.access_token, pair.refresh_token
            ),
        )
        .body(Body::empty())
        .unwrap()
}
