mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use common::{
    ADMIN_EMAIL, NEW_KID, OLD_KID, PASSWORD, PLAYER_EMAIL, get, get_with_bearer, setup_test_app,
    with_cookies,
};
use serde_json::json;

#[tokio::test]
async fn test_login_success() {
    let app = setup_test_app().await;

    let response = app.login(PLAYER_EMAIL, PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);

    let pair = response.token_pair();
    let claims = app.state.verifier.verify(&pair.access_token).unwrap();
    assert_eq!(claims.email, PLAYER_EMAIL);
    assert_eq!(claims.role, "Player");
    assert_eq!(claims.permissions, vec!["games:read"]);

    let access = response.set_cookie("access_token").unwrap();
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("Secure"));
    assert!(access.contains("Domain=localhost"));
    assert!(access.contains("Max-Age=3660"));

    let refresh = response.set_cookie("refresh_token").unwrap();
    assert!(!refresh.contains("HttpOnly"));
    assert!(refresh.contains("Secure"));
    assert!(refresh.contains("Max-Age=7260"));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = setup_test_app().await;

    let wrong_password = app.login(PLAYER_EMAIL, "not the password").await;
    let unknown_user = app.login("nobody@example.com", PASSWORD).await;

    for response in [wrong_password, unknown_user] {
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body, json!({ "error": "authentication failed" }));
        assert!(response.set_cookies().is_empty());
    }
}

#[tokio::test]
async fn test_login_validation() {
    let app = setup_test_app().await;

    let response = app.login("not-an-email", PASSWORD).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": PLAYER_EMAIL }).to_string()))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "error": "password is required" }));
}

#[tokio::test]
async fn test_profile_with_bearer_token() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;

    let response = app.send(get_with_bearer("/v1/profile", &pair.access_token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], PLAYER_EMAIL);
    assert_eq!(response.body["name"], "Pat Player");
    assert_eq!(response.body["role"], "Player");
    assert_eq!(response.body["id"], 2);
}

#[tokio::test]
async fn test_profile_with_cookie() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;

    let response = app.send(with_cookies("GET", "/v1/profile", &pair)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], PLAYER_EMAIL);
    // Refresh token not active yet, nothing renewed
    assert!(response.set_cookies().is_empty());
}

#[tokio::test]
async fn test_unauthenticated_requests_get_uniform_401() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;
    let refresh_as_access = pair.refresh_token.clone();

    let mut tampered = pair.access_token.clone();
    tampered.push_str("abcdefg");

    let requests = vec![
        get("/v1/profile"),
        get_with_bearer("/v1/profile", "garbage"),
        get_with_bearer("/v1/profile", &tampered),
        // Refresh tokens are not active yet, so they cannot stand in for access tokens
        get_with_bearer("/v1/profile", &refresh_as_access),
    ];

    for request in requests {
        let response = app.send(request).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body, json!({ "error": "authentication failed" }));
    }
}

#[tokio::test]
async fn test_expired_access_token_rejected() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;

    app.clock.advance(Duration::minutes(61));
    let response = app.send(get_with_bearer("/v1/profile", &pair.access_token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_keys_require_permission() {
    let app = setup_test_app().await;

    let admin = app.login_pair(ADMIN_EMAIL).await;
    let response = app.send(get_with_bearer("/v1/keys", &admin.access_token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["current"], NEW_KID);
    assert_eq!(response.body["keys"], json!([OLD_KID, NEW_KID]));

    let player = app.login_pair(PLAYER_EMAIL).await;
    let response = app.send(get_with_bearer("/v1/keys", &player.access_token)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, json!({ "error": "permission denied" }));

    let response = app.send(get("/v1/keys")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_silent_reauthentication() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;

    // Access token expired, refresh token active
    app.clock.advance(Duration::minutes(70));
    let response = app.send(with_cookies("GET", "/v1/profile", &pair)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], PLAYER_EMAIL);

    let access = response.set_cookie("access_token").unwrap();
    let renewed = access
        .trim_start_matches("access_token=")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert_ne!(renewed, pair.access_token);

    let claims = app.state.verifier.verify(&renewed).unwrap();
    let original = app.state.verifier.parse(&pair.access_token).unwrap();
    assert_ne!(claims.jti, original.jti);
    assert_eq!(claims.sub, original.sub);
    assert!(response.set_cookie("refresh_token").is_some());
}

#[tokio::test]
async fn test_refresh_token_expired() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;

    app.clock.advance(Duration::hours(3));
    let response = app.send(with_cookies("GET", "/v1/profile", &pair)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookies().is_empty());
}

#[tokio::test]
async fn test_explicit_reauthenticate() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;

    let response = app.send(with_cookies("POST", "/v1/reauthenticate", &pair)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({ "error": "authentication failed" }));

    // Inside the overlap window both tokens are valid
    app.clock.advance(Duration::minutes(50));
    let response = app.send(with_cookies("POST", "/v1/reauthenticate", &pair)).await;
    assert_eq!(response.status, StatusCode::OK);

    let renewed = response.token_pair();
    assert_ne!(renewed.access_token, pair.access_token);
    assert!(app.state.verifier.verify(&renewed.access_token).is_ok());
    assert_eq!(response.set_cookies().len(), 2);
}

#[tokio::test]
async fn test_reauthenticate_requires_refresh_cookie() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;
    app.clock.advance(Duration::minutes(50));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/reauthenticate")
        .header(header::AUTHORIZATION, format!("Bearer {}", pair.access_token))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = setup_test_app().await;
    let pair = app.login_pair(PLAYER_EMAIL).await;

    let response = app.send(with_cookies("POST", "/v1/logout", &pair)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "success": true }));

    for name in ["access_token", "refresh_token"] {
        let cookie = response.set_cookie(name).unwrap();
        assert!(cookie.starts_with(&format!("{name}=;")), "cookie {cookie}");
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Domain=localhost"));
    }
}

#[tokio::test]
async fn test_register_success() {
    let app = setup_test_app().await;

    let response = app
        .register(json!({
            "name": "  Grace Hopper ",
            "email": "grace@example.com",
            "password": "compilers1952",
        }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.body,
        json!({
            "id": 3,
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "role": "Player",
        })
    );
    assert!(response.set_cookies().is_empty());

    let login = app.login("grace@example.com", "compilers1952").await;
    assert_eq!(login.status, StatusCode::OK);
    let claims = app.state.verifier.verify(&login.token_pair().access_token).unwrap();
    assert_eq!(claims.role, "Player");
}

#[tokio::test]
async fn test_register_existing_user() {
    let app = setup_test_app().await;

    let response = app
        .register(json!({
            "name": "Someone Else",
            "email": PLAYER_EMAIL,
            "password": "another-password",
        }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "error": "user already exists" }));

    // The original account is untouched
    assert_eq!(app.login(PLAYER_EMAIL, PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_validation() {
    let app = setup_test_app().await;

    let response = app
        .register(json!({
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "password": "short",
        }))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body,
        json!({ "error": "password must be at least 8 characters" })
    );

    let response = app
        .register(json!({
            "name": "   ",
            "email": "grace@example.com",
            "password": "compilers1952",
        }))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body, json!({ "error": "name is required" }));

    let response = app
        .register(json!({ "email": "grace@example.com", "password": "compilers1952" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "error": "name is required" }));
}

#[tokio::test]
async fn test_wrong_method_is_json_405() {
    let app = setup_test_app().await;

    for request in [
        get("/v1/login"),
        Request::builder()
            .method("POST")
            .uri("/v1/profile")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .method("DELETE")
            .uri("/healthz")
            .body(Body::empty())
            .unwrap(),
    ] {
        let response = app.send(request).await;
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.body, json!({ "error": "method not allowed" }));
    }
}
