//! Router-level tests for the session endpoints against a mocked identity service.

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::handlers::test_support::{json_body, request, set_cookies, test_app, UNREACHABLE};
use crate::token::test_tokens::{claims, sign, token, SECRET};

fn tokens_body(access: &str) -> Value {
    json!({
        "success": true,
        "data": {"tokens": {"access_token": access, "refresh_token": "refresh-1"}}
    })
}

fn clears_both(cookies: &[String]) -> bool {
    cookies.len() == 2 && cookies.iter().all(|cookie| cookie.contains("Max-Age=0"))
}

#[tokio::test]
async fn login_sets_cookies_and_returns_user() {
    let server = MockServer::start().await;
    let access = token("u-1", "Admin");
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"login": "anna", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body(&access)))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&server.uri(), UNREACHABLE);
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"login": "anna", "password": "pw"})),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with(&format!("access_token={access};")));
    assert!(cookies[1].starts_with("refresh_token=refresh-1;"));

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["userId"], "u-1");
    assert_eq!(body["data"]["role"], "Admin");
}

#[tokio::test]
async fn login_validates_before_calling_upstream() {
    let app = test_app(UNREACHABLE, UNREACHABLE);
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"login": "anna", "password": "  "})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "data": "Login and password required"})
    );
}

#[tokio::test]
async fn login_rejects_unreadable_body() {
    let app = test_app(UNREACHABLE, UNREACHABLE);
    let response = app
        .router
        .oneshot(request("POST", "/api/auth/login", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_relays_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Bad credentials"})))
        .mount(&server)
        .await;

    let app = test_app(&server.uri(), UNREACHABLE);
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"login": "anna", "password": "pw"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "data": "Bad credentials"})
    );
}

#[tokio::test]
async fn register_sends_admin_role() {
    let server = MockServer::start().await;
    let access = token("u-9", "Admin");
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "name": "Anna",
            "login": "anna",
            "email": "anna@example.com",
            "password": "s3cret!pass",
            "confirm_password": "s3cret!pass",
            "role": "Admin"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body(&access)))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&server.uri(), UNREACHABLE);
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Anna",
                "login": "anna",
                "email": "anna@example.com",
                "password": "s3cret!pass",
                "confirm_password": "s3cret!pass"
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookies(&response).len(), 2);
    assert_eq!(json_body(response).await["data"]["userId"], "u-9");
}

#[tokio::test]
async fn register_validation_error() {
    let app = test_app(UNREACHABLE, UNREACHABLE);
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Anna",
                "login": "anna",
                "email": "anna@example.com",
                "password": "s3cret!pass",
                "confirm_password": "different!1"
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["data"], "Passwords do not match");
}

#[tokio::test]
async fn refresh_without_cookie_clears_session() {
    let app = test_app(UNREACHABLE, UNREACHABLE);
    let response = app
        .router
        .oneshot(request("POST", "/api/auth/refresh", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_both(&set_cookies(&response)));
    assert_eq!(json_body(response).await["data"], "No refresh token");
}

#[tokio::test]
async fn refresh_rotates_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refresh_token": "old-refresh"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body("new-access")))
        .mount(&server)
        .await;

    let app = test_app(&server.uri(), UNREACHABLE);
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/auth/refresh",
            Some("refresh_token=old-refresh"),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies[0].starts_with("access_token=new-access;"));
    assert_eq!(
        json_body(response).await,
        json!({"success": true, "data": "Tokens refreshed"})
    );
}

#[tokio::test]
async fn refresh_failure_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let app = test_app(&server.uri(), UNREACHABLE);
    let response = app
        .router
        .oneshot(request("POST", "/api/auth/refresh", Some("refresh_token=r"), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_both(&set_cookies(&response)));
    assert_eq!(json_body(response).await["data"], "Refresh failed");
}

#[tokio::test]
async fn logout_without_cookie() {
    let app = test_app(UNREACHABLE, UNREACHABLE);
    let response = app
        .router
        .oneshot(request("POST", "/api/auth/logout", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(clears_both(&set_cookies(&response)));
    assert_eq!(
        json_body(response).await,
        json!({"success": true, "data": "Already logged out"})
    );
}

#[tokio::test]
async fn logout_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer gone"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer broken"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let app = test_app(&server.uri(), UNREACHABLE);
    let cases = [
        ("access_token=live", StatusCode::OK, json!({"success": true, "data": "Logged out"})),
        (
            "access_token=gone",
            StatusCode::OK,
            json!({"success": true, "data": "Session already expired"}),
        ),
        (
            "access_token=broken",
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"success": false, "data": "boom"}),
        ),
    ];
    for (cookie, status, expected) in cases {
        let response = app
            .router
            .clone()
            .oneshot(request("POST", "/api/auth/logout", Some(cookie), None))
            .await
            .expect("response");
        assert_eq!(response.status(), status);
        assert!(clears_both(&set_cookies(&response)));
        assert_eq!(json_body(response).await, expected);
    }
}

#[tokio::test]
async fn me_without_cookie() {
    let app = test_app(UNREACHABLE, UNREACHABLE);
    let response = app
        .router
        .oneshot(request("GET", "/api/auth/me", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn me_with_expired_token_clears_cookies() {
    let app = test_app(UNREACHABLE, UNREACHABLE);
    let expired = sign(&claims("u-1", "Admin", -30), SECRET);
    let response = app
        .router
        .oneshot(request(
            "GET",
            "/api/auth/me",
            Some(&format!("access_token={expired}")),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_both(&set_cookies(&response)));
    assert_eq!(json_body(response).await["data"], "Token expired");
}

#[tokio::test]
async fn me_returns_upstream_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"sub": "u-1", "email": "anna@example.com", "login": "anna", "name": "Anna", "role": "Admin"}
        })))
        .mount(&server)
        .await;

    let app = test_app(&server.uri(), UNREACHABLE);
    let cookie = format!("access_token={}", token("u-1", "Admin"));
    let response = app
        .router
        .oneshot(request("GET", "/api/auth/me", Some(&cookie), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["userId"], "u-1");
    assert_eq!(body["data"]["login"], "anna");
}

#[tokio::test]
async fn me_maps_upstream_failures() {
    let cases = [
        (401, StatusCode::UNAUTHORIZED, "Session expired or invalid", true),
        (403, StatusCode::UNAUTHORIZED, "Session expired or invalid", true),
        (429, StatusCode::TOO_MANY_REQUESTS, "Too many requests", false),
        (502, StatusCode::SERVICE_UNAVAILABLE, "Failed to verify session", false),
    ];
    let cookie = format!("access_token={}", token("u-1", "Admin"));

    for (upstream, status, message, cleared) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(upstream))
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), UNREACHABLE);
        let response = app
            .router
            .oneshot(request("GET", "/api/auth/me", Some(&cookie), None))
            .await
            .expect("response");
        assert_eq!(response.status(), status);
        assert_eq!(clears_both(&set_cookies(&response)), cleared);
        assert_eq!(json_body(response).await["data"], message);
    }
}

#[tokio::test]
async fn change_password_verify_forwards_body_and_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/change-password/verify"))
        .and(body_json(json!({"code": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": "ok"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/change-password/verify"))
        .and(body_json(json!({"code": "000000"})))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"success": false, "data": "Wrong code"})),
        )
        .mount(&server)
        .await;

    let app = test_app(&server.uri(), UNREACHABLE);
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/change-password/verify",
            Some("access_token=abc"),
            Some(json!({"code": "123456"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"success": true, "data": "ok"}));

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/auth/change-password/verify",
            Some("access_token=abc"),
            Some(json!({"code": "000000"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "data": "Wrong code"})
    );
}

#[tokio::test]
async fn change_password_verify_requires_cookie() {
    let app = test_app(UNREACHABLE, UNREACHABLE);
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/auth/change-password/verify",
            None,
            Some(json!({"code": "1"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
