use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use clipshare::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single connection keeps every request on the same in-memory database.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;
    config.observability.metrics_enabled = false;
    config.auth.access_token_secret = "test-access-secret-long-enough-for-hmac".to_string();
    config.auth.refresh_token_secret = "test-refresh-secret-long-enough-for-hmac".to_string();
    config
}

async fn spawn_app() -> Router {
    spawn_app_with(test_config()).await
}

async fn spawn_app_with(config: Config) -> Router {
    let state = clipshare::api::create_app_state(config, None)
        .await
        .expect("Failed to create app state");
    clipshare::api::router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn register_body(username: &str, email: &str, password: &str) -> Value {
    json!({
        "fullName": "Test User",
        "email": email,
        "username": username,
        "password": password,
        "avatarUrl": "https://cdn.example.com/avatar.png",
    })
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> Value {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            &register_body(username, email, password),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Returns (access_token, refresh_token).
async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            &json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    (
        body["data"]["accessToken"].as_str().unwrap().to_string(),
        body["data"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

fn bearer(request: Request<Body>, token: &str) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    Request::from_parts(parts, body)
}

async fn publish_video(app: &Router, access: &str, title: &str) -> i32 {
    let request = bearer(
        post_json(
            "/api/videos",
            &json!({
                "title": title,
                "description": format!("{title} description"),
                "videoUrl": "https://cdn.example.com/v.mp4",
                "thumbnailUrl": "https://cdn.example.com/t.png",
                "duration": 42.5,
            }),
        ),
        access,
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_lowercases_username_and_rejects_duplicates() {
    let app = spawn_app().await;

    let body = register(&app, "ChaiDev", "chai@example.com", "secret1").await;
    assert_eq!(body["data"]["username"], "chaidev");
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["success"], true);

    // Same username in a different case mix
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            &register_body("CHAIDEV", "other@example.com", "secret1"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 409);

    // Same email, case-insensitively
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            &register_body("freshname", "CHAI@EXAMPLE.COM", "secret1"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_validates_input_shape() {
    let app = spawn_app().await;

    // Non-alphanumeric username
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            &register_body("chai_dev", "chai@example.com", "secret1"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());

    // Missing avatar
    let mut no_avatar = register_body("chaidev", "chai@example.com", "secret1");
    no_avatar.as_object_mut().unwrap().remove("avatarUrl");
    let response = app
        .clone()
        .oneshot(post_json("/api/users/register", &no_avatar))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Short password
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            &register_body("chaidev", "chai@example.com", "abc"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registration_response_never_leaks_secrets() {
    let app = spawn_app().await;

    let body = register(&app, "leakcheck", "leak@example.com", "secret1").await;
    let data = body["data"].as_object().unwrap();
    assert!(!data.contains_key("password"));
    assert!(!data.contains_key("passwordHash"));
    assert!(!data.contains_key("refreshToken"));
}

// ============================================================================
// Login & session transport
// ============================================================================

#[tokio::test]
async fn login_sets_httponly_cookies_and_returns_tokens() {
    let app = spawn_app().await;
    register(&app, "logincookies", "lc@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            &json!({"username": "logincookies", "password": "secret1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        // secure_cookies=false in the test config
        assert!(!cookie.contains("Secure"));
    }

    let body = body_json(response).await;
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
    let user = body["data"]["user"].as_object().unwrap();
    assert!(!user.contains_key("passwordHash"));
    assert!(!user.contains_key("refreshToken"));
}

#[tokio::test]
async fn secure_flag_follows_deployment_config() {
    let mut config = test_config();
    config.server.secure_cookies = true;
    let app = spawn_app_with(config).await;
    register(&app, "secureuser", "secure@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            &json!({"username": "secureuser", "password": "secret1"}),
        ))
        .await
        .unwrap();

    for cookie in response.headers().get_all(header::SET_COOKIE).iter() {
        assert!(cookie.to_str().unwrap().contains("Secure"));
    }
}

#[tokio::test]
async fn login_accepts_email_as_identifier() {
    let app = spawn_app().await;
    register(&app, "emaillogin", "el@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            &json!({"username": "el@example.com", "password": "secret1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let app = spawn_app().await;
    register(&app, "enumcheck", "enum@example.com", "secret1").await;

    let wrong_password = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            &json!({"username": "enumcheck", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_json(wrong_password).await;

    let no_such_user = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            &json!({"username": "ghost", "password": "whatever"}),
        ))
        .await
        .unwrap();
    assert_eq!(no_such_user.status(), StatusCode::UNAUTHORIZED);
    let no_such_user = body_json(no_such_user).await;

    // Same message for both, so the endpoint cannot enumerate accounts.
    assert_eq!(wrong_password["message"], no_such_user["message"]);
}

// ============================================================================
// Refresh rotation
// ============================================================================

#[tokio::test]
async fn refresh_rotates_and_rejects_superseded_tokens() {
    let app = spawn_app().await;
    register(&app, "rotator", "rot@example.com", "secret1").await;
    let (_, refresh1) = login(&app, "rotator", "secret1").await;

    // refresh(token1) succeeds and yields token2
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/refresh-token",
            &json!({"refreshToken": refresh1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let refresh2 = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(refresh1, refresh2);

    // refresh(token1) again fails
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/refresh-token",
            &json!({"refreshToken": refresh1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // refresh(token2) succeeds
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/refresh-token",
            &json!({"refreshToken": refresh2}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn second_login_invalidates_previous_refresh_token() {
    let app = spawn_app().await;
    register(&app, "twologins", "two@example.com", "secret1").await;

    let (_, old_refresh) = login(&app, "twologins", "secret1").await;
    let (_, new_refresh) = login(&app, "twologins", "secret1").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/refresh-token",
            &json!({"refreshToken": old_refresh}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/refresh-token",
            &json!({"refreshToken": new_refresh}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_accepts_cookie_with_precedence_over_body() {
    let app = spawn_app().await;
    register(&app, "cookierefresh", "cr@example.com", "secret1").await;
    let (_, refresh) = login(&app, "cookierefresh", "secret1").await;

    // Valid cookie + garbage body field: the cookie must win.
    let request = Request::builder()
        .method("POST")
        .uri("/api/users/refresh-token")
        .header("Content-Type", "application/json")
        .header(header::COOKIE, format!("refreshToken={refresh}"))
        .body(Body::from(
            serde_json::to_string(&json!({"refreshToken": "garbage"})).unwrap(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_token_is_unauthorized() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/refresh-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_refresh_token_is_rejected() {
    let app = spawn_app().await;
    register(&app, "forgery", "forge@example.com", "secret1").await;
    let (access, _) = login(&app, "forgery", "secret1").await;

    // An access token is signed with the wrong secret for this endpoint.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/refresh-token",
            &json!({"refreshToken": access}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn logout_clears_session_and_cookies() {
    let app = spawn_app().await;
    register(&app, "leaver", "leave@example.com", "secret1").await;
    let (access, refresh) = login(&app, "leaver", "secret1").await;

    let request = bearer(
        Request::builder()
            .method("POST")
            .uri("/api/users/logout")
            .body(Body::empty())
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    for cookie in &cookies {
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
    }

    // A refresh attempt immediately after logout fails.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/refresh-token",
            &json!({"refreshToken": refresh}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Access-token gate
// ============================================================================

#[tokio::test]
async fn protected_routes_require_a_valid_access_token() {
    let app = spawn_app().await;
    register(&app, "gated", "gate@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 401);
    assert_eq!(body["success"], false);

    let response = app
        .clone()
        .oneshot(bearer(
            Request::builder()
                .uri("/api/users/me")
                .body(Body::empty())
                .unwrap(),
            "not-a-token",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (access, _) = login(&app, "gated", "secret1").await;
    let response = app
        .clone()
        .oneshot(bearer(
            Request::builder()
                .uri("/api/users/me")
                .body(Body::empty())
                .unwrap(),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "gated");
}

#[tokio::test]
async fn access_token_cookie_also_authenticates() {
    let app = spawn_app().await;
    register(&app, "cookieauth", "ca@example.com", "secret1").await;
    let (access, _) = login(&app, "cookieauth", "secret1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header(header::COOKIE, format!("accessToken={access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Password change
// ============================================================================

#[tokio::test]
async fn password_change_requires_old_password_and_takes_effect() {
    let app = spawn_app().await;
    register(&app, "rekey", "rekey@example.com", "oldPass1").await;
    let (access, _) = login(&app, "rekey", "oldPass1").await;

    // Wrong old password
    let response = app
        .clone()
        .oneshot(bearer(
            post_json(
                "/api/users/change-password",
                &json!({"oldPassword": "nope", "newPassword": "n3wPass!"}),
            ),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct old password
    let response = app
        .clone()
        .oneshot(bearer(
            post_json(
                "/api/users/change-password",
                &json!({"oldPassword": "oldPass1", "newPassword": "n3wPass!"}),
            ),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, new one does.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            &json!({"username": "rekey", "password": "oldPass1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    login(&app, "rekey", "n3wPass!").await;
}

// ============================================================================
// Profile updates
// ============================================================================

#[tokio::test]
async fn profile_avatar_and_cover_updates_return_projected_views() {
    let app = spawn_app().await;
    register(&app, "editor", "edit@example.com", "secret1").await;
    let (access, _) = login(&app, "editor", "secret1").await;

    let request = bearer(
        Request::builder()
            .method("PATCH")
            .uri("/api/users/me")
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::to_string(
                    &json!({"fullName": "Edited Name", "email": "edited@example.com"}),
                )
                .unwrap(),
            ))
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["fullName"], "Edited Name");
    assert_eq!(body["data"]["email"], "edited@example.com");
    assert!(!body["data"].as_object().unwrap().contains_key("passwordHash"));

    let request = bearer(
        Request::builder()
            .method("PATCH")
            .uri("/api/users/avatar")
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::to_string(&json!({"avatarUrl": "https://cdn.example.com/new.png"}))
                    .unwrap(),
            ))
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["avatarUrl"], "https://cdn.example.com/new.png");
}

#[tokio::test]
async fn profile_update_rejects_taken_email() {
    let app = spawn_app().await;
    register(&app, "holder", "holder@example.com", "secret1").await;
    register(&app, "mover", "mover@example.com", "secret1").await;
    let (access, _) = login(&app, "mover", "secret1").await;

    let request = bearer(
        Request::builder()
            .method("PATCH")
            .uri("/api/users/me")
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::to_string(
                    &json!({"fullName": "Mover", "email": "holder@example.com"}),
                )
                .unwrap(),
            ))
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ============================================================================
// Channel profile aggregation
// ============================================================================

#[tokio::test]
async fn channel_profile_aggregates_counts_and_viewer_flag() {
    let app = spawn_app().await;
    register(&app, "usera", "a@example.com", "secret1").await;
    register(&app, "channelb", "b@example.com", "secret1").await;
    register(&app, "channelc", "c@example.com", "secret1").await;
    let (access_a, _) = login(&app, "usera", "secret1").await;

    // A subscribes to B and to C
    for channel in ["channelb", "channelc"] {
        let response = app
            .clone()
            .oneshot(bearer(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/channels/{channel}/subscribe"))
                    .body(Body::empty())
                    .unwrap(),
                &access_a,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["subscribed"], true);
    }

    // Viewed by A: B has 1 subscriber, 0 own subscriptions, isSubscriber=true
    let response = app
        .clone()
        .oneshot(bearer(
            Request::builder()
                .uri("/api/channels/channelb")
                .body(Body::empty())
                .unwrap(),
            &access_a,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalSubscribers"], 1);
    assert_eq!(body["data"]["totalSubscribed"], 0);
    assert_eq!(body["data"]["isSubscriber"], true);

    // Anonymous view: flag is false, not absent
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/channels/channelb")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["isSubscriber"], false);

    // A's own channel shows 2 outgoing subscriptions and no subscribers
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/channels/usera")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalSubscribed"], 2);
    assert_eq!(body["data"]["totalSubscribers"], 0);

    // A viewer with no edge sees false
    let (access_b, _) = login(&app, "channelb", "secret1").await;
    let response = app
        .clone()
        .oneshot(bearer(
            Request::builder()
                .uri("/api/channels/channelc")
                .body(Body::empty())
                .unwrap(),
            &access_b,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["isSubscriber"], false);
}

#[tokio::test]
async fn channel_profile_projects_exactly_the_public_fields() {
    let app = spawn_app().await;
    register(&app, "projcheck", "proj@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/channels/projcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    let data = body["data"].as_object().unwrap();

    let mut keys: Vec<&str> = data.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "avatarUrl",
            "coverImageUrl",
            "email",
            "fullName",
            "isSubscriber",
            "totalSubscribed",
            "totalSubscribers",
            "username",
        ]
    );
}

#[tokio::test]
async fn channel_lookup_is_case_insensitive_and_missing_channel_is_404() {
    let app = spawn_app().await;
    register(&app, "MixedCase", "mixed@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/channels/MIXEDCASE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/channels/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subscribing_to_yourself_is_rejected() {
    let app = spawn_app().await;
    register(&app, "selfsub", "self@example.com", "secret1").await;
    let (access, _) = login(&app, "selfsub", "secret1").await;

    let response = app
        .clone()
        .oneshot(bearer(
            Request::builder()
                .method("POST")
                .uri("/api/channels/selfsub/subscribe")
                .body(Body::empty())
                .unwrap(),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggling_twice_removes_the_edge() {
    let app = spawn_app().await;
    register(&app, "toggler", "tog@example.com", "secret1").await;
    register(&app, "togglee", "tee@example.com", "secret1").await;
    let (access, _) = login(&app, "toggler", "secret1").await;

    for expected in [true, false] {
        let response = app
            .clone()
            .oneshot(bearer(
                Request::builder()
                    .method("POST")
                    .uri("/api/channels/togglee/subscribe")
                    .body(Body::empty())
                    .unwrap(),
                &access,
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["subscribed"], expected);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/channels/togglee")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalSubscribers"], 0);
}

// ============================================================================
// Videos
// ============================================================================

#[tokio::test]
async fn video_mutations_are_owner_only() {
    let app = spawn_app().await;
    register(&app, "owner", "owner@example.com", "secret1").await;
    register(&app, "intruder", "intr@example.com", "secret1").await;
    let (owner_access, _) = login(&app, "owner", "secret1").await;
    let (intruder_access, _) = login(&app, "intruder", "secret1").await;

    let video_id = publish_video(&app, &owner_access, "My Video").await;

    // Someone else cannot update or delete it; existence is not advertised.
    let request = bearer(
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/videos/{video_id}"))
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::to_string(&json!({"title": "Hijacked"})).unwrap(),
            ))
            .unwrap(),
        &intruder_access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = bearer(
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/videos/{video_id}"))
            .body(Body::empty())
            .unwrap(),
        &intruder_access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The owner can.
    let request = bearer(
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/videos/{video_id}"))
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::to_string(&json!({"title": "Renamed"})).unwrap(),
            ))
            .unwrap(),
        &owner_access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Renamed");
}

#[tokio::test]
async fn toggle_publish_flips_the_flag() {
    let app = spawn_app().await;
    register(&app, "flipper", "flip@example.com", "secret1").await;
    let (access, _) = login(&app, "flipper", "secret1").await;
    let video_id = publish_video(&app, &access, "Flip Me").await;

    let request = bearer(
        Request::builder()
            .method("POST")
            .uri(format!("/api/videos/{video_id}/toggle-publish"))
            .body(Body::empty())
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["isPublished"], false);
}

#[tokio::test]
async fn video_listing_filters_sorts_and_paginates() {
    let app = spawn_app().await;
    register(&app, "lister", "list@example.com", "secret1").await;
    let (access, _) = login(&app, "lister", "secret1").await;

    publish_video(&app, &access, "Banana peeling").await;
    publish_video(&app, &access, "Apple tasting").await;
    publish_video(&app, &access, "Cherry picking").await;

    let request = bearer(
        Request::builder()
            .uri("/api/videos?sortBy=title&sortType=asc&page=1&limit=2")
            .body(Body::empty())
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let titles: Vec<&str> = body["data"]["videos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Apple tasting", "Banana peeling"]);
    assert_eq!(body["data"]["pagination"]["total"], 3);
    assert_eq!(body["data"]["pagination"]["totalPages"], 2);

    // Substring filter
    let request = bearer(
        Request::builder()
            .uri("/api/videos?search=Cherry")
            .body(Body::empty())
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 1);

    // Unknown sort key is a validation error
    let request = bearer(
        Request::builder()
            .uri("/api/videos?sortBy=views")
            .body(Body::empty())
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Watch history
// ============================================================================

#[tokio::test]
async fn watch_history_preserves_watch_order_and_hydrates_owner() {
    let app = spawn_app().await;
    register(&app, "creator", "create@example.com", "secret1").await;
    register(&app, "watcher", "watch@example.com", "secret1").await;
    let (creator_access, _) = login(&app, "creator", "secret1").await;
    let (watcher_access, _) = login(&app, "watcher", "secret1").await;

    // Insertion order: v1, v2, v3
    let v1 = publish_video(&app, &creator_access, "First uploaded").await;
    let v2 = publish_video(&app, &creator_access, "Second uploaded").await;
    let v3 = publish_video(&app, &creator_access, "Third uploaded").await;

    // Watch order: v3, v1, v2
    for id in [v3, v1, v2] {
        let request = bearer(
            Request::builder()
                .uri(format!("/api/videos/{id}"))
                .body(Body::empty())
                .unwrap(),
            &watcher_access,
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let request = bearer(
        Request::builder()
            .uri("/api/users/history")
            .body(Body::empty())
            .unwrap(),
        &watcher_access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let entries = body["data"].as_array().unwrap();
    let ids: Vec<i64> = entries.iter().map(|e| e["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![i64::from(v3), i64::from(v1), i64::from(v2)]);

    // Owner is a single hydrated object, not a list, and carries only the
    // public identity.
    let owner = &entries[0]["owner"];
    assert!(owner.is_object());
    assert_eq!(owner["username"], "creator");
    assert_eq!(owner["email"], "create@example.com");
    assert!(owner["avatarUrl"].is_string());
    assert!(!owner.as_object().unwrap().contains_key("passwordHash"));
}

#[tokio::test]
async fn empty_watch_history_is_an_empty_list() {
    let app = spawn_app().await;
    register(&app, "fresh", "fresh@example.com", "secret1").await;
    let (access, _) = login(&app, "fresh", "secret1").await;

    let request = bearer(
        Request::builder()
            .uri("/api/users/history")
            .body(Body::empty())
            .unwrap(),
        &access,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

// ============================================================================
// System
// ============================================================================

#[tokio::test]
async fn system_status_is_gated_and_health_is_public() {
    let app = spawn_app().await;
    register(&app, "sysuser", "sys@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");

    let (access, _) = login(&app, "sysuser", "secret1").await;
    let response = app
        .clone()
        .oneshot(bearer(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["users"], 1);
}
