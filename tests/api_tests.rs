/// End-to-end API tests driving the router directly
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use craftlink::{
    config::{AuthConfig, IdentityConfig, LoggingConfig, ServerConfig, ServiceConfig, StorageConfig},
    context::AppContext,
    db,
    error::{ApiError, ApiResult},
    identity::{FederatedIdentity, IdentityVerifier},
    image_store::{DiskImageBackend, ImageStore},
    server::build_router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Accepts the token "good-google-token" as a fixed identity
struct FakeVerifier;

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify_id_token(&self, id_token: &str) -> ApiResult<FederatedIdentity> {
        if id_token == "good-google-token" {
            Ok(FederatedIdentity {
                email: "Fed@Example.com".to_string(),
                fullname: "Fed Erated".to_string(),
                picture: Some("https://lh3.googleusercontent.com/a/fed-pic".to_string()),
            })
        } else {
            Err(ApiError::Authentication(
                "Federated token rejected by provider".to_string(),
            ))
        }
    }
}

fn test_server_config(image_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "localhost".to_string(),
            port: 0,
            version: "0.1.0".to_string(),
            public_url: "http://localhost:8000".to_string(),
        },
        storage: StorageConfig {
            data_directory: image_dir.clone(),
            database: image_dir.join("unused.sqlite"),
            image_directory: image_dir,
            image_upload_limit: 1024 * 1024,
            image_upload_timeout: 5,
        },
        authentication: AuthConfig {
            access_token_secret: "integration-access-secret-0123456789".to_string(),
            refresh_token_secret: "integration-refresh-secret-012345678".to_string(),
            access_token_lifetime_days: 10,
            refresh_token_lifetime_days: 10,
        },
        identity: IdentityConfig {
            google_client_id: "test-client".to_string(),
            google_tokeninfo_url: "http://unused".to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
        },
    }
}

async fn test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_server_config(dir.path().to_path_buf());

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();

    let images = ImageStore::new(
        Arc::new(DiskImageBackend::new(dir.path().to_path_buf())),
        &config.storage,
        &config.service,
    );

    let ctx = AppContext::from_parts(config, pool, Arc::new(FakeVerifier), images);
    (build_router(ctx), dir)
}

async fn send_json(app: &Router, method: &str, path: &str, body: Value) -> (StatusCode, Value) {
    send(app, method, path, None, body).await
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn register_body(email: &str) -> Value {
    json!({
        "fullname": "Inte Gration",
        "email": email,
        "password": "long-enough-password",
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, "GET", "/health", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_strips_credentials_from_body() {
    let (app, _dir) = test_app().await;

    let (status, body) =
        send_json(&app, "POST", "/api/v1/register", register_body("a@x.com")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());

    let raw = body.to_string();
    assert!(!raw.contains("passwordHash"));
    assert!(!raw.contains("password_hash"));
    assert!(!raw.contains("argon2"));
    // The refresh token appears only as the issued credential, never inside
    // the user projection
    assert!(body["user"]["refreshToken"].is_null());
}

#[tokio::test]
async fn test_duplicate_email_registration() {
    let (app, _dir) = test_app().await;

    let (status, _) = send_json(&app, "POST", "/api/v1/register", register_body("d@x.com")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        send_json(&app, "POST", "/api/v1/register", register_body("D@x.com")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DuplicateEmail");
}

#[tokio::test]
async fn test_login_failures_identical_shape() {
    let (app, _dir) = test_app().await;
    send_json(&app, "POST", "/api/v1/register", register_body("real@x.com")).await;

    let (s1, b1) = send_json(
        &app,
        "POST",
        "/api/v1/login",
        json!({"email": "real@x.com", "password": "wrong-password-here"}),
    )
    .await;
    let (s2, b2) = send_json(
        &app,
        "POST",
        "/api/v1/login",
        json!({"email": "ghost@x.com", "password": "wrong-password-here"}),
    )
    .await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s1, s2);
    assert_eq!(b1, b2);
}

#[tokio::test]
async fn test_register_login_refresh_lifecycle() {
    let (app, _dir) = test_app().await;

    let (_, registered) =
        send_json(&app, "POST", "/api/v1/register", register_body("life@x.com")).await;
    let registration_refresh = registered["refreshToken"].as_str().unwrap().to_string();

    // Login rotates to a different refresh token
    let (status, logged_in) = send_json(
        &app,
        "POST",
        "/api/v1/login",
        json!({"email": "life@x.com", "password": "long-enough-password"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let login_refresh = logged_in["refreshToken"].as_str().unwrap();
    assert_ne!(login_refresh, registration_refresh);

    // The registration-era refresh token is now stale
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/refresh",
        json!({"refreshToken": registration_refresh}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "InvalidRefreshToken");

    // The login-era one works, once
    let (status, rotated) = send_json(
        &app,
        "POST",
        "/api/v1/refresh",
        json!({"refreshToken": login_refresh}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(rotated["refreshToken"].is_string());

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/refresh",
        json!({"refreshToken": login_refresh}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_me_requires_valid_access_token() {
    let (app, _dir) = test_app().await;
    let (_, registered) =
        send_json(&app, "POST", "/api/v1/register", register_body("me@x.com")).await;
    let access = registered["accessToken"].as_str().unwrap();

    let (status, body) = send(&app, "GET", "/api/v1/me", Some(access), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "me@x.com");

    // Missing header is 401; a forged token is 403
    let (status, _) = send(&app, "GET", "/api/v1/me", None, Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/v1/me", Some("garbage"), Value::Null).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "SessionExpired");
}

#[tokio::test]
async fn test_update_user_sparse() {
    let (app, _dir) = test_app().await;
    let (_, registered) =
        send_json(&app, "POST", "/api/v1/register", register_body("up@x.com")).await;
    let access = registered["accessToken"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        "/api/v1/update-user",
        Some(access),
        json!({"bio": "new bio"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["bio"], "new bio");
    assert_eq!(updated["fullname"], "Inte Gration");
}

#[tokio::test]
async fn test_google_auth_upsert() {
    let (app, _dir) = test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/auth/google",
        json!({"token": "good-google-token"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["isNewAccount"], true);
    assert_eq!(body["user"]["email"], "fed@example.com");
    // Provider picture URLs come back as-is, not rewritten to the image route
    assert_eq!(
        body["user"]["image"],
        "https://lh3.googleusercontent.com/a/fed-pic"
    );

    // Second login lands in the same account
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/auth/google",
        json!({"token": "good-google-token"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isNewAccount"], false);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/auth/google",
        json!({"token": "bad-token"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_is_available() {
    let (app, _dir) = test_app().await;
    send_json(&app, "POST", "/api/v1/register", register_body("taken@x.com")).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/isAvailable",
        json!({"email": "TAKEN@x.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);

    let (_, body) = send_json(
        &app,
        "POST",
        "/api/v1/isAvailable",
        json!({"email": "free@x.com"}),
    )
    .await;
    assert_eq!(body["available"], true);
}

fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, content_type, data)) = file {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

async fn send_multipart(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (StatusCode, Value) {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder
        .body(Body::from(multipart_body(boundary, fields, file)))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn count_files(dir: &std::path::Path) -> usize {
    let mut n = 0;
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            n += count_files(&path);
        } else {
            n += 1;
        }
    }
    n
}

#[tokio::test]
async fn test_register_with_image_stores_and_serves() {
    let (app, _dir) = test_app().await;
    let png: &[u8] = b"\x89PNG\r\n\x1a\nfakepixels";

    let (status, body) = send_multipart(
        &app,
        "POST",
        "/api/v1/register-with-image",
        None,
        &[
            ("fullname", "Pic Owner"),
            ("email", "pic@x.com"),
            ("password", "long-enough-password"),
        ],
        Some(("avatar.png", "image/png", png)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The response carries a fetchable URL, not the bare stored name
    let image_url = body["user"]["image"].as_str().unwrap();
    let path = image_url.strip_prefix("http://localhost:8000").unwrap();
    assert!(path.starts_with("/api/v1/images/"));

    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "image/png"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], png);
}

#[tokio::test]
async fn test_register_with_image_discards_upload_on_conflict() {
    let (app, dir) = test_app().await;
    send_json(&app, "POST", "/api/v1/register", register_body("dup-pic@x.com")).await;

    let png: &[u8] = b"\x89PNG\r\n\x1a\nfakepixels";
    let (status, body) = send_multipart(
        &app,
        "POST",
        "/api/v1/register-with-image",
        None,
        &[
            ("fullname", "Dup Licate"),
            ("email", "dup-pic@x.com"),
            ("password", "long-enough-password"),
        ],
        Some(("avatar.png", "image/png", png)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DuplicateEmail");

    // The orphaned upload was cleaned out of the store
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn test_missing_json_fields_use_error_taxonomy() {
    let (app, _dir) = test_app().await;

    // Body missing the password field entirely
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/login",
        json!({"email": "x@x.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_become_contractor_validation_and_success() {
    let (app, _dir) = test_app().await;
    let (_, registered) =
        send_json(&app, "POST", "/api/v1/register", register_body("con@x.com")).await;
    let access = registered["accessToken"].as_str().unwrap();
    let id = registered["user"]["id"].as_str().unwrap();

    // Missing price
    let (status, body) = send_multipart(
        &app,
        "POST",
        &format!("/api/v1/user/{}/become-contractor", id),
        Some(access),
        &[
            ("service", "Plumbing"),
            ("unit", "hour"),
            ("about", "I fix pipes"),
        ],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");

    // Full set
    let (status, body) = send_multipart(
        &app,
        "POST",
        &format!("/api/v1/user/{}/become-contractor", id),
        Some(access),
        &[
            ("service", "Plumbing"),
            ("subServices", "drains, heating"),
            ("price", "40"),
            ("unit", "hour"),
            ("about", "I fix pipes"),
        ],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isContractor"], true);
    assert_eq!(body["subServices"], json!(["drains", "heating"]));

    // Now discoverable through the directory
    let (status, listing) = send_json(
        &app,
        "GET",
        "/api/v1/contractors?service=Plumbing",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn test_posts_and_engagement_over_http() {
    let (app, _dir) = test_app().await;

    let (_, contractor) =
        send_json(&app, "POST", "/api/v1/register", register_body("pro@x.com")).await;
    let contractor_access = contractor["accessToken"].as_str().unwrap();
    let contractor_id = contractor["user"]["id"].as_str().unwrap().to_string();
    send_multipart(
        &app,
        "POST",
        &format!("/api/v1/user/{}/become-contractor", contractor_id),
        Some(contractor_access),
        &[
            ("service", "Roofing"),
            ("price", "55"),
            ("unit", "hour"),
            ("about", "roofs"),
        ],
        None,
    )
    .await;

    let (_, customer) =
        send_json(&app, "POST", "/api/v1/register", register_body("cust@x.com")).await;
    let access = customer["accessToken"].as_str().unwrap();

    let (status, post) = send(
        &app,
        "POST",
        "/api/v1/posts",
        Some(access),
        json!({"contractorId": contractor_id, "text": "solid work", "rating": 4}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = post["id"].as_str().unwrap();

    // The rating aggregate moved off the default
    let (_, details) = send_json(
        &app,
        "GET",
        &format!("/api/v1/contractors/{}", contractor_id),
        Value::Null,
    )
    .await;
    assert_eq!(details["reviewCount"], 1);
    assert_eq!(details["rating"], 4.0);

    // Like once, not twice
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/posts/{}/likes", post_id),
        Some(access),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/posts/{}/likes", post_id),
        Some(access),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Comment and author-only edit
    let (status, comment) = send(
        &app,
        "POST",
        &format!("/api/v1/posts/{}/comments", post_id),
        Some(access),
        json!({"text": "agreed"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = comment["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/comments/{}", comment_id),
        Some(contractor_access),
        json!({"text": "hijacked"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bookmarks_over_http() {
    let (app, _dir) = test_app().await;

    let (_, contractor) =
        send_json(&app, "POST", "/api/v1/register", register_body("bm-pro@x.com")).await;
    let contractor_id = contractor["user"]["id"].as_str().unwrap().to_string();
    send_multipart(
        &app,
        "POST",
        &format!("/api/v1/user/{}/become-contractor", contractor_id),
        Some(contractor["accessToken"].as_str().unwrap()),
        &[
            ("service", "Painting"),
            ("price", "35"),
            ("unit", "hour"),
            ("about", "paint"),
        ],
        None,
    )
    .await;

    let (_, customer) =
        send_json(&app, "POST", "/api/v1/register", register_body("bm@x.com")).await;
    let access = customer["accessToken"].as_str().unwrap();

    let (status, toggled) = send(
        &app,
        "POST",
        "/api/v1/bookmarks",
        Some(access),
        json!({"contractorId": contractor_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["bookmarked"], true);

    let (_, listed) = send(&app, "GET", "/api/v1/bookmarks", Some(access), Value::Null).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["contractors"][0]["id"], contractor_id.as_str());

    let (_, toggled) = send(
        &app,
        "POST",
        "/api/v1/bookmarks",
        Some(access),
        json!({"contractorId": contractor_id}),
    )
    .await;
    assert_eq!(toggled["bookmarked"], false);
}

#[tokio::test]
async fn test_notices_and_bulk_register() {
    let (app, _dir) = test_app().await;

    let (status, ack) = send_json(
        &app,
        "POST",
        "/api/v1/help",
        json!({"name": "A Person", "userId": "user-1", "message": "stuck on login"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["received"], true);

    let (status, outcomes) = send_json(
        &app,
        "POST",
        "/api/v1/bulk-register",
        json!([
            {"fullname": "One", "email": "one@x.com", "password": "long-enough-password"},
            {"fullname": "Two", "email": "one@x.com", "password": "long-enough-password"},
            {"fullname": "Three", "email": "three@x.com", "password": "long-enough-password"}
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(outcomes[0]["success"], true);
    assert_eq!(outcomes[1]["success"], false);
    assert_eq!(outcomes[2]["success"], true);
}

#[tokio::test]
async fn test_delete_user_self_only() {
    let (app, _dir) = test_app().await;

    let (_, alice) =
        send_json(&app, "POST", "/api/v1/register", register_body("alice@x.com")).await;
    let (_, bob) = send_json(&app, "POST", "/api/v1/register", register_body("bob@x.com")).await;
    let alice_access = alice["accessToken"].as_str().unwrap();
    let bob_id = bob["user"]["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/delete-user/{}", bob_id),
        Some(alice_access),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let alice_id = alice["user"]["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/v1/delete-user/{}", alice_id),
        Some(alice_access),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    // The session token now points at nothing
    let (status, _) = send(&app, "GET", "/api/v1/me", Some(alice_access), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
