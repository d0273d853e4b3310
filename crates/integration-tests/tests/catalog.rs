//! Tools, reviews, profiles, and service endpoints through the router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tool_market_core::Role;
use tool_market_integration_tests::TestApp;

// ============================================================================
// Service endpoints
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let resp = app.get("/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");

    assert_eq!(app.get("/health/ready", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .expect("request must build");
    let resp = app.send(request).await;
    assert_eq!(
        resp.headers.get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-123")
    );

    let resp = app.get("/health", None).await;
    assert!(resp.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();
    assert_eq!(app.get("/nope", None).await.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Tools
// ============================================================================

#[tokio::test]
async fn test_tool_lifecycle() {
    let app = TestApp::new();
    let admin = app.register("root@x.com", Role::Admin).await;

    let created = app
        .post(
            "/tools",
            Some(&admin),
            json!({
                "name": "Cordless Drill",
                "description": "18V brushless",
                "price": "89.99",
                "minOrderQuantity": 10,
                "availableQuantity": 500
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["name"], "Cordless Drill");
    assert_eq!(created.body["minOrderQuantity"], 10);
    let id = created.body["_id"].as_str().expect("tool id").to_owned();

    let list = app.get("/tools", None).await;
    assert_eq!(list.body.as_array().map(Vec::len), Some(1));

    let one = app.get(&format!("/tools/{id}"), None).await;
    assert_eq!(one.status, StatusCode::OK);
    assert_eq!(one.body["_id"], id.as_str());

    let deleted = app.delete(&format!("/tools/{id}"), Some(&admin)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        app.get(&format!("/tools/{id}"), None).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.delete(&format!("/tools/{id}"), Some(&admin)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_tool_writes_require_admin() {
    let app = TestApp::new();
    let user = app.register("a@x.com", Role::User).await;
    let body = json!({ "name": "Saw", "price": 5, "availableQuantity": 10 });

    assert_eq!(
        app.post("/tools", None, body.clone()).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.post("/tools", Some(&user), body).await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_invalid_tool_is_bad_request() {
    let app = TestApp::new();
    let admin = app.register("root@x.com", Role::Admin).await;

    let resp = app
        .post(
            "/tools",
            Some(&admin),
            json!({ "name": "Saw", "price": 5, "minOrderQuantity": 20, "availableQuantity": 10 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post(
            "/tools",
            Some(&admin),
            json!({ "name": "Saw", "price": "5.125", "availableQuantity": 10 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    assert_eq!(
        app.get("/tools/not-an-id", None).await.status,
        StatusCode::BAD_REQUEST
    );
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn test_reviews_newest_first_and_authored_by_caller() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    for comment in ["first", "second"] {
        let resp = app
            .post(
                "/reviews",
                Some(&token),
                json!({ "rating": 4, "comment": comment, "email": "someone@else.com" }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
        assert_eq!(resp.body["email"], "a@x.com");
    }

    let list = app.get("/reviews", None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body[0]["comment"], "second");
    assert_eq!(list.body[1]["comment"], "first");
}

#[tokio::test]
async fn test_review_rating_bounds() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    let resp = app
        .post("/reviews", Some(&token), json!({ "rating": 6, "comment": "wow" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Profiles
// ============================================================================

#[tokio::test]
async fn test_profile_upsert_and_read() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    assert_eq!(
        app.get("/profile/a@x.com", Some(&token)).await.status,
        StatusCode::NOT_FOUND
    );

    let resp = app
        .put(
            "/profile_update/a@x.com",
            Some(&token),
            json!({ "name": "Ann", "location": "Dhaka" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    app.put(
        "/profile_update/a@x.com",
        Some(&token),
        json!({ "location": "Chittagong" }),
    )
    .await;

    let profile = app.get("/profile/a@x.com", Some(&token)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["name"], "Ann");
    assert_eq!(profile.body["location"], "Chittagong");
}

#[tokio::test]
async fn test_profile_of_someone_else_is_forbidden() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    assert_eq!(
        app.get("/profile/b@x.com", Some(&token)).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.put("/profile_update/b@x.com", Some(&token), json!({ "name": "Bob" }))
            .await
            .status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get("/profile/a@x.com", None).await.status,
        StatusCode::UNAUTHORIZED
    );
}
