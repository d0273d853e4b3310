//! Order lifecycle through the router: duplicate guard, payment, acceptance,
//! cancellation, and payment intents.

use axum::http::StatusCode;
use serde_json::{Value, json};
use tool_market_core::Role;
use tool_market_integration_tests::TestApp;
use tool_market_server::db::Store;

fn drill_for(email: &str) -> Value {
    json!({ "toolName": "Drill", "email": email, "price": 10 })
}

fn id_of(body: &Value) -> String {
    body["_id"]
        .as_str()
        .expect("record has an _id")
        .to_owned()
}

/// Place the drill order for `email` and return the order JSON.
async fn place_drill(app: &TestApp, token: &str, email: &str) -> Value {
    let resp = app.post("/orders", Some(token), drill_for(email)).await;
    assert!(resp.status.is_success(), "place failed: {:?}", resp.body);
    resp.body["order"].clone()
}

// ============================================================================
// Placing orders
// ============================================================================

#[tokio::test]
async fn test_duplicate_order_returns_original() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    let first = app.post("/orders", Some(&token), drill_for("a@x.com")).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["success"], true);
    assert_eq!(first.body["order"]["paid"], false);
    assert!(first.body["order"].get("adminAccept").is_none());

    let second = app.post("/orders", Some(&token), drill_for("a@x.com")).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["success"], false);
    assert_eq!(second.body["order"], first.body["order"]);

    assert_eq!(app.store().list_orders().await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_orders_insert_once() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    let (a, b) = tokio::join!(
        app.post("/orders", Some(&token), drill_for("a@x.com")),
        app.post("/orders", Some(&token), drill_for("a@x.com")),
    );
    let successes = [&a, &b]
        .iter()
        .filter(|r| r.body["success"] == true)
        .count();
    assert_eq!(successes, 1);
    assert_eq!(app.store().list_orders().await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_order_for_another_purchaser_is_forbidden() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    let resp = app.post("/orders", Some(&token), drill_for("b@x.com")).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert!(app.store().list_orders().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_invalid_order_body_is_bad_request() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    let resp = app
        .post("/orders", Some(&token), json!({ "email": "a@x.com", "price": 10 }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post(
            "/orders",
            Some(&token),
            json!({ "toolName": "Drill", "email": "a@x.com", "price": 10, "quantity": 0 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unstorable_order_price_is_bad_request() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    for price in ["10.005", "99999999999999999999"] {
        let resp = app
            .post(
                "/orders",
                Some(&token),
                json!({ "toolName": "Drill", "email": "a@x.com", "price": price }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "price {price}");
    }
    assert!(app.store().list_orders().await.expect("list").is_empty());
}

// ============================================================================
// Listing and reading
// ============================================================================

#[tokio::test]
async fn test_list_orders_requires_matching_identity() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");
    place_drill(&app, &token, "a@x.com").await;

    let own = app.get("/orders?email=a@x.com", Some(&token)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body.as_array().map(Vec::len), Some(1));

    let other = app.get("/orders?email=b@x.com", Some(&token)).await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    let missing = app.get("/orders", Some(&token)).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_order_owner_or_admin() {
    let app = TestApp::new();
    let owner = app.token_for("a@x.com");
    let order = place_drill(&app, &owner, "a@x.com").await;
    let uri = format!("/orders/{}", id_of(&order));

    assert_eq!(app.get(&uri, Some(&owner)).await.status, StatusCode::OK);

    let stranger = app.token_for("b@x.com");
    assert_eq!(
        app.get(&uri, Some(&stranger)).await.status,
        StatusCode::FORBIDDEN
    );

    let admin = app.register("root@x.com", Role::Admin).await;
    assert_eq!(app.get(&uri, Some(&admin)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_order_id_is_bad_request() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    let resp = app.get("/orders/64b7f0c2e4b0a1a2b3c4d5e6", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .patch(
            "/orders/not-an-id",
            Some(&token),
            Some(json!({ "transactionId": "tx1" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    let resp = app
        .get("/orders/6f1c3a52-1d5e-4c4f-9a49-2f3b8d7e0a11", Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Payment confirmation
// ============================================================================

#[tokio::test]
async fn test_payment_confirmation_records_payment() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");
    let order = place_drill(&app, &token, "a@x.com").await;
    let id = id_of(&order);

    let resp = app
        .patch(
            &format!("/orders/{id}"),
            Some(&token),
            Some(json!({ "transactionId": "tx1" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["paid"], true);
    assert_eq!(resp.body["transactionId"], "tx1");

    let admin = app.register("root@x.com", Role::Admin).await;
    let payments = app
        .get(&format!("/admin/orders/{id}/payments"), Some(&admin))
        .await;
    assert_eq!(payments.status, StatusCode::OK);
    assert_eq!(payments.body.as_array().map(Vec::len), Some(1));
    assert_eq!(payments.body[0]["transactionId"], "tx1");
    assert_eq!(payments.body[0]["email"], "a@x.com");
}

#[tokio::test]
async fn test_repeat_payment_same_transaction_is_idempotent() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");
    let id = id_of(&place_drill(&app, &token, "a@x.com").await);
    let uri = format!("/orders/{id}");
    let body = json!({ "transactionId": "tx1" });

    let first = app.patch(&uri, Some(&token), Some(body.clone())).await;
    let second = app.patch(&uri, Some(&token), Some(body)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body, first.body);

    let conflict = app
        .patch(&uri, Some(&token), Some(json!({ "transactionId": "tx2" })))
        .await;
    assert_eq!(conflict.status, StatusCode::CONFLICT);

    let order_id = id.parse().expect("uuid id");
    assert_eq!(
        app.store()
            .list_payments_for(order_id)
            .await
            .expect("payments")
            .len(),
        1
    );
}

#[tokio::test]
async fn test_only_purchaser_confirms_payment() {
    let app = TestApp::new();
    let owner = app.token_for("a@x.com");
    let id = id_of(&place_drill(&app, &owner, "a@x.com").await);

    let admin = app.register("root@x.com", Role::Admin).await;
    let resp = app
        .patch(
            &format!("/orders/{id}"),
            Some(&admin),
            Some(json!({ "transactionId": "tx1" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blank_transaction_is_bad_request() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");
    let id = id_of(&place_drill(&app, &token, "a@x.com").await);

    let resp = app
        .patch(
            &format!("/orders/{id}"),
            Some(&token),
            Some(json!({ "transactionId": "  " })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Admin acceptance and cancellation
// ============================================================================

#[tokio::test]
async fn test_admin_accepts_unpaid_order() {
    let app = TestApp::new();
    let owner = app.token_for("a@x.com");
    let id = id_of(&place_drill(&app, &owner, "a@x.com").await);
    let admin = app.register("root@x.com", Role::Admin).await;

    let resp = app
        .patch(&format!("/admin/orders/{id}"), Some(&admin), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["adminAccept"], true);
    assert_eq!(resp.body["paid"], false);

    let all = app.get("/admin/orders", Some(&admin)).await;
    assert_eq!(all.body.as_array().map(Vec::len), Some(1));

    let resp = app
        .patch(&format!("/admin/orders/{id}"), Some(&owner), None)
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_accepting_missing_order_is_not_found() {
    let app = TestApp::new();
    let admin = app.register("root@x.com", Role::Admin).await;

    let resp = app
        .patch(
            "/admin/orders/6f1c3a52-1d5e-4c4f-9a49-2f3b8d7e0a11",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_keeps_payment_log() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");
    let id = id_of(&place_drill(&app, &token, "a@x.com").await);
    let uri = format!("/orders/{id}");

    app.patch(&uri, Some(&token), Some(json!({ "transactionId": "tx1" })))
        .await;

    let stranger = app.token_for("b@x.com");
    assert_eq!(
        app.delete(&uri, Some(&stranger)).await.status,
        StatusCode::FORBIDDEN
    );

    let resp = app.delete(&uri, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(app.get(&uri, Some(&token)).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, Some(&token)).await.status, StatusCode::NOT_FOUND);

    let admin = app.register("root@x.com", Role::Admin).await;
    let payments = app
        .get(&format!("/admin/orders/{id}/payments"), Some(&admin))
        .await;
    assert_eq!(payments.body.as_array().map(Vec::len), Some(1));

    // The pair is free again once the order is gone.
    let again = app.post("/orders", Some(&token), drill_for("a@x.com")).await;
    assert_eq!(again.body["success"], true);
}

// ============================================================================
// Payment intents
// ============================================================================

#[tokio::test]
async fn test_payment_intent_in_cents() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    let resp = app
        .post("/create-payment-intent", Some(&token), json!({ "price": "12.34" }))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["clientSecret"], "pi_test_1234_secret");
    assert_eq!(app.payments.calls().await, vec![(1234, "usd".to_owned())]);
}

#[tokio::test]
async fn test_payment_intent_rejects_bad_prices() {
    let app = TestApp::new();
    let token = app.token_for("a@x.com");

    for price in [json!(0), json!("-5"), json!("1.005")] {
        let resp = app
            .post("/create-payment-intent", Some(&token), json!({ "price": price }))
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "price {price}");
    }
    assert!(app.payments.calls().await.is_empty());

    let resp = app
        .post("/create-payment-intent", None, json!({ "price": 10 }))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
