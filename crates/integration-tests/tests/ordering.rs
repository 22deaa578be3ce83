//! Checkout and the order status lifecycle against the fake backend.
//!
//! Run with: cargo test -p forkline-integration-tests --test ordering

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use forkline_client::models::OrderFilter;
use forkline_client::{
    ApiClient, ClientError, CustomerView, NotificationLog, RestaurantView, SessionController,
    TokenStore,
};
use forkline_core::{FoodId, OrderId, OrderStatus, Price, UserId};
use forkline_integration_tests::{FakeBackend, StatusCode};
use forkline_integration_tests::fixtures::{customer, food, order, restaurant};
use secrecy::SecretString;
use serde_json::json;

async fn sign_in(backend: &FakeBackend, username: &str) -> SessionController<ApiClient> {
    let tokens = TokenStore::in_memory();
    let api = ApiClient::new(&backend.config(), tokens.clone()).unwrap();
    let mut session = SessionController::new(api, tokens);
    session.restore();
    session
        .login(username, SecretString::from("pass123"))
        .await
        .unwrap();
    session
}

async fn seeded() -> FakeBackend {
    let backend = FakeBackend::start().await;
    backend.add_account(customer(7, "jordan"), "pass123");
    backend.add_account(restaurant(3, "burgerhut", "Burger Hut"), "pass123");
    backend.add_food(food(1, 3, "Burger", 1000));
    backend.add_food(food(2, 3, "Fries", 500));
    backend
}

#[tokio::test]
async fn test_checkout_sends_cart_as_order() {
    let backend = seeded().await;
    let session = sign_in(&backend, "jordan").await;
    let log = NotificationLog::new();
    let user = session.session().user().unwrap().clone();
    let mut view = CustomerView::new(session.api().clone(), Arc::new(log.clone()), user).unwrap();
    view.refresh().await.unwrap();

    view.add_to_cart(FoodId::new(1)).unwrap();
    view.add_to_cart(FoodId::new(1)).unwrap();
    view.add_to_cart(FoodId::new(2)).unwrap();
    assert_eq!(view.cart().total(), Price::from_cents(2500));
    assert_eq!(view.cart().item_count(), 3);

    let placed = view.checkout("no onions").await.unwrap();
    assert_eq!(
        backend.last_body("order").unwrap(),
        json!({
            "note": "no onions",
            "cost": 25.0,
            "orderItems": [
                {"foodId": 1, "quantity": 2},
                {"foodId": 2, "quantity": 1}
            ]
        })
    );
    assert_eq!(placed.customer_id, UserId::new(7));
    assert_eq!(placed.status, OrderStatus::Pending);
    assert!(view.cart().is_empty());
    assert_eq!(view.orders(OrderFilter::Active).len(), 1);
    assert_eq!(
        log.last().unwrap().description,
        "Your order of 3 items for $25.00 has been placed."
    );
}

#[tokio::test]
async fn test_rejected_checkout_keeps_cart() {
    let backend = seeded().await;
    let session = sign_in(&backend, "jordan").await;
    let log = NotificationLog::new();
    let user = session.session().user().unwrap().clone();
    let mut view = CustomerView::new(session.api().clone(), Arc::new(log.clone()), user).unwrap();
    view.refresh().await.unwrap();
    view.add_to_cart(FoodId::new(2)).unwrap();

    backend.fail_next(StatusCode::BAD_REQUEST, "Invalid food IDs: [2]");
    let err = view.checkout("").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
    assert_eq!(view.cart().item_count(), 1);
    assert_eq!(log.last().unwrap().description, "Invalid food IDs: [2]");
    assert!(backend.orders().is_empty());
}

#[tokio::test]
async fn test_restaurant_walks_an_order_to_delivery() {
    let backend = seeded().await;
    backend.add_order(order(41, 7, OrderStatus::Pending, 1500, &[(1, 1), (2, 1)]));
    backend.add_order(order(42, 8, OrderStatus::Pending, 900, &[(99, 1)]));
    let session = sign_in(&backend, "burgerhut").await;
    let log = NotificationLog::new();
    let user = session.session().user().unwrap().clone();
    let mut view = RestaurantView::new(session.api().clone(), Arc::new(log.clone()), user).unwrap();
    view.refresh().await.unwrap();

    // Order 42 contains none of this restaurant's items.
    assert_eq!(view.orders(OrderFilter::All).len(), 1);

    let id = OrderId::new(41);
    for next in [OrderStatus::Ready, OrderStatus::OutForDelivery, OrderStatus::Delivered] {
        let updated = view.advance(id, next).await.unwrap();
        assert_eq!(updated.status, next);
    }
    assert_eq!(
        log.last().unwrap().description,
        "Order #41 has been delivered successfully"
    );

    let body = backend.last_body("order/41").unwrap();
    assert_eq!(body["id"], 41);
    assert_eq!(body["customerId"], 7);
    assert_eq!(body["status"], "DELIVERED");
    assert_eq!(body["orderItems"].as_array().unwrap().len(), 2);
    assert_eq!(backend.orders()[0].status, OrderStatus::Delivered);
    assert_eq!(view.revenue(), Price::from_cents(1500));

    let before = backend.hits("order/41");
    let err = view.advance(id, OrderStatus::Pending).await.unwrap_err();
    assert!(matches!(err, ClientError::IllegalTransition(_)));
    assert_eq!(backend.hits("order/41"), before);
}

#[tokio::test]
async fn test_customer_cancels_pending_order() {
    let backend = seeded().await;
    backend.add_order(order(50, 7, OrderStatus::Pending, 1000, &[(1, 1)]));
    backend.add_order(order(51, 7, OrderStatus::Ready, 500, &[(2, 1)]));
    let session = sign_in(&backend, "jordan").await;
    let log = NotificationLog::new();
    let user = session.session().user().unwrap().clone();
    let mut view = CustomerView::new(session.api().clone(), Arc::new(log.clone()), user).unwrap();
    view.refresh().await.unwrap();

    let cancelled = view.cancel_order(OrderId::new(50)).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(log.last().unwrap().description, "Your order #50 has been cancelled");

    assert!(view.cancel_order(OrderId::new(51)).await.is_err());
    assert_eq!(backend.hits("order/51"), 0);
}
