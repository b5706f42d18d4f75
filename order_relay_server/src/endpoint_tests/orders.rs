use actix_web::{http::StatusCode, test::TestRequest};
use mockall::predicate::eq;
use order_relay_engine::{
    db_types::{OrderId, OrderStatusType, PaymentId},
    payment_objects::{ConfirmationHandle, ConfirmationMode, OpenedPayment, RemotePaymentStatus},
    OrderStoreError,
    PaymentProviderError,
};

use super::{
    helpers::{order, redirect_mode, relay_routes, send_request, WIDGET_ORDER_JSON},
    mocks::{MockOrderStore, MockPaymentGateway},
};

fn post_order(body: &str) -> TestRequest {
    TestRequest::post().uri("/order").insert_header(("Content-Type", "application/json")).set_payload(body.to_string())
}

fn opened(handle: ConfirmationHandle) -> OpenedPayment {
    OpenedPayment { payment_id: PaymentId::from("pay-1"), status: RemotePaymentStatus::Pending, confirmation: handle }
}

#[actix_web::test]
async fn submit_order_redirect() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order()
        .withf(|o| o.email == "a@b.com" && o.total_amount.kopecks() == 999)
        .times(1)
        .returning(|_| Ok(order(1, OrderStatusType::Created, None)));
    db.expect_attach_payment()
        .withf(|id, payment| *id == OrderId(1) && payment.as_str() == "pay-1")
        .times(1)
        .returning(|_, _| Ok(order(1, OrderStatusType::Created, Some("pay-1"))));
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_open_payment()
        .withf(|req| {
            req.order_id == OrderId(1)
                && req.amount.kopecks() == 999
                && req.currency == "RUB"
                && req.description == "Заказ №1"
                && !req.idempotency_key.is_empty()
                && matches!(req.confirmation, ConfirmationMode::Redirect { .. })
        })
        .times(1)
        .returning(|_| Ok(opened(ConfirmationHandle::PaymentUrl("https://pay.example/pay-1".into()))));
    let (status, body) = send_request(post_order(WIDGET_ORDER_JSON), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":1,"payment_url":"https://pay.example/pay-1"}"#);
}

#[actix_web::test]
async fn submit_order_embedded() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().returning(|_| Ok(order(2, OrderStatusType::Created, None)));
    db.expect_attach_payment().returning(|_, _| Ok(order(2, OrderStatusType::Created, Some("pay-1"))));
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_open_payment()
        .withf(|req| req.confirmation == ConfirmationMode::Embedded)
        .returning(|_| Ok(opened(ConfirmationHandle::ConfirmationToken("ct-pay-1".into()))));
    let routes = relay_routes(db, gateway, ConfirmationMode::Embedded);
    let (status, body) = send_request(post_order(WIDGET_ORDER_JSON), routes).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":2,"confirmation_token":"ct-pay-1"}"#);
}

#[actix_web::test]
async fn invalid_orders_are_rejected_before_storage() {
    let _ = env_logger::try_init().ok();
    let bad_email = r#"{"email":"not-an-email","phone":"+1","address":"X","items":[{"name":"Widget","quantity":2}],
        "total_amount":9.99}"#;
    let no_items = r#"{"email":"a@b.com","phone":"+1","address":"X","items":[],"total_amount":9.99}"#;
    for (body, expected) in
        [(bad_email, "Invalid email address: not-an-email"), (no_items, "The order contains no items")]
    {
        let mut db = MockOrderStore::new();
        db.expect_insert_order().never();
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_open_payment().never();
        let (status, response) = send_request(post_order(body), relay_routes(db, gateway, redirect_mode())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert!(json["detail"].as_str().unwrap().contains(expected), "{response}");
    }
}

#[actix_web::test]
async fn malformed_order_body() {
    let _ = env_logger::try_init().ok();
    let negative =
        r#"{"email":"a@b.com","phone":"+1","address":"X","items":[{"name":"W","quantity":1}],"total_amount":-1}"#;
    for body in ["{not json", r#"{"email":"a@b.com"}"#, negative] {
        let mut db = MockOrderStore::new();
        db.expect_insert_order().never();
        let (status, response) =
            send_request(post_order(body), relay_routes(db, MockPaymentGateway::new(), redirect_mode())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response.contains("detail"), "{response}");
    }
}

#[actix_web::test]
async fn payment_failure_keeps_the_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().times(1).returning(|_| Ok(order(3, OrderStatusType::Created, None)));
    db.expect_attach_payment().never();
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_open_payment()
        .times(1)
        .returning(|_| Err(PaymentProviderError::Unavailable("Gave up after 4 attempts".into())));
    let (status, body) = send_request(post_order(WIDGET_ORDER_JSON), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Gave up after 4 attempts"), "{body}");
}

#[actix_web::test]
async fn database_failure_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().returning(|_| Err(OrderStoreError::DatabaseError("database is locked".into())));
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_open_payment().never();
    let (status, _) = send_request(post_order(WIDGET_ORDER_JSON), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn fetch_order_status() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_id()
        .with(eq(OrderId(1)))
        .returning(|_| Ok(Some(order(1, OrderStatusType::Paid, Some("pay-1")))));
    let routes = relay_routes(db, MockPaymentGateway::new(), redirect_mode());
    let (status, body) = send_request(TestRequest::get().uri("/order/1/status"), routes).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":1,"status":"paid","payment_id":"pay-1"}"#);
}

#[actix_web::test]
async fn fetch_unknown_order_status() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(None));
    let routes = relay_routes(db, MockPaymentGateway::new(), redirect_mode());
    let (status, body) = send_request(TestRequest::get().uri("/order/42/status"), routes).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"detail":"The data was not found. The requested order 42 does not exist"}"#);
}
