use actix_web::{http::StatusCode, test::TestRequest};
use mockall::predicate::eq;
use order_relay_engine::{
    db_types::{OrderId, OrderStatusType, StatusChange},
    payment_objects::RemotePaymentStatus,
    OrderStoreError,
    PaymentProviderError,
};

use super::{
    helpers::{order, redirect_mode, relay_routes, send_request},
    mocks::{MockOrderStore, MockPaymentGateway},
};

fn payment_success(payment_id: &str) -> TestRequest {
    TestRequest::post().uri(&format!("/payment_success?payment_id={payment_id}"))
}

fn gateway_reporting(status: RemotePaymentStatus) -> MockPaymentGateway {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().withf(|id| id.as_str() == "pay-1").times(1).returning(move |_| Ok(status));
    gateway
}

fn store_with_order(status: OrderStatusType) -> MockOrderStore {
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_payment_id()
        .withf(|id| id.as_str() == "pay-1")
        .returning(move |_| Ok(Some(order(1, status, Some("pay-1")))));
    db
}

#[actix_web::test]
async fn succeeded_payment_marks_order_paid() {
    let _ = env_logger::try_init().ok();
    let mut db = store_with_order(OrderStatusType::Created);
    db.expect_update_order_status()
        .with(eq(OrderId(1)), eq(OrderStatusType::Paid))
        .times(1)
        .returning(|_, _| Ok(StatusChange::Changed(order(1, OrderStatusType::Paid, Some("pay-1")))));
    let gateway = gateway_reporting(RemotePaymentStatus::Succeeded);
    let (status, body) = send_request(payment_success("pay-1"), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["order_id"], 1);
    assert!(json["message"].as_str().unwrap().contains("№1"));
}

#[actix_web::test]
async fn repeated_return_is_still_a_success() {
    let _ = env_logger::try_init().ok();
    let mut db = store_with_order(OrderStatusType::Paid);
    db.expect_update_order_status()
        .returning(|_, _| Ok(StatusChange::Unchanged(order(1, OrderStatusType::Paid, Some("pay-1")))));
    let gateway = gateway_reporting(RemotePaymentStatus::Succeeded);
    let (status, body) = send_request(payment_success("pay-1"), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"success""#), "{body}");
}

#[actix_web::test]
async fn waiting_for_capture() {
    let _ = env_logger::try_init().ok();
    let mut db = store_with_order(OrderStatusType::Created);
    db.expect_update_order_status().never();
    let gateway = gateway_reporting(RemotePaymentStatus::WaitingForCapture);
    let (status, body) = send_request(payment_success("pay-1"), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "waiting");
    assert_eq!(json["order_id"], 1);
}

#[actix_web::test]
async fn unfinished_payments_are_rejected() {
    let _ = env_logger::try_init().ok();
    for remote in [RemotePaymentStatus::Pending, RemotePaymentStatus::Canceled] {
        let mut db = MockOrderStore::new();
        db.expect_update_order_status().never();
        let gateway = gateway_reporting(remote);
        let (status, body) = send_request(payment_success("pay-1"), relay_routes(db, gateway, redirect_mode())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, format!(r#"{{"detail":"Payment pay-1 has not succeeded. Its status is {remote}"}}"#));
    }
}

#[actix_web::test]
async fn unknown_payment() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_fetch_payment_status()
        .returning(|id| Err(PaymentProviderError::PaymentNotFound(id.clone())));
    let (status, _) =
        send_request(payment_success("pay-1"), relay_routes(MockOrderStore::new(), gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn payment_without_an_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_payment_id().returning(|_| Ok(None));
    db.expect_update_order_status().never();
    let gateway = gateway_reporting(RemotePaymentStatus::Succeeded);
    let (status, body) = send_request(payment_success("pay-1"), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No order is linked to payment pay-1"), "{body}");
}

#[actix_web::test]
async fn canceled_order_cannot_be_paid() {
    let _ = env_logger::try_init().ok();
    let mut db = store_with_order(OrderStatusType::Canceled);
    db.expect_update_order_status().never();
    let gateway = gateway_reporting(RemotePaymentStatus::Succeeded);
    let (status, _) = send_request(payment_success("pay-1"), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn order_canceled_concurrently() {
    let _ = env_logger::try_init().ok();
    let mut db = store_with_order(OrderStatusType::Created);
    db.expect_update_order_status().returning(|id, to| {
        Err(OrderStoreError::IllegalStatusTransition { order_id: id, from: OrderStatusType::Canceled, to })
    });
    let gateway = gateway_reporting(RemotePaymentStatus::Succeeded);
    let (status, _) = send_request(payment_success("pay-1"), relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn processor_unavailable() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().returning(|_| Err(PaymentProviderError::Unavailable("timed out".into())));
    let (status, _) =
        send_request(payment_success("pay-1"), relay_routes(MockOrderStore::new(), gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn missing_payment_id() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().never();
    let req = TestRequest::post().uri("/payment_success");
    let (status, body) = send_request(req, relay_routes(MockOrderStore::new(), gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("detail"), "{body}");
}
