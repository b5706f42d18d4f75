use actix_web::{http::StatusCode, test::TestRequest};
use mockall::predicate::eq;
use order_relay_engine::{
    db_types::{OrderId, OrderStatusType, StatusChange},
    payment_objects::RemotePaymentStatus,
    PaymentProviderError,
};
use relay_common::TrustedNetworks;

use super::{
    helpers::{
        order,
        peer,
        redirect_mode,
        relay_routes,
        relay_routes_with_guard,
        send_request,
        STRANGER_PEER,
        YOOKASSA_PEER,
    },
    mocks::{MockOrderStore, MockPaymentGateway},
};
use crate::config::ServerOptions;

fn notification(event: &str, payment_id: &str, status: &str) -> String {
    format!(r#"{{"type":"notification","event":"{event}","object":{{"id":"{payment_id}","status":"{status}","paid":true}}}}"#)
}

fn webhook_from(addr: &str, body: String) -> TestRequest {
    TestRequest::post()
        .uri("/webhook")
        .peer_addr(peer(addr))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
}

fn untouched_store() -> MockOrderStore {
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_payment_id().never();
    db.expect_update_order_status().never();
    db
}

fn silent_gateway() -> MockPaymentGateway {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().never();
    gateway
}

#[actix_web::test]
async fn untrusted_sources_are_forbidden() {
    let _ = env_logger::try_init().ok();
    for event in ["payment.succeeded", "payment.canceled", "payment.waiting_for_capture", "refund.succeeded"] {
        let req = webhook_from(STRANGER_PEER, notification(event, "pay-1", "succeeded"));
        let (status, body) = send_request(req, relay_routes(untouched_store(), silent_gateway(), redirect_mode())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, r#"{"detail":"Access denied. 203.0.113.9 is not a trusted source"}"#);
    }
}

#[actix_web::test]
async fn verified_success_marks_order_paid() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_fetch_payment_status()
        .withf(|id| id.as_str() == "pay-1")
        .times(1)
        .returning(|_| Ok(RemotePaymentStatus::Succeeded));
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(1, OrderStatusType::Created, Some("pay-1")))));
    db.expect_update_order_status()
        .with(eq(OrderId(1)), eq(OrderStatusType::Paid))
        .times(1)
        .returning(|_, _| Ok(StatusChange::Changed(order(1, OrderStatusType::Paid, Some("pay-1")))));
    let req = webhook_from(YOOKASSA_PEER, notification("payment.succeeded", "pay-1", "succeeded"));
    let (status, body) = send_request(req, relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[actix_web::test]
async fn redelivered_success_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().returning(|_| Ok(RemotePaymentStatus::Succeeded));
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(1, OrderStatusType::Paid, Some("pay-1")))));
    db.expect_update_order_status()
        .returning(|_, _| Ok(StatusChange::Unchanged(order(1, OrderStatusType::Paid, Some("pay-1")))));
    let req = webhook_from(YOOKASSA_PEER, notification("payment.succeeded", "pay-1", "succeeded"));
    let (status, body) = send_request(req, relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[actix_web::test]
async fn claimed_status_is_not_trusted() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().times(1).returning(|_| Ok(RemotePaymentStatus::Pending));
    let req = webhook_from(YOOKASSA_PEER, notification("payment.succeeded", "pay-1", "succeeded"));
    let (status, _) = send_request(req, relay_routes(untouched_store(), gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn verified_cancellation() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().times(1).returning(|_| Ok(RemotePaymentStatus::Canceled));
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(4, OrderStatusType::Created, Some("pay-1")))));
    db.expect_update_order_status()
        .with(eq(OrderId(4)), eq(OrderStatusType::Canceled))
        .times(1)
        .returning(|_, _| Ok(StatusChange::Changed(order(4, OrderStatusType::Canceled, Some("pay-1")))));
    let req = webhook_from(YOOKASSA_PEER, notification("payment.canceled", "pay-1", "canceled"));
    let (status, _) = send_request(req, relay_routes(db, gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn events_without_action_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    for event in ["payment.waiting_for_capture", "refund.succeeded"] {
        let req = webhook_from(YOOKASSA_PEER, notification(event, "pay-1", "waiting_for_capture"));
        let (status, body) = send_request(req, relay_routes(untouched_store(), silent_gateway(), redirect_mode())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);
    }
}

#[actix_web::test]
async fn unknown_payment_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().returning(|id| Err(PaymentProviderError::PaymentNotFound(id.clone())));
    let req = webhook_from(YOOKASSA_PEER, notification("payment.succeeded", "pay-404", "succeeded"));
    let (status, _) = send_request(req, relay_routes(untouched_store(), gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn processor_failure_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_fetch_payment_status().returning(|_| Err(PaymentProviderError::Unavailable("timed out".into())));
    let req = webhook_from(YOOKASSA_PEER, notification("payment.succeeded", "pay-1", "succeeded"));
    let (status, body) = send_request(req, relay_routes(untouched_store(), gateway, redirect_mode())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("timed out"), "{body}");
}

#[actix_web::test]
async fn malformed_notifications() {
    let _ = env_logger::try_init().ok();
    let bodies = [
        "{oops".to_string(),
        r#"{"type":"notification","event":"payment.succeeded"}"#.to_string(),
        r#"{"type":"ping","event":"payment.succeeded","object":{"id":"pay-1"}}"#.to_string(),
    ];
    for body in bodies {
        let req = webhook_from(YOOKASSA_PEER, body);
        let (status, response) =
            send_request(req, relay_routes(untouched_store(), silent_gateway(), redirect_mode())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response.contains("detail"), "{response}");
    }
}

#[actix_web::test]
async fn forwarded_address_is_used_when_enabled() {
    let _ = env_logger::try_init().ok();
    let networks = TrustedNetworks::from_list("185.71.76.0/27").ok();
    let options = ServerOptions { use_x_forwarded_for: true, use_forwarded: false };
    let req = webhook_from("10.0.0.1:8080", notification("refund.succeeded", "rf-1", "succeeded"))
        .insert_header(("X-Forwarded-For", "185.71.76.3"));
    let routes = relay_routes_with_guard(untouched_store(), silent_gateway(), redirect_mode(), networks.clone(), options);
    let (status, _) = send_request(req, routes).await;
    assert_eq!(status, StatusCode::OK);

    // The same header is ignored unless proxies are trusted
    let req = webhook_from("10.0.0.1:8080", notification("refund.succeeded", "rf-1", "succeeded"))
        .insert_header(("X-Forwarded-For", "185.71.76.3"));
    let routes = relay_routes_with_guard(
        untouched_store(),
        silent_gateway(),
        redirect_mode(),
        networks,
        ServerOptions::default(),
    );
    let (status, _) = send_request(req, routes).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn caller_supplied_forwarded_entries_are_not_trusted() {
    let _ = env_logger::try_init().ok();
    let networks = TrustedNetworks::from_list("185.71.76.0/27").ok();
    let options = ServerOptions { use_x_forwarded_for: true, use_forwarded: false };
    // The caller prepends a trusted address. Our proxy appends the real one.
    let req = webhook_from("10.0.0.1:8080", notification("payment.succeeded", "pay-1", "succeeded"))
        .insert_header(("X-Forwarded-For", "185.71.76.3, 203.0.113.9"));
    let routes = relay_routes_with_guard(untouched_store(), silent_gateway(), redirect_mode(), networks, options);
    let (status, body) = send_request(req, routes).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"detail":"Access denied. 203.0.113.9 is not a trusted source"}"#);
}

#[actix_web::test]
async fn disabled_guard_accepts_any_source() {
    let _ = env_logger::try_init().ok();
    let req = webhook_from(STRANGER_PEER, notification("refund.succeeded", "rf-1", "succeeded"));
    let routes =
        relay_routes_with_guard(untouched_store(), silent_gateway(), redirect_mode(), None, ServerOptions::default());
    let (status, _) = send_request(req, routes).await;
    assert_eq!(status, StatusCode::OK);
}
