use std::net::SocketAddr;

use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use order_relay_engine::{
    db_types::{Json, Order, OrderId, OrderItem, OrderStatusType, PaymentId, Rubles},
    events::EventProducers,
    payment_objects::ConfirmationMode,
    OrderFlowApi,
};
use relay_common::TrustedNetworks;

use super::mocks::{MockOrderStore, MockPaymentGateway};
use crate::{
    config::ServerOptions,
    middleware::TrustedSourceMiddlewareFactory,
    routes::{OrderStatusRoute, PaymentSuccessRoute, SubmitOrderRoute, WebhookRoute},
    server::{json_config, query_config},
};

pub const YOOKASSA_PEER: &str = "185.71.76.10:443";
pub const STRANGER_PEER: &str = "203.0.113.9:443";

/// Sends `req` to an app set up by `configure`, and returns the status and body of the response. Errors raised by
/// middleware are rendered the same way the server would render them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().app_data(json_config()).app_data(query_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

/// Registers every order route, backed by the given mocks. The webhook scope only trusts `185.71.76.0/27`.
pub fn relay_routes(
    db: MockOrderStore,
    gateway: MockPaymentGateway,
    confirmation: ConfirmationMode,
) -> impl FnOnce(&mut ServiceConfig) {
    let networks = TrustedNetworks::from_list("185.71.76.0/27").ok();
    relay_routes_with_guard(db, gateway, confirmation, networks, ServerOptions::default())
}

pub fn relay_routes_with_guard(
    db: MockOrderStore,
    gateway: MockPaymentGateway,
    confirmation: ConfirmationMode,
    networks: Option<TrustedNetworks>,
    options: ServerOptions,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(db, gateway, confirmation, EventProducers::default());
        let webhook_scope = web::scope("/webhook")
            .wrap(TrustedSourceMiddlewareFactory::new(networks, options))
            .service(WebhookRoute::<MockOrderStore, MockPaymentGateway>::new());
        cfg.app_data(web::Data::new(api))
            .service(SubmitOrderRoute::<MockOrderStore, MockPaymentGateway>::new())
            .service(PaymentSuccessRoute::<MockOrderStore, MockPaymentGateway>::new())
            .service(OrderStatusRoute::<MockOrderStore, MockPaymentGateway>::new())
            .service(webhook_scope);
    }
}

pub fn redirect_mode() -> ConfirmationMode {
    ConfirmationMode::Redirect { return_url: "https://shop.example/payment_success".into() }
}

pub fn peer(addr: &str) -> SocketAddr {
    addr.parse().unwrap()
}

pub fn order(id: i64, status: OrderStatusType, payment_id: Option<&str>) -> Order {
    Order {
        id: OrderId(id),
        email: "a@b.com".into(),
        phone: "+1".into(),
        address: "X".into(),
        delivery_time: String::new(),
        order_time: String::new(),
        items: Json(vec![OrderItem { name: "Widget".into(), quantity: 2 }]),
        total_amount: Rubles::from_kopecks(999),
        status,
        payment_id: payment_id.map(PaymentId::from),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    }
}

pub const WIDGET_ORDER_JSON: &str = r#"{"email":"a@b.com","phone":"+1","address":"X","items":[{"name":"Widget","quantity":2}],"total_amount":9.99}"#;
