use order_relay_engine::{
    db_types::{Order, OrderId, OrderStatusType, PaymentId},
    order_objects::{RedirectConfirmation, SubmittedOrder},
    payment_objects::ConfirmationHandle,
};
use serde::{Deserialize, Serialize};

/// Returned by `POST /order`. Exactly one of `payment_url` or `confirmation_token` is present, depending on the
/// configured confirmation mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,
}

impl From<SubmittedOrder> for OrderCreatedResponse {
    fn from(value: SubmittedOrder) -> Self {
        let order_id = value.order_id();
        match value.confirmation {
            ConfirmationHandle::PaymentUrl(url) => Self { order_id, payment_url: Some(url), confirmation_token: None },
            ConfirmationHandle::ConfirmationToken(token) => {
                Self { order_id, payment_url: None, confirmation_token: Some(token) }
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSuccessParams {
    pub payment_id: PaymentId,
}

/// Returned by `POST /payment_success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResultResponse {
    pub status: String,
    pub message: String,
    pub order_id: OrderId,
}

impl From<RedirectConfirmation> for PaymentResultResponse {
    fn from(value: RedirectConfirmation) -> Self {
        match value {
            RedirectConfirmation::Paid { order, .. } => Self {
                status: "success".into(),
                message: format!("Заказ №{} успешно оплачен", order.id),
                order_id: order.id,
            },
            RedirectConfirmation::Waiting { order } => Self {
                status: "waiting".into(),
                message: format!("Платёж по заказу №{} ожидает подтверждения", order.id),
                order_id: order.id,
            },
        }
    }
}

/// Returned by `GET /order/{order_id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub payment_id: Option<PaymentId>,
}

impl From<Order> for OrderStatusResponse {
    fn from(order: Order) -> Self {
        Self { order_id: order.id, status: order.status, payment_id: order.payment_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { status: "ok".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self { service: env!("CARGO_PKG_NAME").to_string(), version: env!("CARGO_PKG_VERSION").to_string() }
    }
}
