//! # YooKassa tools
//!
//! A thin REST client for the parts of the [YooKassa v3 API](https://yookassa.ru/developers/api) that the order relay
//! needs:
//! * creating a payment, with a redirect or embedded-widget confirmation, under an idempotence key,
//! * fetching a payment to learn its current status,
//! * the wire format of the asynchronous webhook notifications YooKassa pushes to merchants.
//!
//! Transient failures (5xx responses, timeouts, connection errors) are retried with bounded exponential backoff; see
//! [`RetryPolicy`].
mod api;
mod config;
mod error;

pub mod data_objects;

pub use api::YookassaApi;
pub use config::{RetryPolicy, YookassaConfig, DEFAULT_YOOKASSA_API_URL};
pub use data_objects::{
    Amount,
    Confirmation,
    ConfirmationRequest,
    NewPayment,
    Payment,
    PaymentStatus,
    WebhookEvent,
    WebhookNotification,
    WebhookObject,
};
pub use error::YookassaApiError;
