use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, PaymentId, Rubles};

/// How the customer confirms a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// The customer is sent to the processor's payment page, and comes back to `return_url` afterwards.
    Redirect { return_url: String },
    /// The shop front-end embeds the processor's widget using a confirmation token.
    Embedded,
}

/// What the customer needs in order to pay, depending on the [`ConfirmationMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationHandle {
    PaymentUrl(String),
    ConfirmationToken(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Rubles,
    pub currency: String,
    pub description: String,
    pub confirmation: ConfirmationMode,
    /// Unique per logical payment creation. Providers must send the same key on every retry.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedPayment {
    pub payment_id: PaymentId,
    pub status: RemotePaymentStatus,
    pub confirmation: ConfirmationHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

impl Display for RemotePaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemotePaymentStatus::Pending => write!(f, "pending"),
            RemotePaymentStatus::WaitingForCapture => write!(f, "waiting_for_capture"),
            RemotePaymentStatus::Succeeded => write!(f, "succeeded"),
            RemotePaymentStatus::Canceled => write!(f, "canceled"),
        }
    }
}
