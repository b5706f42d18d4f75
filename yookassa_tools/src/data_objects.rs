use std::{collections::HashMap, fmt::Display};

use chrono::{DateTime, Utc};
use relay_common::{Rubles, RUB_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NOTIFICATION_TYPE: &str = "notification";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: Rubles,
    pub currency: String,
}

impl Amount {
    pub fn rub(value: Rubles) -> Self {
        Self { value, currency: RUB_CURRENCY_CODE.to_string() }
    }
}

/// How the customer is asked to confirm a new payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfirmationRequest {
    /// The customer is sent to a YooKassa page and redirected back to `return_url` afterwards.
    Redirect { return_url: String },
    /// The merchant embeds the YooKassa widget, initialised with the returned confirmation token.
    Embedded,
}

/// The request body for `POST /payments`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPayment {
    pub amount: Amount,
    pub confirmation: ConfirmationRequest,
    pub capture: bool,
    pub description: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl NewPayment {
    pub fn new(amount: Amount, confirmation: ConfirmationRequest, description: String) -> Self {
        Self { amount, confirmation, capture: true, description, metadata: HashMap::new() }
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Confirmation {
    Redirect {
        confirmation_url: String,
        #[serde(default)]
        return_url: Option<String>,
    },
    Embedded {
        confirmation_token: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::WaitingForCapture => write!(f, "waiting_for_capture"),
            PaymentStatus::Succeeded => write!(f, "succeeded"),
            PaymentStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// A payment object, as returned by `POST /payments` and `GET /payments/{id}`. Only the fields the relay uses are
/// modelled; everything else in the response is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub paid: bool,
    pub amount: Amount,
    #[serde(default)]
    pub confirmation: Option<Confirmation>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub test: bool,
}

//--------------------------------------     Webhooks        ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum WebhookEvent {
    PaymentSucceeded,
    PaymentWaitingForCapture,
    PaymentCanceled,
    /// Refunds, payouts and anything YooKassa adds in the future.
    Other(String),
}

impl From<String> for WebhookEvent {
    fn from(value: String) -> Self {
        match value.as_str() {
            "payment.succeeded" => Self::PaymentSucceeded,
            "payment.waiting_for_capture" => Self::PaymentWaitingForCapture,
            "payment.canceled" => Self::PaymentCanceled,
            _ => Self::Other(value),
        }
    }
}

impl Display for WebhookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookEvent::PaymentSucceeded => write!(f, "payment.succeeded"),
            WebhookEvent::PaymentWaitingForCapture => write!(f, "payment.waiting_for_capture"),
            WebhookEvent::PaymentCanceled => write!(f, "payment.canceled"),
            WebhookEvent::Other(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// The body YooKassa posts to the merchant's webhook URL.
///
/// The `object.status` field is informational only. Consumers must re-fetch the payment before acting on it.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub event: WebhookEvent,
    pub object: WebhookObject,
}

impl WebhookNotification {
    pub fn is_notification(&self) -> bool {
        self.kind == NOTIFICATION_TYPE
    }
}
