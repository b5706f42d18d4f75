use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
use regex::Regex;
pub use relay_common::Rubles;
use serde::{Deserialize, Serialize};
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s.]+$";

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The id the store assigns to an order. Sequential and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

//--------------------------------------       PaymentId       ---------------------------------------------------------
/// The payment processor's reference for one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PaymentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PaymentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been stored, and is waiting for its payment to be confirmed.
    Created,
    /// The payment processor has confirmed that the payment succeeded.
    Paid,
    /// The payment processor has reported the payment as canceled.
    Canceled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Created)
    }

    /// Orders only ever move out of `Created`, and only into one of the terminal states.
    pub fn can_transition_to(&self, new_status: OrderStatusType) -> bool {
        matches!(self, OrderStatusType::Created) && new_status.is_terminal()
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "created"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Canceled => write!(f, "canceled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "paid" => Ok(Self::Paid),
            "canceled" => Ok(Self::Canceled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub delivery_time: String,
    pub order_time: String,
    pub items: Json<Vec<OrderItem>>,
    pub total_amount: Rubles,
    pub status: OrderStatusType,
    pub payment_id: Option<PaymentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn items(&self) -> &[OrderItem] {
        self.items.0.as_slice()
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// An order as submitted by a customer. `delivery_time` and `order_time` are free text and are stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub delivery_time: String,
    #[serde(default)]
    pub order_time: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Rubles,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("A phone number is required")]
    MissingPhone,
    #[error("A delivery address is required")]
    MissingAddress,
    #[error("The order contains no items")]
    NoItems,
    #[error("Item #{0} has no name")]
    UnnamedItem(usize),
    #[error("Item '{0}' must have a quantity of at least 1")]
    InvalidQuantity(String),
}

impl NewOrder {
    /// Checks the order before anything is written. Amounts are already guaranteed non-negative by [`Rubles`].
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if !is_valid_email(&self.email) {
            return Err(OrderValidationError::InvalidEmail(self.email.clone()));
        }
        if self.phone.trim().is_empty() {
            return Err(OrderValidationError::MissingPhone);
        }
        if self.address.trim().is_empty() {
            return Err(OrderValidationError::MissingAddress);
        }
        if self.items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(OrderValidationError::UnnamedItem(i + 1));
            }
            if item.quantity == 0 {
                return Err(OrderValidationError::InvalidQuantity(item.name.clone()));
            }
        }
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    match Regex::new(EMAIL_PATTERN) {
        Ok(re) => re.is_match(email.trim()),
        Err(e) => {
            error!("🗃️ Email pattern failed to compile. {e}");
            false
        },
    }
}

//--------------------------------------     StatusChange      ---------------------------------------------------------
/// The result of a status update. Re-applying the status an order already has is not an error, but callers need to
/// know whether *this* call performed the transition, e.g. to publish an event exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Changed(Order),
    Unchanged(Order),
}

impl StatusChange {
    pub fn order(&self) -> &Order {
        match self {
            StatusChange::Changed(o) | StatusChange::Unchanged(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            StatusChange::Changed(o) | StatusChange::Unchanged(o) => o,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, StatusChange::Changed(_))
    }
}
