use std::fmt::Display;

use crate::{
    db_types::{Order, OrderId, PaymentId},
    relay_api::payment_objects::ConfirmationHandle,
};

/// The result of a successful order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedOrder {
    pub order: Order,
    pub payment_id: PaymentId,
    pub confirmation: ConfirmationHandle,
}

impl SubmittedOrder {
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }
}

/// The result of a customer returning from the payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectConfirmation {
    /// The payment succeeded and the order is paid. `newly_paid` is false if an earlier call had already marked it.
    Paid { order: Order, newly_paid: bool },
    /// The payment is authorised but not yet captured. The order is left untouched.
    Waiting { order: Order },
}

impl RedirectConfirmation {
    pub fn order(&self) -> &Order {
        match self {
            RedirectConfirmation::Paid { order, .. } | RedirectConfirmation::Waiting { order } => order,
        }
    }
}

/// A payment notification pushed by the processor, reduced to what the order flow needs. The processor's claimed
/// status is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotice {
    pub event: PaymentEvent,
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    Succeeded,
    WaitingForCapture,
    Canceled,
    Other(String),
}

impl Display for PaymentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentEvent::Succeeded => write!(f, "succeeded"),
            PaymentEvent::WaitingForCapture => write!(f, "waiting_for_capture"),
            PaymentEvent::Canceled => write!(f, "canceled"),
            PaymentEvent::Other(s) => write!(f, "{s}"),
        }
    }
}

/// What the order flow did with a [`PaymentNotice`]. Every variant is acknowledged to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    MarkedPaid(OrderId),
    MarkedCanceled(OrderId),
    /// The order was already in the state the notice asks for, e.g. on a re-delivery.
    AlreadyProcessed(OrderId),
    Ignored(String),
}
