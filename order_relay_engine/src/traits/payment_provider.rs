use thiserror::Error;

use crate::{
    db_types::PaymentId,
    relay_api::payment_objects::{OpenedPayment, PaymentRequest, RemotePaymentStatus},
};

/// The seam between the order flow and a payment processor.
///
/// Implementations are expected to retry transient failures themselves, and to send the request's idempotency key with
/// every attempt so that a retried creation never opens a second payment.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    async fn open_payment(&self, request: PaymentRequest) -> Result<OpenedPayment, PaymentProviderError>;

    /// Asks the processor for the current status of a payment. This is the only source of truth the order flow uses
    /// for status changes; callback payloads are never trusted.
    async fn fetch_payment_status(&self, payment_id: &PaymentId) -> Result<RemotePaymentStatus, PaymentProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentProviderError {
    #[error("The payment processor rejected the request. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment processor is unavailable. {0}")]
    Unavailable(String),
    #[error("The payment processor does not know payment {0}")]
    PaymentNotFound(PaymentId),
    #[error("The payment processor returned an unusable response. {0}")]
    InvalidResponse(String),
    /// The payment exists at the processor, but the customer has no way to confirm it.
    #[error("Payment {0} was created, but has no usable confirmation")]
    UnusableConfirmation(PaymentId),
}
