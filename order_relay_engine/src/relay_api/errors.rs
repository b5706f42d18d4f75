use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderValidationError, PaymentId},
    relay_api::payment_objects::RemotePaymentStatus,
    traits::{OrderStoreError, PaymentProviderError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order. {0}")]
    ValidationError(#[from] OrderValidationError),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("No order is linked to payment {0}")]
    PaymentNotLinked(PaymentId),
    #[error("Payment {payment_id} has not succeeded. Its status is {status}")]
    PaymentNotSuccessful { payment_id: PaymentId, status: RemotePaymentStatus },
    #[error("Order {0} has been canceled")]
    OrderCanceled(OrderId),
    #[error("{0}")]
    StoreError(#[from] OrderStoreError),
    #[error("{0}")]
    ProviderError(#[from] PaymentProviderError),
}
