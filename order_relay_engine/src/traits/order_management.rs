use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentId, StatusChange};

/// Persistence for orders and their payment lifecycle.
///
/// Every method is atomic on its own. Implementations must guarantee that an order only ever leaves the `Created`
/// state once, even when several callers race to update it.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order with status `Created` and no payment reference, returning the stored record.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    /// Links the payment processor's reference to the order. A payment reference is set at most once.
    /// Re-attaching the same reference is a no-op.
    async fn attach_payment(&self, order_id: OrderId, payment_id: &PaymentId) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_id(&self, order_id: OrderId) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_order_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Order>, OrderStoreError>;

    /// Moves the order to `status`.
    ///
    /// * `Created -> Paid` and `Created -> Canceled` succeed with [`StatusChange::Changed`].
    /// * Setting the status an order already has returns [`StatusChange::Unchanged`].
    /// * Anything else is an [`OrderStoreError::IllegalStatusTransition`].
    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatusType,
    ) -> Result<StatusChange, OrderStoreError>;

    /// Closes the underlying connections. Further calls will fail.
    async fn close(&self) -> Result<(), OrderStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} is already linked to payment {payment_id}")]
    PaymentAlreadyAttached { order_id: OrderId, payment_id: PaymentId },
    #[error("Order {order_id} cannot move from {from} to {to}")]
    IllegalStatusTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for OrderStoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        OrderStoreError::DatabaseError(format!("Migration failed. {e}"))
    }
}
