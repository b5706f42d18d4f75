//! Order Relay Engine
//!
//! The engine holds the core logic of the order relay. It is provider-agnostic: it knows how to store orders and how
//! to sequence a payment, but not which payment processor is on the other end.
//!
//! The library is divided into:
//! 1. The order store ([`OrderManagement`]), with a SQLite implementation in [`SqliteDatabase`]. The data types held in
//!    the store are defined in [`mod@db_types`] and are public.
//! 2. The payment seam ([`PaymentProvider`]). Integrations implement this trait for a specific processor.
//! 3. The public API ([`OrderFlowApi`]), which uses the two traits above to submit orders and confirm payments.
//!
//! The engine also emits events when an order is paid or canceled. A simple hook system ([`mod@events`]) lets you
//! subscribe to them, e.g. to send a notification, without blocking the order flow.
pub mod db_types;
pub mod events;
mod relay_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use relay_api::{
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{OrderManagement, OrderStoreError, PaymentProvider, PaymentProviderError};
