//! # Order relay public API
//!
//! The `relay_api` module exposes the programmatic API of the order relay.
//!
//! * [`order_flow_api`] sequences order submission, payment creation, and payment confirmation.
//! * [`payment_objects`] are the provider-neutral request and response types exchanged with a
//!   [`crate::traits::PaymentProvider`].
//! * [`order_objects`] are the results the order flow hands back to its callers.
//!
//! # API usage
//!
//! An API instance is created by supplying an order store and a payment provider:
//!
//! ```rust,ignore
//! use order_relay_engine::{events::EventProducers, payment_objects::ConfirmationMode, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/orders.db", 5).await?;
//! let api = OrderFlowApi::new(db, my_provider, ConfirmationMode::Embedded, EventProducers::default());
//! let submitted = api.submit_order(new_order).await?;
//! ```

pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
