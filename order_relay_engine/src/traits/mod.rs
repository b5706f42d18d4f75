mod order_management;
mod payment_provider;

pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_provider::{PaymentProvider, PaymentProviderError};
