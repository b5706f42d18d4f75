use mockall::mock;
use order_relay_engine::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentId, StatusChange},
    payment_objects::{OpenedPayment, PaymentRequest, RemotePaymentStatus},
    OrderManagement,
    OrderStoreError,
    PaymentProvider,
    PaymentProviderError,
};

mock! {
    pub OrderStore {}
    impl OrderManagement for OrderStore {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn attach_payment(&self, order_id: OrderId, payment_id: &PaymentId) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_id(&self, order_id: OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Order>, OrderStoreError>;
        async fn update_order_status(&self, order_id: OrderId, status: OrderStatusType) -> Result<StatusChange, OrderStoreError>;
        async fn close(&self) -> Result<(), OrderStoreError>;
    }
}

mock! {
    pub PaymentGateway {}
    impl PaymentProvider for PaymentGateway {
        async fn open_payment(&self, request: PaymentRequest) -> Result<OpenedPayment, PaymentProviderError>;
        async fn fetch_payment_status(&self, payment_id: &PaymentId) -> Result<RemotePaymentStatus, PaymentProviderError>;
    }
}
