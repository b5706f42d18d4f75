use serde::Serialize;

use crate::db_types::{Order, OrderStatusType};

/// Published exactly once per order, by the call that moved it from `created` to `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Published exactly once per order, by the call that moved it from `created` to `canceled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}
