use log::{debug, trace};
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentId, StatusChange},
    traits::OrderStoreError,
};

/// Inserts a new order into the database using the given connection. The store assigns the id, and the status always
/// starts as `created`.
///
/// `RETURNING` statements in this module are read with `fetch_all`. That steps them to completion, so the write is
/// finished before the connection goes back to the pool.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let inserted: Vec<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (
                email,
                phone,
                address,
                delivery_time,
                order_time,
                items,
                total_amount
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.email)
    .bind(order.phone)
    .bind(order.address)
    .bind(order.delivery_time)
    .bind(order.order_time)
    .bind(Json(order.items))
    .bind(order.total_amount)
    .fetch_all(conn)
    .await?;
    let order = inserted
        .into_iter()
        .next()
        .ok_or_else(|| OrderStoreError::DatabaseError("The new order was not returned by the database".into()))?;
    debug!("🗃️ Order #{} inserted", order.id);
    Ok(order)
}

pub async fn fetch_order_by_id(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_id(
    payment_id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_id = $1")
        .bind(payment_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Sets the payment reference, but only if the order does not have one yet.
pub async fn attach_payment(
    id: OrderId,
    payment_id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderStoreError> {
    let updated: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND payment_id IS NULL \
         RETURNING *",
    )
    .bind(payment_id.as_str())
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .pop();
    if let Some(order) = updated {
        debug!("🗃️ Order #{id} linked to payment {payment_id}");
        return Ok(order);
    }
    let existing = fetch_order_by_id(id, conn).await?.ok_or(OrderStoreError::OrderNotFound(id))?;
    match existing.payment_id.clone() {
        Some(p) if &p == payment_id => {
            trace!("🗃️ Order #{id} is already linked to payment {payment_id}");
            Ok(existing)
        },
        Some(p) => Err(OrderStoreError::PaymentAlreadyAttached { order_id: id, payment_id: p }),
        // Lost a race with a concurrent writer. Should not happen since the order id is only known to its submitter.
        None => Err(OrderStoreError::DatabaseError(format!("Could not link order #{id} to payment {payment_id}"))),
    }
}

/// Moves an order out of `created`. The `status = 'created'` guard makes the transition atomic: of several concurrent
/// callers, exactly one sees [`StatusChange::Changed`].
pub async fn update_order_status(
    id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<StatusChange, OrderStoreError> {
    if status.is_terminal() {
        let updated: Option<Order> = sqlx::query_as(
            "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = 'created' \
             RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .pop();
        if let Some(order) = updated {
            debug!("🗃️ Order #{id} is now {status}");
            return Ok(StatusChange::Changed(order));
        }
    }
    let current = fetch_order_by_id(id, conn).await?.ok_or(OrderStoreError::OrderNotFound(id))?;
    if current.status == status {
        trace!("🗃️ Order #{id} is already {status}");
        Ok(StatusChange::Unchanged(current))
    } else {
        Err(OrderStoreError::IllegalStatusTransition { order_id: id, from: current.status, to: status })
    }
}
