use std::fmt::Debug;

use log::*;
use relay_common::RUB_CURRENCY_CODE;
use uuid::Uuid;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentId, StatusChange},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    relay_api::{
        errors::OrderFlowError,
        order_objects::{PaymentEvent, PaymentNotice, RedirectConfirmation, SubmittedOrder, WebhookOutcome},
        payment_objects::{ConfirmationMode, PaymentRequest, RemotePaymentStatus},
    },
    traits::{OrderManagement, OrderStoreError, PaymentProvider, PaymentProviderError},
};

/// `OrderFlowApi` sequences the life of an order: it stores the order, opens a payment for it, and marks it paid or
/// canceled once the payment processor confirms the outcome.
///
/// The processor's word is always taken from a fresh [`PaymentProvider::fetch_payment_status`] call. Redirect
/// parameters and webhook payloads only say *which* payment to check.
pub struct OrderFlowApi<B, P> {
    db: B,
    provider: P,
    confirmation: ConfirmationMode,
    producers: EventProducers,
}

impl<B, P> Debug for OrderFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.confirmation)
    }
}

impl<B, P> OrderFlowApi<B, P> {
    pub fn new(db: B, provider: P, confirmation: ConfirmationMode, producers: EventProducers) -> Self {
        Self { db, provider, confirmation, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn confirmation_mode(&self) -> &ConfirmationMode {
        &self.confirmation
    }
}

impl<B, P> OrderFlowApi<B, P>
where
    B: OrderManagement,
    P: PaymentProvider,
{
    /// Validates and stores a new order, then opens a payment for it.
    ///
    /// If the payment cannot be opened, the order stays in the store as `created` with no payment reference and the
    /// provider error is returned. Such orders are never paid and are not cleaned up. A payment that was created but
    /// cannot be confirmed by the customer is still linked to the order before the error is returned.
    pub async fn submit_order(&self, order: NewOrder) -> Result<SubmittedOrder, OrderFlowError> {
        order.validate()?;
        let order = self.db.insert_order(order).await?;
        let order_id = order.id;
        let request = PaymentRequest {
            order_id,
            amount: order.total_amount,
            currency: RUB_CURRENCY_CODE.to_string(),
            description: format!("Заказ №{order_id}"),
            confirmation: self.confirmation.clone(),
            idempotency_key: Uuid::new_v4().to_string(),
        };
        debug!("🔄️📦️ Opening a payment of {} for order #{order_id}", order.total_amount);
        let opened = match self.provider.open_payment(request).await {
            Ok(opened) => opened,
            Err(PaymentProviderError::UnusableConfirmation(payment_id)) => {
                // Link it anyway, so that notifications for this payment still find the order
                warn!("🔄️📦️ Payment {payment_id} for order #{order_id} cannot be confirmed by the customer");
                self.db.attach_payment(order_id, &payment_id).await?;
                return Err(PaymentProviderError::UnusableConfirmation(payment_id).into());
            },
            Err(e) => {
                warn!("🔄️📦️ Could not open a payment for order #{order_id}. The order will remain unpaid. {e}");
                return Err(e.into());
            },
        };
        let order = self.db.attach_payment(order_id, &opened.payment_id).await?;
        info!("🔄️📦️ Order #{order_id} submitted with payment {}", opened.payment_id);
        Ok(SubmittedOrder { order, payment_id: opened.payment_id, confirmation: opened.confirmation })
    }

    /// Handles a customer coming back from the payment page.
    ///
    /// * `succeeded`: the linked order is marked paid.
    /// * `waiting_for_capture`: nothing changes, and the order is reported as waiting.
    /// * `pending` or `canceled`: [`OrderFlowError::PaymentNotSuccessful`].
    pub async fn confirm_by_redirect(&self, payment_id: &PaymentId) -> Result<RedirectConfirmation, OrderFlowError> {
        let status = self.provider.fetch_payment_status(payment_id).await?;
        debug!("🔄️💰️ Payment {payment_id} has status {status}");
        match status {
            RemotePaymentStatus::Succeeded => {
                let order = self.order_for_payment(payment_id).await?;
                if order.status == OrderStatusType::Canceled {
                    return Err(OrderFlowError::OrderCanceled(order.id));
                }
                let change = self.mark_paid(order.id).await.map_err(|e| match e {
                    OrderStoreError::IllegalStatusTransition { order_id, .. } => OrderFlowError::OrderCanceled(order_id),
                    e => e.into(),
                })?;
                let newly_paid = change.is_changed();
                Ok(RedirectConfirmation::Paid { order: change.into_order(), newly_paid })
            },
            RemotePaymentStatus::WaitingForCapture => {
                let order = self.order_for_payment(payment_id).await?;
                info!("🔄️💰️ Payment {payment_id} for order #{} is waiting for capture", order.id);
                Ok(RedirectConfirmation::Waiting { order })
            },
            status @ (RemotePaymentStatus::Pending | RemotePaymentStatus::Canceled) => {
                info!("🔄️💰️ Customer returned, but payment {payment_id} is {status}");
                Err(OrderFlowError::PaymentNotSuccessful { payment_id: payment_id.clone(), status })
            },
        }
    }

    /// Handles an asynchronous notification from the payment processor.
    ///
    /// Returns `Ok` for everything the sender should consider delivered, including unknown events and payments. Errors
    /// are only returned when the processor or the store could not be reached, so that the sender retries later.
    pub async fn confirm_by_webhook(&self, notice: PaymentNotice) -> Result<WebhookOutcome, OrderFlowError> {
        let PaymentNotice { event, payment_id } = notice;
        let target = match &event {
            PaymentEvent::Succeeded => OrderStatusType::Paid,
            PaymentEvent::Canceled => OrderStatusType::Canceled,
            PaymentEvent::WaitingForCapture => {
                info!("🔄️💰️ Payment {payment_id} is waiting for capture. No action taken.");
                return Ok(WebhookOutcome::Ignored(format!("payment {payment_id} is waiting for capture")));
            },
            PaymentEvent::Other(name) => {
                info!("🔄️💰️ Ignoring webhook event '{name}' for {payment_id}");
                return Ok(WebhookOutcome::Ignored(format!("unsupported event {name}")));
            },
        };
        let status = match self.provider.fetch_payment_status(&payment_id).await {
            Ok(status) => status,
            Err(PaymentProviderError::PaymentNotFound(_)) => {
                warn!("🔄️💰️ Webhook refers to payment {payment_id}, which the processor does not know. Ignoring it.");
                return Ok(WebhookOutcome::Ignored(format!("unknown payment {payment_id}")));
            },
            Err(e) => return Err(e.into()),
        };
        let expected = match target {
            OrderStatusType::Paid => RemotePaymentStatus::Succeeded,
            _ => RemotePaymentStatus::Canceled,
        };
        if status != expected {
            warn!("🔄️💰️ Webhook says payment {payment_id} is {event}, but the processor reports {status}. Ignoring it.");
            return Ok(WebhookOutcome::Ignored(format!("payment {payment_id} is {status}")));
        }
        let Some(order) = self.db.fetch_order_by_payment_id(&payment_id).await? else {
            warn!("🔄️💰️ No order is linked to payment {payment_id}. Ignoring the webhook.");
            return Ok(WebhookOutcome::Ignored(format!("no order for payment {payment_id}")));
        };
        let result = match target {
            OrderStatusType::Paid => self.mark_paid(order.id).await,
            _ => self.mark_canceled(order.id).await,
        };
        match result {
            Ok(StatusChange::Changed(order)) if target == OrderStatusType::Paid => {
                Ok(WebhookOutcome::MarkedPaid(order.id))
            },
            Ok(StatusChange::Changed(order)) => Ok(WebhookOutcome::MarkedCanceled(order.id)),
            Ok(StatusChange::Unchanged(order)) => Ok(WebhookOutcome::AlreadyProcessed(order.id)),
            Err(OrderStoreError::IllegalStatusTransition { order_id, from, to }) => {
                warn!("🔄️💰️ Order #{order_id} is {from} and cannot become {to}. Ignoring the webhook.");
                Ok(WebhookOutcome::Ignored(format!("order {order_id} is already {from}")))
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Read-only lookup of an order.
    pub async fn order_status(&self, order_id: OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order_by_id(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    async fn order_for_payment(&self, payment_id: &PaymentId) -> Result<Order, OrderFlowError> {
        self.db
            .fetch_order_by_payment_id(payment_id)
            .await?
            .ok_or_else(|| OrderFlowError::PaymentNotLinked(payment_id.clone()))
    }

    async fn mark_paid(&self, order_id: OrderId) -> Result<StatusChange, OrderStoreError> {
        let change = self.db.update_order_status(order_id, OrderStatusType::Paid).await?;
        match &change {
            StatusChange::Changed(order) => {
                info!("🔄️💰️ Order #{order_id} has been paid");
                self.producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
            },
            StatusChange::Unchanged(_) => debug!("🔄️💰️ Order #{order_id} was already paid"),
        }
        Ok(change)
    }

    async fn mark_canceled(&self, order_id: OrderId) -> Result<StatusChange, OrderStoreError> {
        let change = self.db.update_order_status(order_id, OrderStatusType::Canceled).await?;
        match &change {
            StatusChange::Changed(order) => {
                info!("🔄️💰️ Order #{order_id} has been canceled");
                self.producers.publish_order_annulled(OrderAnnulledEvent::new(order.clone())).await;
            },
            StatusChange::Unchanged(_) => debug!("🔄️💰️ Order #{order_id} was already canceled"),
        }
        Ok(change)
    }
}
