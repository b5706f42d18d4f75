use log::*;
use order_relay_engine::{
    db_types::PaymentId,
    order_objects::{PaymentEvent, PaymentNotice},
    payment_objects::{ConfirmationHandle, ConfirmationMode, OpenedPayment, PaymentRequest, RemotePaymentStatus},
    PaymentProvider,
    PaymentProviderError,
};
use yookassa_tools::{
    Amount,
    Confirmation,
    ConfirmationRequest,
    NewPayment,
    PaymentStatus,
    WebhookEvent,
    WebhookNotification,
    YookassaApi,
    YookassaApiError,
    YookassaConfig,
};

use crate::errors::ServerError;

pub const ORDER_ID_METADATA_KEY: &str = "order_id";

/// Plugs the YooKassa REST client into the order flow.
#[derive(Clone)]
pub struct YookassaProvider {
    api: YookassaApi,
}

impl YookassaProvider {
    pub fn new(config: YookassaConfig) -> Result<Self, YookassaApiError> {
        let api = YookassaApi::new(config)?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &YookassaApi {
        &self.api
    }
}

impl PaymentProvider for YookassaProvider {
    async fn open_payment(&self, request: PaymentRequest) -> Result<OpenedPayment, PaymentProviderError> {
        let mode = request.confirmation.clone();
        let payment = new_payment_from_request(request);
        let key = payment.idempotence_key;
        let result = self.api.create_payment(&payment.body, &key).await.map_err(provider_error)?;
        let payment_id = PaymentId::from(result.id);
        let confirmation = confirmation_handle(&payment_id, mode, result.confirmation)?;
        Ok(OpenedPayment { payment_id, status: remote_status(result.status), confirmation })
    }

    async fn fetch_payment_status(&self, payment_id: &PaymentId) -> Result<RemotePaymentStatus, PaymentProviderError> {
        let payment = self.api.get_payment(payment_id.as_str()).await.map_err(|e| match e {
            YookassaApiError::InvalidPaymentId(_) | YookassaApiError::QueryError { status: 404, .. } => {
                PaymentProviderError::PaymentNotFound(payment_id.clone())
            },
            e => provider_error(e),
        })?;
        Ok(remote_status(payment.status))
    }
}

struct PreparedPayment {
    body: NewPayment,
    idempotence_key: String,
}

fn new_payment_from_request(request: PaymentRequest) -> PreparedPayment {
    let confirmation = match request.confirmation {
        ConfirmationMode::Redirect { return_url } => ConfirmationRequest::Redirect { return_url },
        ConfirmationMode::Embedded => ConfirmationRequest::Embedded,
    };
    let amount = Amount { value: request.amount, currency: request.currency };
    let body = NewPayment::new(amount, confirmation, request.description)
        .with_metadata(ORDER_ID_METADATA_KEY, request.order_id.to_string());
    PreparedPayment { body, idempotence_key: request.idempotency_key }
}

/// Picks the customer's way to pay out of a freshly created payment. The payment already exists at this point, so a
/// mismatch carries its id back to the order flow.
fn confirmation_handle(
    payment_id: &PaymentId,
    mode: ConfirmationMode,
    confirmation: Option<Confirmation>,
) -> Result<ConfirmationHandle, PaymentProviderError> {
    match (mode, confirmation) {
        (ConfirmationMode::Redirect { .. }, Some(Confirmation::Redirect { confirmation_url, .. })) => {
            Ok(ConfirmationHandle::PaymentUrl(confirmation_url))
        },
        (ConfirmationMode::Embedded, Some(Confirmation::Embedded { confirmation_token })) => {
            Ok(ConfirmationHandle::ConfirmationToken(confirmation_token))
        },
        (mode, other) => {
            error!("💳️ Payment {payment_id} was created, but its confirmation ({other:?}) does not match {mode:?}");
            Err(PaymentProviderError::UnusableConfirmation(payment_id.clone()))
        },
    }
}

fn remote_status(status: PaymentStatus) -> RemotePaymentStatus {
    match status {
        PaymentStatus::Pending => RemotePaymentStatus::Pending,
        PaymentStatus::WaitingForCapture => RemotePaymentStatus::WaitingForCapture,
        PaymentStatus::Succeeded => RemotePaymentStatus::Succeeded,
        PaymentStatus::Canceled => RemotePaymentStatus::Canceled,
    }
}

fn provider_error(e: YookassaApiError) -> PaymentProviderError {
    match e {
        YookassaApiError::QueryError { status, message } if status < 500 => {
            PaymentProviderError::Rejected { status, message }
        },
        e @ (YookassaApiError::JsonError(_) | YookassaApiError::InvalidPaymentId(_)) => {
            PaymentProviderError::InvalidResponse(e.to_string())
        },
        e => PaymentProviderError::Unavailable(e.to_string()),
    }
}

/// Reduces a webhook body to the notice the order flow acts on. The `object.status` claim is dropped here on purpose:
/// the order flow re-fetches the payment instead.
pub fn payment_notice_from_webhook(notification: WebhookNotification) -> Result<PaymentNotice, ServerError> {
    if !notification.is_notification() {
        return Err(ServerError::InvalidRequestBody(format!("Unexpected notification type '{}'", notification.kind)));
    }
    if notification.object.id.trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("The notification has no payment id".into()));
    }
    if let Some(claimed) = &notification.object.status {
        trace!("💳️ Webhook for {} claims status {claimed}", notification.object.id);
    }
    let event = match notification.event {
        WebhookEvent::PaymentSucceeded => PaymentEvent::Succeeded,
        WebhookEvent::PaymentWaitingForCapture => PaymentEvent::WaitingForCapture,
        WebhookEvent::PaymentCanceled => PaymentEvent::Canceled,
        WebhookEvent::Other(name) => PaymentEvent::Other(name),
    };
    Ok(PaymentNotice { event, payment_id: PaymentId::from(notification.object.id) })
}
