use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use order_relay_engine::{
    db_types::{NewOrder, OrderItem, PaymentId, Rubles},
    payment_objects::{ConfirmationHandle, ConfirmationMode, OpenedPayment, PaymentRequest, RemotePaymentStatus},
    PaymentProvider,
    PaymentProviderError,
};

/// A payment provider whose answers are set up by the test.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    inner: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    open_results: VecDeque<Result<(), PaymentProviderError>>,
    statuses: HashMap<PaymentId, Result<RemotePaymentStatus, PaymentProviderError>>,
    requests: Vec<PaymentRequest>,
    status_checks: usize,
    next_payment: u32,
}

impl ScriptedProvider {
    /// The next `open_payment` call fails with `err`. Calls without a queued result succeed.
    pub fn fail_next_open(&self, err: PaymentProviderError) {
        self.inner.lock().unwrap().open_results.push_back(Err(err));
    }

    pub fn set_status(&self, payment_id: &PaymentId, status: RemotePaymentStatus) {
        self.inner.lock().unwrap().statuses.insert(payment_id.clone(), Ok(status));
    }

    pub fn set_status_error(&self, payment_id: &PaymentId, err: PaymentProviderError) {
        self.inner.lock().unwrap().statuses.insert(payment_id.clone(), Err(err));
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn status_checks(&self) -> usize {
        self.inner.lock().unwrap().status_checks
    }
}

impl PaymentProvider for ScriptedProvider {
    async fn open_payment(&self, request: PaymentRequest) -> Result<OpenedPayment, PaymentProviderError> {
        let mut script = self.inner.lock().unwrap();
        let confirmation_mode = request.confirmation.clone();
        script.requests.push(request);
        script.open_results.pop_front().unwrap_or(Ok(()))?;
        script.next_payment += 1;
        let payment_id = PaymentId::from(format!("pay-{:04}", script.next_payment));
        script.statuses.insert(payment_id.clone(), Ok(RemotePaymentStatus::Pending));
        let confirmation = match confirmation_mode {
            ConfirmationMode::Redirect { .. } => {
                ConfirmationHandle::PaymentUrl(format!("https://checkout.example/{payment_id}"))
            },
            ConfirmationMode::Embedded => ConfirmationHandle::ConfirmationToken(format!("ct-{payment_id}")),
        };
        Ok(OpenedPayment { payment_id, status: RemotePaymentStatus::Pending, confirmation })
    }

    async fn fetch_payment_status(&self, payment_id: &PaymentId) -> Result<RemotePaymentStatus, PaymentProviderError> {
        let mut script = self.inner.lock().unwrap();
        script.status_checks += 1;
        script
            .statuses
            .get(payment_id)
            .cloned()
            .unwrap_or_else(|| Err(PaymentProviderError::PaymentNotFound(payment_id.clone())))
    }
}

pub fn widget_order() -> NewOrder {
    NewOrder {
        email: "a@b.com".into(),
        phone: "+1".into(),
        address: "X".into(),
        delivery_time: "завтра 10:00".into(),
        order_time: "2024-05-01 09:00".into(),
        items: vec![OrderItem { name: "Widget".into(), quantity: 2 }],
        total_amount: Rubles::from_kopecks(999),
    }
}

pub fn redirect_mode() -> ConfirmationMode {
    ConfirmationMode::Redirect { return_url: "https://shop.example/payment_success".into() }
}
