use std::sync::Arc;

use log::*;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::YookassaConfig,
    data_objects::{NewPayment, Payment},
    YookassaApiError,
};

pub const IDEMPOTENCE_KEY_HEADER: &str = "Idempotence-Key";

#[derive(Clone)]
pub struct YookassaApi {
    config: YookassaConfig,
    client: Arc<Client>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl YookassaApi {
    pub fn new(config: YookassaConfig) -> Result<Self, YookassaApiError> {
        if config.shop_id.trim().is_empty() || config.secret_key.is_empty() {
            return Err(YookassaApiError::Initialization("The shop id and secret key are both required".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| YookassaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &YookassaConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Sends a request, retrying transient failures according to the configured [`crate::RetryPolicy`].
    ///
    /// Every attempt carries the same idempotence key, so YooKassa will not create a second payment if an earlier
    /// attempt actually succeeded but its response was lost.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotence_key: Option<&str>,
    ) -> Result<T, YookassaApiError> {
        let policy = self.config.retry;
        let max_attempts = policy.max_attempts();
        let mut attempt = 1;
        loop {
            let req = self.build_request(method.clone(), path, body, idempotence_key);
            match self.send_once::<T>(req).await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    error!("💳️ {method} {path} failed after {attempt} attempts. {e}");
                    if max_attempts == 1 {
                        return Err(e);
                    }
                    return Err(YookassaApiError::RetriesExhausted { attempts: attempt, last_error: Box::new(e) });
                },
                Err(e) => {
                    let delay = policy.backoff_for(attempt);
                    warn!(
                        "💳️ {method} {path} failed on attempt {attempt}/{max_attempts}. {e}. Retrying in {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
            }
        }
    }

    fn build_request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotence_key: Option<&str>,
    ) -> RequestBuilder {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.shop_id, Some(self.config.secret_key.reveal()));
        if let Some(key) = idempotence_key {
            req = req.header(IDEMPOTENCE_KEY_HEADER, key);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req
    }

    async fn send_once<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, YookassaApiError> {
        let response = req.send().await.map_err(|e| {
            if e.is_builder() {
                YookassaApiError::RestRequestError(e.to_string())
            } else {
                YookassaApiError::Transport(e.to_string())
            }
        })?;
        let status = response.status();
        if status.is_success() {
            trace!("💳️ REST query successful. {status}");
            return response.json::<T>().await.map_err(|e| YookassaApiError::JsonError(e.to_string()));
        }
        let text = response.text().await.map_err(|e| YookassaApiError::Transport(e.to_string()))?;
        let message = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(ApiErrorBody { code: Some(code), description: Some(desc) }) => format!("{code}: {desc}"),
            Ok(ApiErrorBody { description: Some(desc), .. }) => desc,
            _ => text,
        };
        Err(YookassaApiError::QueryError { status: status.as_u16(), message })
    }

    /// Creates a payment. The same `idempotence_key` must be used when repeating a request for the same order.
    pub async fn create_payment(
        &self,
        payment: &NewPayment,
        idempotence_key: &str,
    ) -> Result<Payment, YookassaApiError> {
        debug!("💳️ Creating payment for {} {}", payment.amount.value, payment.amount.currency);
        let result = self
            .rest_query::<Payment, NewPayment>(Method::POST, "/payments", Some(payment), Some(idempotence_key))
            .await?;
        info!("💳️ Created payment {} with status {}", result.id, result.status);
        Ok(result)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, YookassaApiError> {
        if !is_valid_payment_id(payment_id) {
            return Err(YookassaApiError::InvalidPaymentId(payment_id.to_string()));
        }
        let path = format!("/payments/{payment_id}");
        debug!("💳️ Fetching payment {payment_id}");
        let result = self.rest_query::<Payment, ()>(Method::GET, &path, None, None).await?;
        debug!("💳️ Payment {payment_id} has status {}", result.status);
        Ok(result)
    }
}

/// YooKassa payment ids are UUID-like strings. Anything else is rejected before it is spliced into a URL path.
pub fn is_valid_payment_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
