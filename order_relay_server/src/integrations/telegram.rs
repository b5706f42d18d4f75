//! Telegram notifications for the shop owner.
//!
//! The notifier subscribes to the order flow's events. Every order that becomes paid or canceled results in one
//! message to the configured chat. Delivery happens on the event worker, so a slow or failing Bot API never holds up
//! (or fails) the HTTP request that changed the order.
use std::{fmt::Write, sync::Arc};

use log::*;
use order_relay_engine::{
    db_types::Order,
    events::{EventHandlers, EventHooks, OrderAnnulledEvent, OrderPaidEvent},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TelegramConfig;

pub const TELEGRAM_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Could not initialize the Telegram client. {0}")]
    Initialization(String),
    #[error("Could not reach the Telegram Bot API. {0}")]
    Transport(String),
    #[error("The Telegram Bot API rejected the message. Error {status}. {description}")]
    Rejected { status: u16, description: String },
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramApi {
    config: TelegramConfig,
    client: Arc<Client>,
}

impl TelegramApi {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        if !config.is_configured() {
            return Err(TelegramError::Initialization("A bot token and chat id are both required".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TelegramError::Initialization(e.without_url().to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn chat_id(&self) -> &str {
        self.config.chat_id.as_str()
    }

    /// Sends `text` to the configured chat.
    ///
    /// The request URL embeds the bot token, so it must never end up in logs or error messages. Transport errors are
    /// stripped of their URL before being returned.
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let url = format!("{}/bot{}/sendMessage", self.config.api_url, self.config.bot_token.reveal());
        trace!("📨️ Sending message to chat {}", self.config.chat_id);
        let body = SendMessage { chat_id: &self.config.chat_id, text };
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Transport(e.without_url().to_string()))?;
        let status = response.status();
        let reply = response.json::<BotApiResponse>().await.ok();
        match reply {
            Some(BotApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            reply => {
                let description = reply.and_then(|r| r.description).unwrap_or_else(|| "No description".into());
                Err(TelegramError::Rejected { status: status.as_u16(), description })
            },
        }
    }
}

pub fn format_paid_message(order: &Order) -> String {
    let mut msg = format!("Оплачен заказ №{}, сумма {} руб.\n", order.id, order.total_amount);
    append_order_details(&mut msg, order);
    msg
}

pub fn format_canceled_message(order: &Order) -> String {
    let mut msg = format!("Отменён заказ №{}, сумма {} руб.\n", order.id, order.total_amount);
    append_order_details(&mut msg, order);
    msg
}

fn append_order_details(msg: &mut String, order: &Order) {
    msg.push_str("\nСостав заказа:\n");
    for item in order.items() {
        let _ = writeln!(msg, "• {} × {}", item.name, item.quantity);
    }
    let _ = writeln!(msg, "\nEmail: {}", order.email);
    let _ = writeln!(msg, "Телефон: {}", order.phone);
    let _ = writeln!(msg, "Адрес: {}", order.address);
    if !order.delivery_time.is_empty() {
        let _ = writeln!(msg, "Время доставки: {}", order.delivery_time);
    }
    if !order.order_time.is_empty() {
        let _ = writeln!(msg, "Время заказа: {}", order.order_time);
    }
}

/// Assigns event handlers that notify the shop's Telegram chat.
///
/// 1. OrderPaidEvent - A summary of the order, its items and the customer's contact details.
/// 2. OrderAnnulledEvent - The same summary, flagged as canceled.
///
/// If Telegram is not configured, no hooks are registered and events are simply dropped.
pub fn create_telegram_event_handlers(config: TelegramConfig) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let api = match TelegramApi::new(config) {
        Ok(api) => api,
        Err(e) => {
            warn!("📨️ Telegram notifications are disabled. {e}");
            return EventHandlers::new(TELEGRAM_EVENT_BUFFER_SIZE, hooks);
        },
    };
    info!("📨️ Order notifications will be sent to Telegram chat {}", api.chat_id());
    let api_clone = api.clone();
    // --- On OrderPaid Handler ---
    hooks.on_order_paid(move |ev: OrderPaidEvent| {
        let order = ev.order;
        let api = api_clone.clone();
        Box::pin(async move {
            let text = format_paid_message(&order);
            match api.send_message(&text).await {
                Ok(()) => info!("📨️ Sent payment notification for order #{}", order.id),
                Err(e) => error!("📨️ Could not send payment notification for order #{}. {e}", order.id),
            }
        })
    });
    // --- On OrderAnnulled Handler ---
    hooks.on_order_annulled(move |ev: OrderAnnulledEvent| {
        let OrderAnnulledEvent { order, status } = ev;
        let api = api.clone();
        debug!("📨️ Order #{} is now {status}. Notifying Telegram.", order.id);
        Box::pin(async move {
            let text = format_canceled_message(&order);
            match api.send_message(&text).await {
                Ok(()) => info!("📨️ Sent cancellation notification for order #{}", order.id),
                Err(e) => error!("📨️ Could not send cancellation notification for order #{}. {e}", order.id),
            }
        })
    });
    EventHandlers::new(TELEGRAM_EVENT_BUFFER_SIZE, hooks)
}
