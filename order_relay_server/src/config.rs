use std::{env, time::Duration};

use log::*;
use order_relay_engine::payment_objects::ConfirmationMode;
use relay_common::{
    helpers::{env_flag, parse_seconds},
    Secret,
    TrustedNetworks,
};
use yookassa_tools::YookassaConfig;

const DEFAULT_RELAY_HOST: &str = "127.0.0.1";
const DEFAULT_RELAY_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/orders.db";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_TELEGRAM_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

/// The address ranges YooKassa sends webhooks from.
/// See <https://yookassa.ru/developers/using-api/webhooks#ip>
pub const YOOKASSA_WEBHOOK_NETWORKS: &str = "185.71.76.0/27, 185.71.77.0/27, 77.75.153.0/25, 77.75.156.11, \
                                             77.75.156.35, 77.75.154.128/25, 2a02:5180::/32";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the `Forwarded` header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// How customers confirm payments: via a redirect to the payment page, or an embedded widget.
    pub confirmation: ConfirmationMode,
    /// Webhook calls are only accepted from these ranges. `None` disables the check.
    pub webhook_networks: Option<TrustedNetworks>,
    /// How long to wait for queued notifications to be delivered on shutdown.
    pub shutdown_timeout: Duration,
    pub yookassa: YookassaConfig,
    pub telegram: TelegramConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RELAY_HOST.to_string(),
            port: DEFAULT_RELAY_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            confirmation: ConfirmationMode::Redirect {
                return_url: default_return_url(DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT),
            },
            webhook_networks: Some(default_webhook_networks()),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            yookassa: YookassaConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("RELAY_HOST").ok().unwrap_or_else(|| DEFAULT_RELAY_HOST.into());
        let port = env::var("RELAY_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for RELAY_PORT. {e} Using the default, {DEFAULT_RELAY_PORT}, \
                         instead."
                    );
                    DEFAULT_RELAY_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_RELAY_PORT);
        let database_url = env::var("RELAY_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ RELAY_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = env_flag("RELAY_USE_X_FORWARDED_FOR", false);
        let use_forwarded = env_flag("RELAY_USE_FORWARDED", false);
        let confirmation = configure_confirmation_mode(&host, port);
        let webhook_networks = configure_webhook_networks(env::var("RELAY_WEBHOOK_TRUSTED_NETWORKS").ok());
        let shutdown_timeout = env::var("RELAY_SHUTDOWN_TIMEOUT")
            .ok()
            .and_then(|s| {
                parse_seconds(&s).or_else(|| {
                    warn!("🪛️ Invalid value for RELAY_SHUTDOWN_TIMEOUT: {s}. Using the default.");
                    None
                })
            })
            .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        let yookassa = YookassaConfig::new_from_env_or_default();
        let telegram = TelegramConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            confirmation,
            webhook_networks,
            shutdown_timeout,
            yookassa,
            telegram,
        }
    }
}

fn default_return_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}/payment_success")
}

pub fn default_webhook_networks() -> TrustedNetworks {
    TrustedNetworks::from_list(YOOKASSA_WEBHOOK_NETWORKS).unwrap_or_default()
}

fn configure_confirmation_mode(host: &str, port: u16) -> ConfirmationMode {
    let mode = env::var("RELAY_CONFIRMATION_MODE").unwrap_or_default().trim().to_lowercase();
    match mode.as_str() {
        "embedded" => {
            info!("🪛️ Payments are confirmed with the embedded YooKassa widget.");
            ConfirmationMode::Embedded
        },
        other => {
            if !other.is_empty() && other != "redirect" {
                warn!("🪛️ Unknown RELAY_CONFIRMATION_MODE '{other}'. Using 'redirect'.");
            }
            let return_url = env::var("RELAY_RETURN_URL").unwrap_or_else(|_| {
                let url = default_return_url(host, port);
                warn!("🪛️ RELAY_RETURN_URL is not set. Customers will be sent back to {url} after paying.");
                url
            });
            info!("🪛️ Payments are confirmed by redirect. Return URL: {return_url}");
            ConfirmationMode::Redirect { return_url }
        },
    }
}

/// Parses the webhook allow-list. Unset means the published YooKassa ranges; `none`, `false` or `0` disables the
/// check. An invalid list falls back to the defaults rather than opening the endpoint up.
pub fn configure_webhook_networks(value: Option<String>) -> Option<TrustedNetworks> {
    let Some(s) = value else {
        info!("🪛️ RELAY_WEBHOOK_TRUSTED_NETWORKS is not set. Using the published YooKassa ranges.");
        return Some(default_webhook_networks());
    };
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        warn!(
            "🚨️ The webhook source check is disabled. Anyone can call /webhook. If this is not what you want, set \
             RELAY_WEBHOOK_TRUSTED_NETWORKS to a comma-separated list of networks."
        );
        return None;
    }
    match TrustedNetworks::from_list(&s) {
        Ok(networks) if networks.is_empty() => {
            warn!(
                "🚨️ The webhook allow-list was configured, but is empty. The server will run, but won't accept any \
                 webhook calls."
            );
            Some(networks)
        },
        Ok(networks) => {
            info!("🪛️ Webhook allow-list: {networks}");
            Some(networks)
        },
        Err(e) => {
            error!("🪛️ Invalid RELAY_WEBHOOK_TRUSTED_NETWORKS. {e}. Using the published YooKassa ranges instead.");
            Some(default_webhook_networks())
        },
    }
}

//-------------------------------------------------  TelegramConfig  ---------------------------------------------------
#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: Secret<String>,
    pub chat_id: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: Secret::default(),
            chat_id: String::default(),
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            timeout: DEFAULT_TELEGRAM_TIMEOUT,
        }
    }
}

impl TelegramConfig {
    pub fn from_env_or_default() -> Self {
        let bot_token = Secret::new(env::var("RELAY_TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ RELAY_TELEGRAM_BOT_TOKEN is not set. Telegram notifications are disabled.");
            String::default()
        }));
        let chat_id = env::var("RELAY_TELEGRAM_CHAT_ID").unwrap_or_else(|_| {
            warn!("🪛️ RELAY_TELEGRAM_CHAT_ID is not set. Telegram notifications are disabled.");
            String::default()
        });
        let api_url = env::var("RELAY_TELEGRAM_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string());
        Self { bot_token, chat_id, api_url, timeout: DEFAULT_TELEGRAM_TIMEOUT }
    }

    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.trim().is_empty()
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
