use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::future::join_all;
use log::*;
use order_relay_engine::{OrderFlowApi, OrderManagement, SqliteDatabase};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{telegram::create_telegram_event_handlers, yookassa::YookassaProvider},
    middleware::TrustedSourceMiddlewareFactory,
    routes::{health, service_info, OrderStatusRoute, PaymentSuccessRoute, SubmitOrderRoute, WebhookRoute},
};

pub type RelayApi = OrderFlowApi<SqliteDatabase, YookassaProvider>;

/// Runs the relay until the HTTP server stops (e.g. on Ctrl-C).
///
/// The notification worker is started before the server accepts requests. Once the server has stopped, queued
/// notifications are given `shutdown_timeout` to go out before the database is closed.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let provider = YookassaProvider::new(config.yookassa.clone())
        .map_err(|e| ServerError::ConfigurationError(format!("YooKassa is not configured. {e}")))?;
    let handlers = create_telegram_event_handlers(config.telegram.clone());
    let producers = handlers.producers();
    let workers = handlers.start_handlers();
    debug!("🚀️ Started {} notification worker(s)", workers.len());

    let api = web::Data::new(OrderFlowApi::new(db.clone(), provider, config.confirmation.clone(), producers));
    let srv = create_server_instance(&config, api.clone())?;
    info!("🚀️ Listening on {}:{}", config.host, config.port);
    let result = srv.await.map_err(ServerError::from);

    info!("🚀️ Server stopped. Delivering outstanding notifications.");
    // The event workers exit once every producer is gone, and the API holds the last ones.
    drop(api);
    drain_workers(workers, config.shutdown_timeout).await;
    if let Err(e) = db.close().await {
        warn!("🚀️ Could not close the database cleanly. {e}");
    }
    result
}

pub fn create_server_instance(config: &ServerConfig, api: web::Data<RelayApi>) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(config);
    let webhook_networks = config.webhook_networks.clone();
    let srv = HttpServer::new(move || {
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("relay::access_log"))
            .app_data(api.clone())
            .app_data(json_config())
            .app_data(query_config());
        // YooKassa webhooks are only accepted from its published address ranges
        let webhook_scope = web::scope("/webhook")
            .wrap(TrustedSourceMiddlewareFactory::new(webhook_networks.clone(), options))
            .service(WebhookRoute::<SqliteDatabase, YookassaProvider>::new());
        app.service(health)
            .service(service_info)
            .service(SubmitOrderRoute::<SqliteDatabase, YookassaProvider>::new())
            .service(PaymentSuccessRoute::<SqliteDatabase, YookassaProvider>::new())
            .service(OrderStatusRoute::<SqliteDatabase, YookassaProvider>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are reported as 400 with the usual `{detail}` body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not deserialize request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not deserialize request query. {err}");
        ServerError::InvalidRequestQuery(err.to_string()).into()
    })
}

async fn drain_workers(workers: Vec<tokio::task::JoinHandle<()>>, timeout: Duration) {
    if workers.is_empty() {
        return;
    }
    match tokio::time::timeout(timeout, join_all(workers)).await {
        Ok(results) => {
            for e in results.into_iter().filter_map(Result::err) {
                error!("🚀️ A notification worker failed. {e}");
            }
            info!("🚀️ All notifications delivered");
        },
        Err(_) => warn!(
            "🚀️ Notifications were still pending after {}s. They will not be sent.",
            timeout.as_secs()
        ),
    }
}
