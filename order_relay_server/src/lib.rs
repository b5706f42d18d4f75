//! # Order relay server
//! This crate hosts the HTTP front-end of the order relay. It is responsible for:
//! * Accepting orders from the shop front-end and opening a YooKassa payment for each.
//! * Confirming payments when the customer returns from the payment page, or when YooKassa posts a notification.
//! * Telling the shop's Telegram chat about paid and canceled orders.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/`: The service name and version.
//! * `/order`: Submit a new order.
//! * `/order/{order_id}/status`: Look up an order.
//! * `/payment_success`: Where customers land after paying.
//! * `/webhook`: YooKassa notifications. Only accepted from trusted networks.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
