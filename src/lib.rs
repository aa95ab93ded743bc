//! snaplink - a deduplicating URL shortener.
//!
//! The server side issues short codes through [`services::ShortenerService`]
//! and exposes them over HTTP ([`routes`]). The client side ([`client`],
//! [`history`]) shortens through that API and keeps a bounded history of
//! recent conversions.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod store;
