#![allow(clippy::manual_unwrap_or_default)]
#![allow(clippy::manual_unwrap_or)]

pub mod client;
pub mod constants;
pub mod failover;
pub mod forwarder;
pub mod gemini;
pub mod health;
pub mod logging;
pub mod main_helper;
pub mod persona;
pub mod redaction_layer;
pub mod resolver;
pub mod routes;
pub mod str_utils;
pub mod synthetic;
pub mod types;

pub use types::*;

pub use main_helper::{AppState, Args, GatewayConfig};
