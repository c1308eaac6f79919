//! shop-hex: storefront API library (application core + inbound HTTP)

pub mod config;
pub mod errors;

pub mod application;
pub mod auth;

pub use shop_types::{domain, ports};

pub mod inbound; // HTTP adapter (server, gates, handlers)
