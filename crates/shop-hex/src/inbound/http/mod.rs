pub mod admin;
pub mod extract;
pub mod orders;
pub mod products;
pub mod requests;
pub mod server;
pub mod users;

pub use server::{AppState, HttpServer, HttpServerConfig};
