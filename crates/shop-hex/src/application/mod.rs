pub mod catalog_service;
pub mod order_service;
pub mod policy;
pub mod uploads;
pub mod user_service;
