//! shop-types: domain entities and repository ports shared by every ring.

pub mod domain;
pub mod ports;
