use shop_types::domain::order::{is_lifecycle_status, lifecycle_allows};
use std::str::FromStr;

/// Where an order's `totalPrice` comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PricePolicy {
    /// Store the total the client sent.
    #[default]
    Client,
    /// Sum quantity x current catalog price; unknown products are rejected.
    Server,
}

/// Which status changes are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Any non-empty label.
    #[default]
    Free,
    /// Pending -> Processing -> Shipped -> Delivered, Cancelled before shipping.
    Lifecycle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderPolicy {
    pub price: PricePolicy,
    pub status: StatusPolicy,
}

impl FromStr for PricePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(PricePolicy::Client),
            "server" => Ok(PricePolicy::Server),
            other => anyhow::bail!("unknown price policy {other:?} (expected client|server)"),
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(StatusPolicy::Free),
            "lifecycle" => Ok(StatusPolicy::Lifecycle),
            other => anyhow::bail!("unknown status policy {other:?} (expected free|lifecycle)"),
        }
    }
}

impl StatusPolicy {
    /// Returns the rejection reason, if any.
    pub fn check(&self, from: &str, to: &str) -> Result<(), String> {
        if to.trim().is_empty() {
            return Err("status must not be empty".into());
        }
        match self {
            StatusPolicy::Free => Ok(()),
            StatusPolicy::Lifecycle if !is_lifecycle_status(to) => {
                Err(format!("unknown order status {to:?}"))
            }
            StatusPolicy::Lifecycle if lifecycle_allows(from, to) => Ok(()),
            StatusPolicy::Lifecycle => Err(format!("cannot move order from {from} to {to}")),
        }
    }
}
