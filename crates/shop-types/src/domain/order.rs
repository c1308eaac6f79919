use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::Product;
use super::user::{Address, UserSummary};

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_PROCESSING: &str = "Processing";
pub const STATUS_SHIPPED: &str = "Shipped";
pub const STATUS_DELIVERED: &str = "Delivered";
pub const STATUS_CANCELLED: &str = "Cancelled";

/// Payment label recorded on the order. No gateway is involved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit-card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::CashOnDelivery => "cash-on-delivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit-card" => Ok(PaymentMethod::CreditCard),
            "paypal" => Ok(PaymentMethod::Paypal),
            "cash-on-delivery" => Ok(PaymentMethod::CashOnDelivery),
            other => anyhow::bail!("unknown payment method: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<LineItem>,
    pub total_price: f64,
    pub payment_method: Option<PaymentMethod>,
    pub status: String,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: Uuid, items: Vec<LineItem>, total_price: f64) -> anyhow::Result<Self> {
        if items.is_empty() {
            anyhow::bail!("No products in order");
        }
        for it in &items {
            if it.quantity == 0 {
                anyhow::bail!("item quantity must be > 0");
            }
        }
        if !total_price.is_finite() || total_price < 0.0 {
            anyhow::bail!("totalPrice must be a non-negative number");
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            total_price,
            payment_method: None,
            status: STATUS_PENDING.to_string(),
            address: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_payment_method(mut self, method: Option<PaymentMethod>) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn update_status(&mut self, status: String) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Drops every line item for `product_id`. Returns whether anything changed.
    pub fn remove_product(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|it| it.product_id != product_id);
        let changed = self.items.len() != before;
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.items.iter().map(|it| it.product_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Whether the conventional order lifecycle permits `from -> to`.
/// Re-applying the current status is always allowed.
pub fn lifecycle_allows(from: &str, to: &str) -> bool {
    if from == to {
        return is_lifecycle_status(to);
    }
    matches!(
        (from, to),
        (STATUS_PENDING, STATUS_PROCESSING)
            | (STATUS_PENDING, STATUS_SHIPPED)
            | (STATUS_PENDING, STATUS_CANCELLED)
            | (STATUS_PROCESSING, STATUS_SHIPPED)
            | (STATUS_PROCESSING, STATUS_CANCELLED)
            | (STATUS_SHIPPED, STATUS_DELIVERED)
    )
}

pub fn is_lifecycle_status(s: &str) -> bool {
    matches!(
        s,
        STATUS_PENDING | STATUS_PROCESSING | STATUS_SHIPPED | STATUS_DELIVERED | STATUS_CANCELLED
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLineItem {
    pub product_id: Uuid,
    pub quantity: u32,
    /// `None` when the product has since been deleted.
    pub product: Option<Product>,
}

/// An order with its line-item product references resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<ResolvedLineItem>,
    pub total_price: f64,
    pub payment_method: Option<PaymentMethod>,
    pub status: String,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn resolve(order: Order, products: &HashMap<Uuid, Product>) -> Self {
        let items = order
            .items
            .iter()
            .map(|it| ResolvedLineItem {
                product_id: it.product_id,
                quantity: it.quantity,
                product: products.get(&it.product_id).cloned(),
            })
            .collect();
        Self {
            id: order.id,
            user_id: order.user_id,
            items,
            total_price: order.total_price,
            payment_method: order.payment_method,
            status: order.status,
            address: order.address,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Admin listing row: the stored order plus its owner, if still present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderView {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<UserSummary>,
}
