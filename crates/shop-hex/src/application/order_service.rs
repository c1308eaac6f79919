use crate::application::policy::{OrderPolicy, PricePolicy};
use crate::errors::{AppError, FieldError};
use shop_types::domain::order::{AdminOrderView, LineItem, Order, OrderView, PaymentMethod};
use shop_types::domain::product::Product;
use shop_types::domain::user::UserSummary;
use shop_types::ports::Store;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const MSG_NO_PRODUCTS: &str = "No products in order";
pub const MSG_NO_ADDRESS: &str = "No address found. Please add an address first.";

/// What a customer submits when placing an order.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub items: Vec<LineItem>,
    pub total_price: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
}

/// Who is asking. Customers only ever see their own orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Customer(Uuid),
    Admin,
}

pub struct OrderService<R: Store> {
    repo: Arc<R>,
    policy: OrderPolicy,
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".into())
}

impl<R: Store> OrderService<R> {
    pub fn new(repo: Arc<R>, policy: OrderPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> OrderPolicy {
        self.policy
    }

    async fn resolve_total(&self, draft: &OrderDraft) -> Result<f64, AppError> {
        match self.policy.price {
            PricePolicy::Client => draft.total_price.ok_or_else(|| {
                AppError::Validation(vec![FieldError::new("totalPrice", "totalPrice is required")])
            }),
            PricePolicy::Server => {
                let mut total = 0.0;
                for item in &draft.items {
                    let product = self.repo.get_product(item.product_id).await?.ok_or_else(|| {
                        AppError::BadRequest(format!("Product {} not found", item.product_id))
                    })?;
                    total += product.price * f64::from(item.quantity);
                }
                Ok((total * 100.0).round() / 100.0)
            }
        }
    }

    async fn build(&self, user_id: Uuid, draft: OrderDraft) -> Result<Order, AppError> {
        if draft.items.is_empty() {
            return Err(AppError::BadRequest(MSG_NO_PRODUCTS.into()));
        }
        let total = self.resolve_total(&draft).await?;
        let order = Order::new(user_id, draft.items, total)
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .with_payment_method(draft.payment_method);
        Ok(order)
    }

    /// Places an order for `user_id`. Stock is not checked or decremented.
    pub async fn create_order(&self, user_id: Uuid, draft: OrderDraft) -> Result<Order, AppError> {
        let order = self.build(user_id, draft).await?;
        let order = self.repo.create_order(order).await?;
        tracing::info!(order_id = %order.id, %user_id, total = order.total_price, "order created");
        Ok(order)
    }

    /// Places an order that snapshots one of the user's saved addresses
    /// (the first one unless `address_index` says otherwise).
    pub async fn checkout(
        &self,
        user_id: Uuid,
        draft: OrderDraft,
        address_index: Option<usize>,
    ) -> Result<Order, AppError> {
        let user = self
            .repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))?;
        if user.addresses.is_empty() {
            return Err(AppError::BadRequest(MSG_NO_ADDRESS.into()));
        }
        let index = address_index.unwrap_or(0);
        let address = user
            .addresses
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::BadRequest(format!("No address at index {index}")))?;

        let order = self.build(user_id, draft).await?.with_address(address);
        let order = self.repo.create_order(order).await?;
        tracing::info!(order_id = %order.id, %user_id, "checkout completed");
        Ok(order)
    }

    /// Every order the user owns, oldest first. May be empty.
    pub async fn order_history(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list_orders_for_user(user_id).await?)
    }

    /// Like [`Self::order_history`] with products resolved, but an empty
    /// history is reported as NotFound.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, AppError> {
        let orders = self.order_history(user_id).await?;
        if orders.is_empty() {
            return Err(AppError::NotFound("No orders found for this user".into()));
        }
        let ids: Vec<Uuid> = orders.iter().flat_map(|o| o.product_ids()).collect();
        let products = self.products_by_id(ids).await?;
        Ok(orders
            .into_iter()
            .map(|o| OrderView::resolve(o, &products))
            .collect())
    }

    async fn products_by_id(&self, mut ids: Vec<Uuid>) -> Result<HashMap<Uuid, Product>, AppError> {
        ids.sort();
        ids.dedup();
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(p) = self.repo.get_product(id).await? {
                found.insert(id, p);
            }
        }
        Ok(found)
    }

    async fn load(&self, id: Uuid, access: Access) -> Result<Order, AppError> {
        let order = self.repo.get_order(id).await?.ok_or_else(order_not_found)?;
        match access {
            Access::Customer(user_id) if order.user_id != user_id => Err(order_not_found()),
            _ => Ok(order),
        }
    }

    pub async fn get_order(&self, id: Uuid, access: Access) -> Result<OrderView, AppError> {
        let order = self.load(id, access).await?;
        let products = self.products_by_id(order.product_ids()).await?;
        Ok(OrderView::resolve(order, &products))
    }

    /// Removing a product the order does not contain is a successful no-op.
    pub async fn remove_item(
        &self,
        order_id: Uuid,
        product_id: Uuid,
        access: Access,
    ) -> Result<Order, AppError> {
        let mut order = self.load(order_id, access).await?;
        if !order.remove_product(product_id) {
            return Ok(order);
        }
        let order = self
            .repo
            .update_order(order)
            .await?
            .ok_or_else(order_not_found)?;
        tracing::info!(order_id = %order.id, %product_id, "line item removed");
        Ok(order)
    }

    pub async fn update_status(
        &self,
        order_id: Uuid,
        status: String,
        access: Access,
    ) -> Result<Order, AppError> {
        let mut order = self.load(order_id, access).await?;
        let status = status.trim().to_string();
        self.policy
            .status
            .check(&order.status, &status)
            .map_err(AppError::BadRequest)?;
        let previous = std::mem::take(&mut order.status);
        order.update_status(status);
        let order = self
            .repo
            .update_order(order)
            .await?
            .ok_or_else(order_not_found)?;
        tracing::info!(order_id = %order.id, from = %previous, to = %order.status, "order status updated");
        Ok(order)
    }

    /// Admin variant: a missing status leaves the order as it is.
    pub async fn admin_update_status(
        &self,
        order_id: Uuid,
        status: Option<String>,
    ) -> Result<Order, AppError> {
        match status {
            Some(s) => self.update_status(order_id, s, Access::Admin).await,
            None => self.load(order_id, Access::Admin).await,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<AdminOrderView>, AppError> {
        let users: HashMap<Uuid, UserSummary> = self
            .repo
            .list_users()
            .await?
            .iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();
        let orders = self.repo.list_orders().await?;
        Ok(orders
            .into_iter()
            .map(|order| {
                let user = users.get(&order.user_id).cloned();
                AdminOrderView { order, user }
            })
            .collect())
    }
}
