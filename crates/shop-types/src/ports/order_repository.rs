use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::order::Order;

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError>;
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError>;
    async fn list_orders(&self) -> Result<Vec<Order>, RepoError>;
    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError>;
    /// Replaces the stored document. `None` if no order has this id.
    async fn update_order(&self, order: Order) -> Result<Option<Order>, RepoError>;
}
