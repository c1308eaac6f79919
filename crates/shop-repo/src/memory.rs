use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shop_types::domain::order::Order;
use shop_types::domain::product::{Product, ProductFilter};
use shop_types::domain::user::User;
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub users: Arc<DashMap<Uuid, User>>,
    /// email -> user id; claimed before a user row is written.
    pub emails: Arc<DashMap<String, Uuid>>,
    pub products: Arc<DashMap<Uuid, Product>>,
    pub orders: Arc<DashMap<Uuid, Order>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            emails: Arc::new(DashMap::new()),
            products: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
        }
    }

    fn claim_email(&self, email: &str, owner: Uuid) -> Result<(), RepoError> {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(e) if *e.get() != owner => {
                Err(RepoError::Conflict(format!("email {email} already registered")))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(v) => {
                v.insert(owner);
                Ok(())
            }
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn oldest_first<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    rows.sort_by_key(|r| key(r));
    rows
}

#[async_trait]
impl UserRepository for InMemoryRepo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        self.claim_email(&user.email, user.id)?;
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.get(&id).map(|r| r.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let Some(id) = self.emails.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        self.get_user(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let rows = self.users.iter().map(|kv| kv.value().clone()).collect();
        Ok(oldest_first(rows, |u: &User| u.created_at))
    }

    async fn update_user(&self, user: User) -> Result<Option<User>, RepoError> {
        // The row guard serialises email swaps and deletes for this user.
        let Some(mut existing) = self.users.get_mut(&user.id) else {
            return Ok(None);
        };
        if existing.email != user.email {
            self.claim_email(&user.email, user.id)?;
            self.emails.remove_if(&existing.email, |_, owner| *owner == user.id);
        }
        *existing = user.clone();
        Ok(Some(user))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError> {
        match self.users.remove(&id) {
            Some((_, user)) => {
                self.emails.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        Ok(self.products.get(&id).map(|r| r.clone()))
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let rows = self.products.iter().map(|kv| kv.value().clone()).collect();
        Ok(oldest_first(rows, |p: &Product| p.created_at))
    }

    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepoError> {
        let rows = self
            .products
            .iter()
            .filter(|kv| filter.matches(kv.value()))
            .map(|kv| kv.value().clone())
            .collect();
        Ok(oldest_first(rows, |p: &Product| p.created_at))
    }

    async fn update_product(&self, product: Product) -> Result<Option<Product>, RepoError> {
        if let Some(mut v) = self.products.get_mut(&product.id) {
            *v = product.clone();
            return Ok(Some(product));
        }
        Ok(None)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.products.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let rows = self.orders.iter().map(|kv| kv.value().clone()).collect();
        Ok(oldest_first(rows, |o: &Order| o.created_at))
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let rows = self
            .orders
            .iter()
            .filter(|kv| kv.value().user_id == user_id)
            .map(|kv| kv.value().clone())
            .collect();
        Ok(oldest_first(rows, |o: &Order| o.created_at))
    }

    async fn update_order(&self, order: Order) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.orders.get_mut(&order.id) {
            *v = order.clone();
            return Ok(Some(order));
        }
        Ok(None)
    }
}
