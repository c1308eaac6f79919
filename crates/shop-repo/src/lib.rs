#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use shop_types::domain::order::Order;
use shop_types::domain::product::{Product, ProductFilter};
use shop_types::domain::user::User;
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub const DEFAULT_DATABASE_URL: &str = "sqlite://shop.db";

/// The backend chosen at startup. With both features enabled a database
/// URL selects SQLite and its absence selects the in-memory store.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        if let Some(url) = url {
            tracing::warn!(%url, "sqlite feature disabled; ignoring database url");
        }
        Ok(Self::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_DATABASE_URL);
        let sqlite = sqlite::SqliteRepo::new(url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    // If both features are enabled
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?)),
            None => Ok(Self::Memory(memory::InMemoryRepo::new())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait::async_trait]
impl UserRepository for Repo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        dispatch!(self, r => r.create_user(user).await)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.get_user(id).await)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.find_user_by_email(email).await)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        dispatch!(self, r => r.list_users().await)
    }

    async fn update_user(&self, user: User) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.update_user(user).await)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_user(id).await)
    }
}

#[async_trait::async_trait]
impl ProductRepository for Repo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        dispatch!(self, r => r.create_product(product).await)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.get_product(id).await)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        dispatch!(self, r => r.list_products().await)
    }

    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepoError> {
        dispatch!(self, r => r.search_products(filter).await)
    }

    async fn update_product(&self, product: Product) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.update_product(product).await)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_product(id).await)
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        dispatch!(self, r => r.create_order(order).await)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get_order(id).await)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders().await)
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders_for_user(user_id).await)
    }

    async fn update_order(&self, order: Order) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.update_order(order).await)
    }
}
