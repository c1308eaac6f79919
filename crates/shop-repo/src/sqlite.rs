use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use shop_types::domain::order::{LineItem, Order, PaymentMethod};
use shop_types::domain::product::{Product, ProductFilter};
use shop_types::domain::user::{Address, User};
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, is_admin, addresses_json, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, name, description, price, images_json, category, stock, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, items_json, total_price, payment_method, status, address_json, created_at, updated_at";

pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn write_err(e: sqlx::Error, what: &str) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Conflict(format!("{what} already exists"))
        }
        _ => db_err(e),
    }
}

fn ts(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_id(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(db_err)
}

#[derive(FromRow)]
struct DbUser {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    addresses_json: String,
    created_at: String,
    updated_at: String,
}

impl DbUser {
    fn into_user(self) -> Result<User, RepoError> {
        let addresses: Vec<Address> =
            serde_json::from_str(&self.addresses_json).map_err(db_err)?;
        Ok(User {
            id: parse_id(&self.id)?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            is_admin: self.is_admin,
            addresses,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbProduct {
    id: String,
    name: String,
    description: String,
    price: f64,
    images_json: String,
    category: String,
    stock: i64,
    created_at: String,
    updated_at: String,
}

impl DbProduct {
    fn into_product(self) -> Result<Product, RepoError> {
        let images: Vec<String> = serde_json::from_str(&self.images_json).map_err(db_err)?;
        Ok(Product {
            id: parse_id(&self.id)?,
            name: self.name,
            description: self.description,
            price: self.price,
            images,
            category: self.category,
            stock: u32::try_from(self.stock).map_err(db_err)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    items_json: String,
    total_price: f64,
    payment_method: Option<String>,
    status: String,
    address_json: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let items: Vec<LineItem> = serde_json::from_str(&self.items_json).map_err(db_err)?;
        let payment_method = self
            .payment_method
            .as_deref()
            .map(PaymentMethod::from_str)
            .transpose()
            .map_err(db_err)?;
        let address: Option<Address> = self
            .address_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(db_err)?;
        Ok(Order {
            id: parse_id(&self.id)?,
            user_id: parse_id(&self.user_id)?,
            items,
            total_price: self.total_price,
            payment_method,
            status: self.status,
            address,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_shop.sql");
        for statement in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    async fn fetch_users(&self, sql: &str, bind: Option<String>) -> Result<Vec<User>, RepoError> {
        let mut query = sqlx::query_as::<_, DbUser>(sql);
        if let Some(b) = bind {
            query = query.bind(b);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.into_iter().map(DbUser::into_user).collect()
    }

    async fn fetch_orders(&self, sql: &str, bind: Option<String>) -> Result<Vec<Order>, RepoError> {
        let mut query = sqlx::query_as::<_, DbOrder>(sql);
        if let Some(b) = bind {
            query = query.bind(b);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.into_iter().map(DbOrder::into_order).collect()
    }
}

#[async_trait]
impl UserRepository for SqliteRepo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        let addresses_json = serde_json::to_string(&user.addresses).map_err(db_err)?;
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, is_admin, addresses_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(addresses_json)
        .bind(ts(&user.created_at))
        .bind(ts(&user.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(e, "email"))?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(self.fetch_users(&sql, Some(id.to_string())).await?.pop())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        Ok(self.fetch_users(&sql, Some(email.to_string())).await?.pop())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at");
        self.fetch_users(&sql, None).await
    }

    async fn update_user(&self, user: User) -> Result<Option<User>, RepoError> {
        let addresses_json = serde_json::to_string(&user.addresses).map_err(db_err)?;
        let updated = sqlx::query(
            "UPDATE users SET name = ?, email = ?, password_hash = ?, is_admin = ?, addresses_json = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(addresses_json)
        .bind(ts(&user.updated_at))
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(e, "email"))?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(user))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductRepository for SqliteRepo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        let images_json = serde_json::to_string(&product.images).map_err(db_err)?;
        sqlx::query(
            "INSERT INTO products (id, name, description, price, images_json, category, stock, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(images_json)
        .bind(&product.category)
        .bind(i64::from(product.stock))
        .bind(ts(&product.created_at))
        .bind(ts(&product.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(e, "product"))?;
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let row: Option<DbProduct> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(DbProduct::into_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        self.search_products(&ProductFilter::default()).await
    }

    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepoError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"));
        if let Some(k) = filter.keyword_lower() {
            qb.push(" AND (instr(lower(name), ")
                .push_bind(k.clone())
                .push(") > 0 OR instr(lower(description), ")
                .push_bind(k)
                .push(") > 0)");
        }
        if let Some(c) = filter.category_lower() {
            qb.push(" AND lower(category) = ").push_bind(c);
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price <= ").push_bind(max);
        }
        qb.push(" ORDER BY created_at");

        let rows: Vec<DbProduct> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(DbProduct::into_product).collect()
    }

    async fn update_product(&self, product: Product) -> Result<Option<Product>, RepoError> {
        let images_json = serde_json::to_string(&product.images).map_err(db_err)?;
        let updated = sqlx::query(
            "UPDATE products SET name = ?, description = ?, price = ?, images_json = ?, category = ?, stock = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(images_json)
        .bind(&product.category)
        .bind(i64::from(product.stock))
        .bind(ts(&product.updated_at))
        .bind(product.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(product))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        let address_json = order
            .address
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(db_err)?;
        sqlx::query(
            "INSERT INTO orders (id, user_id, items_json, total_price, payment_method, status, address_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(order.user_id.to_string())
        .bind(items_json)
        .bind(order.total_price)
        .bind(order.payment_method.map(|m| m.as_str()))
        .bind(&order.status)
        .bind(address_json)
        .bind(ts(&order.created_at))
        .bind(ts(&order.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(e, "order"))?;
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
        Ok(self.fetch_orders(&sql, Some(id.to_string())).await?.pop())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at");
        self.fetch_orders(&sql, None).await
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at");
        self.fetch_orders(&sql, Some(user_id.to_string())).await
    }

    async fn update_order(&self, order: Order) -> Result<Option<Order>, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        let address_json = order
            .address
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(db_err)?;
        let updated = sqlx::query(
            "UPDATE orders SET items_json = ?, total_price = ?, payment_method = ?, status = ?, address_json = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(items_json)
        .bind(order.total_price)
        .bind(order.payment_method.map(|m| m.as_str()))
        .bind(&order.status)
        .bind(address_json)
        .bind(ts(&order.updated_at))
        .bind(order.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(order))
    }
}
