use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shop_types::domain::order::{AdminOrderView, LineItem, Order, OrderView, PaymentMethod};
use shop_types::domain::product::{NewProduct, Product, ProductFilter, ProductPatch};
use shop_types::domain::user::{Address, UserProfile};
use thiserror::Error;
use uuid::Uuid;

/// A non-2xx answer from the API, carrying its `message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Clone)]
pub struct ShopClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    token: Option<String>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct ShopClient {
    base: Url,
    client: reqwest::Client,
    token: Option<String>,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

async fn read<T: DeserializeOwned>(res: Response) -> anyhow::Result<T> {
    let status = res.status();
    if !status.is_success() {
        let body: ErrorBody = res.json().await.unwrap_or_default();
        tracing::debug!(%status, message = %body.message, "api request failed");
        return Err(ApiError {
            status,
            message: body.message,
        }
        .into());
    }
    res.json().await.context("failed to decode response body")
}

impl ShopClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<ShopClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(ShopClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            token: None,
            client: None,
        })
    }

    /// Same connection pool, different caller.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            base: self.base.clone(),
            client: self.client.clone(),
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.header(AUTHORIZATION, format!("Bearer {t}")),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let req = self.authed(self.client.get(self.url(path)?));
        read(req.send().await?).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let req = self.authed(self.client.request(method, self.url(path)?).json(body));
        read(req.send().await?).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let req = self.authed(self.client.delete(self.url(path)?));
        read(req.send().await?).await
    }

    pub async fn health(&self) -> anyhow::Result<bool> {
        let body: serde_json::Value = self.get("health").await?;
        Ok(body["status"] == "ok")
    }

    // Accounts

    pub async fn register(&self, req: &RegisterRequest) -> anyhow::Result<AuthResponse> {
        self.send_json(reqwest::Method::POST, "users/register", req)
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<AuthResponse> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(reqwest::Method::POST, "users/login", &req)
            .await
    }

    pub async fn profile(&self) -> anyhow::Result<UserProfile> {
        self.get("users/profile").await
    }

    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> anyhow::Result<Account> {
        self.send_json(reqwest::Method::PUT, "users/profile", req)
            .await
    }

    pub async fn add_address(&self, address: &Address) -> anyhow::Result<Vec<Address>> {
        let res: AddressesResponse = self
            .send_json(reqwest::Method::POST, "users/add-address", address)
            .await?;
        Ok(res.addresses)
    }

    pub async fn order_history(&self) -> anyhow::Result<Vec<Order>> {
        self.get("users/orders").await
    }

    pub async fn order_details(&self, id: Uuid) -> anyhow::Result<OrderView> {
        self.get(&format!("users/orders/{id}")).await
    }

    // Catalog

    pub async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        self.get("products").await
    }

    pub async fn search_products(&self, filter: &ProductFilter) -> anyhow::Result<Vec<Product>> {
        let mut url = self.url("products/search")?;
        {
            let mut q = url.query_pairs_mut();
            if let Some(k) = &filter.keyword {
                q.append_pair("keyword", k);
            }
            if let Some(c) = &filter.category {
                q.append_pair("category", c);
            }
            if let Some(min) = filter.min_price {
                q.append_pair("minPrice", &min.to_string());
            }
            if let Some(max) = filter.max_price {
                q.append_pair("maxPrice", &max.to_string());
            }
        }
        read(self.client.get(url).send().await?).await
    }

    pub async fn top_products(&self, limit: Option<usize>) -> anyhow::Result<Vec<Product>> {
        match limit {
            Some(n) => self.get(&format!("products/top?limit={n}")).await,
            None => self.get("products/top").await,
        }
    }

    pub async fn get_product(&self, id: Uuid) -> anyhow::Result<Product> {
        self.get(&format!("products/{id}")).await
    }

    // Orders

    pub async fn create_order(&self, req: &NewOrder) -> anyhow::Result<Order> {
        let res: OrderMessage<Order> = self
            .send_json(reqwest::Method::POST, "orders", req)
            .await?;
        Ok(res.order)
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<OrderView>> {
        let res: OrdersBody = self.get("orders").await?;
        Ok(res.orders)
    }

    pub async fn get_order(&self, id: Uuid) -> anyhow::Result<OrderView> {
        let res: OrderBody = self.get(&format!("orders/{id}")).await?;
        Ok(res.order)
    }

    pub async fn checkout(&self, req: &CheckoutRequest) -> anyhow::Result<Order> {
        let res: OrderMessage<Order> = self
            .send_json(reqwest::Method::POST, "orders/checkout", req)
            .await?;
        Ok(res.order)
    }

    pub async fn update_order_status(&self, order_id: Uuid, status: &str) -> anyhow::Result<Order> {
        let req = StatusUpdate {
            order_id: Some(order_id),
            status: Some(status.to_string()),
        };
        let res: OrderMessage<Order> = self
            .send_json(reqwest::Method::PATCH, "orders/status", &req)
            .await?;
        Ok(res.order)
    }

    pub async fn remove_item(&self, order_id: Uuid, product_id: Uuid) -> anyhow::Result<Order> {
        let res: OrderMessage<Order> = self
            .delete(&format!("orders/{order_id}/items/{product_id}"))
            .await?;
        Ok(res.order)
    }

    // Admin

    pub async fn create_product(&self, input: &NewProduct) -> anyhow::Result<Product> {
        self.send_json(reqwest::Method::POST, "admin/products", input)
            .await
    }

    pub async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> anyhow::Result<Product> {
        self.send_json(reqwest::Method::PUT, &format!("admin/products/{id}"), patch)
            .await
    }

    pub async fn delete_product(&self, id: Uuid) -> anyhow::Result<String> {
        let res: MessageBody = self.delete(&format!("admin/products/{id}")).await?;
        Ok(res.message)
    }

    pub async fn admin_products(&self) -> anyhow::Result<Vec<Product>> {
        self.get("admin/products").await
    }

    pub async fn list_users(&self) -> anyhow::Result<Vec<UserProfile>> {
        self.get("admin/users").await
    }

    pub async fn delete_user(&self, id: Uuid) -> anyhow::Result<String> {
        let res: MessageBody = self.delete(&format!("admin/users/{id}")).await?;
        Ok(res.message)
    }

    pub async fn all_orders(&self) -> anyhow::Result<Vec<AdminOrderView>> {
        self.get("admin/orders").await
    }

    /// `None` leaves the status unchanged.
    pub async fn set_order_status(&self, id: Uuid, status: Option<&str>) -> anyhow::Result<Order> {
        let req = StatusUpdate {
            order_id: None,
            status: status.map(str::to_string),
        };
        self.send_json(reqwest::Method::PUT, &format!("admin/orders/{id}"), &req)
            .await
    }

    /// Uploads an image and returns its public path.
    pub async fn upload_image(
        &self,
        file_name: &str,
        mime: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<String> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .context("invalid mime type")?;
        let form = reqwest::multipart::Form::new().part("image", part);
        let req = self.authed(self.client.post(self.url("admin/upload")?).multipart(form));
        let res: UploadBody = read(req.send().await?).await?;
        Ok(res.url)
    }
}

impl ShopClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<ShopClient> {
        if let Some(client) = self.client {
            return Ok(ShopClient {
                base: self.base,
                client,
                token: self.token,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(ShopClient {
            base: self.base,
            client,
            token: self.token,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub products: Vec<LineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub order: NewOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_index: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct AddressesResponse {
    message: String,
    addresses: Vec<Address>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OrderMessage<T> {
    message: String,
    order: T,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OrdersBody {
    orders: Vec<OrderView>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OrderBody {
    order: OrderView,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct MessageBody {
    message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct UploadBody {
    url: String,
}
