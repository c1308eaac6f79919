use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    serve, Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use shop_types::ports::Store;

use crate::application::catalog_service::CatalogService;
use crate::application::order_service::OrderService;
use crate::application::policy::OrderPolicy;
use crate::application::uploads::{UploadStore, MAX_UPLOAD_BYTES};
use crate::application::user_service::UserService;
use crate::auth::gate::{authenticate, require_admin, require_customer};
use crate::auth::token::TokenService;
use crate::config::Config;
use crate::inbound::http::{admin, orders, products, users};

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

/// Services shared by every handler. All of them wrap the same repository.
pub struct AppState<R: Store> {
    pub users: Arc<UserService<R>>,
    pub catalog: Arc<CatalogService<R>>,
    pub orders: Arc<OrderService<R>>,
    pub uploads: Arc<UploadStore>,
}

impl<R: Store> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            catalog: self.catalog.clone(),
            orders: self.orders.clone(),
            uploads: self.uploads.clone(),
        }
    }
}

impl<R: Store> AppState<R> {
    pub fn new(repo: Arc<R>, tokens: TokenService, policy: OrderPolicy, uploads: UploadStore) -> Self {
        Self {
            users: Arc::new(UserService::new(repo.clone(), tokens)),
            catalog: Arc::new(CatalogService::new(repo.clone())),
            orders: Arc::new(OrderService::new(repo, policy)),
            uploads: Arc::new(uploads),
        }
    }

    pub fn from_config(repo: Arc<R>, config: &Config) -> Self {
        let tokens = TokenService::with_ttl(
            &config.jwt_secret,
            chrono::Duration::days(config.token_ttl_days),
        );
        Self::new(
            repo,
            tokens,
            config.order_policy,
            UploadStore::new(config.upload_dir.clone()),
        )
    }
}

pub struct HttpServer<R: Store> {
    pub state: AppState<R>,
    pub config: HttpServerConfig,
}

impl<R: Store> HttpServer<R> {
    pub fn new(state: AppState<R>, config: HttpServerConfig) -> Self {
        Self { state, config }
    }

    pub fn router(&self) -> Router {
        let state = self.state.clone();
        let authn = middleware::from_fn_with_state(state.clone(), authenticate::<R>);

        let public = Router::new()
            .route("/health", get(health))
            .route("/users/register", post(users::register::<R>))
            .route("/users/login", post(users::login::<R>))
            .route("/products", get(products::list_products::<R>))
            .route("/products/search", get(products::search_products::<R>))
            .route("/products/top", get(products::top_products::<R>))
            .route("/products/{id}", get(products::get_product::<R>));

        let account = Router::new()
            .route(
                "/users/profile",
                get(users::get_profile::<R>).put(users::update_profile::<R>),
            )
            .route("/users/add-address", post(users::add_address::<R>))
            .layer(authn.clone());

        let customer = Router::new()
            .route(
                "/users/orders",
                get(users::order_history::<R>).post(users::create_order::<R>),
            )
            .route("/users/orders/{id}", get(users::order_details::<R>))
            .route(
                "/orders",
                post(orders::create_order::<R>).get(orders::list_orders::<R>),
            )
            .route("/orders/status", patch(orders::update_status::<R>))
            .route("/orders/checkout", post(orders::checkout::<R>))
            .route("/orders/{id}", get(orders::get_order::<R>))
            .route(
                "/orders/{id}/items/{product_id}",
                delete(orders::remove_item::<R>),
            )
            .layer(middleware::from_fn(require_customer))
            .layer(authn.clone());

        let admin = Router::new()
            .route(
                "/admin/products",
                post(admin::create_product::<R>).get(admin::list_products::<R>),
            )
            .route(
                "/admin/products/{id}",
                put(admin::update_product::<R>).delete(admin::delete_product::<R>),
            )
            .route("/admin/users", get(admin::list_users::<R>))
            .route("/admin/users/{id}", delete(admin::delete_user::<R>))
            .route("/admin/orders", get(admin::list_orders::<R>))
            .route("/admin/orders/{id}", put(admin::update_order::<R>))
            .route(
                "/admin/upload",
                post(admin::upload_image::<R>)
                    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
            )
            .layer(middleware::from_fn(require_admin))
            .layer(authn);

        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .merge(public)
            .merge(account)
            .merge(customer)
            .merge(admin)
            .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
            .layer(trace_layer)
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
