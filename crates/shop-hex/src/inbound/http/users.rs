use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use shop_types::domain::order::{Order, OrderView};
use shop_types::domain::user::{Address, User, UserProfile};
use shop_types::ports::Store;

use crate::application::order_service::Access;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::inbound::http::extract::{parse_id, ValidJson};
use crate::inbound::http::requests::{
    AddressRequest, CreateOrderRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
use crate::inbound::http::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
}

impl AuthResponse {
    fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            token,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for AccountResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name,
            email: u.email,
            is_admin: u.is_admin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddressesResponse {
    pub message: &'static str,
    pub addresses: Vec<Address>,
}

pub async fn register<R: Store>(
    State(state): State<AppState<R>>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (user, token) = state
        .users
        .register(
            body.name.unwrap_or_default().trim().to_string(),
            body.email.unwrap_or_default(),
            body.password.unwrap_or_default(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(&user, token))))
}

pub async fn login<R: Store>(
    State(state): State<AppState<R>>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (user, token) = state
        .users
        .login(body.email.unwrap_or_default(), body.password.unwrap_or_default())
        .await?;
    Ok(Json(AuthResponse::new(&user, token)))
}

pub async fn get_profile<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state.users.profile(me.id).await?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn update_profile<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    ValidJson(body): ValidJson<UpdateProfileRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let user = state.users.update_profile(me.id, body.into()).await?;
    Ok(Json(user.into()))
}

pub async fn add_address<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    ValidJson(body): ValidJson<AddressRequest>,
) -> Result<Json<AddressesResponse>, AppError> {
    let user = state.users.add_address(me.id, body.into()).await?;
    Ok(Json(AddressesResponse {
        message: "Address added successfully.",
        addresses: user.addresses,
    }))
}

pub async fn order_history<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.order_history(me.id).await?))
}

pub async fn create_order<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    ValidJson(body): ValidJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = state.orders.create_order(me.id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn order_details<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, AppError> {
    let id = parse_id(&id, "order")?;
    let view = state.orders.get_order(id, Access::Customer(me.id)).await?;
    Ok(Json(view))
}
