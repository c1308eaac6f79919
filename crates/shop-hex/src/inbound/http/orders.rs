use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use shop_types::domain::order::{Order, OrderView};
use shop_types::ports::Store;

use crate::application::order_service::Access;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::inbound::http::extract::{parse_id, ValidJson};
use crate::inbound::http::requests::{CheckoutRequest, CreateOrderRequest, CustomerStatusRequest};
use crate::inbound::http::AppState;

#[derive(Debug, Serialize)]
pub struct OrderMessage<T> {
    pub message: &'static str,
    pub order: T,
}

#[derive(Debug, Serialize)]
pub struct OrdersBody {
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Serialize)]
pub struct OrderBody {
    pub order: OrderView,
}

pub async fn create_order<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    ValidJson(body): ValidJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderMessage<Order>>), AppError> {
    let order = state.orders.create_order(me.id, body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderMessage {
            message: "Order created successfully",
            order,
        }),
    ))
}

pub async fn list_orders<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
) -> Result<Json<OrdersBody>, AppError> {
    let orders = state.orders.list_for_user(me.id).await?;
    Ok(Json(OrdersBody { orders }))
}

pub async fn get_order<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<OrderBody>, AppError> {
    let id = parse_id(&id, "order")?;
    let order = state.orders.get_order(id, Access::Customer(me.id)).await?;
    Ok(Json(OrderBody { order }))
}

pub async fn update_status<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    ValidJson(body): ValidJson<CustomerStatusRequest>,
) -> Result<Json<OrderMessage<Order>>, AppError> {
    let (Some(order_id), Some(status)) = (body.order_id, body.status) else {
        return Err(AppError::BadRequest("Order ID and status are required".into()));
    };
    let order = state
        .orders
        .update_status(order_id, status, Access::Customer(me.id))
        .await?;
    Ok(Json(OrderMessage {
        message: "Order status updated successfully",
        order,
    }))
}

pub async fn checkout<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    ValidJson(body): ValidJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderMessage<Order>>), AppError> {
    let (draft, address_index) = body.into_parts();
    let order = state.orders.checkout(me.id, draft, address_index).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderMessage {
            message: "Order placed successfully.",
            order,
        }),
    ))
}

pub async fn remove_item<R: Store>(
    State(state): State<AppState<R>>,
    Extension(me): Extension<CurrentUser>,
    Path((id, product_id)): Path<(String, String)>,
) -> Result<Json<OrderMessage<Order>>, AppError> {
    let id = parse_id(&id, "order")?;
    let product_id = parse_id(&product_id, "product")?;
    let order = state
        .orders
        .remove_item(id, product_id, Access::Customer(me.id))
        .await?;
    Ok(Json(OrderMessage {
        message: "Product removed from order",
        order,
    }))
}
