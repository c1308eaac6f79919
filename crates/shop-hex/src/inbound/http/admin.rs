use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shop_types::domain::order::{AdminOrderView, Order};
use shop_types::domain::product::{Product, ProductPatch};
use shop_types::domain::user::UserProfile;
use shop_types::ports::Store;

use crate::application::uploads::MSG_NO_FILE;
use crate::errors::AppError;
use crate::inbound::http::extract::{parse_id, ValidJson};
use crate::inbound::http::requests::{AdminStatusRequest, CreateProductRequest};
use crate::inbound::http::AppState;

/// Multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadBody {
    pub url: String,
}

pub async fn create_product<R: Store>(
    State(state): State<AppState<R>>,
    ValidJson(body): ValidJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.catalog.create_product(body.into()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<ProductPatch>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id, "product")?;
    Ok(Json(state.catalog.update_product(id, patch).await?))
}

pub async fn delete_product<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, AppError> {
    let id = parse_id(&id, "product")?;
    state.catalog.delete_product(id).await?;
    Ok(Json(MessageBody {
        message: "Product deleted successfully",
    }))
}

pub async fn list_products<R: Store>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.catalog.list_products().await?))
}

pub async fn list_users<R: Store>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let users = state.users.list_users().await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

pub async fn delete_user<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, AppError> {
    let id = parse_id(&id, "user")?;
    state.users.delete_user(id).await?;
    Ok(Json(MessageBody {
        message: "User deleted successfully",
    }))
}

pub async fn list_orders<R: Store>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<AdminOrderView>>, AppError> {
    Ok(Json(state.orders.list_all().await?))
}

pub async fn update_order<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<AdminStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id, "order")?;
    Ok(Json(state.orders.admin_update_status(id, body.status).await?))
}

/// Reads the first `image` field; other fields are ignored.
pub async fn upload_image<R: Store>(
    State(state): State<AppState<R>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadBody>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let url = state
            .uploads
            .save_image(&file_name, content_type.as_deref(), &data)
            .await?;
        return Ok((StatusCode::CREATED, Json(UploadBody { url })));
    }
    Err(AppError::BadRequest(MSG_NO_FILE.into()))
}
