use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use shop_types::domain::product::{Product, ProductFilter};
use shop_types::ports::Store;

use crate::errors::AppError;
use crate::inbound::http::extract::parse_id;
use crate::inbound::http::requests::{SearchQuery, TopQuery};
use crate::inbound::http::AppState;

fn bad_query(e: QueryRejection) -> AppError {
    AppError::BadRequest(e.body_text())
}

pub async fn list_products<R: Store>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.catalog.list_products().await?))
}

pub async fn search_products<R: Store>(
    State(state): State<AppState<R>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(q) = query.map_err(bad_query)?;
    let filter = ProductFilter {
        keyword: q.keyword,
        category: q.category,
        min_price: q.min_price,
        max_price: q.max_price,
    };
    Ok(Json(state.catalog.search_products(&filter).await?))
}

pub async fn top_products<R: Store>(
    State(state): State<AppState<R>>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(q) = query.map_err(bad_query)?;
    Ok(Json(state.catalog.top_products(q.limit).await?))
}

pub async fn get_product<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id, "product")?;
    Ok(Json(state.catalog.get_product(id).await?))
}
