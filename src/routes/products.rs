use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{NewProduct, Principal, Product},
};

fn not_found() -> AppError {
    AppError::NotFound("Not found.".to_string())
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.products.list().await?;

    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let Json(body) = payload?;
    let new_product = NewProduct::from_json(&body)?;

    let product = state.products.create(new_product).await?;
    tracing::info!(
        product_id = product.id,
        user = %principal.username,
        "Product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    let product = state.products.get(id).await?.ok_or_else(not_found)?;

    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    if state.products.get(id).await?.is_none() {
        return Err(not_found());
    }

    let Json(body) = payload?;
    let new_product = NewProduct::from_json(&body)?;

    let product = state
        .products
        .update(id, new_product)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(
        product_id = product.id,
        user = %principal.username,
        "Product updated"
    );

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    if !state.products.delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(product_id = id, user = %principal.username, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}
