//! Cart routes. Every route acts on the caller's own cart.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use luxe_core::CartItemId;

use super::extract::{ApiJson, ApiPath};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{CartLine, CartSummary};
use crate::services::cart::AddToCart;
use crate::state::AppState;

/// Quantity update form.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i64,
}

/// `GET /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartLine>>> {
    Ok(Json(state.cart().lines(&user).await?))
}

/// `GET /api/cart/summary`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartSummary>> {
    Ok(Json(state.cart().summary(&user).await?))
}

/// `POST /api/cart`
///
/// 201 for a new line, 200 when merged into an existing one.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<AddToCart>,
) -> Result<Response> {
    let product_id = form.product_id.to_string();
    let (item, merged) = state.cart().add_item(&user, form).await?;

    add_breadcrumb("cart", "Added item", Some(&[("product_id", &product_id)]));

    let status = if merged {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(item)).into_response())
}

/// `PUT /api/cart/{id}`
///
/// A quantity of zero or less removes the line.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(form): ApiJson<UpdateQuantity>,
) -> Result<Response> {
    match state.cart().update_quantity(&user, id, form.quantity).await? {
        Some(item) => Ok(Json(item).into_response()),
        None => Ok(Json(json!({ "message": "Item removed from cart" })).into_response()),
    }
}

/// `DELETE /api/cart/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<Json<Value>> {
    state.cart().remove(&user, id).await?;
    Ok(Json(json!({ "message": "Item removed from cart" })))
}

/// `DELETE /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let removed = state.cart().clear(&user).await?;
    Ok(Json(json!({ "message": "Cart cleared", "removed": removed })))
}
