//! Checkout and order history.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use luxe_core::OrderId;

use super::extract::{ApiJson, ApiPath};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderWithItems};
use crate::services::orders::PlaceOrder;
use crate::state::AppState;

/// `POST /api/orders`
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<PlaceOrder>,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    let placed = state.orders().place(&user, form).await?;

    let order_id = placed.order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", &order_id)]));

    Ok((StatusCode::CREATED, Json(placed)))
}

/// `GET /api/orders`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders().list(&user).await?))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderWithItems>> {
    Ok(Json(state.orders().get(&user, id).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::super::test_support::{TestContext, body_json, get, json_request};

    async fn fill_cart(ctx: &TestContext, token: &str) -> String {
        let product = body_json(
            ctx.app()
                .oneshot(get("/api/products/slug/classic-white-tee", None))
                .await
                .unwrap(),
        )
        .await;
        let id = product["id"].as_str().unwrap().to_owned();
        let response = ctx
            .app()
            .oneshot(json_request(
                "POST",
                "/api/cart",
                Some(token),
                &json!({ "productId": id, "size": "M", "quantity": 2 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        id
    }

    fn checkout(product_id: &str) -> Value {
        json!({
            "items": [{ "productId": product_id, "quantity": 2, "price": "29.00", "size": "M" }],
            "shippingAddress": "1 Main St, Springfield",
            "total": "62.64"
        })
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_once() {
        let ctx = TestContext::seeded().await;
        let token = ctx.signup("shopper@example.com").await;
        let product_id = fill_cart(&ctx, &token).await;

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/orders", Some(&token), &checkout(&product_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let placed = body_json(response).await;
        assert_eq!(placed["status"], "pending");
        assert_eq!(placed["total"], "62.64");
        assert_eq!(placed["items"][0]["quantity"], 2);

        let cart = body_json(ctx.app().oneshot(get("/api/cart", Some(&token))).await.unwrap()).await;
        assert!(cart.as_array().unwrap().is_empty());

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/orders", Some(&token), &checkout(&product_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(body_json(response).await["message"], "Your cart is empty");

        let orders = body_json(ctx.app().oneshot(get("/api/orders", Some(&token))).await.unwrap()).await;
        assert_eq!(orders.as_array().unwrap().len(), 1);

        let id = placed["id"].as_str().unwrap();
        let response = ctx
            .app()
            .oneshot(get(&format!("/api/orders/{id}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["items"][0]["size"], "M");
    }

    #[tokio::test]
    async fn test_invalid_checkout_changes_nothing() {
        let ctx = TestContext::seeded().await;
        let token = ctx.signup("shopper@example.com").await;
        let product_id = fill_cart(&ctx, &token).await;

        for body in [
            json!({ "items": [], "total": "0.00" }),
            json!({
                "items": [{ "productId": product_id, "quantity": 0, "price": "29.00" }],
                "total": "0.00"
            }),
            json!({
                "items": [{ "productId": product_id, "quantity": 1, "price": "abc" }],
                "total": "29.00"
            }),
            json!({
                "items": [{ "productId": product_id, "quantity": 1, "price": "29.00" }],
                "shippingAddress": "  ",
                "total": "29.00"
            }),
        ] {
            let response = ctx
                .app()
                .oneshot(json_request("POST", "/api/orders", Some(&token), &body))
                .await
                .unwrap();
            assert_eq!(response.status(), 400, "{body}");
        }

        let cart = body_json(ctx.app().oneshot(get("/api/cart", Some(&token))).await.unwrap()).await;
        assert_eq!(cart.as_array().unwrap().len(), 1);
        let orders = body_json(ctx.app().oneshot(get("/api/orders", Some(&token))).await.unwrap()).await;
        assert!(orders.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orders_are_private() {
        let ctx = TestContext::seeded().await;
        let alice = ctx.signup("alice@example.com").await;
        let bob = ctx.signup("bob@example.com").await;
        let product_id = fill_cart(&ctx, &alice).await;

        let placed = body_json(
            ctx.app()
                .oneshot(json_request("POST", "/api/orders", Some(&alice), &checkout(&product_id)))
                .await
                .unwrap(),
        )
        .await;
        let id = placed["id"].as_str().unwrap();

        let response = ctx
            .app()
            .oneshot(get(&format!("/api/orders/{id}"), Some(&bob)))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let orders = body_json(ctx.app().oneshot(get("/api/orders", Some(&bob))).await.unwrap()).await;
        assert!(orders.as_array().unwrap().is_empty());

        let response = ctx.app().oneshot(get("/api/orders", None)).await.unwrap();
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn test_total_above_storage_limit_is_bad_request() {
        let ctx = TestContext::seeded().await;
        let token = ctx.signup("shopper@example.com").await;
        let product_id = fill_cart(&ctx, &token).await;

        let mut body = checkout(&product_id);
        body["total"] = json!("100000000000.00");
        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/orders", Some(&token), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let cart = body_json(ctx.app().oneshot(get("/api/cart", Some(&token))).await.unwrap()).await;
        assert_eq!(cart.as_array().unwrap().len(), 1);
        let orders = body_json(ctx.app().oneshot(get("/api/orders", Some(&token))).await.unwrap()).await;
        assert!(orders.as_array().unwrap().is_empty());
    }
}
