//! Product routes: browsing and search for everyone, CRUD for admins.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use luxe_core::{CategoryId, ProductId};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductFilter};
use crate::services::catalog::{ProductInput, ProductPatch, ProductSort};
use crate::state::AppState;

/// Query parameters for the product list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub on_sale: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
}

/// Query parameters for search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter {
        category_id: query.category_id,
        featured: query.featured,
        on_sale: query.on_sale,
    };
    Ok(Json(state.catalog().list(filter, query.sort).await?))
}

/// `GET /api/products/search?q=`
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().search(&query.q).await?))
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get(id).await?))
}

/// `GET /api/products/slug/{slug}`
#[instrument(skip(state))]
pub async fn show_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get_by_slug(&slug).await?))
}

/// `POST /api/products` (admin)
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog().create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}` (admin)
#[instrument(skip(state, admin, patch), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().update(id, patch).await?))
}

/// `DELETE /api/products/{id}` (admin)
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Value>> {
    state.catalog().delete(id).await?;
    Ok(Json(json!({ "message": "Product deleted" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use tower::ServiceExt;

    use super::super::test_support::{TestContext, body_json, get, json_request, request};

    fn slugs(body: &serde_json::Value) -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|p| p["slug"].as_str().unwrap().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_list_filters_are_conjunctive() {
        let ctx = TestContext::seeded().await;

        let all = body_json(ctx.app().oneshot(get("/api/products", None)).await.unwrap()).await;
        assert_eq!(all.as_array().unwrap().len(), 17);

        let footwear = body_json(
            ctx.app()
                .oneshot(get("/api/categories/footwear", None))
                .await
                .unwrap(),
        )
        .await;
        let category_id = footwear["id"].as_str().unwrap();

        let response = ctx
            .app()
            .oneshot(get(
                &format!("/api/products?categoryId={category_id}&featured=true"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = body_json(response).await;
        for product in body.as_array().unwrap() {
            assert_eq!(product["categoryId"], category_id);
            assert_eq!(product["featured"], true);
        }

        let on_sale = body_json(
            ctx.app()
                .oneshot(get("/api/products?onSale=true", None))
                .await
                .unwrap(),
        )
        .await;
        assert!(!on_sale.as_array().unwrap().is_empty());
        assert!(on_sale.as_array().unwrap().iter().all(|p| p["onSale"] == true));
    }

    #[tokio::test]
    async fn test_list_sorted_by_price() {
        let ctx = TestContext::seeded().await;

        let body = body_json(
            ctx.app()
                .oneshot(get("/api/products?sort=price-low", None))
                .await
                .unwrap(),
        )
        .await;
        let prices: Vec<f64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["price"].as_str().unwrap().parse().unwrap())
            .collect();
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_bad_query_is_bad_request() {
        let ctx = TestContext::seeded().await;
        for uri in [
            "/api/products?sort=cheapest",
            "/api/products?featured=maybe",
            "/api/products?categoryId=not-a-uuid",
        ] {
            let response = ctx.app().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(response.status(), 400, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_search() {
        let ctx = TestContext::seeded().await;

        let body = body_json(
            ctx.app()
                .oneshot(get("/api/products/search?q=DENIM", None))
                .await
                .unwrap(),
        )
        .await;
        assert!(slugs(&body).contains(&"slim-fit-denim".to_owned()));

        let body = body_json(
            ctx.app()
                .oneshot(get("/api/products/search?q=", None))
                .await
                .unwrap(),
        )
        .await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_and_slug() {
        let ctx = TestContext::seeded().await;

        let response = ctx
            .app()
            .oneshot(get("/api/products/slug/classic-white-tee", None))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let product = body_json(response).await;
        assert_eq!(product["price"], "29.00");

        let id = product["id"].as_str().unwrap();
        let response = ctx
            .app()
            .oneshot(get(&format!("/api/products/{id}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["slug"], "classic-white-tee");

        let response = ctx
            .app()
            .oneshot(get("/api/products/slug/Not_A_Slug", None))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let response = ctx
            .app()
            .oneshot(get(
                "/api/products/00000000-0000-4000-8000-000000000000",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_admin_crud() {
        let ctx = TestContext::seeded().await;
        let admin = ctx.admin_token().await;

        let response = ctx
            .app()
            .oneshot(json_request(
                "POST",
                "/api/products",
                Some(&admin),
                &json!({
                    "name": "Linen Shirt",
                    "price": "59.00",
                    "sizes": ["S", "M"],
                    "featured": true
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let created = body_json(response).await;
        assert_eq!(created["slug"], "linen-shirt");
        assert_eq!(created["inStock"], true);
        let id = created["id"].as_str().unwrap().to_owned();

        let response = ctx
            .app()
            .oneshot(json_request(
                "PUT",
                &format!("/api/products/{id}"),
                Some(&admin),
                &json!({ "price": "49.00", "onSale": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let updated = body_json(response).await;
        assert_eq!(updated["price"], "49.00");
        assert_eq!(updated["onSale"], true);
        assert_eq!(updated["name"], "Linen Shirt");

        let response = ctx
            .app()
            .oneshot(request("DELETE", &format!("/api/products/{id}"), Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["message"], "Product deleted");

        let response = ctx
            .app()
            .oneshot(request("DELETE", &format!("/api/products/{id}"), Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_admin_routes_reject_shoppers() {
        let ctx = TestContext::seeded().await;
        let shopper = ctx.signup("shopper@example.com").await;
        let form = json!({ "name": "Linen Shirt", "price": "59.00" });

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/products", None, &form))
            .await
            .unwrap();
        assert_eq!(response.status(), 401);

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/products", Some(&shopper), &form))
            .await
            .unwrap();
        assert_eq!(response.status(), 403);
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let ctx = TestContext::seeded().await;
        let admin = ctx.admin_token().await;

        let response = ctx
            .app()
            .oneshot(json_request(
                "POST",
                "/api/products",
                Some(&admin),
                &json!({ "name": "Classic White Tee", "price": "19.00" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 409);
    }

    #[tokio::test]
    async fn test_price_above_storage_limit_is_bad_request() {
        let ctx = TestContext::seeded().await;
        let admin = ctx.admin_token().await;

        let response = ctx
            .app()
            .oneshot(json_request(
                "POST",
                "/api/products",
                Some(&admin),
                &json!({ "name": "Gold Watch", "price": "100000000000.00" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert!(body_json(response).await["message"].is_string());

        let id = body_json(
            ctx.app()
                .oneshot(get("/api/products/slug/classic-white-tee", None))
                .await
                .unwrap(),
        )
        .await["id"]
            .as_str()
            .unwrap()
            .to_owned();
        let response = ctx
            .app()
            .oneshot(json_request(
                "PUT",
                &format!("/api/products/{id}"),
                Some(&admin),
                &json!({ "price": "100000000000.00" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = ctx
            .app()
            .oneshot(get("/api/products/slug/gold-watch", None))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}
