//! Category routes.

use axum::{Json, extract::State};
use tracing::instrument;

use super::extract::ApiPath;
use crate::error::Result;
use crate::models::Category;
use crate::state::AppState;

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog().categories().await?))
}

/// `GET /api/categories/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Category>> {
    Ok(Json(state.catalog().category_by_slug(&slug).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower::ServiceExt;

    use super::super::test_support::{TestContext, body_json, get};

    #[tokio::test]
    async fn test_categories_sorted_by_name() {
        let ctx = TestContext::seeded().await;

        let response = ctx.app().oneshot(get("/api/categories", None)).await.unwrap();
        assert_eq!(response.status(), 200);
        let body = body_json(response).await;
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(names.len(), 6);
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_category_by_slug() {
        let ctx = TestContext::seeded().await;

        let response = ctx
            .app()
            .oneshot(get("/api/categories/footwear", None))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["name"], "Footwear");

        let response = ctx
            .app()
            .oneshot(get("/api/categories/hats", None))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(body_json(response).await["message"], "Category not found");
    }
}
