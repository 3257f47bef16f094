//! Admin-only reporting routes.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::services::catalog::CatalogStats;
use crate::state::AppState;

/// `GET /api/admin/users`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.auth().list_users().await?))
}

/// `GET /api/admin/stats`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<CatalogStats>> {
    Ok(Json(state.catalog().stats().await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower::ServiceExt;

    use super::super::test_support::{TestContext, body_json, get};

    #[tokio::test]
    async fn test_users_lists_without_passwords() {
        let ctx = TestContext::seeded().await;
        ctx.signup("shopper@example.com").await;
        let admin = ctx.admin_token().await;

        let response = ctx
            .app()
            .oneshot(get("/api/admin/users", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let users = body_json(response).await;
        let users = users.as_array().unwrap();
        assert_eq!(users.len(), 2);
        for user in users {
            assert!(user.get("password").is_none());
            assert!(user.get("passwordHash").is_none());
        }
        assert!(users.iter().any(|u| u["isAdmin"] == true));
    }

    #[tokio::test]
    async fn test_stats() {
        let ctx = TestContext::seeded().await;
        let admin = ctx.admin_token().await;

        let response = ctx
            .app()
            .oneshot(get("/api/admin/stats", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let stats = body_json(response).await;
        assert_eq!(stats["totalProducts"], 17);
        assert!(stats["catalogValue"].is_string());
        assert!(stats["averagePrice"].is_string());
    }

    #[tokio::test]
    async fn test_shoppers_are_forbidden() {
        let ctx = TestContext::seeded().await;
        let shopper = ctx.signup("shopper@example.com").await;

        for uri in ["/api/admin/users", "/api/admin/stats"] {
            let response = ctx.app().oneshot(get(uri, Some(&shopper))).await.unwrap();
            assert_eq!(response.status(), 403);
            assert_eq!(body_json(response).await["message"], "Admin access required");
        }
    }
}
