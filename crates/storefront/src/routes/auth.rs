//! Account routes: signup, signin, current user and signout.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::extract::ApiJson;
use crate::error::{Result, clear_sentry_user};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{AuthSession, Signup};
use crate::state::AppState;

/// Signin form.
#[derive(Deserialize)]
pub struct Signin {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/signup`
#[instrument(skip(state, form))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<Signup>,
) -> Result<(StatusCode, Json<AuthSession>)> {
    let session = state.auth().signup(form).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/auth/signin`
#[instrument(skip(state, form))]
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<Signin>,
) -> Result<Json<AuthSession>> {
    let session = state.auth().signin(&form.email, &form.password).await?;
    Ok(Json(session))
}

/// `GET /api/auth/me`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<User>> {
    Ok(Json(state.auth().user(user.id).await?))
}

/// `POST /api/auth/signout`
///
/// Tokens are stateless, so signing out is the client discarding its token.
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn signout(RequireAuth(user): RequireAuth) -> Json<Value> {
    tracing::info!("User signed out");
    clear_sentry_user();
    Json(json!({ "message": "Signed out" }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Request, header};
    use serde_json::json;
    use tower::ServiceExt;

    use super::super::test_support::{body_json, json_request, test_app};
    use axum::body::Body;

    #[tokio::test]
    async fn test_signup_signin_me() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/signup",
                None,
                &json!({
                    "username": "ada",
                    "email": "Ada@Example.com",
                    "password": "correct horse",
                    "firstName": "Ada"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body = body_json(response).await;
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["firstName"], "Ada");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("passwordHash").is_none());

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/signin",
                None,
                &json!({ "email": "ada@example.com", "password": "correct horse" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let token = body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_owned();

        let response = app
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["username"], "ada");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let app = test_app();
        let form = json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "correct horse"
        });

        let first = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/signup", None, &form))
            .await
            .unwrap();
        assert_eq!(first.status(), 201);

        let second = app
            .oneshot(json_request("POST", "/api/auth/signup", None, &form))
            .await
            .unwrap();
        assert_eq!(second.status(), 409);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = test_app();
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/signup",
                None,
                &json!({
                    "username": "ada",
                    "email": "ada@example.com",
                    "password": "correct horse"
                }),
            ))
            .await
            .unwrap();

        for (email, password) in [
            ("ada@example.com", "wrong horse"),
            ("nobody@example.com", "correct horse"),
            ("not-an-email", "correct horse"),
        ] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/auth/signin",
                    None,
                    &json!({ "email": email, "password": password }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), 401);
            assert_eq!(
                body_json(response).await["message"],
                "Invalid email or password"
            );
        }
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(Request::get("/api/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 401);

        let response = app
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        assert_eq!(body_json(response).await["message"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = test_app()
            .oneshot(
                Request::post("/api/auth/signup")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email": 42}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert!(body_json(response).await["message"].is_string());
    }
}
