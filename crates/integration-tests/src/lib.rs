//! Integration tests for the Luxe storefront.
//!
//! Each test spawns the full application (routes plus middleware stack) on
//! an ephemeral port and drives it over HTTP with `reqwest`. Most tests use
//! in-memory repositories; `tests/postgres.rs` runs against the database
//! named by `LUXE_TEST_DATABASE_URL` and does nothing when it is unset.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p luxe-integration-tests
//! LUXE_TEST_DATABASE_URL=postgres://localhost/luxe_test cargo test -p luxe-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;

use reqwest::{Client, RequestBuilder, Response};
use secrecy::SecretString;
use serde_json::{Value, json};

use luxe_core::Email;
use luxe_storefront::config::StorefrontConfig;
use luxe_storefront::db::{self, MIGRATOR, Repositories};
use luxe_storefront::seed::{SeedCatalog, seed_catalog};
use luxe_storefront::state::AppState;

/// Token secret used by every spawned app.
pub const TEST_SECRET: &str = "k7Hq2mVx9pLr4nTz8wBc3yFd6gJs1aEu";

/// Password used by [`TestApp::signup`].
pub const TEST_PASSWORD: &str = "correct horse";

/// A running storefront plus a client pointed at it.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub repos: Repositories,
}

impl TestApp {
    /// Spawn an app with an empty store.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn an app with the demo catalog loaded.
    pub async fn spawn_seeded() -> Self {
        let app = Self::spawn().await;
        seed_catalog(app.repos.catalog.as_ref(), &SeedCatalog::demo().unwrap())
            .await
            .unwrap();
        app
    }

    /// Spawn an app after adjusting the test configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        Self::spawn_on(Repositories::in_memory(), configure).await
    }

    /// Spawn an app over the given repositories.
    pub async fn spawn_on(
        repos: Repositories,
        configure: impl FnOnce(&mut StorefrontConfig),
    ) -> Self {
        let mut config = StorefrontConfig::for_testing(SecretString::from(TEST_SECRET.to_string()));
        configure(&mut config);

        let state = AppState::new(config, repos.clone());
        let app = luxe_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            repos,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        authorize(self.client.get(self.url(path)), token)
    }

    pub fn post(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        authorize(self.client.post(self.url(path)), token)
    }

    pub fn put(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        authorize(self.client.put(self.url(path)), token)
    }

    pub fn delete(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        authorize(self.client.delete(self.url(path)), token)
    }

    /// Sign up a user and return their bearer token.
    pub async fn signup(&self, email: &str) -> String {
        let response = self
            .post("/api/auth/signup", None)
            .json(&json!({
                "username": email.split('@').next().unwrap(),
                "email": email,
                "password": TEST_PASSWORD,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_owned()
    }

    /// Sign up a user, make them an admin, and return their token.
    pub async fn admin(&self, email: &str) -> String {
        let token = self.signup(email).await;
        self.repos
            .users
            .set_admin(&Email::parse(email).unwrap(), true)
            .await
            .unwrap();
        token
    }

    /// Look up a product ID by slug.
    pub async fn product_id(&self, slug: &str) -> String {
        let response = self
            .get(&format!("/api/products/slug/{slug}"), None)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        json_body(response).await["id"].as_str().unwrap().to_owned()
    }
}

/// Migrated `PostgreSQL` repositories, or `None` when
/// `LUXE_TEST_DATABASE_URL` is unset.
pub async fn postgres_repositories() -> Option<Repositories> {
    let url = std::env::var("LUXE_TEST_DATABASE_URL").ok()?;
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    Some(Repositories::postgres(pool))
}

/// An email no other test run has used.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", luxe_core::UserId::new())
}

fn authorize(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// Parse a response body as JSON.
pub async fn json_body(response: Response) -> Value {
    response.json().await.unwrap()
}
