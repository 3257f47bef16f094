//! Integration tests against the `PostgreSQL` backend.
//!
//! Each test returns early unless `LUXE_TEST_DATABASE_URL` points at a
//! database the migrations can run in. Rows are keyed by fresh users and
//! slugs, so runs do not interfere with each other.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use luxe_core::{Email, Money, Quantity, Slug, UserId};
use luxe_integration_tests::{TestApp, json_body, postgres_repositories, unique_email};
use luxe_storefront::db::{Repositories, RepositoryError};
use luxe_storefront::models::{NewCartItem, NewOrder, NewOrderItem, NewProduct, NewUser, Product};

async fn user(repos: &Repositories) -> UserId {
    repos
        .users
        .create(NewUser {
            username: "shopper".to_owned(),
            email: Email::parse(&unique_email("pg")).unwrap(),
            password_hash: "not-a-real-hash".to_owned(),
            first_name: None,
            last_name: None,
        })
        .await
        .unwrap()
        .id
}

async fn product(repos: &Repositories) -> Product {
    repos
        .catalog
        .create_product(NewProduct {
            name: "Classic White Tee".to_owned(),
            slug: Slug::parse(&format!("tee-{}", UserId::new())).unwrap(),
            description: None,
            price: Money::parse("29.00").unwrap(),
            category_id: None,
            image_url: None,
            sizes: vec!["M".to_owned()],
            in_stock: true,
            featured: false,
            on_sale: false,
        })
        .await
        .unwrap()
}

fn line(product: &Product, quantity: u32) -> NewCartItem {
    NewCartItem {
        product_id: product.id,
        name: product.name.clone(),
        price: product.price,
        size: "M".to_owned(),
        quantity: Quantity::new(quantity).unwrap(),
        image_url: None,
    }
}

#[tokio::test]
async fn test_concurrent_adds_of_one_variant_merge_into_one_row() {
    let Some(repos) = postgres_repositories().await else {
        return;
    };
    let user = user(&repos).await;
    let product = Arc::new(product(&repos).await);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let carts = repos.carts.clone();
            let product = product.clone();
            tokio::spawn(async move { carts.add_or_merge(user, line(&product, 1)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let items = repos.carts.list_items(user).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity.get(), 8);
}

#[tokio::test]
async fn test_concurrent_checkouts_record_one_order() {
    let Some(repos) = postgres_repositories().await else {
        return;
    };
    let user = user(&repos).await;
    let product = product(&repos).await;
    repos.carts.add_or_merge(user, line(&product, 2)).await.unwrap();

    let order = NewOrder {
        items: vec![NewOrderItem {
            product_id: Some(product.id),
            quantity: Quantity::new(2).unwrap(),
            price: product.price,
            size: Some("M".to_owned()),
        }],
        shipping_address: Some("1 Main St, Springfield".to_owned()),
        total: Money::parse("58.00").unwrap(),
    };

    let (first, second) = tokio::join!(
        repos.orders.place_order(user, order.clone()),
        repos.orders.place_order(user, order),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(RepositoryError::EmptyCart)))
    );

    let orders = repos.orders.list_orders(user).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert!(repos.carts.list_items(user).await.unwrap().is_empty());

    let placed = repos.orders.get_order(user, orders[0].id).await.unwrap().unwrap();
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].price.to_string(), "29.00");
}

#[tokio::test]
async fn test_merge_overflow_is_conflict() {
    let Some(repos) = postgres_repositories().await else {
        return;
    };
    let product = product(&repos).await;
    let app = TestApp::spawn_on(repos, |_| {}).await;
    let token = app.signup(&unique_email("overflow")).await;

    let response = app
        .post("/api/cart", Some(&token))
        .json(&json!({ "productId": product.id, "size": "M", "quantity": Quantity::MAX }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .post("/api/cart", Some(&token))
        .json(&json!({ "productId": product.id, "size": "M", "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let cart = json_body(app.get("/api/cart", Some(&token)).send().await.unwrap()).await;
    assert_eq!(cart[0]["quantity"], Quantity::MAX);
}

#[tokio::test]
async fn test_amounts_above_column_limit_are_bad_request() {
    let Some(repos) = postgres_repositories().await else {
        return;
    };
    let product = product(&repos).await;
    let app = TestApp::spawn_on(repos, |_| {}).await;
    let admin = app.admin(&unique_email("admin")).await;
    let token = app.signup(&unique_email("shopper")).await;

    let response = app
        .post("/api/products", Some(&admin))
        .json(&json!({ "name": "Gold Watch", "price": "100000000000.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post("/api/cart", Some(&token))
        .json(&json!({ "productId": product.id, "size": "M" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .post("/api/orders", Some(&token))
        .json(&json!({
            "items": [{ "productId": product.id, "quantity": 1, "price": "29.00", "size": "M" }],
            "total": "100000000000.00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let cart = json_body(app.get("/api/cart", Some(&token)).send().await.unwrap()).await;
    assert_eq!(cart.as_array().unwrap().len(), 1);
}
