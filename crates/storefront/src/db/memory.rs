//! In-memory repository backend.
//!
//! All tables live behind a single [`RwLock`]. Each trait method takes the
//! lock exactly once, so compound operations such as merge-on-add and
//! order placement are atomic with respect to every other request.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use luxe_core::{
    CartItemId, CategoryId, Email, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, Slug,
    UserId,
};

use super::{
    CartRepository, CatalogRepository, OrderRepository, RepositoryError, StoreHealth,
    UserRepository,
};
use crate::models::{
    CartItem, Category, NewCartItem, NewCategory, NewOrder, NewProduct, NewUser, Order, OrderItem,
    OrderWithItems, Product, ProductFilter, ProductUpdate, User,
};

/// Process-local store. Rows are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<StoredUser>,
    categories: Vec<Category>,
    products: Vec<Product>,
    cart_items: Vec<CartItem>,
    orders: Vec<OrderWithItems>,
}

#[derive(Debug)]
struct StoredUser {
    user: User,
    password_hash: String,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.user.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = User {
            id: UserId::new(),
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            is_admin: false,
            created_at: Utc::now(),
        };
        tables.users.push(StoredUser {
            user: user.clone(),
            password_hash: new.password_hash,
        });
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone()))
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().rev().map(|u| u.user.clone()).collect())
    }

    async fn set_admin(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .iter_mut()
            .find(|u| &u.user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        stored.user.is_admin = is_admin;
        Ok(stored.user.clone())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut categories = tables.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| &c.slug == slug).cloned())
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.slug == new.slug) {
            return Err(RepositoryError::Conflict("category slug already exists".to_owned()));
        }

        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            slug: new.slug,
            description: new.description,
            image_url: new.image_url,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .rev()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| &p.slug == slug).cloned())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.products.iter().any(|p| p.slug == new.slug) {
            return Err(RepositoryError::Conflict("product slug already exists".to_owned()));
        }

        let product = Product {
            id: ProductId::new(),
            name: new.name,
            slug: new.slug,
            description: new.description,
            price: new.price,
            category_id: new.category_id,
            image_url: new.image_url,
            sizes: new.sizes,
            in_stock: new.in_stock,
            featured: new.featured,
            on_sale: new.on_sale,
            created_at: Utc::now(),
        };
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(slug) = &update.slug
            && tables.products.iter().any(|p| p.id != id && &p.slug == slug)
        {
            return Err(RepositoryError::Conflict("product slug already exists".to_owned()));
        }

        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        product.apply(update);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        Ok(tables.products.len() < before)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn list_items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart_items
            .iter()
            .filter(|i| i.user_id == user)
            .cloned()
            .collect())
    }

    async fn add_or_merge(
        &self,
        user: UserId,
        item: NewCartItem,
    ) -> Result<(CartItem, bool), RepositoryError> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.cart_items.iter_mut().find(|i| {
            i.user_id == user && i.product_id == item.product_id && i.size == item.size
        }) {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .map_err(|_| RepositoryError::Conflict("cart quantity is too large".to_owned()))?;
            return Ok((existing.clone(), true));
        }

        let created = CartItem {
            id: CartItemId::new(),
            user_id: user,
            product_id: item.product_id,
            name: item.name,
            price: item.price,
            size: item.size,
            quantity: item.quantity,
            image_url: item.image_url,
            created_at: Utc::now(),
        };
        tables.cart_items.push(created.clone());
        Ok((created, false))
    }

    async fn set_quantity(
        &self,
        user: UserId,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.tables.write().await;
        let line = tables
            .cart_items
            .iter_mut()
            .find(|i| i.id == item && i.user_id == user)
            .ok_or(RepositoryError::NotFound)?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn remove(&self, user: UserId, item: CartItemId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.cart_items.len();
        tables
            .cart_items
            .retain(|i| !(i.id == item && i.user_id == user));
        Ok(tables.cart_items.len() < before)
    }

    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(clear_cart(&mut tables, user))
    }
}

/// Remove a user's cart rows, returning how many went.
fn clear_cart(tables: &mut Tables, user: UserId) -> u64 {
    let before = tables.cart_items.len();
    tables.cart_items.retain(|i| i.user_id != user);
    u64::try_from(before - tables.cart_items.len()).unwrap_or(u64::MAX)
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place_order(
        &self,
        user: UserId,
        order: NewOrder,
    ) -> Result<OrderWithItems, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.cart_items.iter().any(|i| i.user_id == user) {
            return Err(RepositoryError::EmptyCart);
        }

        let header = Order {
            id: OrderId::new(),
            user_id: user,
            total: order.total,
            shipping_address: order.shipping_address,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        let items = order
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: OrderItemId::new(),
                order_id: header.id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                size: item.size,
            })
            .collect();
        let placed = OrderWithItems {
            order: header,
            items,
        };

        tables.orders.push(placed.clone());
        clear_cart(&mut tables, user);
        Ok(placed)
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .rev()
            .filter(|o| o.order.user_id == user)
            .map(|o| o.order.clone())
            .collect())
    }

    async fn get_order(
        &self,
        user: UserId,
        id: OrderId,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| o.order.id == id && o.order.user_id == user)
            .cloned())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use luxe_core::Money;

    use super::*;
    use crate::models::NewOrderItem;

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn line(product_id: ProductId, size: &str, quantity: u32, price: &str) -> NewCartItem {
        NewCartItem {
            product_id,
            name: "Classic White Tee".to_owned(),
            price: money(price),
            size: size.to_owned(),
            quantity: qty(quantity),
            image_url: None,
        }
    }

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create(NewUser {
                username: "shopper".to_owned(),
                email: Email::parse(email).unwrap(),
                password_hash: "hash".to_owned(),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "a@example.com").await;
        let err = store
            .create(NewUser {
                username: "again".to_owned(),
                email: Email::parse("A@Example.com").unwrap(),
                password_hash: "hash".to_owned(),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_merges_same_variant() {
        let store = MemoryStore::new();
        let shopper = user(&store, "a@example.com").await;
        let product = ProductId::new();

        let (first, merged) = store
            .add_or_merge(shopper.id, line(product, "M", 2, "29.00"))
            .await
            .unwrap();
        assert!(!merged);
        let (second, merged) = store
            .add_or_merge(shopper.id, line(product, "M", 1, "29.00"))
            .await
            .unwrap();
        assert!(merged);
        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity.get(), 3);

        store
            .add_or_merge(shopper.id, line(product, "L", 1, "29.00"))
            .await
            .unwrap();
        assert_eq!(store.list_items(shopper.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_adds_keep_one_row() {
        let store = Arc::new(MemoryStore::new());
        let shopper = user(&store, "a@example.com").await;
        let product = ProductId::new();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .add_or_merge(shopper.id, line(product, "M", 1, "29.00"))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let items = store.list_items(shopper.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity.get(), 16);
    }

    #[tokio::test]
    async fn test_cart_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let (item, _) = store
            .add_or_merge(alice.id, line(ProductId::new(), "M", 1, "29.00"))
            .await
            .unwrap();

        assert!(matches!(
            store.set_quantity(bob.id, item.id, qty(5)).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(!store.remove(bob.id, item.id).await.unwrap());
        assert_eq!(store.clear(bob.id).await.unwrap(), 0);
        assert_eq!(store.list_items(alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_place_order_clears_cart_once() {
        let store = MemoryStore::new();
        let shopper = user(&store, "a@example.com").await;
        let product = ProductId::new();
        store
            .add_or_merge(shopper.id, line(product, "M", 2, "29.00"))
            .await
            .unwrap();

        let order = NewOrder {
            items: vec![NewOrderItem {
                product_id: Some(product),
                quantity: qty(2),
                price: money("29.00"),
                size: Some("M".to_owned()),
            }],
            shipping_address: Some("1 Main St".to_owned()),
            total: money("58.00"),
        };

        let placed = store.place_order(shopper.id, order.clone()).await.unwrap();
        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert!(store.list_items(shopper.id).await.unwrap().is_empty());

        assert!(matches!(
            store.place_order(shopper.id, order).await,
            Err(RepositoryError::EmptyCart)
        ));
        assert_eq!(store.list_orders(shopper.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_orders_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        store
            .add_or_merge(alice.id, line(ProductId::new(), "M", 1, "29.00"))
            .await
            .unwrap();
        let placed = store
            .place_order(
                alice.id,
                NewOrder {
                    items: vec![],
                    shipping_address: None,
                    total: money("29.00"),
                },
            )
            .await
            .unwrap();

        assert!(store.get_order(bob.id, placed.order.id).await.unwrap().is_none());
        assert!(store.list_orders(bob.id).await.unwrap().is_empty());
        assert!(store.get_order(alice.id, placed.order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_product_rejects_taken_slug() {
        let store = MemoryStore::new();
        let new = |slug: &str| NewProduct {
            name: slug.to_owned(),
            slug: Slug::parse(slug).unwrap(),
            description: None,
            price: money("10.00"),
            category_id: None,
            image_url: None,
            sizes: vec![],
            in_stock: true,
            featured: false,
            on_sale: false,
        };
        store.create_product(new("first")).await.unwrap();
        let second = store.create_product(new("second")).await.unwrap();

        let err = store
            .update_product(
                second.id,
                ProductUpdate {
                    slug: Some(Slug::parse("first").unwrap()),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let listed = store.list_products(ProductFilter::default()).await.unwrap();
        assert_eq!(listed[0].id, second.id, "newest first");
    }
}
