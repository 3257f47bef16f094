//! Catalog domain types: categories and products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use luxe_core::{CategoryId, Money, ProductId, Slug};

/// A product category. Reference data, created by seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A purchasable product.
///
/// `sizes` is an ordered list of labels; an empty list means the product
/// does not declare sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Money,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub sizes: Vec<String>,
    pub in_stock: bool,
    pub featured: bool,
    pub on_sale: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether `size` is a valid variant of this product.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        self.sizes.is_empty() || self.sizes.iter().any(|s| s == size)
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: ProductUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(slug) = update.slug {
            self.slug = slug;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(category_id) = update.category_id {
            self.category_id = Some(category_id);
        }
        if let Some(image_url) = update.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(sizes) = update.sizes {
            self.sizes = sizes;
        }
        if let Some(in_stock) = update.in_stock {
            self.in_stock = in_stock;
        }
        if let Some(featured) = update.featured {
            self.featured = featured;
        }
        if let Some(on_sale) = update.on_sale {
            self.on_sale = on_sale;
        }
    }
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Money,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub sizes: Vec<String>,
    pub in_stock: bool,
    pub featured: bool,
    pub on_sale: bool,
}

/// Partial product update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<Slug>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub on_sale: Option<bool>,
}

/// Conjunctive product filter. Absent fields are not applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub featured: Option<bool>,
    pub on_sale: Option<bool>,
}

impl ProductFilter {
    /// Whether `product` satisfies every supplied predicate.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category_id
            .is_none_or(|id| product.category_id == Some(id))
            && self.featured.is_none_or(|f| product.featured == f)
            && self.on_sale.is_none_or(|s| product.on_sale == s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(),
            name: "Classic White Tee".to_owned(),
            slug: Slug::parse("classic-white-tee").unwrap(),
            description: None,
            price: Money::parse("29.00").unwrap(),
            category_id: None,
            image_url: None,
            sizes: vec!["S".to_owned(), "M".to_owned()],
            in_stock: true,
            featured: true,
            on_sale: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_is_conjunctive() {
        let mut p = product();
        let category = CategoryId::new();
        p.category_id = Some(category);

        assert!(ProductFilter::default().matches(&p));
        let both = ProductFilter {
            category_id: Some(category),
            featured: Some(true),
            on_sale: None,
        };
        assert!(both.matches(&p));
        let wrong_sale = ProductFilter {
            on_sale: Some(true),
            ..both
        };
        assert!(!wrong_sale.matches(&p));
        let other_category = ProductFilter {
            category_id: Some(CategoryId::new()),
            ..ProductFilter::default()
        };
        assert!(!other_category.matches(&p));
    }

    #[test]
    fn test_offers_size() {
        let mut p = product();
        assert!(p.offers_size("M"));
        assert!(!p.offers_size("XL"));
        p.sizes.clear();
        assert!(p.offers_size("anything"));
    }

    #[test]
    fn test_apply_partial_update() {
        let mut p = product();
        p.apply(ProductUpdate {
            price: Some(Money::parse("25.00").unwrap()),
            on_sale: Some(true),
            ..ProductUpdate::default()
        });
        assert_eq!(p.price.to_string(), "25.00");
        assert!(p.on_sale);
        assert_eq!(p.name, "Classic White Tee");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(product()).unwrap();
        assert_eq!(json["inStock"], true);
        assert_eq!(json["onSale"], false);
        assert_eq!(json["price"], "29.00");
        assert!(json.get("categoryId").is_some());
    }
}
