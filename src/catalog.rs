//! Product catalog: the read-only side of the shop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ShopError;

pub type ProductId = i64;

/// The two fixed shelves of the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cats,
    Dogs,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Cats, Category::Dogs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cats => "cats",
            Category::Dogs => "dogs",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cats" => Ok(Category::Cats),
            "dogs" => Ok(Category::Dogs),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// A product row; prices are whole currency units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub subcategory: String,
    pub price: i64,
    pub description: String,
    pub image_ref: String,
}

/// Read-only product lookup
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ShopError>;

    /// Products of a category, ordered by id
    async fn find_by_category(&self, category: Category) -> Result<Vec<Product>, ShopError>;
}

/// Catalog held in memory, used when no database is configured
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub fn new(mut products: Vec<Product>) -> Self {
        products.sort_by_key(|p| p.id);
        Self { products }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ShopError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_category(&self, category: Category) -> Result<Vec<Product>, ShopError> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }
}

/// The shop's starter assortment, used by the seeding binary and the
/// in-memory fallback
pub fn default_products() -> Vec<Product> {
    let product = |id, name: &str, category, subcategory: &str, price, description: &str, image_ref: &str| Product {
        id,
        name: name.to_string(),
        category,
        subcategory: subcategory.to_string(),
        price,
        description: description.to_string(),
        image_ref: image_ref.to_string(),
    };

    vec![
        product(
            1,
            "Food for active cats",
            Category::Cats,
            "active",
            1200,
            "Complete food for active cats. Enriched with vitamins and minerals.",
            "cat_active.jpg",
        ),
        product(
            2,
            "Food for sterilized cats",
            Category::Cats,
            "sterilized",
            1300,
            "Food for sterilized cats. Supports urinary tract health.",
            "cat_sterilized.jpg",
        ),
        product(
            3,
            "Food for small dog breeds",
            Category::Dogs,
            "small",
            1100,
            "Food for small dog breeds. Easy to digest and tasty.",
            "dog_small.jpg",
        ),
        product(
            4,
            "Food for large and medium dog breeds",
            Category::Dogs,
            "big",
            1500,
            "Food for large and medium dog breeds. Contains glucosamine for joints.",
            "dog_big.jpg",
        ),
        product(
            5,
            "Food for medium and large dog breeds",
            Category::Dogs,
            "medium_big",
            1400,
            "Food for medium and large dog breeds. Balanced proteins and fats.",
            "dog_medium_big.jpg",
        ),
    ]
}
