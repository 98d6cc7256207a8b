//! # Cart Engine
//!
//! A cart is a value: every operation consumes the current cart and returns
//! the next one, which the caller writes back to the session store.
//!
//! Invariants held by every constructor and operation:
//! - a line's quantity is at least 1 (lines reaching zero are removed)
//! - at most one line per product id
//! - lines keep the order in which products were first added

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{CatalogStore, Product, ProductId};
use crate::errors::ShopError;

/// One product/quantity pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Ordered cart lines, stored as `[{"product_id": .., "quantity": ..}]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl From<Vec<CartLine>> for Cart {
    /// Normalizes stored data: zero quantities are dropped and duplicate
    /// product ids are folded into their first occurrence.
    fn from(raw: Vec<CartLine>) -> Self {
        let mut lines: Vec<CartLine> = Vec::with_capacity(raw.len());
        for line in raw.into_iter().filter(|l| l.quantity > 0) {
            match lines.iter_mut().find(|l| l.product_id == line.product_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
                None => lines.push(line),
            }
        }
        Self { lines }
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds one unit of a resolved product. Taking a `Product` rather than an
    /// id means the caller has already proven the product exists.
    pub fn add(mut self, product: &Product) -> Cart {
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product_id: product.id,
                quantity: 1,
            }),
        }
        self
    }

    pub fn increment(mut self, index: usize) -> Result<Cart, ShopError> {
        let len = self.lines.len();
        let line = self
            .lines
            .get_mut(index)
            .ok_or(ShopError::CartIndexOutOfRange { index, len })?;
        line.quantity = line.quantity.saturating_add(1);
        Ok(self)
    }

    /// Decrements a line, removing it when its quantity would reach zero.
    pub fn decrement(mut self, index: usize) -> Result<Cart, ShopError> {
        let len = self.lines.len();
        let line = self
            .lines
            .get_mut(index)
            .ok_or(ShopError::CartIndexOutOfRange { index, len })?;
        if line.quantity > 1 {
            line.quantity -= 1;
        } else {
            self.lines.remove(index);
        }
        Ok(self)
    }

    pub fn remove_line(mut self, index: usize) -> Result<Cart, ShopError> {
        if index >= self.lines.len() {
            return Err(ShopError::CartIndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        self.lines.remove(index);
        Ok(self)
    }

    pub fn clear(self) -> Cart {
        Cart::default()
    }

    /// Sum of quantity x price over lines whose price is known. Lines the
    /// lookup cannot price are skipped.
    pub fn total<F>(&self, price_of: F) -> i64
    where
        F: Fn(ProductId) -> Option<i64>,
    {
        self.lines
            .iter()
            .filter_map(|line| price_of(line.product_id).map(|price| price * i64::from(line.quantity)))
            .sum()
    }
}

/// Adds a product by id, failing with `ProductNotFound` before touching the
/// cart when the catalog does not know it.
pub async fn add_by_id(
    catalog: &dyn CatalogStore,
    cart: Cart,
    product_id: ProductId,
) -> Result<(Cart, Product), ShopError> {
    let product = catalog
        .find_by_id(product_id)
        .await?
        .ok_or(ShopError::ProductNotFound(product_id))?;
    Ok((cart.add(&product), product))
}

/// A cart line paired with its catalog entry, if it still exists
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine {
    pub index: usize,
    pub line: CartLine,
    pub product: Option<Product>,
}

impl ResolvedLine {
    pub fn line_total(&self) -> Option<i64> {
        self.product
            .as_ref()
            .map(|p| p.price * i64::from(self.line.quantity))
    }
}

/// A cart resolved against the catalog, ready for display or ordering
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    pub lines: Vec<ResolvedLine>,
    pub total: i64,
}

impl CartSummary {
    pub async fn resolve(catalog: &dyn CatalogStore, cart: &Cart) -> Result<Self, ShopError> {
        let mut prices: HashMap<ProductId, i64> = HashMap::new();
        let mut lines = Vec::with_capacity(cart.len());

        for (index, line) in cart.lines().iter().enumerate() {
            let product = catalog.find_by_id(line.product_id).await?;
            if let Some(ref p) = product {
                prices.insert(p.id, p.price);
            }
            lines.push(ResolvedLine {
                index,
                line: *line,
                product,
            });
        }

        let total = cart.total(|id| prices.get(&id).copied());
        Ok(Self { lines, total })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
