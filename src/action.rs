//! Action tokens carried by inline buttons.
//!
//! Tokens are colon-delimited (`cart_item:remove_one:2`). Parsing is closed:
//! a token either maps to exactly one `Action` or is rejected, and
//! formatting an `Action` gives back the same token.

use std::fmt;
use std::str::FromStr;

use crate::catalog::{Category, ProductId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget {
    Main,
    Catalog,
    Promo,
    Cart,
    Help,
}

impl MenuTarget {
    fn as_str(&self) -> &'static str {
        match self {
            MenuTarget::Main => "main",
            MenuTarget::Catalog => "feed_type",
            MenuTarget::Promo => "promo",
            MenuTarget::Cart => "cart",
            MenuTarget::Help => "help",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "main" => Some(MenuTarget::Main),
            "feed_type" => Some(MenuTarget::Catalog),
            "promo" => Some(MenuTarget::Promo),
            "cart" => Some(MenuTarget::Cart),
            "help" => Some(MenuTarget::Help),
            _ => None,
        }
    }
}

/// Edit applied to one cart line from the cart view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOp {
    Increment,
    Decrement,
    Remove,
}

impl LineOp {
    fn as_str(&self) -> &'static str {
        match self {
            LineOp::Increment => "add_one",
            LineOp::Decrement => "remove_one",
            LineOp::Remove => "delete_all",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "add_one" => Some(LineOp::Increment),
            "remove_one" => Some(LineOp::Decrement),
            "delete_all" => Some(LineOp::Remove),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    MainMenu,
    CategoryPicker,
    Category(Category),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `menu:<target>`
    Menu(MenuTarget),
    /// `feed:<category>`
    PickCategory(Category),
    /// `product:<id>`
    ViewProduct(ProductId),
    /// `cart:add:<id>`
    AddToCart(ProductId),
    /// `cart:clear`
    ClearCart,
    /// `cart:checkout`
    Checkout,
    /// `cart_item:<op>:<index>`
    EditLine { op: LineOp, index: usize },
    /// `back:<menu or feed token>`
    Back(BackTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParseError(pub String);

impl fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized action token: {:?}", self.0)
    }
}

impl std::error::Error for ActionParseError {}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Menu(target) => write!(f, "menu:{}", target.as_str()),
            Action::PickCategory(category) => write!(f, "feed:{category}"),
            Action::ViewProduct(id) => write!(f, "product:{id}"),
            Action::AddToCart(id) => write!(f, "cart:add:{id}"),
            Action::ClearCart => f.write_str("cart:clear"),
            Action::Checkout => f.write_str("cart:checkout"),
            Action::EditLine { op, index } => write!(f, "cart_item:{}:{index}", op.as_str()),
            Action::Back(BackTarget::MainMenu) => f.write_str("back:menu:main"),
            Action::Back(BackTarget::CategoryPicker) => f.write_str("back:menu:feed_type"),
            Action::Back(BackTarget::Category(category)) => write!(f, "back:feed:{category}"),
        }
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = token.split(':').collect();
        let action = match parts.as_slice() {
            ["menu", target] => MenuTarget::parse(target).map(Action::Menu),
            ["feed", category] => category.parse().ok().map(Action::PickCategory),
            ["product", id] => parse_id(id).map(Action::ViewProduct),
            ["cart", "add", id] => parse_id(id).map(Action::AddToCart),
            ["cart", "clear"] => Some(Action::ClearCart),
            ["cart", "checkout"] => Some(Action::Checkout),
            ["cart_item", op, index] => LineOp::parse(op)
                .zip(parse_index(index))
                .map(|(op, index)| Action::EditLine { op, index }),
            ["back", "menu", "main"] => Some(Action::Back(BackTarget::MainMenu)),
            ["back", "menu", "feed_type"] => Some(Action::Back(BackTarget::CategoryPicker)),
            ["back", "feed", category] => category
                .parse()
                .ok()
                .map(|c| Action::Back(BackTarget::Category(c))),
            _ => None,
        };
        action.ok_or_else(|| ActionParseError(token.to_string()))
    }
}

/// Digits only, so that formatting reproduces the token exactly
fn is_canonical_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'))
}

fn parse_id(s: &str) -> Option<ProductId> {
    is_canonical_number(s).then(|| s.parse().ok()).flatten()
}

fn parse_index(s: &str) -> Option<usize> {
    is_canonical_number(s).then(|| s.parse().ok()).flatten()
}
