//! # Pet Shop Telegram Bot
//!
//! A Telegram storefront for pet food: users browse the catalog, keep a
//! persistent cart, check out by sharing a delivery address and contact, and
//! can message the shop operator for help.

pub mod action;
pub mod bot;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod session;
