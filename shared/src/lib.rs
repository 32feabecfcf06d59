//! Shared wire models for the storefront stock engine
//!
//! # Module structure
//!
//! ```text
//! shared/src/
//! ├── models/        # Product, order and user records
//! └── util.rs        # Timestamps, local order ids
//! ```
//!
//! These types describe the JSON shapes exchanged with the remote
//! Product/Order/User stores. The stores are legacy and loose about
//! field names (see [`models::ProductRecord`]), so the product model
//! wraps the raw record instead of declaring a rigid struct.

pub mod models;
pub mod util;

// Re-export public types
pub use models::{Order, OrderLineItem, OrderStatus, ProductRecord, UserRecord};
