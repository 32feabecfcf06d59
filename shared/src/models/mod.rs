//! Wire models for the remote stores

mod order;
mod product;
mod user;

pub use order::{Order, OrderLineItem, OrderStatus};
pub use product::ProductRecord;
pub use user::UserRecord;
