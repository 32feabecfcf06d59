//! HTTP clients for the remote storefront stores
//!
//! The storefront keeps its data in three remote collections, reached
//! over plain JSON/HTTP:
//!
//! - **Product store** — `GET /products/{id}`, `PUT /products/{id}`
//!   (whole-record replace only, no partial patch, no CAS)
//! - **Order store** — `GET/POST /orders`, `PUT/DELETE /orders/{id}`
//! - **User store** — `GET /users`, used to resolve order emails
//!
//! Each collection is exposed as an object-safe trait so the engine
//! and its tests can substitute implementations; the `memory` module
//! (feature `in-memory`) provides fakes with failure injection.

pub mod config;
pub mod error;
pub mod http;
#[cfg(feature = "in-memory")]
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

pub use config::StoreConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use orders::{HttpOrderStore, OrderStore};
pub use products::{HttpProductStore, ProductStore};
pub use users::{HttpUserDirectory, UserDirectory};
