//! Client for the storefront catalog, cart and admin API.
//!
//! Provides an authenticated API client, a cart store that mirrors the
//! server's cart, and debounced paginated search controllers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storefront::{ApiClient, CartStore, SessionContext};
//!
//! # async fn run() -> storefront::Result<()> {
//! let session = SessionContext::in_memory();
//! let client = Arc::new(ApiClient::new("http://localhost:8080", session.clone())?);
//! client.login("ana@example.com", "secret").await?;
//!
//! let cart = CartStore::new(client, session);
//! cart.load().await?;
//! println!("{} items", cart.snapshot().total_items);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cart;
pub mod client;
pub mod config;
pub mod error;
pub mod search;
pub mod session;

pub use api::{CartApi, SearchSource, Upload};
pub use cart::{CartSnapshot, CartStore};
pub use client::{ApiClient, SignInRedirect};
pub use config::Config;
pub use error::{Error, Result};
pub use search::{SearchController, SearchSnapshot};
pub use session::fs::FileSessionStore;
pub use session::{MemorySessionStore, Session, SessionContext, SessionStore};

pub use storefront_core as types;
