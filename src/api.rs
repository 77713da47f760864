//! Endpoint bindings on [`ApiClient`](crate::client::ApiClient), plus the
//! traits the stores are written against.

use async_trait::async_trait;

use storefront_core::{Cart, Page, SearchQuery};

use crate::error::Result;

pub mod auth;
pub mod cart;
pub mod companies;
pub mod products;
pub mod users;

/// Remote cart resource
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Current cart of the authenticated caller
    async fn fetch_cart(&self) -> Result<Cart>;

    /// Add `quantity` units of a product
    async fn add_item(&self, product_id: u64, quantity: u32) -> Result<Cart>;

    /// Set the quantity of a cart line
    async fn update_item(&self, cart_item_id: u64, quantity: u32) -> Result<Cart>;

    /// Delete a cart line
    async fn remove_item(&self, cart_item_id: u64) -> Result<Cart>;

    /// Delete every line. The server sends no cart back.
    async fn clear(&self) -> Result<()>;
}

/// A paginated listing endpoint
#[async_trait]
pub trait SearchSource<T>: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Page<T>>;
}

/// A file sent as a multipart part (product photos, profile images)
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Read a file from disk, guessing the content type from its extension.
    pub async fn from_path(path: &std::path::Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let content_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
        .to_string();

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub(crate) fn into_part(self) -> Result<reqwest::multipart::Part> {
        Ok(reqwest::multipart::Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?)
    }
}
