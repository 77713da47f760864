use async_trait::async_trait;
use reqwest::Method;

use storefront_core::{AddToCartRequest, Cart, UpdateCartItemRequest};

use crate::api::CartApi;
use crate::client::{ApiClient, NO_QUERY};
use crate::error::Result;

#[async_trait]
impl CartApi for ApiClient {
    /// GET /api/cart
    async fn fetch_cart(&self) -> Result<Cart> {
        self.get("/api/cart", NO_QUERY).await
    }

    /// POST /api/cart/add
    async fn add_item(&self, product_id: u64, quantity: u32) -> Result<Cart> {
        let body = AddToCartRequest { product_id, quantity };
        self.send_json(Method::POST, "/api/cart/add", &body).await
    }

    /// PUT /api/cart/items/{id}
    async fn update_item(&self, cart_item_id: u64, quantity: u32) -> Result<Cart> {
        let path = format!("/api/cart/items/{}", cart_item_id);
        self.send_json(Method::PUT, &path, &UpdateCartItemRequest { quantity })
            .await
    }

    /// DELETE /api/cart/items/{id}
    async fn remove_item(&self, cart_item_id: u64) -> Result<Cart> {
        let path = format!("/api/cart/items/{}", cart_item_id);
        self.call(Method::DELETE, &path).await
    }

    /// DELETE /api/cart/clear
    async fn clear(&self) -> Result<()> {
        self.send_discarding(Method::DELETE, "/api/cart/clear", NO_QUERY)
            .await
    }
}
