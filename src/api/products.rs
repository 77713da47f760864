use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Method;
use tracing::info;

use storefront_core::{Page, Product, ProductDraft, SearchQuery};

use crate::api::{SearchSource, Upload};
use crate::client::{ApiClient, NO_QUERY};
use crate::error::{Error, Result};

/// The backend accepts at most this many images per product.
pub const MAX_PRODUCT_IMAGES: usize = 10;

#[async_trait]
impl SearchSource<Product> for ApiClient {
    /// GET /api/products/search?term&page&size&sort
    async fn search(&self, query: &SearchQuery) -> Result<Page<Product>> {
        let params = [
            ("term", query.term.clone()),
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
            ("sort", query.sort.clone()),
        ];
        self.get("/api/products/search", &params).await
    }
}

impl ApiClient {
    /// GET /api/products/{id}
    pub async fn product(&self, id: u64) -> Result<Product> {
        self.get(&format!("/api/products/{}", id), NO_QUERY).await
    }

    /// POST /api/products (multipart)
    pub async fn create_product(&self, draft: &ProductDraft, images: Vec<Upload>) -> Result<Product> {
        let form = product_form(draft, images)?;
        let product: Product = self.send_multipart(Method::POST, "/api/products", form).await?;
        info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    /// PUT /api/products/{id} (multipart). `images` are added to the
    /// product's existing ones.
    pub async fn update_product(&self, id: u64, draft: &ProductDraft, images: Vec<Upload>) -> Result<Product> {
        let form = product_form(draft, images)?;
        self.send_multipart(Method::PUT, &format!("/api/products/{}", id), form)
            .await
    }

    /// DELETE /api/products/{id}
    pub async fn delete_product(&self, id: u64) -> Result<()> {
        self.send_discarding(Method::DELETE, &format!("/api/products/{}", id), NO_QUERY)
            .await?;
        info!("Deleted product {}", id);
        Ok(())
    }
}

fn product_form(draft: &ProductDraft, images: Vec<Upload>) -> Result<Form> {
    if images.len() > MAX_PRODUCT_IMAGES {
        return Err(Error::InvalidInput(format!(
            "at most {} images per product",
            MAX_PRODUCT_IMAGES
        )));
    }

    let mut form = Form::new()
        .text("name", draft.name.clone())
        .text("description", draft.description.clone())
        .text("price", draft.price.to_string())
        .text("stockQuantity", draft.stock_quantity.to_string())
        .text("isActive", draft.is_active.to_string());
    for image in images {
        form = form.part("productImages", image.into_part()?);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_images_fail_locally() {
        let draft = ProductDraft {
            name: "Lamp".into(),
            description: String::new(),
            price: 10.0,
            stock_quantity: 3,
            is_active: true,
        };
        let image = Upload {
            file_name: "a.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0],
        };
        let images = vec![image; MAX_PRODUCT_IMAGES + 1];
        assert!(matches!(product_form(&draft, images), Err(Error::InvalidInput(_))));
    }
}
