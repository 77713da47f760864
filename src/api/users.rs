use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Method;
use tracing::info;

use storefront_core::{Page, Registration, SearchQuery, SortDirection, User, UserUpdate};

use crate::api::auth::registration_form;
use crate::api::{SearchSource, Upload};
use crate::client::{ApiClient, NO_QUERY};
use crate::error::Result;

#[async_trait]
impl SearchSource<User> for ApiClient {
    /// GET /api/auth/users/search?name&page&size&sortBy&direction
    async fn search(&self, query: &SearchQuery) -> Result<Page<User>> {
        let direction = query.direction.unwrap_or(SortDirection::Asc);
        let params = [
            ("name", query.term.clone()),
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
            ("sortBy", query.sort.clone()),
            ("direction", direction.as_str().to_string()),
        ];
        self.get("/api/auth/users/search", &params).await
    }
}

impl ApiClient {
    /// GET /api/auth/users/{id}
    pub async fn user(&self, id: u64) -> Result<User> {
        self.get(&format!("/api/auth/users/{}", id), NO_QUERY).await
    }

    /// PUT /api/auth/users/{id} (multipart, only the fields that are set)
    pub async fn update_user(&self, id: u64, update: &UserUpdate, profile_image: Option<Upload>) -> Result<User> {
        let mut form = Form::new();
        if let Some(v) = &update.full_name {
            form = form.text("fullName", v.clone());
        }
        if let Some(v) = &update.email {
            form = form.text("email", v.clone());
        }
        if let Some(v) = &update.password {
            form = form.text("password", v.clone());
        }
        if let Some(v) = update.role {
            form = form.text("role", v.as_str());
        }
        if let Some(v) = update.is_active {
            form = form.text("isActive", v.to_string());
        }
        if let Some(v) = update.is_not_locked {
            form = form.text("isNotLocked", v.to_string());
        }
        if let Some(v) = update.is_change_password {
            form = form.text("isChangePassword", v.to_string());
        }
        if let Some(image) = profile_image {
            form = form.part("profileImage", image.into_part()?);
        }

        self.send_multipart(Method::PUT, &format!("/api/auth/users/{}", id), form)
            .await
    }

    /// DELETE /api/auth/users/{id}
    pub async fn delete_user(&self, id: u64) -> Result<()> {
        self.send_discarding(Method::DELETE, &format!("/api/auth/users/{}", id), NO_QUERY)
            .await?;
        info!("Deleted user {}", id);
        Ok(())
    }

    /// POST /api/useradmin/registerAdmin (multipart). Admin-only: registers
    /// a user attached to a company.
    pub async fn register_company_user(
        &self,
        registration: &Registration,
        company_id: u64,
        profile_image: Option<Upload>,
    ) -> Result<User> {
        let form = registration_form(registration, profile_image)?.text("companyId", company_id.to_string());
        let user: User = self
            .send_multipart(Method::POST, "/api/useradmin/registerAdmin", form)
            .await?;
        info!("Registered {} for company {}", user.email, company_id);
        Ok(user)
    }
}
