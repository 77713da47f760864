use reqwest::Method;

use storefront_core::{Company, CompanyRequest};

use crate::client::{ApiClient, NO_QUERY};
use crate::error::Result;

impl ApiClient {
    /// GET /api/companies
    pub async fn companies(&self) -> Result<Vec<Company>> {
        self.get("/api/companies", NO_QUERY).await
    }

    /// GET /api/companies/active
    pub async fn active_companies(&self) -> Result<Vec<Company>> {
        self.get("/api/companies/active", NO_QUERY).await
    }

    /// GET /api/companies/{id}
    pub async fn company(&self, id: u64) -> Result<Company> {
        self.get(&format!("/api/companies/{}", id), NO_QUERY).await
    }

    /// GET /api/companies/{id}/stats
    pub async fn company_with_stats(&self, id: u64) -> Result<Company> {
        self.get(&format!("/api/companies/{}/stats", id), NO_QUERY).await
    }

    /// POST /api/companies
    pub async fn create_company(&self, request: &CompanyRequest) -> Result<Company> {
        self.send_json(Method::POST, "/api/companies", request).await
    }

    /// PUT /api/companies/{id}
    pub async fn update_company(&self, id: u64, request: &CompanyRequest) -> Result<Company> {
        self.send_json(Method::PUT, &format!("/api/companies/{}", id), request)
            .await
    }
}
