//! HTTP plumbing shared by every endpoint binding.
//!
//! Adds the bearer token to protected routes and tears the session down
//! when a protected route answers 401/403.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use storefront_core::MessageResponse;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::SessionContext;

/// Routes that never carry credentials and never trigger a teardown.
pub const PUBLIC_ROUTES: &[&str] = &[
    "/api/auth/authenticate",
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/forgot-password",
    "/api/auth/reset-password",
    "/api/auth/confirm-email",
];

/// Empty query string.
pub(crate) const NO_QUERY: &[(&str, &str)] = &[];

pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.iter().any(|route| path.starts_with(route))
}

/// Navigation hook invoked after a session teardown.
pub trait SignInRedirect: Send + Sync {
    /// Whether the UI is already showing the sign-in entry point.
    fn is_at_sign_in(&self) -> bool;

    fn redirect_to_sign_in(&self);
}

/// Storefront API client
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
    redirect: Option<Arc<dyn SignInRedirect>>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionContext) -> Result<Self> {
        Self::build(base_url, None, session)
    }

    pub fn from_config(config: &Config, session: SessionContext) -> Result<Self> {
        Self::build(&config.api_url, config.timeout(), session)
    }

    fn build(base_url: &str, timeout: Option<std::time::Duration>, session: SessionContext) -> Result<Self> {
        // Validate once up front so per-request joins only fail on bad paths.
        Url::parse(base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            redirect: None,
        })
    }

    /// Install the hook used to send the user back to sign-in.
    pub fn with_redirect(mut self, redirect: Arc<dyn SignInRedirect>) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Start a request, attaching credentials unless the route is public.
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let builder = self.http.request(method, self.url(path)?);
        if is_public_route(path) {
            debug!("Public route {}: no token", path);
            return Ok(builder);
        }
        match self.session.access_token().await {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => {
                debug!("Protected route {} without a token", path);
                Ok(builder)
            }
        }
    }

    /// Send and check the status, mapping failures into the error taxonomy.
    async fn execute(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Response> {
        debug!("{} {}", method, path);
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MessageResponse>(&body)
            .ok()
            .and_then(|m| m.text().map(str::to_string));
        warn!("{} {} failed: {} {}", method, path, status, message.as_deref().unwrap_or(""));

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            if is_public_route(path) {
                debug!("Credentials rejected on public route {}", path);
            } else {
                self.handle_unauthorized().await;
            }
        }

        Err(Error::from_status(status, message, path))
    }

    async fn handle_unauthorized(&self) {
        info!("Unauthorized: clearing session");
        if let Err(e) = self.session.teardown().await {
            warn!("Failed to clear persisted session: {}", e);
        }
        if let Some(redirect) = &self.redirect {
            if !redirect.is_at_sign_in() {
                redirect.redirect_to_sign_in();
            }
        }
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::InvalidResponse(format!("{}: {}", path, e)))
    }

    pub(crate) async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).await?.query(query);
        let response = self.execute(Method::GET, path, builder).await?;
        Self::decode(path, response).await
    }

    /// A bodiless request whose response carries JSON.
    pub(crate) async fn call<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let builder = self.request(method.clone(), path).await?;
        let response = self.execute(method, path, builder).await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), path).await?.json(body);
        let response = self.execute(method, path, builder).await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let builder = self.request(method.clone(), path).await?.multipart(form);
        let response = self.execute(method, path, builder).await?;
        Self::decode(path, response).await
    }

    /// For endpoints whose success body is either absent or irrelevant.
    pub(crate) async fn send_discarding<Q>(&self, method: Method, path: &str, query: &Q) -> Result<()>
    where
        Q: Serialize + ?Sized,
    {
        let builder = self.request(method.clone(), path).await?.query(query);
        self.execute(method, path, builder).await?;
        Ok(())
    }

    /// For auth flows that answer `{ "message": ... }`, possibly with an
    /// empty body.
    pub(crate) async fn send_for_message<Q, B>(
        &self,
        method: Method,
        path: &str,
        query: &Q,
        body: Option<&B>,
    ) -> Result<Option<String>>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method.clone(), path).await?.query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.execute(method, path, builder).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str::<MessageResponse>(&body)
            .ok()
            .and_then(|m| m.text().map(str::to_string)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_routes() {
        assert!(is_public_route("/api/auth/authenticate"));
        assert!(is_public_route("/api/auth/register"));
        assert!(is_public_route("/api/auth/forgot-password"));
        assert!(is_public_route("/api/auth/confirm-email"));

        assert!(!is_public_route("/api/auth/users/search"));
        assert!(!is_public_route("/api/cart"));
        assert!(!is_public_route("/api/useradmin/registerAdmin"));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", SessionContext::in_memory()),
            Err(Error::Url(_))
        ));
    }

    #[test]
    fn joins_paths_onto_base() {
        let client = ApiClient::new("http://localhost:8080/", SessionContext::in_memory()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.url("/api/cart/items/4").unwrap().as_str(),
            "http://localhost:8080/api/cart/items/4"
        );
    }
}
