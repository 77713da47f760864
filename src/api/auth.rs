use reqwest::multipart::Form;
use reqwest::Method;
use tracing::info;

use storefront_core::{AuthResponse, LoginRequest, Registration, ResetPasswordRequest, User};

use crate::api::Upload;
use crate::client::{ApiClient, NO_QUERY};
use crate::error::Result;
use crate::session::Session;

impl ApiClient {
    /// POST /api/auth/authenticate
    ///
    /// A response without both tokens and the user is rejected as invalid;
    /// on success the session is started and persisted.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .send_json(Method::POST, "/api/auth/authenticate", &request)
            .await?;

        let session = Session::from_auth(response)?;
        let user = session.user.clone();
        self.session().begin(session).await?;
        Ok(user)
    }

    /// Local sign-out: drops every persisted session value
    pub async fn logout(&self) -> Result<()> {
        self.session().teardown().await
    }

    /// POST /api/auth/register (multipart)
    pub async fn register(&self, registration: &Registration, profile_image: Option<Upload>) -> Result<User> {
        let form = registration_form(registration, profile_image)?;
        let user: User = self
            .send_multipart(Method::POST, "/api/auth/register", form)
            .await?;
        info!("Registered {}", user.email);
        Ok(user)
    }

    /// POST /api/auth/forgot-password?email=
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>> {
        self.send_for_message(
            Method::POST,
            "/api/auth/forgot-password",
            &[("email", email)],
            None::<&()>,
        )
        .await
    }

    /// POST /api/auth/reset-password
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Option<String>> {
        let body = ResetPasswordRequest {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        self.send_for_message(Method::POST, "/api/auth/reset-password", NO_QUERY, Some(&body))
            .await
    }

    /// GET /api/auth/confirm-email?token=
    pub async fn confirm_email(&self, token: &str) -> Result<Option<String>> {
        self.send_for_message(
            Method::GET,
            "/api/auth/confirm-email",
            &[("token", token)],
            None::<&()>,
        )
        .await
    }
}

/// Text fields of a registration, shared with the admin variant.
pub(crate) fn registration_form(registration: &Registration, profile_image: Option<Upload>) -> Result<Form> {
    let mut form = Form::new()
        .text("fullName", registration.full_name.clone())
        .text("email", registration.email.clone())
        .text("password", registration.password.clone())
        .text("role", registration.role.as_str())
        .text("isActive", registration.is_active.to_string())
        .text("isNotLocked", registration.is_not_locked.to_string())
        .text("isChangePassword", registration.is_change_password.to_string());

    if let Some(image) = profile_image {
        form = form.part("profileImage", image.into_part()?);
    }
    Ok(form)
}
