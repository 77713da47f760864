//! Core types for the storefront API.
//!
//! This crate provides the wire types shared by the storefront client
//! library and anything else that talks to the catalog, cart and admin
//! endpoints. Field names follow the backend's camelCase JSON.
//!
//! # Overview
//!
//! The main types are:
//!
//! - [`Page`] - The page envelope returned by every search endpoint
//! - [`SearchQuery`] - Term, page, size and sort for a search request
//! - [`Cart`] / [`CartItem`] - The authenticated user's cart
//! - [`Product`] - A catalog entry
//! - [`User`] / [`Company`] - Admin-side records
//! - [`AuthResponse`] - Tokens and profile returned by sign-in
//!
//! # Example
//!
//! Fetching a page of products:
//!
//! ```ignore
//! use storefront_core::{Page, Product};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = reqwest::Client::new();
//!
//! let page: Page<Product> = client
//!     .get("http://localhost:8080/api/products/search?term=lamp&page=0&size=12&sort=name")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//!
//! for product in &page.content {
//!     println!("{} ({} in stock)", product.name, product.stock_quantity);
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

/// A page envelope.
///
/// Every search endpoint returns a slice of results plus pagination
/// metadata. The counts are owned by the server: clients display them as
/// received and never recompute them.
///
/// # Example
///
/// ```
/// use storefront_core::Page;
///
/// let page: Page<u32> = serde_json::from_str(
///     r#"{"content":[1,2],"totalElements":14,"totalPages":2,"number":1,"size":12}"#,
/// ).unwrap();
///
/// assert_eq!(page.total_elements, 14);
/// assert_eq!(page.total_pages, 2);
/// assert_eq!(page.content.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items in this page.
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Total number of items across all pages.
    #[serde(default)]
    pub total_elements: u64,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Current page number (0-indexed).
    #[serde(default)]
    pub number: u32,
    /// Requested page size.
    #[serde(default)]
    pub size: u32,
    /// Number of items actually in `content`.
    #[serde(default)]
    pub number_of_elements: u32,
    /// Whether this is the first page.
    #[serde(default)]
    pub first: bool,
    /// Whether this is the last page.
    #[serde(default)]
    pub last: bool,
    /// Whether the page has no content.
    #[serde(default)]
    pub empty: bool,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            number: 0,
            size: 0,
            number_of_elements: 0,
            first: true,
            last: true,
            empty: true,
        }
    }
}

impl<T> Page<T> {
    /// Builds an envelope the way the backend does.
    ///
    /// Meant for producing responses (mock backends, fixtures); clients
    /// should take envelopes from the server as-is.
    ///
    /// ```
    /// use storefront_core::Page;
    ///
    /// let page = Page::new(vec!["a", "b"], 26, 2, 12);
    /// assert_eq!(page.total_pages, 3);
    /// assert!(page.last);
    /// assert!(!page.first);
    /// ```
    pub fn new(content: Vec<T>, total_elements: u64, number: u32, size: u32) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size as u64) as u32
        };
        let number_of_elements = content.len() as u32;
        Self {
            empty: content.is_empty(),
            content,
            total_elements,
            total_pages,
            number,
            size,
            number_of_elements,
            first: number == 0,
            last: number.saturating_add(1) >= total_pages,
        }
    }
}

/// Sort direction for search endpoints that accept one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// The opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Parameters for a paginated search.
///
/// # Example
///
/// ```
/// use storefront_core::SearchQuery;
///
/// let query = SearchQuery::new(12, "name").with_page(3).with_term("lamp");
///
/// // A new term always starts from the first page.
/// assert_eq!(query.page, 0);
/// assert_eq!(query.term, "lamp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text term. Empty matches everything.
    #[serde(default)]
    pub term: String,
    /// Page index (0-indexed).
    #[serde(default)]
    pub page: u32,
    /// Items per page.
    pub size: u32,
    /// Sort key understood by the endpoint (e.g. `"name"`, `"fullName"`).
    pub sort: String,
    /// Sort direction, for endpoints that take one.
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

impl SearchQuery {
    pub fn new(size: u32, sort: impl Into<String>) -> Self {
        Self {
            term: String::new(),
            page: 0,
            size,
            sort: sort.into(),
            direction: None,
        }
    }

    /// Replaces the term and resets to the first page.
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self.page = 0;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// A line item in the cart.
///
/// Prices and subtotals are the server's figures; `subtotal` is
/// `price_at_addition * quantity` as computed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Cart line identifier, used for update and remove.
    pub cart_item_id: u64,
    /// Product this line refers to.
    pub product_id: u64,
    /// Product name at the time the cart was read.
    pub product_name: String,
    #[serde(default)]
    pub product_description: String,
    #[serde(default)]
    pub product_image_url: Option<String>,
    /// Quantity in the cart.
    pub quantity: u32,
    /// Unit price captured when the product was added.
    pub price_at_addition: f64,
    /// Line total.
    pub subtotal: f64,
    /// Stock ceiling: the most that can be purchased.
    pub max_stock: u32,
}

impl CartItem {
    /// Bounds a requested quantity into `[1, max_stock]`.
    ///
    /// This is a UI convenience; the server remains the authority on what
    /// it accepts.
    ///
    /// ```
    /// # use storefront_core::CartItem;
    /// # let item = CartItem {
    /// #     cart_item_id: 1, product_id: 7, product_name: "Lamp".into(),
    /// #     product_description: String::new(), product_image_url: None,
    /// #     quantity: 2, price_at_addition: 10.0, subtotal: 20.0, max_stock: 5,
    /// # };
    /// assert_eq!(item.clamp_quantity(0), 1);
    /// assert_eq!(item.clamp_quantity(9), 5);
    /// assert_eq!(item.clamp_quantity(3), 3);
    /// ```
    pub fn clamp_quantity(&self, quantity: u32) -> u32 {
        quantity.clamp(1, self.max_stock.max(1))
    }

    pub fn can_increment(&self) -> bool {
        self.quantity < self.max_stock
    }

    pub fn can_decrement(&self) -> bool {
        self.quantity > 1
    }
}

/// The authenticated user's cart, as returned by every cart mutation
/// except clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub cart_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub user_email: Option<String>,
    /// Items in server order.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Sum of item quantities.
    #[serde(default)]
    pub total_items: u32,
    /// Sum of item subtotals.
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body for `POST /api/cart/add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: u64,
    pub quantity: u32,
}

/// Body for `PUT /api/cart/items/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    /// Image URLs, first one is the cover.
    #[serde(default)]
    pub images: Vec<String>,
    pub price: f64,
    /// Units available; the stock ceiling for cart quantities.
    pub stock_quantity: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Fields for creating or updating a product. Images travel separately as
/// multipart file parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock_quantity: u32,
    pub is_active: bool,
}

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

/// Company reference embedded in a user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRef {
    pub id: u64,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub nif: String,
}

/// A user account.
///
/// The backend reports `isActive`/`isNotLocked` either as booleans or as
/// `0`/`1`; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    /// Role name as sent by the server (`"ADMIN"`, `"USER"`).
    pub role: String,
    #[serde(default = "default_true", deserialize_with = "flag::deserialize")]
    pub is_active: bool,
    #[serde(default = "default_true", deserialize_with = "flag::deserialize")]
    pub is_not_locked: bool,
    #[serde(default)]
    pub is_change_password: bool,
    #[serde(default)]
    pub join_date: Option<String>,
    #[serde(default)]
    pub last_login_date: Option<String>,
    #[serde(default)]
    pub company: Option<CompanyRef>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(Role::Admin.as_str())
    }
}

/// Fields for a new account. The optional profile image travels as a
/// multipart file part.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub is_not_locked: bool,
    pub is_change_password: bool,
}

/// Partial update of a user; unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_not_locked: Option<bool>,
    pub is_change_password: Option<bool>,
}

/// A company record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: u64,
    pub company_name: String,
    #[serde(default)]
    pub trade_name: Option<String>,
    pub nif: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Present on the `/stats` variant only.
    #[serde(default)]
    pub total_products: Option<u64>,
    #[serde(default)]
    pub active_products: Option<u64>,
    #[serde(default)]
    pub total_administrators: Option<u64>,
}

/// Body for creating or updating a company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRequest {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    pub nif: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Body for `POST /api/auth/authenticate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Sign-in response.
///
/// Every field is optional on the wire: a response missing either token or
/// the user object is invalid, and it is up to the caller to reject it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Body for `POST /api/auth/reset-password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Generic `{ "message": ... }` body used by the auth flows and by error
/// responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MessageResponse {
    /// The most specific message present.
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

fn default_true() -> bool {
    true
}

mod flag {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
    }
}
