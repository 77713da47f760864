use reqwest::StatusCode;

/// Errors surfaced by the storefront client and stores.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced an HTTP response (connection, DNS, TLS,
    /// timeout) or the body could not be read.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server refused the request with a structured message
    /// (validation failure or business rule, e.g. insufficient stock).
    #[error("Rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// 401/403. On protected routes the session has already been torn down
    /// by the time the caller sees this.
    #[error("Unauthorized ({status})")]
    Unauthorized { status: StatusCode, message: Option<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    /// 5xx or any other unexpected status.
    #[error("Server error ({status}): {message}")]
    Server { status: StatusCode, message: String },

    /// The server answered successfully but with a body we cannot use.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Caught locally before any request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Maps a non-success status and its (already parsed) message.
    pub fn from_status(status: StatusCode, message: Option<String>, path: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized { status, message },
            StatusCode::NOT_FOUND => Error::NotFound(message.unwrap_or_else(|| path.to_string())),
            s if s.is_client_error() => Error::Rejected {
                status,
                message: message.unwrap_or_else(|| s.canonical_reason().unwrap_or("Bad request").to_string()),
            },
            s => Error::Server {
                status,
                message: message.unwrap_or_else(|| s.canonical_reason().unwrap_or("Server error").to_string()),
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// Text suitable for showing to the user.
    ///
    /// Server-reported messages are passed through verbatim; transport and
    /// internal failures collapse to a generic line.
    pub fn user_message(&self) -> String {
        match self {
            Error::Rejected { message, .. } | Error::Server { message, .. } => message.clone(),
            Error::Unauthorized { message: Some(m), .. } => m.clone(),
            Error::Unauthorized { .. } => "Your session has expired, please sign in again".to_string(),
            Error::NotFound(_) => "Not found".to_string(),
            Error::InvalidInput(m) => m.clone(),
            Error::Transport(_) => "Could not reach the server".to_string(),
            Error::InvalidResponse(_) => "Invalid server response".to_string(),
            Error::Url(_) | Error::Io(_) | Error::Json(_) | Error::Config(_) => "Something went wrong".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
