use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use storefront_core::{AuthResponse, User};

use crate::error::{Error, Result};

pub mod fs;

/// An authenticated session as persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
    pub saved_at: Timestamp,
}

impl Session {
    /// Build a session from a sign-in response.
    ///
    /// Both tokens and the user object must be present.
    pub fn from_auth(response: AuthResponse) -> Result<Self> {
        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidResponse("missing access token".into()))?;
        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidResponse("missing refresh token".into()))?;
        let user = response
            .user
            .ok_or_else(|| Error::InvalidResponse("missing user".into()))?;

        Ok(Self {
            access_token,
            refresh_token,
            user,
            saved_at: Timestamp::now(),
        })
    }
}

/// Persistent storage for the session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the stored session, if any
    async fn load(&self) -> Result<Option<Session>>;

    /// Replace the stored session
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove everything stored
    async fn clear(&self) -> Result<()>;
}

/// Keeps the session in memory only; nothing survives the process.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self.session.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.lock().await = None;
        Ok(())
    }
}

/// The caller's session, shared by the API client and the stores.
///
/// Cheap to clone; all clones see the same state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

struct Inner {
    current: RwLock<Option<Session>>,
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(None),
                store,
            }),
        }
    }

    /// A context backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// Restore the persisted session.
    ///
    /// Unreadable data is cleared and treated as no session.
    pub async fn init(&self) -> Result<Option<User>> {
        let loaded = match self.inner.store.load().await {
            Ok(session) => session,
            Err(Error::Json(e)) => {
                warn!("Discarding unreadable session data: {}", e);
                self.inner.store.clear().await?;
                None
            }
            Err(e) => return Err(e),
        };

        let user = loaded.as_ref().map(|s| s.user.clone());
        *self.inner.current.write().await = loaded;
        Ok(user)
    }

    /// Start a session and persist it
    pub async fn begin(&self, session: Session) -> Result<()> {
        self.inner.store.save(&session).await?;
        info!("Signed in as {}", session.user.email);
        *self.inner.current.write().await = Some(session);
        Ok(())
    }

    /// Drop the session from memory and from the persistent store
    pub async fn teardown(&self) -> Result<()> {
        let previous = self.inner.current.write().await.take();
        if let Some(session) = previous {
            info!("Session ended for {}", session.user.email);
        }
        self.inner.store.clear().await
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .current
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.inner
            .current
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.current.read().await.is_some()
    }

    pub async fn is_admin(&self) -> bool {
        self.inner
            .current
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.user.is_admin())
    }
}
