//! Login, logout and session-deletion notifications.
//!
//! The host calls [`Signals::user_logged_in`] and [`Signals::user_logged_out`]
//! from its own authentication flow. Observers run one after another in the
//! order they were connected; the first error stops the dispatch and is
//! returned to the host.

use crate::error::Result;
use crate::request::RequestContext;
use safety_models::{AuthUser, Session};
use std::sync::Arc;

#[async_trait::async_trait]
pub trait LoginObserver: Send + Sync {
    async fn user_logged_in(&self, request: &RequestContext, user: &AuthUser) -> Result<()>;
}

#[async_trait::async_trait]
pub trait LogoutObserver: Send + Sync {
    /// `user` is `None` when the request was not authenticated.
    async fn user_logged_out(&self, request: &RequestContext, user: Option<&AuthUser>) -> Result<()>;
}

/// Notified when a session record is about to be deleted, whatever the cause.
///
/// The record is removed only after every observer succeeded.
#[async_trait::async_trait]
pub trait SessionDeletedObserver: Send + Sync {
    async fn session_deleted(&self, session: &Session) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct Signals {
    login: Vec<Arc<dyn LoginObserver>>,
    logout: Vec<Arc<dyn LogoutObserver>>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_login(&mut self, observer: Arc<dyn LoginObserver>) -> &mut Self {
        self.login.push(observer);
        self
    }

    pub fn connect_logout(&mut self, observer: Arc<dyn LogoutObserver>) -> &mut Self {
        self.logout.push(observer);
        self
    }

    pub async fn user_logged_in(&self, request: &RequestContext, user: &AuthUser) -> Result<()> {
        for observer in &self.login {
            observer.user_logged_in(request, user).await?;
        }
        Ok(())
    }

    pub async fn user_logged_out(&self, request: &RequestContext, user: Option<&AuthUser>) -> Result<()> {
        for observer in &self.logout {
            observer.user_logged_out(request, user).await?;
        }
        Ok(())
    }
}
