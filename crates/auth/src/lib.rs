//! Session tracking and forced password reset bookkeeping.
//!
//! Build a [`Safety`] once at startup and call its [`Signals`] from the
//! login and logout paths of the host application.

pub mod admin;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod password_reset;
pub mod receivers;
pub mod request;
pub mod resolvers;
pub mod session;
pub mod signals;

pub use admin::{SessionAdmin, SessionRow};
pub use bootstrap::{Safety, SafetyBuilder};
pub use config::{DeviceResolverKind, IpResolverKind, LocationResolverKind, SafetyConfig};
pub use error::{Result, SafetyError};
pub use password_reset::PasswordResetManager;
pub use receivers::{
    CheckPasswordOnLogin, CreateSessionOnLogin, DeleteSessionOnLogout, PurgeSessionStore,
};
pub use request::{RequestContext, RequestSession};
pub use resolvers::{Resolver, Resolvers};
pub use session::SessionManager;
pub use signals::{LoginObserver, LogoutObserver, SessionDeletedObserver, Signals};
