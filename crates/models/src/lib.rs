pub mod password_reset;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use password_reset::PasswordReset;
pub use session::{
    truncate_chars, truncate_user_agent, NewSession, Session, SessionFilter,
    DEVICE_MAX_LENGTH, IP_MAX_LENGTH, LOCATION_MAX_LENGTH,
    SESSION_KEY_MAX_LENGTH, USER_AGENT_MAX_LENGTH,
};
pub use user::AuthUser;
