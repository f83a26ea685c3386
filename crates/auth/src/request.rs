use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// The host's session attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSession {
    pub key: String,
    pub expiry_date: DateTime<Utc>,
}

/// What this crate gets to see of an incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub headers: HeaderMap,
    pub remote_addr: Option<IpAddr>,
    pub session: Option<RequestSession>,
}

impl RequestContext {
    pub fn new(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Default::default()
        }
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_session(mut self, key: impl Into<String>, expiry_date: DateTime<Utc>) -> Self {
        self.session = Some(RequestSession {
            key: key.into(),
            expiry_date,
        });
        self
    }

    /// Header value as a string; missing or non-UTF-8 values give `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
    }

    pub fn session_key(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.key.as_str())
    }
}
