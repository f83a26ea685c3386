use crate::error::{Result, SafetyError};
use serde::Deserialize;

/// Which resolver derives the session IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpResolverKind {
    /// Peer address of the connection
    #[default]
    RemoteAddr,
    /// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address
    ForwardedFor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceResolverKind {
    /// "Browser on OS" parsed from the User-Agent header
    #[default]
    UserAgent,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationResolverKind {
    #[default]
    Unknown,
    /// Read from the header named by `location_header`
    Header,
}

/// Resolver selection, read from `SAFETY_*` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub ip_resolver: IpResolverKind,
    pub device_resolver: DeviceResolverKind,
    pub location_resolver: LocationResolverKind,
    pub location_header: Option<String>,
}

impl SafetyConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("SAFETY"))
    }

    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.location_resolver == LocationResolverKind::Header
            && self.location_header.as_deref().map_or(true, str::is_empty)
        {
            return Err(SafetyError::ConfigurationError(
                "location_resolver = header requires location_header".to_string(),
            ));
        }
        Ok(())
    }
}
