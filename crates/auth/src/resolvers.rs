//! Resolvers derive session metadata (IP, device, location) from a request.
//!
//! Any `Fn(&RequestContext) -> String` is a resolver, so hosts can plug in
//! their own lookups (GeoIP and the like) next to the built-ins below.

use crate::config::{DeviceResolverKind, IpResolverKind, LocationResolverKind, SafetyConfig};
use crate::error::{Result, SafetyError};
use crate::request::RequestContext;
use regex::Regex;
use safety_models::{truncate_chars, LOCATION_MAX_LENGTH};
use std::net::IpAddr;
use std::sync::Arc;

pub const UNKNOWN: &str = "Unknown";

pub trait Resolver: Send + Sync {
    fn resolve(&self, request: &RequestContext) -> String;
}

impl<F> Resolver for F
where
    F: Fn(&RequestContext) -> String + Send + Sync,
{
    fn resolve(&self, request: &RequestContext) -> String {
        self(request)
    }
}

pub struct RemoteAddrIp;

impl Resolver for RemoteAddrIp {
    fn resolve(&self, request: &RequestContext) -> String {
        request
            .remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }
}

/// Client address from proxy headers. Values that are not IP addresses are
/// skipped, ending with the peer address.
pub struct ForwardedForIp;

impl Resolver for ForwardedForIp {
    fn resolve(&self, request: &RequestContext) -> String {
        let forwarded = request
            .header("x-forwarded-for")
            .and_then(|v| v.split(',').next());
        let real_ip = request.header("x-real-ip");

        [forwarded, real_ip]
            .into_iter()
            .flatten()
            .find_map(|candidate| candidate.trim().parse::<IpAddr>().ok())
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| RemoteAddrIp.resolve(request))
    }
}

pub struct UserAgentDevice;

impl Resolver for UserAgentDevice {
    fn resolve(&self, request: &RequestContext) -> String {
        match request.user_agent() {
            Some(ua) if !ua.trim().is_empty() => describe_user_agent(ua),
            _ => UNKNOWN.to_string(),
        }
    }
}

pub struct NoDevice;

impl Resolver for NoDevice {
    fn resolve(&self, _request: &RequestContext) -> String {
        String::new()
    }
}

pub struct UnknownLocation;

impl Resolver for UnknownLocation {
    fn resolve(&self, _request: &RequestContext) -> String {
        UNKNOWN.to_string()
    }
}

/// Location taken verbatim from a header set by a proxy or CDN.
pub struct HeaderLocation {
    header: String,
}

impl HeaderLocation {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_lowercase(),
        }
    }
}

impl Resolver for HeaderLocation {
    fn resolve(&self, request: &RequestContext) -> String {
        request
            .header(&self.header)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| truncate_chars(v, LOCATION_MAX_LENGTH))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// The three resolvers used when a session is recorded.
#[derive(Clone)]
pub struct Resolvers {
    pub ip: Arc<dyn Resolver>,
    pub device: Arc<dyn Resolver>,
    pub location: Arc<dyn Resolver>,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self {
            ip: Arc::new(RemoteAddrIp),
            device: Arc::new(UserAgentDevice),
            location: Arc::new(UnknownLocation),
        }
    }
}

impl Resolvers {
    pub fn from_config(config: &SafetyConfig) -> Result<Self> {
        let ip: Arc<dyn Resolver> = match config.ip_resolver {
            IpResolverKind::RemoteAddr => Arc::new(RemoteAddrIp),
            IpResolverKind::ForwardedFor => Arc::new(ForwardedForIp),
        };

        let device: Arc<dyn Resolver> = match config.device_resolver {
            DeviceResolverKind::UserAgent => Arc::new(UserAgentDevice),
            DeviceResolverKind::None => Arc::new(NoDevice),
        };

        let location: Arc<dyn Resolver> = match config.location_resolver {
            LocationResolverKind::Unknown => Arc::new(UnknownLocation),
            LocationResolverKind::Header => {
                let header = config.location_header.clone().ok_or_else(|| {
                    SafetyError::ConfigurationError("location_header is not set".to_string())
                })?;
                Arc::new(HeaderLocation::new(header))
            }
        };

        Ok(Self { ip, device, location })
    }

    pub fn with_ip(mut self, resolver: impl Resolver + 'static) -> Self {
        self.ip = Arc::new(resolver);
        self
    }

    pub fn with_device(mut self, resolver: impl Resolver + 'static) -> Self {
        self.device = Arc::new(resolver);
        self
    }

    pub fn with_location(mut self, resolver: impl Resolver + 'static) -> Self {
        self.location = Arc::new(resolver);
        self
    }
}

lazy_static::lazy_static! {
    static ref VERSION_TOKEN: Regex = Regex::new(r"([A-Za-z]+)/(\d+)").unwrap();
}

/// "Browser[ major] on OS" for a User-Agent string.
pub fn describe_user_agent(ua: &str) -> String {
    let ua_lower = ua.to_lowercase();
    let (browser, tokens) = detect_browser(&ua_lower);
    let os = detect_os(&ua_lower);

    let version = VERSION_TOKEN
        .captures_iter(ua)
        .find(|c| tokens.contains(&c[1].to_lowercase().as_str()))
        .map(|c| c[2].to_string());

    match version {
        Some(major) => format!("{} {} on {}", browser, major, os),
        None => format!("{} on {}", browser, os),
    }
}

// Order matters: Edge and Opera also advertise Chrome, Chrome advertises Safari.
fn detect_browser(ua_lower: &str) -> (&'static str, &'static [&'static str]) {
    if ua_lower.contains("edg/") || ua_lower.contains("edge/") {
        ("Microsoft Edge", &["edg", "edge"])
    } else if ua_lower.contains("opr/") || ua_lower.contains("opera") {
        ("Opera", &["opr", "opera"])
    } else if ua_lower.contains("chrome/") || ua_lower.contains("crios/") {
        ("Chrome", &["chrome", "crios"])
    } else if ua_lower.contains("firefox/") || ua_lower.contains("fxios/") {
        ("Firefox", &["firefox", "fxios"])
    } else if ua_lower.contains("safari/") {
        ("Safari", &["version"])
    } else if ua_lower.contains("msie") || ua_lower.contains("trident") {
        ("Internet Explorer", &[])
    } else {
        ("Unknown Browser", &[])
    }
}

// iOS user agents contain "like Mac OS X" and Android ones contain "Linux".
fn detect_os(ua_lower: &str) -> &'static str {
    if ua_lower.contains("windows nt 10") {
        "Windows 10/11"
    } else if ua_lower.contains("windows") {
        "Windows"
    } else if ua_lower.contains("iphone") {
        "iOS (iPhone)"
    } else if ua_lower.contains("ipad") {
        "iOS (iPad)"
    } else if ua_lower.contains("mac os x") || ua_lower.contains("macos") {
        "macOS"
    } else if ua_lower.contains("android") {
        "Android"
    } else if ua_lower.contains("cros ") {
        "Chrome OS"
    } else if ua_lower.contains("linux") {
        "Linux"
    } else {
        "Unknown OS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";

    fn request_with(headers: &[(&'static str, &'static str)]) -> RequestContext {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        RequestContext::new(map)
    }

    #[test]
    fn test_describe_user_agent() {
        assert_eq!(describe_user_agent(CHROME_WINDOWS), "Chrome 120 on Windows 10/11");
        assert_eq!(describe_user_agent(FIREFOX_LINUX), "Firefox 121 on Linux");
        assert_eq!(describe_user_agent(SAFARI_IPHONE), "Safari 17 on iOS (iPhone)");
        assert_eq!(describe_user_agent(EDGE_WINDOWS), "Microsoft Edge 120 on Windows 10/11");
        assert_eq!(describe_user_agent("curl/8.4.0"), "Unknown Browser on Unknown OS");
    }

    #[test]
    fn test_user_agent_device() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(FIREFOX_LINUX));
        let request = RequestContext::new(headers);
        assert_eq!(UserAgentDevice.resolve(&request), "Firefox 121 on Linux");

        assert_eq!(UserAgentDevice.resolve(&RequestContext::default()), UNKNOWN);
    }

    #[test]
    fn test_remote_addr_ip() {
        let request = RequestContext::default().with_remote_addr("1.2.3.4".parse().unwrap());
        assert_eq!(RemoteAddrIp.resolve(&request), "1.2.3.4");
        assert_eq!(RemoteAddrIp.resolve(&RequestContext::default()), "");
    }

    #[test]
    fn test_forwarded_for_ip() {
        let request = request_with(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")])
            .with_remote_addr("10.0.0.1".parse().unwrap());
        assert_eq!(ForwardedForIp.resolve(&request), "203.0.113.7");

        let request = request_with(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(ForwardedForIp.resolve(&request), "198.51.100.2");

        let request = RequestContext::default().with_remote_addr("::1".parse().unwrap());
        assert_eq!(ForwardedForIp.resolve(&request), "::1");
    }

    #[test]
    fn test_forwarded_for_skips_non_addresses() {
        let long = "1".repeat(46);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(&long).unwrap());
        let request = RequestContext::new(headers).with_remote_addr("10.0.0.1".parse().unwrap());
        assert_eq!(ForwardedForIp.resolve(&request), "10.0.0.1");

        let request = request_with(&[("x-forwarded-for", "not-an-ip"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(ForwardedForIp.resolve(&request), "198.51.100.2");

        let request = request_with(&[("x-forwarded-for", "garbage"), ("x-real-ip", "also garbage")]);
        assert_eq!(ForwardedForIp.resolve(&request), "");
    }

    #[test]
    fn test_header_location() {
        let resolver = HeaderLocation::new("CF-IPCountry");
        assert_eq!(resolver.resolve(&request_with(&[("cf-ipcountry", "NL")])), "NL");
        assert_eq!(resolver.resolve(&RequestContext::default()), UNKNOWN);

        let mut headers = HeaderMap::new();
        headers.insert("cf-ipcountry", HeaderValue::from_str(&"x".repeat(300)).unwrap());
        let location = resolver.resolve(&RequestContext::new(headers));
        assert_eq!(location.chars().count(), LOCATION_MAX_LENGTH);
    }

    #[test]
    fn test_closure_resolver() {
        let resolvers = Resolvers::default().with_location(|_: &RequestContext| "Amsterdam, NL".to_string());
        assert_eq!(resolvers.location.resolve(&RequestContext::default()), "Amsterdam, NL");
    }

    #[test]
    fn test_from_config() {
        let config = SafetyConfig {
            ip_resolver: IpResolverKind::ForwardedFor,
            device_resolver: DeviceResolverKind::None,
            location_resolver: LocationResolverKind::Header,
            location_header: Some("cf-ipcountry".to_string()),
        };
        let resolvers = Resolvers::from_config(&config).unwrap();
        let request = request_with(&[
            ("x-forwarded-for", "203.0.113.7"),
            ("cf-ipcountry", "DE"),
            ("user-agent", "curl/8.4.0"),
        ]);

        assert_eq!(resolvers.ip.resolve(&request), "203.0.113.7");
        assert_eq!(resolvers.device.resolve(&request), "");
        assert_eq!(resolvers.location.resolve(&request), "DE");
    }
}
