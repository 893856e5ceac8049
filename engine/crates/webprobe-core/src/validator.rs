//! Target URL validation
//!
//! Every scan starts here. A URL is accepted only when it is an absolute
//! `http`/`https` URL whose host is neither a blocked name nor a
//! non-public IP literal. No DNS lookups are performed.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use url::{Host, ParseError, Url};

use crate::target::Target;

/// Host substrings that are always rejected
const BLOCKED_LITERALS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0"];

/// Host suffix reserved for multicast DNS
const BLOCKED_SUFFIX: &str = ".local";

/// Why a URL was refused as a scan target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("URL is required")]
    Empty,

    #[error("Invalid URL format: {0}")]
    Malformed(String),

    #[error("Only HTTP and HTTPS URLs are supported (got {0})")]
    UnsupportedScheme(String),

    #[error("URL must include a host")]
    MissingHost,

    #[error("Scanning {0} is not allowed")]
    BlockedHost(String),

    #[error("Scanning private or internal address {0} is not allowed")]
    PrivateAddress(IpAddr),
}

impl RejectionReason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::Empty => "EMPTY_URL",
            RejectionReason::Malformed(_) => "MALFORMED_URL",
            RejectionReason::UnsupportedScheme(_) => "UNSUPPORTED_SCHEME",
            RejectionReason::MissingHost => "MISSING_HOST",
            RejectionReason::BlockedHost(_) => "BLOCKED_HOST",
            RejectionReason::PrivateAddress(_) => "PRIVATE_ADDRESS",
        }
    }
}

/// Validates user-supplied scan targets
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlValidator;

impl UrlValidator {
    /// Validate `input` and turn it into a [`Target`].
    ///
    /// Rules apply in order and the first failure is returned: non-empty,
    /// well-formed with an http(s) scheme and a host, host free of blocked
    /// names, and host not a private, loopback, link-local or unspecified
    /// IP literal.
    pub fn validate(input: &str) -> Result<Target, RejectionReason> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RejectionReason::Empty);
        }

        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(ParseError::EmptyHost) => return Err(RejectionReason::MissingHost),
            Err(e) => return Err(RejectionReason::Malformed(e.to_string())),
        };

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(RejectionReason::UnsupportedScheme(other.to_string())),
        }

        let host = match url.host() {
            Some(host) => host,
            None => return Err(RejectionReason::MissingHost),
        };

        let host_str = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if host_str.is_empty() {
            return Err(RejectionReason::MissingHost);
        }
        let bare = host_str.trim_end_matches('.');
        if BLOCKED_LITERALS.iter().any(|lit| bare.contains(lit)) || bare.ends_with(BLOCKED_SUFFIX)
        {
            return Err(RejectionReason::BlockedHost(host_str));
        }

        let ip = match host {
            Host::Ipv4(v4) => Some(IpAddr::V4(v4)),
            Host::Ipv6(v6) => Some(IpAddr::V6(v6)),
            Host::Domain(_) => None,
        };
        if let Some(ip) = ip {
            if !is_public_ip(ip) {
                return Err(RejectionReason::PrivateAddress(ip));
            }
        }

        Ok(Target::new(url))
    }

    /// Convenience predicate over [`UrlValidator::validate`]
    pub fn is_allowed(input: &str) -> bool {
        Self::validate(input).is_ok()
    }
}

/// Whether an address is routable on the public internet.
///
/// IPv4-mapped IPv6 addresses are judged by their embedded IPv4 address.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(v4),
            None => is_public_v6(v6),
        },
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast())
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = first & 0xfe00 == 0xfc00;
    let link_local = first & 0xffc0 == 0xfe80;
    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}
