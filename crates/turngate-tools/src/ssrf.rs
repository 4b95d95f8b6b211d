//! SSRF policy (§6): applied to any outbound HTTP a tool initiates on the
//! user's behalf. Rejects non-http(s) schemes, dangerous hostnames, direct
//! private/loopback IPs, and hostnames that resolve to a private or
//! AWS-metadata address.

use std::net::IpAddr;

use url::Host;

const AWS_METADATA_IP: &str = "169.254.169.254";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SsrfViolation {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("dangerous hostname: {0}")]
    DangerousHostname(String),
    #[error("resolves to a private or loopback address: {0}")]
    PrivateAddress(String),
}

const DANGEROUS_HOSTNAMES: &[&str] = &["localhost", "metadata.google.internal", "169.254.169.254"];

/// Validate a URL's scheme and hostname *before* attempting DNS resolution.
pub fn check_url(raw_url: &str) -> Result<url::Url, SsrfViolation> {
    let parsed = url::Url::parse(raw_url)
        .map_err(|_| SsrfViolation::UnsupportedScheme(raw_url.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(SsrfViolation::UnsupportedScheme(parsed.scheme().to_string()));
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => {
            if DANGEROUS_HOSTNAMES.contains(&domain) {
                return Err(SsrfViolation::DangerousHostname(domain.to_string()));
            }
        }
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip))?,
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip))?,
        None => return Err(SsrfViolation::UnsupportedScheme("no host".to_string())),
    }

    Ok(parsed)
}

fn check_ip(ip: IpAddr) -> Result<(), SsrfViolation> {
    if is_blocked_ip(ip) {
        return Err(SsrfViolation::PrivateAddress(ip.to_string()));
    }
    Ok(())
}

fn is_blocked_ip(ip: IpAddr) -> bool {
    if ip.to_string() == AWS_METADATA_IP {
        return true;
    }
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

/// Resolve the host and reject if ANY resolved address is private/loopback
/// or the AWS metadata address (§6) — a client-side scheme/hostname check
/// alone is not enough, since a public hostname can still resolve privately.
pub async fn check_resolved(url: &url::Url) -> Result<(), SsrfViolation> {
    let host = url.host_str().unwrap_or_default();
    let port = url.port_or_known_default().unwrap_or(443);
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| SsrfViolation::DangerousHostname(host.to_string()))?;

    for addr in addrs {
        if is_blocked_ip(addr.ip()) {
            return Err(SsrfViolation::PrivateAddress(addr.ip().to_string()));
        }
    }
    Ok(())
}
