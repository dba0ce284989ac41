//! URL safety gate (spec §4.3.1, testable property §8.1): reject
//! non-HTTP(S) schemes and any host that resolves to `localhost`, `*.local`,
//! or a private/link-local/loopback address before a network request is
//! ever issued. Grounded directly on `rootsignal-api::rest::submit`'s SSRF
//! guard (`is_private_ip` + the `localhost`/`.local` hostname check).

use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSafetyError {
    UnsupportedScheme(String),
    InternalHost(String),
    PrivateAddress(String),
    Unparseable,
}

impl std::fmt::Display for UrlSafetyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlSafetyError::UnsupportedScheme(s) => write!(f, "unsupported scheme: {s}"),
            UrlSafetyError::InternalHost(h) => write!(f, "internal host blocked: {h}"),
            UrlSafetyError::PrivateAddress(h) => write!(f, "private address blocked: {h}"),
            UrlSafetyError::Unparseable => write!(f, "unparseable URL"),
        }
    }
}

/// RFC 1918 / RFC 4193 + link-local private-range check, matching the
/// teacher's `is_private_ip`.
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_link_local()
                || v4.octets()[0] == 10
                || (v4.octets()[0] == 172 && (16..=31).contains(&v4.octets()[1]))
                || (v4.octets()[0] == 192 && v4.octets()[1] == 168)
                || (v4.octets()[0] == 169 && v4.octets()[1] == 254)
        }
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

/// Reject a candidate URL before any network request (spec §4.3.1).
pub fn check_url_safety(raw_url: &str) -> Result<url::Url, UrlSafetyError> {
    let parsed = url::Url::parse(raw_url).map_err(|_| UrlSafetyError::Unparseable)?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlSafetyError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    let Some(host) = parsed.host_str() else {
        return Err(UrlSafetyError::Unparseable);
    };

    if let Ok(ip) = host.parse::<IpAddr>() {
        if ip.is_loopback() || is_private_ip(ip) {
            return Err(UrlSafetyError::PrivateAddress(host.to_string()));
        }
    }

    let lower = host.to_lowercase();
    if lower == "localhost" || lower.ends_with(".local") {
        return Err(UrlSafetyError::InternalHost(host.to_string()));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_scheme() {
        assert_eq!(
            check_url_safety("ftp://example.com/file"),
            Err(UrlSafetyError::UnsupportedScheme("ftp".to_string()))
        );
    }

    #[test]
    fn rejects_localhost() {
        assert!(matches!(check_url_safety("http://localhost/x"), Err(UrlSafetyError::InternalHost(_))));
    }

    #[test]
    fn rejects_dot_local_host() {
        assert!(matches!(check_url_safety("http://printer.local/x"), Err(UrlSafetyError::InternalHost(_))));
    }

    #[test]
    fn rejects_loopback_ipv4() {
        assert!(matches!(check_url_safety("http://127.0.0.1/x"), Err(UrlSafetyError::PrivateAddress(_))));
    }

    #[test]
    fn rejects_rfc1918_ipv4() {
        assert!(matches!(check_url_safety("http://10.0.0.5/x"), Err(UrlSafetyError::PrivateAddress(_))));
        assert!(matches!(check_url_safety("http://172.16.0.1/x"), Err(UrlSafetyError::PrivateAddress(_))));
        assert!(matches!(check_url_safety("http://192.168.1.1/x"), Err(UrlSafetyError::PrivateAddress(_))));
    }

    #[test]
    fn rejects_link_local_ipv4() {
        assert!(matches!(check_url_safety("http://169.254.169.254/x"), Err(UrlSafetyError::PrivateAddress(_))));
    }

    #[test]
    fn rejects_loopback_ipv6() {
        assert!(matches!(check_url_safety("http://[::1]/x"), Err(UrlSafetyError::PrivateAddress(_))));
    }

    #[test]
    fn accepts_public_https_url() {
        assert!(check_url_safety("https://example.com/article").is_ok());
    }
}
