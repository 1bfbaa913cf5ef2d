use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// The URL points to a private/internal IP address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// The URL points to localhost.
    #[error("Localhost not allowed")]
    Localhost,
}

/// Validates the base URL of the news backend.
///
/// Only `http` and `https` are accepted and a host is required. Local and
/// private addresses are allowed since the backend commonly runs on the same
/// machine or LAN during development.
///
/// The returned URL always ends in `/` so that joining path segments never
/// drops the last component of a prefixed deployment (`https://host/news/`).
///
/// # Examples
///
/// ```
/// use tnews::util::validate_base_url;
///
/// let url = validate_base_url("http://127.0.0.1:8001").unwrap();
/// assert_eq!(url.as_str(), "http://127.0.0.1:8001/");
///
/// assert!(validate_base_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Validates a URL taken from an article before handing it to the system
/// browser.
///
/// Article URLs come from third-party feeds via the backend, so anything that
/// is not a public `http(s)` address is refused. This keeps `file://`,
/// `javascript:` and LAN targets away from `open::that`.
///
/// # Examples
///
/// ```
/// use tnews::util::validate_url_for_open;
///
/// let url = validate_url_for_open("https://example.com/story").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url_for_open("http://localhost/admin").is_err());
/// assert!(validate_url_for_open("http://192.168.1.1/").is_err());
/// assert!(validate_url_for_open("file:///etc/passwd").is_err());
/// ```
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let Some(host) = url.host_str() else {
        return Err(UrlValidationError::MissingHost);
    };

    if host.eq_ignore_ascii_case("localhost") {
        return Err(UrlValidationError::Localhost);
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    if let Ok(ip) = host_for_parse.parse::<IpAddr>() {
        if ip.is_loopback() {
            return Err(UrlValidationError::Localhost);
        }
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateIp(ip.to_string()));
        }
    }

    Ok(url)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = validate_base_url("https://tn.thinkingdbx.com").unwrap();
        assert_eq!(url.as_str(), "https://tn.thinkingdbx.com/");

        let url = validate_base_url("https://host.test/news").unwrap();
        assert_eq!(url.as_str(), "https://host.test/news/");
    }

    #[test]
    fn test_base_url_drops_query_and_fragment() {
        let url = validate_base_url("https://host.test/?x=1#top").unwrap();
        assert_eq!(url.as_str(), "https://host.test/");
    }

    #[test]
    fn test_base_url_allows_local_backend() {
        assert!(validate_base_url("http://localhost:8001").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8001").is_ok());
        assert!(validate_base_url("http://192.168.1.20:8001").is_ok());
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        assert!(matches!(
            validate_base_url("ftp://example.com"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_open_accepts_public_urls() {
        assert!(validate_url_for_open("https://example.com/story").is_ok());
        assert!(validate_url_for_open("http://news.example.org").is_ok());
        assert!(validate_url_for_open("https://example.com:443/a").is_ok());
    }

    #[test]
    fn test_open_rejects_dangerous_schemes() {
        assert!(validate_url_for_open("file:///etc/passwd").is_err());
        assert!(validate_url_for_open("javascript:alert(1)").is_err());
        assert!(validate_url_for_open("ftp://example.com").is_err());
    }

    #[test]
    fn test_open_rejects_localhost() {
        assert!(validate_url_for_open("http://localhost/feed").is_err());
        assert!(validate_url_for_open("http://LOCALHOST/feed").is_err());
        assert!(validate_url_for_open("http://127.0.0.1/feed").is_err());
        assert!(validate_url_for_open("http://[::1]/feed").is_err());
    }

    #[test]
    fn test_open_rejects_private_ranges() {
        assert!(validate_url_for_open("http://192.168.1.1/").is_err());
        assert!(validate_url_for_open("http://10.0.0.1:3000/").is_err());
        assert!(validate_url_for_open("http://172.16.0.1/").is_err());
        assert!(validate_url_for_open("http://169.254.1.1/").is_err());
        assert!(validate_url_for_open("http://[fe80::1]/").is_err());
        assert!(validate_url_for_open("http://0.0.0.0/").is_err());
    }
}
