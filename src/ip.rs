//! Client address extraction from proxy headers.
//!
//! Identifiers for IP-keyed throttling come from the forwarding headers set
//! by upstream proxies and CDNs. Header names are matched case-insensitively.

use std::collections::HashMap;

/// Returned when no forwarding header carries a usable address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Single-value headers consulted after `x-forwarded-for`, in order.
const FALLBACK_HEADERS: [&str; 2] = ["cf-connecting-ip", "x-real-ip"];

/// Extract the client IP from request headers.
///
/// Checks `x-forwarded-for` (first comma-separated entry, trimmed of
/// whitespace), then `cf-connecting-ip`, then `x-real-ip`. A header whose
/// value trims to empty does not count as a hit. Returns
/// [`UNKNOWN_CLIENT`] when nothing usable is present.
pub fn client_ip(headers: &HashMap<String, String>) -> &str {
    if let Some(forwarded) = header_value(headers, "x-forwarded-for") {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return first;
        }
    }

    for name in FALLBACK_HEADERS {
        if let Some(value) = header_value(headers, name) {
            let value = value.trim();
            if !value.is_empty() {
                return value;
            }
        }
    }

    UNKNOWN_CLIENT
}

/// Case-insensitive header lookup.
fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_forwarded_for_takes_precedence() {
        let headers = headers(&[
            ("x-forwarded-for", "1.2.3.4"),
            ("cf-connecting-ip", "5.6.7.8"),
            ("x-real-ip", "9.10.11.12"),
        ]);
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn test_forwarded_for_uses_first_entry() {
        let headers = headers(&[("x-forwarded-for", "1.2.3.4, 5.6.7.8")]);
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn test_forwarded_for_is_trimmed() {
        let headers = headers(&[("x-forwarded-for", "  1.2.3.4  ")]);
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn test_cf_connecting_ip_fallback() {
        let headers = headers(&[("cf-connecting-ip", "5.6.7.8")]);
        assert_eq!(client_ip(&headers), "5.6.7.8");
    }

    #[test]
    fn test_real_ip_fallback() {
        let headers = headers(&[("x-real-ip", "9.10.11.12")]);
        assert_eq!(client_ip(&headers), "9.10.11.12");
    }

    #[test]
    fn test_unknown_when_no_headers() {
        assert_eq!(client_ip(&HashMap::new()), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let headers = headers(&[
            ("x-forwarded-for", "   "),
            ("cf-connecting-ip", "5.6.7.8"),
        ]);
        assert_eq!(client_ip(&headers), "5.6.7.8");
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        {
            let headers = headers(&[("X-Forwarded-For", "1.2.3.4")]);
            assert_eq!(client_ip(&headers), "1.2.3.4");
        }
        {
            let headers = headers(&[("CF-Connecting-IP", "5.6.7.8")]);
            assert_eq!(client_ip(&headers), "5.6.7.8");
        }
    }
}
