//! URL canonicalisation for visited-set bookkeeping and deduplication.
//!
//! Canonical URLs are comparison keys only, never shown to users. Two
//! URLs that differ only in host case, a trailing slash, a fragment, or
//! tracking parameters canonicalise to the same string.

use url::Url;

use crate::error::SearchError;

/// Tracking query parameters that are stripped during canonicalisation.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
];

/// Canonicalise a URL into a comparison key.
///
/// 1. Parse; only `http` and `https` are accepted.
/// 2. Lowercase scheme and host; keep non-default ports.
/// 3. Drop user info and the fragment.
/// 4. Strip tracking parameters, re-encoding the rest in original order.
/// 5. Strip trailing slashes from the path (the root path becomes empty).
///
/// Path and query case are preserved. The function is idempotent.
///
/// # Errors
///
/// Returns [`SearchError::MalformedUrl`] if the input does not parse or
/// uses another scheme.
///
/// # Examples
///
/// ```
/// use linkfinder_search::orchestrator::url_normalize::canonicalize;
///
/// let a = canonicalize("https://Example.COM/path/?id=1&utm_source=x#top").unwrap();
/// let b = canonicalize("https://example.com/path?id=1").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn canonicalize(raw: &str) -> Result<String, SearchError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| SearchError::MalformedUrl(format!("{raw}: {e}")))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(SearchError::MalformedUrl(format!(
            "{raw}: unsupported scheme {scheme}"
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| SearchError::MalformedUrl(format!("{raw}: missing host")))?;

    let mut out = format!("{scheme}://{}", host.to_lowercase());
    // `Url::port` is already `None` for the scheme's default port.
    if let Some(port) = parsed.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out.push_str(parsed.path().trim_end_matches('/'));

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !kept.is_empty() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        out.push('?');
        out.push_str(&query);
    }

    Ok(out)
}

/// Host of `raw` in lowercase, without a leading `www.`.
pub fn registrable_host(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_owned).unwrap_or(host))
}

/// Whether `url` lives on `base_domain` or one of its subdomains.
///
/// `base_domain` is compared without a leading `www.` so that `www.a.com`
/// and `a.com` are treated as the same site.
pub fn same_domain(url: &str, base_domain: &str) -> bool {
    let Some(host) = registrable_host(url) else {
        return false;
    };
    let base = base_domain.to_lowercase();
    let base = base.strip_prefix("www.").unwrap_or(&base);
    host == base || host.ends_with(&format!(".{base}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(raw: &str) -> String {
        canonicalize(raw).expect("valid url")
    }

    #[test]
    fn lowercases_scheme_and_host_only() {
        assert_eq!(canon("HTTPS://Example.COM/Path?Q=One"), "https://example.com/Path?Q=One");
    }

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(canon("https://example.com/path/"), "https://example.com/path");
    }

    #[test]
    fn root_path_becomes_empty() {
        assert_eq!(canon("https://example.com/"), "https://example.com");
        assert_eq!(canon("https://example.com"), "https://example.com");
    }

    #[test]
    fn strips_tracking_params() {
        assert_eq!(
            canon("https://a.com/x?utm_source=y&id=1"),
            canon("https://a.com/x?id=1")
        );
        assert_eq!(
            canon("https://a.com/x?gclid=1&fbclid=2&utm_campaign=z"),
            "https://a.com/x"
        );
    }

    #[test]
    fn keeps_query_order() {
        assert_eq!(canon("https://a.com/s?z=1&a=2"), "https://a.com/s?z=1&a=2");
    }

    #[test]
    fn keeps_blank_values() {
        assert_eq!(canon("https://a.com/?s="), "https://a.com?s=");
    }

    #[test]
    fn drops_fragment_and_default_port() {
        assert_eq!(canon("https://a.com:443/p#frag"), "https://a.com/p");
        assert_eq!(canon("http://a.com:8080/p"), "http://a.com:8080/p");
    }

    #[test]
    fn is_idempotent() {
        for raw in [
            "https://Example.com/a/b/?q=one+piece&utm_term=x",
            "https://a.com/search/one%20piece",
            "http://a.com:8080/?s=naruto&page=2",
            "https://a.com/",
        ] {
            let once = canon(raw);
            assert_eq!(canon(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn rejects_other_schemes() {
        let err = canonicalize("ftp://a.com/file").unwrap_err();
        assert!(matches!(err, SearchError::MalformedUrl(_)));
        assert!(canonicalize("javascript:void(0)").is_err());
        assert!(canonicalize("mailto:someone@a.com").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(canonicalize("not a url").is_err());
        assert!(canonicalize("").is_err());
    }

    #[test]
    fn same_domain_accepts_subdomains_and_www() {
        assert!(same_domain("https://www.a.com/x", "a.com"));
        assert!(same_domain("https://a.com/x", "www.a.com"));
        assert!(same_domain("https://cdn.a.com/x", "a.com"));
    }

    #[test]
    fn same_domain_rejects_lookalikes() {
        assert!(!same_domain("https://evil-a.com/x", "a.com"));
        assert!(!same_domain("https://b.com/x", "a.com"));
        assert!(!same_domain("not a url", "a.com"));
    }
}
