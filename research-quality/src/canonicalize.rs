//! URL canonicalization (spec.md §4.3).

use url::Url;

/// Tracking query parameters stripped unconditionally.
const TRACKING_PARAMS: &[&str] = &["gclid", "fbclid", "ref", "source"];

/// Canonicalizes `raw` per spec.md §4.3: lowercase scheme and host,
/// unify `http`/`https` onto `https` (the two are the same page for
/// dedup purposes; providers are inconsistent about which they report),
/// strip default ports, strip a trailing slash from the path (except
/// root), strip the fragment, drop tracking query parameters
/// (`utm_*`, `gclid`, `fbclid`, `ref`, `source`), and preserve the
/// remaining query parameters in lexicographic order.
///
/// Returns `None` if `raw` cannot be parsed as a URL.
#[must_use]
pub fn canonicalize(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;

    let lowered_scheme = url.scheme().to_lowercase();
    let scheme = if lowered_scheme == "http" { "https".to_string() } else { lowered_scheme };
    url.set_scheme(&scheme).ok()?;

    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        url.set_host(Some(&lowered)).ok()?;
    }

    if is_default_port(&scheme, url.port()) {
        url.set_port(None).ok()?;
    }

    url.set_fragment(None);

    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    kept.sort_by(|a, b| a.0.cmp(&b.0));
    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &kept {
            serializer.append_pair(key, value);
        }
        url.set_query(Some(&serializer.finish()));
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

fn is_default_port(scheme: &str, port: Option<u16>) -> bool {
    matches!(
        (scheme, port),
        ("http", Some(80)) | ("https", Some(443))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(
            canonicalize("HTTPS://Example.COM/path"),
            Some("https://example.com/path".to_string())
        );
    }

    #[test]
    fn strips_default_port_and_fragment() {
        assert_eq!(
            canonicalize("https://example.com:443/page#section"),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn strips_trailing_slash_except_root() {
        assert_eq!(
            canonicalize("https://example.com/page/"),
            Some("https://example.com/page".to_string())
        );
        assert_eq!(
            canonicalize("https://example.com/"),
            Some("https://example.com/".to_string())
        );
    }

    #[test]
    fn drops_tracking_params_and_sorts_the_rest() {
        let canonical = canonicalize(
            "https://example.com/a?utm_source=news&b=2&a=1&gclid=xyz&ref=home",
        )
        .unwrap();
        assert_eq!(canonical, "https://example.com/a?a=1&b=2");
    }

    #[test]
    fn unifies_http_and_https_onto_the_same_canonical_form() {
        assert_eq!(
            canonicalize("https://example.com/a?utm_source=x"),
            canonicalize("http://example.com/a/"),
        );
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert_eq!(canonicalize("not a url"), None);
    }

    #[test]
    fn is_idempotent() {
        let once = canonicalize(
            "HTTPS://Example.com:443/a/?utm_campaign=x&z=3&y=2#frag",
        )
        .unwrap();
        let twice = canonicalize(&once).unwrap();
        assert_eq!(once, twice);
    }
}
