//! URL canonicalization (spec §4.3.6, testable properties §8.2-3): strip the
//! fragment, drop every query parameter whose name starts with `utm_`
//! (case-insensitive), preserve every other parameter in its original
//! relative order.

/// Canonicalize a URL: parse, strip the fragment, drop `utm_*` query params.
/// Idempotent by construction — a URL with no fragment and no `utm_*`
/// params round-trips unchanged through a second call.
pub fn canonicalize(raw_url: &str) -> Option<String> {
    let mut parsed = url::Url::parse(raw_url).ok()?;
    parsed.set_fragment(None);

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !k.to_lowercase().starts_with("utm_"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let pairs: Vec<String> = kept
            .iter()
            .map(|(k, v)| format!("{}={}", url::form_urlencoded::byte_serialize(k.as_bytes()).collect::<String>(), url::form_urlencoded::byte_serialize(v.as_bytes()).collect::<String>()))
            .collect();
        parsed.set_query(Some(&pairs.join("&")));
    }

    Some(parsed.to_string())
}

/// Lowercased canonical URL, the form used for dedupe comparisons (spec §4.5, §8.4).
pub fn canonicalize_lower(raw_url: &str) -> Option<String> {
    canonicalize(raw_url).map(|u| u.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment() {
        assert_eq!(canonicalize("https://example.com/a#section").unwrap(), "https://example.com/a");
    }

    #[test]
    fn drops_utm_params_case_insensitively() {
        let out = canonicalize("https://example.com/a?UTM_Source=x&utm_campaign=y&real=1").unwrap();
        assert_eq!(out, "https://example.com/a?real=1");
    }

    #[test]
    fn preserves_non_utm_params_in_order() {
        let out = canonicalize("https://example.com/a?b=2&utm_source=x&a=1").unwrap();
        assert_eq!(out, "https://example.com/a?b=2&a=1");
    }

    #[test]
    fn is_idempotent() {
        let once = canonicalize("https://example.com/a?utm_source=x&b=2#frag").unwrap();
        let twice = canonicalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn url_with_no_query_is_unchanged() {
        assert_eq!(canonicalize("https://example.com/a").unwrap(), "https://example.com/a");
    }

    #[test]
    fn invalid_url_returns_none() {
        assert!(canonicalize("not a url").is_none());
    }
}
