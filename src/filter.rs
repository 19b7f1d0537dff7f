use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Link schemes that are never navigable
const NON_NAVIGABLE_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:"];

/// Returns true when an href uses a scheme the crawler must never follow
pub fn is_non_navigable(raw_href: &str) -> bool {
    let href = raw_href.trim_start();
    NON_NAVIGABLE_SCHEMES.iter().any(|scheme| {
        href.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Resolves `raw_href` against the page that referenced it and canonicalizes it.
///
/// The fragment is dropped and an empty query (`?` with nothing after it) is
/// removed. If either side fails to parse, the input is returned unchanged.
pub fn normalize(base_url: &str, raw_href: &str) -> String {
    try_normalize(base_url, raw_href).unwrap_or_else(|| raw_href.to_string())
}

/// Like [`normalize`], but reports resolution failures instead of echoing the input
pub fn try_normalize(base_url: &str, raw_href: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let resolved = base.join(raw_href.trim()).ok()?;
    Some(canonicalize(resolved).into())
}

/// Strips the parts of a parsed URL that do not identify a page
pub fn canonicalize(mut url: Url) -> Url {
    url.set_fragment(None);
    if url.query().is_some_and(str::is_empty) {
        url.set_query(None);
    }
    url
}

/// True iff `candidate_url` is on the same host as `origin_url`. Scheme is ignored.
pub fn is_in_scope(candidate_url: &str, origin_url: &str) -> bool {
    if is_non_navigable(candidate_url) {
        return false;
    }
    let (Ok(candidate), Ok(origin)) = (Url::parse(candidate_url), Url::parse(origin_url)) else {
        return false;
    };
    match (candidate.host_str(), origin.host_str()) {
        (Some(candidate_host), Some(origin_host)) => {
            candidate_host.eq_ignore_ascii_case(origin_host)
        }
        _ => false,
    }
}

/// Pattern rules applied to in-scope links before they are queued
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Regex patterns for URLs to include (if empty, all URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Decides which in-scope links are followed
#[derive(Debug, Default)]
pub struct UrlFilter {
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: &UrlFilterConfig) -> Result<Self, regex::Error> {
        let include_regexes = config
            .include_patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude_regexes = config
            .exclude_patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_regexes,
            exclude_regexes,
        })
    }

    /// Determine if a canonical link should be queued for crawling
    pub fn should_follow(&self, url: &str) -> bool {
        if self.exclude_regexes.iter().any(|regex| regex.is_match(url)) {
            return false;
        }
        self.include_regexes.is_empty() || self.include_regexes.iter().any(|regex| regex.is_match(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://a.test/", "/x", "http://a.test/x")]
    #[case("http://a.test/docs/intro", "next", "http://a.test/docs/next")]
    #[case("http://a.test/docs/intro", "../up", "http://a.test/up")]
    #[case("http://a.test/", "/x#section", "http://a.test/x")]
    #[case("http://a.test/", "/search?q=rust#top", "http://a.test/search?q=rust")]
    #[case("http://a.test/", "/empty?", "http://a.test/empty")]
    #[case("http://a.test/page", "#only-fragment", "http://a.test/page")]
    #[case("http://a.test/", "  /padded  ", "http://a.test/padded")]
    #[case("http://a.test/", "https://other.test/z", "https://other.test/z")]
    #[case("http://a.test:8080/", "/x", "http://a.test:8080/x")]
    fn test_normalize(#[case] base: &str, #[case] href: &str, #[case] expected: &str) {
        assert_eq!(normalize(base, href), expected);
    }

    #[test]
    fn test_normalize_resolves_against_referencing_page_not_seed() {
        // The seed is http://a.test/, but this link was found on a nested page.
        let found_on = "http://a.test/blog/2024/post.html";
        assert_eq!(
            normalize(found_on, "comments"),
            "http://a.test/blog/2024/comments"
        );
        assert_ne!(
            normalize(found_on, "comments"),
            normalize("http://a.test/", "comments")
        );
    }

    #[test]
    fn test_normalize_fails_closed() {
        assert_eq!(normalize("not a url", "/x"), "/x");
        assert_eq!(normalize("http://a.test/", "http://[::1]:namedport"), "http://[::1]:namedport");
        assert!(try_normalize("http://a.test/", "http://[::1]:namedport").is_none());
    }

    #[rstest]
    #[case("/x#frag")]
    #[case("../a/./b?c=d#e")]
    #[case("https://other.test/p?")]
    #[case("mailto:someone@a.test")]
    #[case("http://[::1]:namedport")]
    fn test_normalize_is_idempotent(#[case] href: &str) {
        let base = "http://a.test/dir/page";
        let once = normalize(base, href);
        assert_eq!(normalize(base, &once), once);
    }

    #[rstest]
    #[case("mailto:someone@a.test")]
    #[case("MAILTO:someone@a.test")]
    #[case("tel:+15550100")]
    #[case("javascript:void(0)")]
    #[case("  javascript:alert(1)")]
    fn test_non_navigable_schemes_are_out_of_scope(#[case] href: &str) {
        assert!(is_non_navigable(href));
        assert!(!is_in_scope(href, "http://a.test/"));
    }

    #[test]
    fn test_scope_ignores_scheme_and_rejects_other_hosts() {
        assert!(is_in_scope("https://a.test/x", "http://a.test/"));
        assert!(is_in_scope("http://A.TEST/x", "http://a.test/"));
        assert!(!is_in_scope("http://other.test/z", "http://a.test/"));
        assert!(!is_in_scope("http://sub.a.test/", "http://a.test/"));
        assert!(!is_in_scope("/relative", "http://a.test/"));
    }

    #[test]
    fn test_filter_patterns() {
        let config = UrlFilterConfig {
            include_patterns: vec![r"/docs/".to_string()],
            exclude_patterns: vec![r"/docs/draft/".to_string()],
        };
        let filter = UrlFilter::new(&config).unwrap();

        assert!(filter.should_follow("http://a.test/docs/page"));
        assert!(!filter.should_follow("http://a.test/blog/post"));
        assert!(!filter.should_follow("http://a.test/docs/draft/page"));
    }

    #[test]
    fn test_default_filter_follows_everything() {
        let filter = UrlFilter::default();
        assert!(filter.should_follow("http://a.test/image.jpg"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let config = UrlFilterConfig {
            include_patterns: vec!["(".to_string()],
            exclude_patterns: vec![],
        };
        assert!(UrlFilter::new(&config).is_err());
    }
}
