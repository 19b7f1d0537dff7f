use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

// Heuristic patterns: they find contact-shaped substrings, they do not validate them.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+").expect("valid email pattern")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\-(). ]{6,}\d").expect("valid phone pattern"));

/// Email-shaped tokens, sorted and deduplicated
pub fn emails(text: &str) -> Vec<String> {
    matches(&EMAIL_RE, text)
}

/// Phone-like tokens, sorted and deduplicated
pub fn phones(text: &str) -> Vec<String> {
    matches(&PHONE_RE, text)
}

fn matches(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|found| found.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emails_sorted_and_deduplicated() {
        let text = "Write to sales@a.test or info@a.test, again sales@a.test";
        assert_eq!(emails(text), vec!["info@a.test", "sales@a.test"]);
    }

    #[test]
    fn test_email_requires_domain_dot() {
        assert!(emails("user@localhost is not matched").is_empty());
    }

    #[test]
    fn test_phones() {
        let text = "Call +1 (555) 010-9999 or 555.0100 today. Year 2024.";
        assert_eq!(phones(text), vec!["+1 (555) 010-9999", "555.0100"]);
    }

    #[test]
    fn test_phone_does_not_span_text_runs() {
        let text = "Established 2001\n4455 6677\nOpen 9\n10 to 5";
        assert_eq!(phones(text), vec!["4455 6677"]);
    }

    #[test]
    fn test_short_numbers_are_not_phones() {
        assert!(phones("Room 12, floor 3, code 12345").is_empty());
    }
}
