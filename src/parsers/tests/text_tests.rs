use crate::parsers::text;

#[test]
fn test_truncate_chars_respects_char_boundaries() {
    assert_eq!(text::truncate_chars("héllo", 2), "hé");
    assert_eq!(text::truncate_chars("short", 200), "short");
    assert_eq!(text::truncate_chars("", 3), "");
}

#[test]
fn test_preview_concatenates_runs() {
    assert_eq!(text::preview(&["Hello", "world"]), Some("Helloworld".to_string()));
    assert_eq!(text::preview(&[]), None);
}

#[test]
fn test_join_lines() {
    assert_eq!(text::join_lines(&["a", "b"]), "a\nb");
}

#[test]
fn test_normalize_whitespace_in_segment() {
    assert_eq!(text::normalize_whitespace_in_segment("  a \t b\n c "), "a b c");
}
