use crate::parsers::{DomExtractor, ExtractError, Extractor, extract_page};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title> Home </title>
  <meta name="Description" content=" Welcome to a.test ">
  <style>body { color: red; }</style>
</head>
<body>
  <h1 class="hero   big">Hello</h1>
  <ul><li>One</li><li>Two</li></ul>
  <script>var secret = "hidden";</script>
  <a href="/x">X</a>
  <a href="y#frag">Y</a>
  <a href="http://other.test/z">Z</a>
  <a href="mailto:sales@a.test">mail</a>
  <a href="javascript:void(0)">js</a>
  <a href="/x">again</a>
  <p>Contact: info@a.test, +1 555 010 9999</p>
</body>
</html>"#;

#[test]
fn test_title_and_meta_description() {
    let extraction = extract_page(PAGE, "http://a.test/").unwrap();
    assert_eq!(extraction.title.as_deref(), Some("Home"));
    assert_eq!(
        extraction.meta_description.as_deref(),
        Some("Welcome to a.test")
    );
}

#[test]
fn test_visible_text_excludes_script_and_style() {
    let extraction = extract_page(PAGE, "http://a.test/").unwrap();
    let lines: Vec<&str> = extraction.text.lines().collect();

    assert_eq!(lines.first(), Some(&"Home"));
    assert!(lines.contains(&"Hello"));
    assert!(lines.contains(&"One"));
    assert!(lines.contains(&"Two"));
    assert_eq!(lines.last(), Some(&"Contact: info@a.test, +1 555 010 9999"));
    assert!(!extraction.text.contains("hidden"));
    assert!(!extraction.text.contains("color: red"));
}

#[test]
fn test_links_are_partitioned_sorted_and_deduplicated() {
    let extraction = extract_page(PAGE, "http://a.test/").unwrap();
    assert_eq!(
        extraction.internal_links,
        vec!["http://a.test/x", "http://a.test/y"]
    );
    assert_eq!(extraction.external_links, vec!["http://other.test/z"]);
    assert!(extraction.warnings.is_empty());
}

#[test]
fn test_relative_links_resolve_against_the_page() {
    let html = r#"<a href="sibling">S</a><a href="../up">U</a>"#;
    let extraction = extract_page(html, "http://a.test/docs/guide/intro").unwrap();
    assert_eq!(
        extraction.internal_links,
        vec!["http://a.test/docs/guide/sibling", "http://a.test/docs/up"]
    );
}

#[test]
fn test_unresolvable_links_become_warnings() {
    let html = r#"<a href="http://[::1]:namedport">bad</a><a href="/ok">ok</a>"#;
    let extraction = extract_page(html, "http://a.test/").unwrap();
    assert_eq!(extraction.internal_links, vec!["http://a.test/ok"]);
    assert_eq!(extraction.warnings.len(), 1);
    assert!(extraction.warnings[0].contains("namedport"));
}

#[test]
fn test_contacts_are_extracted_from_text() {
    let extraction = extract_page(PAGE, "http://a.test/").unwrap();
    assert_eq!(extraction.emails, vec!["info@a.test"]);
    assert_eq!(extraction.phones, vec!["+1 555 010 9999"]);
}

#[test]
fn test_first_non_empty_title_wins() {
    let html = "<html><head><title>  </title><title>Second</title></head><body></body></html>";
    let extraction = extract_page(html, "http://a.test/").unwrap();
    assert_eq!(extraction.title.as_deref(), Some("Second"));
}

#[test]
fn test_renderer_title_is_the_fallback() {
    let html = "<html><body><p>No title here</p></body></html>";
    let record = extract_page(html, "http://a.test/")
        .unwrap()
        .into_record("http://a.test/", Some(" Rendered "));
    assert_eq!(record.title, "Rendered");

    let record = extract_page(PAGE, "http://a.test/")
        .unwrap()
        .into_record("http://a.test/", Some("Rendered"));
    assert_eq!(record.title, "Home");

    let record = extract_page(html, "http://a.test/")
        .unwrap()
        .into_record("http://a.test/", None);
    assert_eq!(record.title, "");
}

#[test]
fn test_extractor_trait_rejects_invalid_page_url() {
    let result = DomExtractor.extract(PAGE, "not a url");
    assert!(matches!(result, Err(ExtractError::InvalidPageUrl { .. })));
}

#[test]
fn test_empty_document() {
    let extraction = extract_page("", "http://a.test/").unwrap();
    assert_eq!(extraction.title, None);
    assert_eq!(extraction.text, "");
    assert!(extraction.internal_links.is_empty());
    // html5ever still builds html/head/body
    let tags: Vec<&str> = extraction.elements.iter().map(|e| e.tag.as_str()).collect();
    assert_eq!(tags, vec!["html", "head", "body"]);
}

#[test]
fn test_base_href_sets_the_resolution_base() {
    let html = r#"<html><head><base href="/docs/"></head><body><a href="intro">I</a><a href="/top">T</a></body></html>"#;
    let extraction = extract_page(html, "http://a.test/page").unwrap();
    assert_eq!(
        extraction.internal_links,
        vec!["http://a.test/docs/intro", "http://a.test/top"]
    );
}

#[test]
fn test_only_the_first_base_href_counts() {
    let html = r#"<base href="http://a.test/one/"><base href="http://a.test/two/"><a href="x">x</a>"#;
    let extraction = extract_page(html, "http://a.test/").unwrap();
    assert_eq!(extraction.internal_links, vec!["http://a.test/one/x"]);
}

#[test]
fn test_base_href_on_another_host_does_not_change_scope() {
    let html = r#"<base href="http://cdn.test/assets/"><a href="logo">L</a><a href="http://a.test/x">X</a>"#;
    let extraction = extract_page(html, "http://a.test/").unwrap();
    assert_eq!(extraction.internal_links, vec!["http://a.test/x"]);
    assert_eq!(extraction.external_links, vec!["http://cdn.test/assets/logo"]);
}
