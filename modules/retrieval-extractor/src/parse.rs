//! HTML parsing (spec §4.3.5): title, canonical link, and body text.
//! Grounded on `rootsignal-archive::readability::html_to_markdown`'s
//! `spider_transformations` Readability transform for the body, and on
//! `rootsignal-archive::services::page::extract_title`'s plain-regex style
//! for the cheap metadata extraction the transform doesn't give us.

use regex::Regex;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};

pub struct ParsedDocument {
    pub title: Option<String>,
    pub canonical_link: Option<String>,
    pub body: String,
}

fn extract_title_tag(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?;
    let raw = re.captures(html)?.get(1)?.as_str();
    let decoded = html_escape::decode_html_entities(raw);
    let normalized = normalize_whitespace(&decoded);
    (!normalized.is_empty()).then_some(normalized)
}

fn extract_meta_content(html: &str, attr: &str, value: &str) -> Option<String> {
    let pattern = format!(r#"(?i)<meta[^>]*{attr}\s*=\s*["']{value}["'][^>]*content\s*=\s*["']([^"']*)["']"#);
    let re = Regex::new(&pattern).ok()?;
    if let Some(cap) = re.captures(html) {
        return Some(html_escape::decode_html_entities(&cap[1]).to_string());
    }
    let pattern2 = format!(r#"(?i)<meta[^>]*content\s*=\s*["']([^"']*)["'][^>]*{attr}\s*=\s*["']{value}["']"#);
    let re2 = Regex::new(&pattern2).ok()?;
    re2.captures(html).map(|cap| html_escape::decode_html_entities(&cap[1]).to_string())
}

/// Title (spec step 5): `<title>` first, `og:title` as fallback.
pub fn extract_title(html: &str) -> Option<String> {
    extract_title_tag(html).or_else(|| extract_meta_content(html, "property", "og:title"))
}

/// Canonical link from `<link rel="canonical" href="...">`, if present.
pub fn extract_canonical_link(html: &str) -> Option<String> {
    let re = Regex::new(r#"(?i)<link[^>]*rel\s*=\s*["']canonical["'][^>]*href\s*=\s*["']([^"']+)["']"#).ok()?;
    if let Some(cap) = re.captures(html) {
        return Some(cap[1].to_string());
    }
    let re2 = Regex::new(r#"(?i)<link[^>]*href\s*=\s*["']([^"']+)["'][^>]*rel\s*=\s*["']canonical["']"#).ok()?;
    re2.captures(html).map(|cap| cap[1].to_string())
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Body extraction (spec §4.3.5): strip `<script>`/`<style>`, prefer
/// `<article>`/`<main>`/`<body>` content in that order, else the whole
/// document, via the teacher's readability+main-content transform, then
/// normalize whitespace and decode any residual entities.
pub fn extract_body(html: &[u8], url: Option<&str>) -> String {
    let parsed_url = url.and_then(|u| url::Url::parse(u).ok());
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Text,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html,
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    let transformed = transform_content_input(input, &config);
    let decoded = html_escape::decode_html_entities(&transformed);
    normalize_whitespace(&decoded)
}

/// Parse an HTML document per the extractor's contract (spec §4.3.5).
pub fn parse_document(html: &[u8], request_url: &str) -> ParsedDocument {
    let text = String::from_utf8_lossy(html);
    let title = extract_title(&text);
    let canonical_link = extract_canonical_link(&text);
    let body = extract_body(html, Some(request_url));

    ParsedDocument { title, canonical_link, body }
}
