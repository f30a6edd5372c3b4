//! Source/citation extraction
//!
//! Pure scan of a reply for URLs: structured fields first, then the text.
//! Never fails; the empty list is the failure mode.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Keys whose string values are treated as citation URLs
const URL_KEYS: &[&str] = &["url", "source", "href"];

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(https?://[^\s)]+)").unwrap());

/// Extract a deduplicated, first-seen-ordered list of URLs from a structured
/// reply and its flattened text.
pub fn extract_sources(raw: &Value, text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    walk(raw, &mut urls);

    for m in URL_REGEX.find_iter(text) {
        urls.push(m.as_str().to_string());
    }

    let cleaned: Vec<String> = urls.iter().map(|u| clean_url(u)).collect();
    dedupe_preserve_order(cleaned)
}

/// Depth-first walk collecting URL-bearing string fields
fn walk(value: &Value, urls: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                if URL_KEYS.contains(&key.to_lowercase().as_str()) {
                    if let Some(s) = val.as_str() {
                        if s.starts_with("http://") || s.starts_with("https://") {
                            urls.push(s.trim().to_string());
                        }
                    }
                }
                walk(val, urls);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, urls);
            }
        }
        _ => {}
    }
}

/// Strip wrapping punctuation picked up by the text scan
fn clean_url(url: &str) -> String {
    url.trim_end_matches([')', '.', ',', ';', ':', ']'])
        .trim_start_matches(['(', '['])
        .to_string()
}

fn dedupe_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
