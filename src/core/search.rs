//! Search keys for raw titles and search-engine URL building.

use regex::Regex;
use std::sync::OnceLock;

use super::error::{CoreError, CoreResult};

const PLACEHOLDER: &str = "{}";

fn punctuation() -> &'static Regex {
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    PUNCT.get_or_init(|| {
        Regex::new(r#"[!！?？,，.．・:：;；/／\\|｜~〜^＾`´'"\[\]\(\)（）【】{}<>＜＞「」『』]"#)
            .unwrap_or_else(|e| panic!("invalid punctuation pattern: {}", e))
    })
}

/// Normalizes a raw title into a search key.
///
/// Lowercases, replaces ASCII and full-width punctuation with spaces, and
/// collapses runs of whitespace.
pub fn build_search_key(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let spaced = punctuation().replace_all(&lowered, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Substitutes the URL-encoded `query` into the first `{}` of `template`.
pub fn build_search_url(template: &str, query: &str) -> CoreResult<String> {
    if !template.contains(PLACEHOLDER) {
        return Err(CoreError::InvalidTemplate(template.to_string()));
    }
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    Ok(template.replacen(PLACEHOLDER, &encoded, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_key_strips_punctuation() {
        assert_eq!(build_search_key("  My Show [HQ] (01)! "), "my show hq 01");
        assert_eq!(build_search_key("タイトル【修正版】「上」"), "タイトル 修正版 上");
        assert_eq!(build_search_key(""), "");
    }

    #[test]
    fn test_search_url_encodes_query() {
        let url = build_search_url("https://www.google.com/search?q={}", "a&b c").unwrap();
        assert_eq!(url, "https://www.google.com/search?q=a%26b+c");
    }

    #[test]
    fn test_search_url_requires_placeholder() {
        let err = build_search_url("https://example.com/", "x").unwrap_err();
        assert!(matches!(err, CoreError::InvalidTemplate(_)));
    }
}
