//! Starter rules offered when a workspace has none.
//!
//! This is a plain seed table, not a pattern-guessing algorithm. Replace or
//! extend [`starter_rules`] freely.

use super::rule::{flags, Rule};

/// Source tag for seeded rules.
pub const SEED_SOURCE: &str = "SEED";
/// Maximum number of ignore words folded into the combined ignore-word rule.
pub const MAX_FOLDED_WORDS: usize = 80;

/// Builds the starter rules, folding `ignore_words` into one alternation rule.
pub fn starter_rules(ignore_words: &[String]) -> Vec<Rule> {
    let mut rules = vec![
        seed(
            "tail_number",
            "Tail number (01 / 001 / 12-345)",
            r"(?:^|[ _\-　])\d{1,4}(?:-\d{1,4})?$",
            "Volume or episode numbers at the end of a title",
            flags::IGNORE_CASE,
        ),
        seed(
            "bracket_tag",
            "Bracket tag ([...] / (...) / 【...】)",
            r"[\[\(（【].{1,30}?[\]\)）】]",
            "Cover, variant and revision notes usually sit in brackets",
            0,
        ),
    ];

    if let Some(rule) = ignore_words_rule(ignore_words) {
        rules.push(rule);
    }

    rules.push(seed(
        "camera_prefix",
        "Camera prefix (IMG_ / DSC_ ...)",
        r"\b(?:img|dsc|pxl|vid|mv)[ _-]?\d{3,}\b",
        "Device-generated file numbers",
        flags::IGNORE_CASE,
    ));
    rules
}

/// One case-insensitive rule matching any of the (escaped) ignore words.
pub fn ignore_words_rule(ignore_words: &[String]) -> Option<Rule> {
    let parts: Vec<String> = ignore_words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .take(MAX_FOLDED_WORDS)
        .map(regex::escape)
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(seed(
        "ignore_words",
        "Ignore words (combined)",
        &format!("({})", parts.join("|")),
        "Removes every word listed as an ignore word",
        flags::IGNORE_CASE,
    ))
}

fn seed(key: &str, name: &str, pattern: &str, why: &str, flag_bits: u32) -> Rule {
    let mut rule = Rule::new(key, name, pattern, why);
    rule.flags = flag_bits;
    rule.source = SEED_SOURCE.to_string();
    rule
}

/// Appends the starter rules whose keys are not present yet. Returns how many were added.
pub fn add_missing(rules: &mut Vec<Rule>, ignore_words: &[String]) -> usize {
    let before = rules.len();
    for seed in starter_rules(ignore_words) {
        if !rules.iter().any(|r| r.key == seed.key) {
            rules.push(seed);
        }
    }
    rules.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PatternCompiler;

    #[test]
    fn test_all_seeds_compile() {
        let mut rules = starter_rules(&["a.b".to_string(), "HQ".to_string()]);
        let compiled = PatternCompiler::new().compile_all(&mut rules);
        assert!(compiled.iter().all(Option::is_some));
        assert!(rules.iter().all(|r| r.error.is_empty()));
    }

    #[test]
    fn test_seed_patterns_match_typical_noise() {
        let mut rules = starter_rules(&["sample".to_string()]);
        let compiled = PatternCompiler::new().compile_all(&mut rules);
        let matches = |key: &str, title: &str| {
            let i = rules.iter().position(|r| r.key == key).unwrap();
            compiled[i].as_ref().unwrap().is_match(title)
        };
        assert!(matches("tail_number", "My Show 01"));
        assert!(matches("tail_number", "title_12-345"));
        assert!(!matches("tail_number", "Clean Title"));
        assert!(matches("bracket_tag", "Title [Cover]"));
        assert!(matches("bracket_tag", "タイトル【修正版】"));
        assert!(matches("camera_prefix", "IMG_2023 beach"));
        assert!(matches("ignore_words", "Title SAMPLE"));
    }

    #[test]
    fn test_ignore_words_are_escaped_and_capped() {
        let words: Vec<String> = (0..100).map(|i| format!("w{}", i)).collect();
        let rule = ignore_words_rule(&words).unwrap();
        assert_eq!(rule.pattern.matches('|').count(), MAX_FOLDED_WORDS - 1);

        let dotted = ignore_words_rule(&["a.b".to_string()]).unwrap();
        assert_eq!(dotted.pattern, r"(a\.b)");
        assert!(ignore_words_rule(&[" ".to_string()]).is_none());
    }

    #[test]
    fn test_add_missing_skips_existing_keys() {
        let mut rules = vec![Rule::new("tail_number", "mine", "x", "")];
        let added = add_missing(&mut rules, &[]);
        assert_eq!(added, 2);
        assert_eq!(rules[0].name, "mine");
        assert_eq!(add_missing(&mut rules, &[]), 0);
    }
}
