//! Compiles rule patterns into executable matchers.
//!
//! Compile failures never propagate: the diagnostic is stored on the rule and
//! the rule simply contributes no matcher.

use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};

use super::rule::{flags, Rule};

/// Matchers aligned index-for-index with the rule collection they were built from.
///
/// `None` marks a rule that is disabled, has an empty pattern, or failed to compile.
pub type CompiledRules = Vec<Option<Regex>>;

/// Compiles patterns and memoizes the outcome by `(pattern, flags)`.
#[derive(Debug, Default)]
pub struct PatternCompiler {
    cache: HashMap<(String, u32), Result<Regex, String>>,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a single rule, updating its `error` field.
    ///
    /// Disabled rules and rules with an empty pattern are not compiled and end
    /// up with an empty error.
    pub fn compile_rule(&mut self, rule: &mut Rule) -> Option<Regex> {
        if !rule.enabled || rule.pattern.is_empty() {
            rule.error.clear();
            return None;
        }

        let cache_key = (rule.pattern.clone(), rule.flags);
        let outcome = self
            .cache
            .entry(cache_key)
            .or_insert_with(|| build_regex(&rule.pattern, rule.flags));

        match outcome {
            Ok(regex) => {
                rule.error.clear();
                Some(regex.clone())
            }
            Err(message) => {
                tracing::warn!("Rule '{}' failed to compile: {}", rule.key, message);
                rule.error = message.clone();
                None
            }
        }
    }

    /// Recompiles every rule in order and returns the aligned matchers.
    ///
    /// Cache entries for patterns no longer used by any rule are dropped.
    pub fn compile_all(&mut self, rules: &mut [Rule]) -> CompiledRules {
        let compiled: CompiledRules = rules.iter_mut().map(|r| self.compile_rule(r)).collect();
        let live: HashSet<(&str, u32)> = rules.iter().map(|r| (r.pattern.as_str(), r.flags)).collect();
        self.cache
            .retain(|(pattern, flag_bits), _| live.contains(&(pattern.as_str(), *flag_bits)));
        tracing::debug!(
            "Compiled {} of {} rules",
            compiled.iter().filter(|m| m.is_some()).count(),
            rules.len()
        );
        compiled
    }

    /// Number of distinct `(pattern, flags)` pairs currently cached.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// Builds a regex honoring the supported flag bits. Unsupported bits are ignored.
///
/// The syntax is that of the `regex` crate: lookaround and backreferences are
/// rejected and show up as the rule's compile error.
fn build_regex(pattern: &str, flag_bits: u32) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .case_insensitive(flag_bits & flags::IGNORE_CASE != 0)
        .multi_line(flag_bits & flags::MULTI_LINE != 0)
        .dot_matches_new_line(flag_bits & flags::DOT_ALL != 0)
        .ignore_whitespace(flag_bits & flags::VERBOSE != 0)
        .build()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_valid_pattern_compiles_and_clears_error() {
        let mut compiler = PatternCompiler::new();
        let mut rule = Rule::new("k", "n", r"\d+", "");
        rule.error = "stale".to_string();
        let matcher = compiler.compile_rule(&mut rule);
        assert!(matcher.is_some());
        assert!(rule.error.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_invalid_pattern_records_error() {
        let mut compiler = PatternCompiler::new();
        let mut rule = Rule::new("broken", "Broken", "(abc", "");
        assert!(compiler.compile_rule(&mut rule).is_none());
        assert!(!rule.error.is_empty());
        assert!(logs_contain("failed to compile"));
    }

    #[test]
    fn test_disabled_or_empty_rules_are_not_compiled() {
        let mut compiler = PatternCompiler::new();
        let mut disabled = Rule::new("a", "a", "(abc", "");
        disabled.enabled = false;
        disabled.error = "old".to_string();
        let mut empty = Rule::new("b", "b", "", "");

        assert!(compiler.compile_rule(&mut disabled).is_none());
        assert!(disabled.error.is_empty());
        assert!(compiler.compile_rule(&mut empty).is_none());
        assert!(empty.error.is_empty());
        assert_eq!(compiler.cached_len(), 0);
    }

    #[test]
    fn test_ignore_case_flag() {
        let mut compiler = PatternCompiler::new();
        let mut rule = Rule::new("img", "img", "img_\\d+", "");
        let strict = compiler.compile_rule(&mut rule).unwrap();
        assert!(!strict.is_match("IMG_0001"));

        rule.flags = flags::IGNORE_CASE;
        let relaxed = compiler.compile_rule(&mut rule).unwrap();
        assert!(relaxed.is_match("IMG_0001"));
    }

    #[test]
    fn test_compile_all_is_aligned_and_memoized() {
        let mut compiler = PatternCompiler::new();
        let mut rules = vec![
            Rule::new("a", "a", "x", ""),
            Rule::new("b", "b", "(", ""),
            Rule::new("c", "c", "x", ""),
        ];
        let compiled = compiler.compile_all(&mut rules);
        assert_eq!(compiled.len(), 3);
        assert!(compiled[0].is_some());
        assert!(compiled[1].is_none());
        assert!(compiled[2].is_some());
        assert_eq!(compiler.cached_len(), 2);

        // A second pass reuses the cached failure and still reports it.
        rules[1].error.clear();
        compiler.compile_all(&mut rules);
        assert!(!rules[1].error.is_empty());
        assert_eq!(compiler.cached_len(), 2);
    }

    #[test]
    fn test_compile_all_drops_patterns_no_longer_in_use() {
        let mut compiler = PatternCompiler::new();
        let mut rules = vec![Rule::new("a", "a", "x", "")];
        for pattern in ["x1", "x12", "x123"] {
            rules[0].pattern = pattern.to_string();
            compiler.compile_all(&mut rules);
        }
        assert_eq!(compiler.cached_len(), 1);

        rules.clear();
        compiler.compile_all(&mut rules);
        assert_eq!(compiler.cached_len(), 0);
    }

    #[test]
    fn test_lookaround_is_reported_as_compile_error() {
        let mut compiler = PatternCompiler::new();
        let mut rule = Rule::new("look", "Lookbehind", r"(?<=vol)\d+", "");
        assert!(compiler.compile_rule(&mut rule).is_none());
        assert!(!rule.error.is_empty());
    }
}
