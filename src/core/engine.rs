//! First-match-wins evaluation of an ordered rule collection against sample titles.
//!
//! For every title the rules are tried in collection order and only the first
//! enabled rule with a compiled matcher that matches is credited. The result
//! answers "which rule fires first for this title", not "which rules match".

use super::compiler::CompiledRules;
use super::rule::Rule;

/// Maximum number of sample titles considered when counting hits.
pub const HIT_TITLE_CAP: usize = 3000;
/// Number of sample titles considered for the preview.
pub const PREVIEW_WINDOW: usize = 400;
/// Number of preview lines produced from the preview window.
pub const PREVIEW_LINES: usize = 200;
/// Maximum number of compile errors listed in a rendered preview.
pub const PREVIEW_ERROR_LIMIT: usize = 20;

/// Per-rule hit counts, in rule collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitCounts {
    counts: Vec<(String, usize)>,
}

impl HitCounts {
    /// Hit count for `key`, or `None` if no such rule was evaluated.
    pub fn get(&self, key: &str) -> Option<usize> {
        self.counts.iter().find(|(k, _)| k == key).map(|(_, n)| *n)
    }

    /// Sum of all hits. Never exceeds the number of evaluated titles.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, n)| (k.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Index of the first enabled, compiled rule that matches `title`.
pub fn first_match(rules: &[Rule], compiled: &CompiledRules, title: &str) -> Option<usize> {
    rules.iter().zip(compiled.iter()).position(|(rule, matcher)| {
        rule.enabled && matcher.as_ref().is_some_and(|m| m.is_match(title))
    })
}

/// Counts first-match hits for the first [`HIT_TITLE_CAP`] titles.
///
/// `compiled` must be aligned with `rules`, as produced by
/// [`PatternCompiler::compile_all`](super::PatternCompiler::compile_all).
/// Every rule appears in the result, including those with zero hits.
pub fn evaluate<S: AsRef<str>>(rules: &[Rule], compiled: &CompiledRules, titles: &[S]) -> HitCounts {
    let mut counts = vec![0usize; rules.len()];
    for title in titles.iter().take(HIT_TITLE_CAP) {
        if let Some(idx) = first_match(rules, compiled, title.as_ref()) {
            counts[idx] += 1;
        }
    }

    tracing::debug!(
        "Evaluated {} rule(s) against {} title(s)",
        rules.len(),
        titles.len().min(HIT_TITLE_CAP)
    );

    HitCounts {
        counts: rules
            .iter()
            .zip(counts)
            .map(|(rule, n)| (rule.key.clone(), n))
            .collect(),
    }
}

/// One sample title and the name of the rule that fired first for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLine {
    pub title: String,
    pub rule_name: Option<String>,
}

/// A rule currently holding a compile error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    pub name: String,
    pub message: String,
}

/// The "explain my matches" view of a rule collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub lines: Vec<PreviewLine>,
    pub errors: Vec<RuleError>,
}

impl Preview {
    /// Renders the preview as text: `title -> rule` lines, then an `[ERROR]` section.
    pub fn render(&self) -> String {
        let mut out: Vec<String> = self
            .lines
            .iter()
            .map(|line| match &line.rule_name {
                Some(name) => format!("{} -> {}", line.title, name),
                None => line.title.clone(),
            })
            .collect();

        if !self.errors.is_empty() {
            out.push(String::new());
            out.push("[ERROR]".to_string());
            out.extend(
                self.errors
                    .iter()
                    .take(PREVIEW_ERROR_LIMIT)
                    .map(|e| format!("- {}: {}", e.name, e.message)),
            );
        }
        out.join("\n")
    }
}

/// Builds the preview for a bounded prefix of `titles`.
pub fn preview<S: AsRef<str>>(rules: &[Rule], compiled: &CompiledRules, titles: &[S]) -> Preview {
    let window = &titles[..titles.len().min(PREVIEW_WINDOW)];
    let lines = window
        .iter()
        .take(PREVIEW_LINES)
        .map(|title| {
            let title = title.as_ref();
            PreviewLine {
                title: title.to_string(),
                rule_name: first_match(rules, compiled, title).map(|i| rules[i].name.clone()),
            }
        })
        .collect();

    Preview {
        lines,
        errors: compile_errors(rules),
    }
}

/// All rules with a non-empty compile error, in collection order.
pub fn compile_errors(rules: &[Rule]) -> Vec<RuleError> {
    rules
        .iter()
        .filter(|r| !r.error.is_empty())
        .map(|r| RuleError {
            name: r.name.clone(),
            message: r.error.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PatternCompiler;
    use proptest::prelude::*;

    fn compiled(rules: &mut [Rule]) -> CompiledRules {
        PatternCompiler::new().compile_all(rules)
    }

    #[test]
    fn test_tail_number_scenario() {
        let mut rules = vec![Rule::new("tail_number", "tail_number", r"\d{2}$", "")];
        let matchers = compiled(&mut rules);
        let titles = ["Show Title 01", "Show Title 02", "Random Clean Title"];

        let hits = evaluate(&rules, &matchers, &titles);
        assert_eq!(hits.get("tail_number"), Some(2));
        assert_eq!(first_match(&rules, &matchers, "Random Clean Title"), None);
    }

    #[test]
    fn test_first_match_wins_and_order_matters() {
        let mut rules = vec![
            Rule::new("digits", "digits", r"\d+", ""),
            Rule::new("tail", "tail", r"\d{2}$", ""),
        ];
        let matchers = compiled(&mut rules);
        let titles = ["Title 01", "Title 02"];
        let hits = evaluate(&rules, &matchers, &titles);
        assert_eq!(hits.get("digits"), Some(2));
        assert_eq!(hits.get("tail"), Some(0));

        rules.reverse();
        let matchers = compiled(&mut rules);
        let hits = evaluate(&rules, &matchers, &titles);
        assert_eq!(hits.get("tail"), Some(2));
        assert_eq!(hits.get("digits"), Some(0));
    }

    #[test]
    fn test_invalid_rule_is_skipped_and_listed() {
        let mut rules = vec![
            Rule::new("broken", "Broken", "(abc", ""),
            Rule::new("abc", "ABC", "abc", ""),
        ];
        let matchers = compiled(&mut rules);
        let hits = evaluate(&rules, &matchers, &["xabcx"]);
        assert_eq!(hits.get("broken"), Some(0));
        assert_eq!(hits.get("abc"), Some(1));

        let errors = compile_errors(&rules);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "Broken");
        assert!(!errors[0].message.is_empty());
    }

    #[test]
    fn test_disabled_rule_never_hits() {
        let mut rules = vec![Rule::new("a", "a", "a", ""), Rule::new("b", "b", "a", "")];
        rules[0].enabled = false;
        let matchers = compiled(&mut rules);
        let hits = evaluate(&rules, &matchers, &["a"]);
        assert_eq!(hits.get("a"), Some(0));
        assert_eq!(hits.get("b"), Some(1));
    }

    #[test]
    fn test_empty_inputs_yield_zero_counts() {
        let mut rules = vec![Rule::new("a", "a", "a", "")];
        let matchers = compiled(&mut rules);
        let none: [&str; 0] = [];
        let hits = evaluate(&rules, &matchers, &none);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.total(), 0);

        let hits = evaluate(&[], &Vec::new(), &["a", "b"]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_hit_cap_is_applied() {
        let mut rules = vec![Rule::new("any", "any", ".", "")];
        let matchers = compiled(&mut rules);
        let titles = vec!["x".to_string(); HIT_TITLE_CAP + 50];
        let hits = evaluate(&rules, &matchers, &titles);
        assert_eq!(hits.get("any"), Some(HIT_TITLE_CAP));
    }

    #[test]
    fn test_evaluate_does_not_reorder_rules() {
        let mut rules = vec![Rule::new("z", "z", "z", ""), Rule::new("a", "a", "a", "")];
        let matchers = compiled(&mut rules);
        let before = rules.clone();
        let hits = evaluate(&rules, &matchers, &["a", "a", "z"]);
        assert_eq!(rules, before);
        let keys: Vec<_> = hits.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_preview_render() {
        let mut rules = vec![
            Rule::new("tail", "tail_number", r"\d{2}$", ""),
            Rule::new("broken", "Broken", "(abc", ""),
        ];
        let matchers = compiled(&mut rules);
        let view = preview(&rules, &matchers, &["Show 01", "Clean"]);
        let rendered = view.render().replace(&rules[1].error, "<diagnostic>");
        insta::assert_snapshot!(rendered, @r"
        Show 01 -> tail_number
        Clean

        [ERROR]
        - Broken: <diagnostic>
        ");
    }

    #[test]
    fn test_preview_is_bounded() {
        let rules: Vec<Rule> = Vec::new();
        let titles = vec!["t".to_string(); 1000];
        let view = preview(&rules, &Vec::new(), &titles);
        assert_eq!(view.lines.len(), PREVIEW_LINES);
        assert!(view.lines.iter().all(|l| l.rule_name.is_none()));
    }

    proptest! {
        #[test]
        fn prop_hits_never_exceed_titles(
            titles in proptest::collection::vec("[a-c0-9 ]{0,8}", 0..60),
            patterns in proptest::collection::vec(prop_oneof![
                Just("a".to_string()),
                Just(r"\d".to_string()),
                Just("^b".to_string()),
                Just("c$".to_string()),
                Just("(".to_string()),
            ], 0..6),
        ) {
            let mut rules: Vec<Rule> = patterns
                .iter()
                .enumerate()
                .map(|(i, p)| Rule::new(format!("r{}", i), format!("r{}", i), p.clone(), ""))
                .collect();
            let matchers = compiled(&mut rules);
            let hits = evaluate(&rules, &matchers, &titles);
            prop_assert!(hits.total() <= titles.len());

            // Each matched title is credited to its earliest matching rule.
            let mut expected = vec![0usize; rules.len()];
            for t in &titles {
                if let Some(i) = rules.iter().zip(&matchers).position(|(_, m)| {
                    m.as_ref().map(|m| m.is_match(t)).unwrap_or(false)
                }) {
                    expected[i] += 1;
                }
            }
            let actual: Vec<usize> = hits.iter().map(|(_, n)| n).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
