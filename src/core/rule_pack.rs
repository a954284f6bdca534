//! Portable rule packs: the rule collection without any workspace material.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::error::{CoreError, CoreResult};
use super::rule::{rules_from_values, Rule, RuleRecord};
use super::workspace::write_json_atomic;

/// Name written into `meta.name` when none is configured.
pub const DEFAULT_PACK_NAME: &str = "workshop";
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePackMeta {
    pub name: String,
    pub generated_at: String,
}

/// The exported document: `{"meta": {...}, "rules": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePackDocument {
    pub meta: RulePackMeta,
    pub rules: Vec<RuleRecord>,
}

impl RulePackDocument {
    pub fn new(name: &str, generated_at: DateTime<Local>, rules: &[Rule]) -> Self {
        Self {
            meta: RulePackMeta {
                name: name.to_string(),
                generated_at: generated_at.format(GENERATED_AT_FORMAT).to_string(),
            },
            rules: rules.iter().map(Rule::to_record).collect(),
        }
    }
}

/// Accepted input shapes when reading a rule pack back.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RulePackInput {
    Bare(Vec<serde_json::Value>),
    Wrapped {
        #[serde(default)]
        rules: Option<Vec<serde_json::Value>>,
    },
}

/// Serializes `rules` as a rule pack JSON string.
pub fn export_to_string(name: &str, generated_at: DateTime<Local>, rules: &[Rule]) -> CoreResult<String> {
    let document = RulePackDocument::new(name, generated_at, rules);
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Writes `rules` as a rule pack to `path`, timestamped with the current local time.
pub fn export(path: &Path, name: &str, rules: &[Rule]) -> CoreResult<()> {
    let document = RulePackDocument::new(name, Local::now(), rules);
    write_json_atomic(path, &document)?;
    tracing::info!("Exported {} rule(s) to {:?}", rules.len(), path);
    Ok(())
}

/// Parses rules from either a bare array or a `{"rules": [...]}` document.
pub fn parse_rules(content: &str, path: &Path) -> CoreResult<Vec<Rule>> {
    let input: RulePackInput = serde_json::from_str(content).map_err(|source| CoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let values = match input {
        RulePackInput::Bare(values) => values,
        RulePackInput::Wrapped { rules } => rules.unwrap_or_default(),
    };
    Ok(rules_from_values(values))
}

/// Loads the rules of a rule pack.
pub fn load(path: &Path) -> CoreResult<Vec<Rule>> {
    if !path.exists() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
    let rules = parse_rules(&content, path)?;
    tracing::info!("Loaded {} rule(s) from rule pack {:?}", rules.len(), path);
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rule::Scope;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_export_omits_empty_optional_fields() {
        let mut tagged = Rule::new("bracket_tag", "Bracket tag", r"\[.+?\]", "tags");
        tagged.genres = Some(vec!["Comics".to_string()]);
        let rules = vec![
            Rule::new("tail_number", "Tail number", r"\d{2}$", "episode numbers"),
            tagged.with_scope(Scope::Temporary, ""),
        ];

        let json = export_to_string("demo", fixed_time(), &rules).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "meta": {
            "name": "demo",
            "generated_at": "2024-05-01 12:30:00"
          },
          "rules": [
            {
              "key": "tail_number",
              "name": "Tail number",
              "pattern": "\\d{2}$",
              "why": "episode numbers",
              "enabled": true,
              "flags": 0,
              "source": "WORKSHOP"
            },
            {
              "key": "bracket_tag",
              "name": "Bracket tag",
              "pattern": "\\[.+?\\]",
              "why": "tags",
              "enabled": true,
              "flags": 0,
              "source": "WORKSHOP",
              "genres": [
                "Comics"
              ],
              "scope": "TMP"
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_parse_bare_array_and_wrapped() {
        let path = Path::new("pack.json");
        let bare = r#"[{"key": "a", "pattern": "x"}]"#;
        let wrapped = r#"{"meta": {"name": "n", "generated_at": ""}, "rules": [{"key": "a", "pattern": "x"}]}"#;
        let bare_rules = parse_rules(bare, path).unwrap();
        let wrapped_rules = parse_rules(wrapped, path).unwrap();
        assert_eq!(bare_rules, wrapped_rules);
        assert_eq!(bare_rules[0].key, "a");
    }

    #[test]
    fn test_parse_object_without_rules_is_empty() {
        let rules = parse_rules(r#"{"meta": {}}"#, Path::new("p.json")).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_a_parse_error() {
        let err = parse_rules("not json", Path::new("p.json")).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn test_export_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules_pack.json");
        let rules = vec![
            Rule::new("a", "A", "a+", ""),
            Rule::new("b", "B", "b+", "").with_scope(Scope::Genre, "Novels"),
        ];
        export(&path, DEFAULT_PACK_NAME, &rules).unwrap();
        assert_eq!(load(&path).unwrap(), rules);
    }

    #[test]
    fn test_load_missing_pack() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
