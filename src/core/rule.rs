//! The rule data model and its serialized record form.
//!
//! [`Rule`] is the in-memory representation used by the compiler, the scope
//! resolver and the match engine. [`RuleRecord`] is the shape written to and
//! read from workspace and rule pack documents. Records are parsed leniently
//! (nulls and missing fields fall back to defaults) and converted into rules
//! exactly once, at load time.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Provenance tag for rules created inside the workshop.
pub const DEFAULT_SOURCE: &str = "WORKSHOP";
/// Display name used when a record carries none.
pub const DEFAULT_RULE_NAME: &str = "rule";

/// Regex flag bits understood by the compiler.
///
/// The values match the flag integers found in existing documents.
pub mod flags {
    pub const IGNORE_CASE: u32 = 2;
    pub const MULTI_LINE: u32 = 8;
    pub const DOT_ALL: u32 = 16;
    pub const UNICODE: u32 = 32;
    pub const VERBOSE: u32 = 64;
}

/// The visibility/applicability tier of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scope {
    /// Scratch rules, cleared in bulk.
    #[serde(rename = "TMP")]
    Temporary,
    /// Applies regardless of genre.
    #[default]
    #[serde(rename = "__global__")]
    Global,
    /// Applies only when the active genre matches `apply_genre`.
    #[serde(rename = "__genre__")]
    Genre,
}

impl Scope {
    pub const TEMPORARY_TAG: &'static str = "TMP";
    pub const GLOBAL_TAG: &'static str = "__global__";
    pub const GENRE_TAG: &'static str = "__genre__";

    /// The tag used for this scope in persisted documents.
    pub fn tag(self) -> &'static str {
        match self {
            Scope::Temporary => Self::TEMPORARY_TAG,
            Scope::Global => Self::GLOBAL_TAG,
            Scope::Genre => Self::GENRE_TAG,
        }
    }

    /// Parses a persisted scope tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            Self::TEMPORARY_TAG => Some(Scope::Temporary),
            Self::GLOBAL_TAG => Some(Scope::Global),
            Self::GENRE_TAG => Some(Scope::Genre),
            _ => None,
        }
    }
}

/// A single named regex rule with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Stable identifier, unique within its collection.
    pub key: String,
    pub name: String,
    pub pattern: String,
    /// Human-readable rationale.
    pub why: String,
    pub enabled: bool,
    /// Bitmask of [`flags`] passed to the regex engine.
    pub flags: u32,
    /// Who or what created the rule.
    pub source: String,
    /// Last compile diagnostic. Empty when the pattern compiles.
    pub error: String,
    /// Free-form genre tags, independent of `scope`.
    pub genres: Option<Vec<String>>,
    pub scope: Scope,
    /// Non-empty only when `scope` is [`Scope::Genre`].
    pub apply_genre: String,
}

impl Rule {
    /// Creates an enabled, global rule with workshop provenance.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        pattern: impl Into<String>,
        why: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            pattern: pattern.into(),
            why: why.into(),
            enabled: true,
            flags: 0,
            source: DEFAULT_SOURCE.to_string(),
            error: String::new(),
            genres: None,
            scope: Scope::Global,
            apply_genre: String::new(),
        }
    }

    /// Builder-style helper to place the rule in a scope.
    pub fn with_scope(mut self, scope: Scope, apply_genre: &str) -> Self {
        self.scope = scope;
        self.apply_genre = apply_genre.to_string();
        self.normalize_scope();
        self
    }

    /// Restores the scope/genre invariant.
    ///
    /// A genre-scoped rule without a genre falls back to global; other scopes
    /// never carry a genre. Returns `true` if anything changed.
    pub fn normalize_scope(&mut self) -> bool {
        match self.scope {
            Scope::Genre if self.apply_genre.trim().is_empty() => {
                tracing::warn!(
                    "Rule '{}' is genre-scoped without a genre; treating it as global",
                    self.key
                );
                self.scope = Scope::Global;
                self.apply_genre.clear();
                true
            }
            Scope::Temporary | Scope::Global if !self.apply_genre.is_empty() => {
                self.apply_genre.clear();
                true
            }
            _ => false,
        }
    }

    /// Converts a persisted record into a rule.
    ///
    /// `index` is the record's position and is used to synthesize a key when
    /// the record has none.
    pub fn from_record(record: RuleRecord, index: usize) -> Self {
        let key = non_empty_or(record.key, || format!("R_{}", index));
        let scope = match record.scope.as_deref() {
            None | Some("") => Scope::Global,
            Some(tag) => Scope::from_tag(tag).unwrap_or_else(|| {
                tracing::warn!("Unknown scope tag '{}' on rule '{}'; using global", tag, key);
                Scope::Global
            }),
        };
        let flags = u32::try_from(record.flags).unwrap_or_else(|_| {
            tracing::warn!("Flags {} on rule '{}' are out of range; using 0", record.flags, key);
            0
        });
        let genres = record
            .genres
            .map(|gs| {
                gs.into_iter()
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|gs| !gs.is_empty());

        let mut rule = Self {
            key,
            name: non_empty_or(record.name, || DEFAULT_RULE_NAME.to_string()),
            pattern: record.pattern,
            why: record.why,
            enabled: record.enabled,
            flags,
            source: non_empty_or(record.source, || DEFAULT_SOURCE.to_string()),
            error: record.error,
            genres,
            scope,
            apply_genre: record.apply_genre,
        };
        rule.normalize_scope();
        rule
    }

    /// Converts the rule into its minimal persisted form.
    pub fn to_record(&self) -> RuleRecord {
        RuleRecord {
            key: self.key.clone(),
            name: self.name.clone(),
            pattern: self.pattern.clone(),
            why: self.why.clone(),
            enabled: self.enabled,
            flags: i64::from(self.flags),
            source: self.source.clone(),
            genres: self.genres.clone().filter(|gs| !gs.is_empty()),
            scope: match self.scope {
                Scope::Global => None,
                other => Some(other.tag().to_string()),
            },
            apply_genre: self.apply_genre.clone(),
            error: self.error.clone(),
        }
    }
}

fn non_empty_or(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.trim().is_empty() {
        fallback()
    } else {
        value
    }
}

/// The serialized form of a [`Rule`].
///
/// Optional fields are omitted when empty so exported documents stay minimal.
/// Reading is lenient field by field: a value of the wrong type is coerced
/// where the intent is clear (`"2"` or `2.0` as flags, `7` as a key) and
/// otherwise replaced by the field's default, so one bad field never costs
/// the whole rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pattern: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub why: String,
    #[serde(default = "default_enabled", deserialize_with = "lenient_enabled")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient_flags")]
    pub flags: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(
        default,
        deserialize_with = "lenient_genres",
        skip_serializing_if = "Option::is_none"
    )]
    pub genres: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub scope: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub apply_genre: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub error: String,
}

fn default_enabled() -> bool {
    true
}

/// Renders a scalar as text. Arrays and objects have no sensible text form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).unwrap_or_else(|| {
        if !value.is_null() {
            tracing::warn!("Expected text in rule record, got {}; using empty", value);
        }
        String::new()
    }))
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let text = scalar_text(&value);
    if text.is_none() && !value.is_null() {
        tracing::warn!("Expected text in rule record, got {}; ignoring it", value);
    }
    Ok(text)
}

fn lenient_enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let enabled = match &value {
        Value::Null => Some(true),
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" => Some(true),
            "false" | "0" | "off" => Some(false),
            _ => None,
        },
        Value::Array(_) | Value::Object(_) => None,
    };
    Ok(enabled.unwrap_or_else(|| {
        tracing::warn!("Unrecognized enabled value {} in rule record; keeping the rule on", value);
        true
    }))
}

/// Parses a flags value: integers, integral floats, and their string forms.
pub(crate) fn flags_from_value(value: &Value) -> Option<i64> {
    fn integral(f: f64) -> Option<i64> {
        (f.fract() == 0.0 && f.abs() <= i64::MAX as f64).then_some(f as i64)
    }
    match value {
        Value::Null => Some(0),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0)
            } else {
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_flags<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flags_from_value(&value).unwrap_or_else(|| {
        tracing::warn!("Invalid flags {} in rule record; using 0", value);
        0
    }))
}

fn lenient_genres<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(items) => Ok(Some(items.iter().filter_map(scalar_text).collect())),
        Value::Null => Ok(None),
        other => {
            tracing::warn!("Expected a list of genres in rule record, got {}; dropping it", other);
            Ok(None)
        }
    }
}

/// Converts a list of raw JSON values into rules.
///
/// Entries that are not objects are skipped with a warning. Badly typed fields
/// inside an object fall back to their defaults. Duplicate keys are made unique.
pub fn rules_from_values(values: Vec<Value>) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        if !value.is_object() {
            tracing::warn!("Skipping rule entry {}: not an object", i);
            continue;
        }
        match serde_json::from_value::<RuleRecord>(value) {
            Ok(record) => rules.push(Rule::from_record(record, rules.len())),
            Err(e) => tracing::warn!("Skipping malformed rule entry {}: {}", i, e),
        }
    }
    ensure_unique_keys(&mut rules);
    rules
}

/// Renames rules whose key collides with an earlier rule.
pub fn ensure_unique_keys(rules: &mut [Rule]) {
    let mut seen: HashSet<String> = HashSet::with_capacity(rules.len());
    for i in 0..rules.len() {
        if seen.contains(&rules[i].key) {
            let base = rules[i].key.clone();
            let mut n = 2;
            let mut candidate = format!("{}_{}", base, n);
            while seen.contains(&candidate) || rules.iter().any(|r| r.key == candidate) {
                n += 1;
                candidate = format!("{}_{}", base, n);
            }
            tracing::warn!("Duplicate rule key '{}' renamed to '{}'", base, candidate);
            rules[i].key = candidate;
        }
        seen.insert(rules[i].key.clone());
    }
}

/// Returns `base` if no rule uses it yet, otherwise the first free `base_<n>`.
pub fn unique_key(rules: &[Rule], base: &str) -> String {
    let taken = |k: &str| rules.iter().any(|r| r.key == k);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
