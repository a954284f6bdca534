//! The rule evaluation and scoping engine.

pub mod compiler;
pub mod engine;
pub mod error;
pub mod ignore;
pub mod materials;
pub mod prompt;
pub mod rule;
pub mod rule_pack;
pub mod scope;
pub mod search;
pub mod seeds;
pub mod workspace;

pub use compiler::{CompiledRules, PatternCompiler};
pub use engine::{evaluate, first_match, preview, HitCounts, Preview, PreviewLine, RuleError};
pub use error::{CoreError, CoreResult};
pub use ignore::IgnoreWords;
pub use materials::ExampleList;
pub use rule::{Rule, RuleRecord, Scope};
pub use scope::ScopeContext;
pub use workspace::Workspace;
