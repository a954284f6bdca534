//! Defines the central, mutable state of one workshop session.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::core::error::{CoreError, CoreResult};
use crate::core::{
    engine, rule_pack, seeds, workspace, CompiledRules, HitCounts, PatternCompiler, Preview,
    ScopeContext, Workspace,
};

/// Holds the complete, mutable state of the rule-building session.
///
/// The workspace is an explicit value owned by this struct. Whoever holds
/// `&mut WorkshopState` has editing rights; changes reach disk only through
/// [`WorkshopState::save_workspace`].
pub struct WorkshopState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// The workspace being edited.
    pub workspace: Workspace,
    /// Where the workspace is loaded from and saved to.
    pub workspace_path: PathBuf,
    /// Default target for rule pack import/export.
    pub rules_pack_path: PathBuf,
    /// The scope currently selected for viewing and editing.
    pub scope_context: ScopeContext,
    /// Matchers aligned with `workspace.rules`, refreshed by [`Self::recompute`].
    pub compiled: CompiledRules,
    /// Hit counts from the last [`Self::recompute`].
    pub hits: HitCounts,
    /// A short, human readable description of the last action.
    pub status_message: String,
    compiler: PatternCompiler,
}

impl WorkshopState {
    /// Creates a session around an in-memory workspace.
    pub fn new(config: AppConfig, workspace: Workspace, workspace_path: PathBuf) -> Self {
        let rules_pack_path = config.rules_pack_path.clone();
        let mut state = Self {
            config,
            workspace,
            workspace_path,
            rules_pack_path,
            scope_context: ScopeContext::default(),
            compiled: Vec::new(),
            hits: HitCounts::default(),
            status_message: "Ready.".to_string(),
            compiler: PatternCompiler::new(),
        };
        state.recompute();
        state
    }

    /// Opens (or creates) the workspace at `workspace_path`.
    ///
    /// A workspace without rules imports the rule pack at `rules_pack_path`
    /// when one exists, and is otherwise seeded with the starter rules if the
    /// configuration asks for it.
    pub fn open(
        config: AppConfig,
        workspace_path: &Path,
        rules_pack_path: &Path,
    ) -> CoreResult<Self> {
        let workspace = workspace::load_or_create(workspace_path)?;
        let mut state = Self::new(config, workspace, workspace_path.to_path_buf());
        state.rules_pack_path = rules_pack_path.to_path_buf();

        if state.workspace.rules.is_empty() {
            match rule_pack::load(rules_pack_path) {
                Ok(rules) => state.workspace.rules = rules,
                Err(CoreError::NotFound(_)) => {
                    tracing::debug!("No rule pack at {:?}; starting fresh", rules_pack_path)
                }
                Err(e) => tracing::warn!("Could not read rule pack {:?}: {}", rules_pack_path, e),
            }
        }
        if state.workspace.rules.is_empty() && state.config.seed_empty_workspace {
            let words = state.workspace.ignore.effective_for_genre(&state.workspace.genre);
            let added = seeds::add_missing(&mut state.workspace.rules, &words);
            tracing::info!("Seeded {} starter rule(s)", added);
        }

        state.recompute();
        Ok(state)
    }

    /// Recompiles every rule and recounts hits against the sample titles.
    pub fn recompute(&mut self) {
        self.compiled = self.compiler.compile_all(&mut self.workspace.rules);
        self.hits = engine::evaluate(
            &self.workspace.rules,
            &self.compiled,
            &self.workspace.sample_titles,
        );
    }

    /// The "explain my matches" preview for the current rules.
    pub fn preview(&self) -> Preview {
        engine::preview(
            &self.workspace.rules,
            &self.compiled,
            &self.workspace.sample_titles,
        )
    }

    /// Writes the workspace to `workspace_path`.
    pub fn save_workspace(&self) -> CoreResult<()> {
        workspace::save(&self.workspace_path, &self.workspace)
    }

    /// Replaces the in-memory workspace with the one on disk.
    pub fn reload_workspace(&mut self) -> CoreResult<()> {
        self.workspace = workspace::load(&self.workspace_path)?;
        self.sync_scope_genre();
        self.recompute();
        Ok(())
    }

    /// Switches to another workspace file, creating it if necessary.
    pub fn open_workspace(&mut self, path: &Path) -> CoreResult<()> {
        self.workspace = workspace::load_or_create(path)?;
        self.workspace_path = path.to_path_buf();
        self.sync_scope_genre();
        self.recompute();
        Ok(())
    }

    /// Position of the rule with `key` in the collection.
    pub fn rule_index(&self, key: &str) -> CoreResult<usize> {
        self.workspace
            .rules
            .iter()
            .position(|r| r.key == key)
            .ok_or_else(|| CoreError::RuleNotFound(key.to_string()))
    }

    /// Keeps a genre context pointing at the workspace's selected genre.
    pub(crate) fn sync_scope_genre(&mut self) {
        if let ScopeContext::Genre(genre) = &mut self.scope_context {
            genre.clone_from(&self.workspace.genre);
        }
    }
}
