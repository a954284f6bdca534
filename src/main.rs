//! Title Workshop command line front end.
//!
//! Usage:
//!     title-workshop --workspace ./workspace.json hits
//!     title-workshop promote tail_number --genre
//!     title-workshop keep "Show 01" && title-workshop prompt

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use title_workshop::app::{self, commands, events::UserEvent, proxy::EventProxy, state::WorkshopState};
use title_workshop::config::{settings, AppConfig};
use title_workshop::core::search::{build_search_key, build_search_url};
use title_workshop::core::{ExampleList, Scope, ScopeContext};

#[derive(Parser, Debug)]
#[command(name = "title-workshop", version, about = "Grow and test regex rules for cleaning titles")]
struct Cli {
    /// Workspace file (defaults to the configured one)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Rule pack file used for import and export
    #[arg(long, global = true)]
    rules_pack: Option<PathBuf>,

    /// Alternative configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scope to list rules and ignore words for
    #[arg(long, global = true, value_enum, default_value_t = ScopeArg::Tmp)]
    scope: ScopeArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ScopeArg {
    Tmp,
    Global,
    Genre,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Tmp => Scope::Temporary,
            ScopeArg::Global => Scope::Global,
            ScopeArg::Genre => Scope::Genre,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ListArg {
    Ex,
    Keep,
}

impl From<ListArg> for ExampleList {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Ex => ExampleList::Exclude,
            ListArg::Keep => ExampleList::Keep,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the rules visible in the selected scope with their hit counts
    Hits,
    /// Show which rule claims each sample title
    Preview,
    /// Write the rule collection as a rule pack
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Add the starter rules that are missing
    Seed,
    /// Remove temporary rules and temporary ignore words
    ClearTmp,
    /// Move a rule to the global scope or to the current genre
    Promote(PromoteArgs),
    /// Add ignore words to the selected scope
    Ignore { words: Vec<String> },
    /// Select the workspace genre
    Genre { name: String },
    /// Collect titles with noise to remove (EX)
    Exclude {
        #[arg(required = true)]
        titles: Vec<String>,
    },
    /// Collect titles that must stay unchanged (KEEP)
    Keep {
        #[arg(required = true)]
        titles: Vec<String>,
    },
    /// Remove one title from an example list
    DropExample {
        #[arg(value_enum)]
        list: ListArg,
        title: String,
    },
    /// Empty both example lists
    ClearExamples,
    /// Print a prompt asking an AI assistant for new rules
    Prompt,
    /// Build a web search URL for a title
    Search {
        title: String,
        #[arg(long)]
        engine: Option<String>,
        /// Open the URL in the default browser
        #[arg(long)]
        open: bool,
        /// Use the title as typed, without normalizing it into a search key
        #[arg(long)]
        raw: bool,
    },
    /// Read JSON command messages from stdin, one per line, and print snapshots
    Session,
}

#[derive(Args, Debug)]
struct PromoteArgs {
    key: String,
    #[arg(long, conflicts_with = "genre", required_unless_present = "genre")]
    global: bool,
    #[arg(long)]
    genre: bool,
}

/// Prints session events to the terminal.
#[derive(Clone)]
struct ConsoleProxy {
    json: bool,
}

impl EventProxy for ConsoleProxy {
    fn send_event(&self, event: UserEvent) {
        match event {
            UserEvent::WorkspaceChanged(view) => {
                if self.json {
                    match serde_json::to_string(&view) {
                        Ok(line) => println!("{}", line),
                        Err(e) => tracing::error!("Failed to serialize snapshot: {}", e),
                    }
                }
            }
            UserEvent::ShowError(msg) => eprintln!("error: {}", msg),
            UserEvent::SaveComplete(ok, path) => {
                tracing::info!("Save {} ({})", if ok { "done" } else { "failed" }, path.display())
            }
            UserEvent::RulePackExported(ok, path) => {
                if ok {
                    eprintln!("Exported rule pack to {}", path.display());
                }
            }
            UserEvent::PromptReady(text) => {
                if self.json {
                    println!("{}", serde_json::json!({ "prompt": text }));
                } else {
                    println!("{}", text);
                }
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "title_workshop=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => settings::load_config(Some(path.as_path()))?,
        None => AppConfig::load()?,
    };

    // Search does not touch the workspace.
    if let Command::Search { title, engine, open, raw } = &cli.command {
        return search(&config, title, engine.as_deref(), *open, *raw);
    }

    let workspace_path = cli.workspace.clone().unwrap_or_else(|| config.workspace_path.clone());
    let rules_pack_path = cli.rules_pack.clone().unwrap_or_else(|| config.rules_pack_path.clone());
    let mut state = WorkshopState::open(config, &workspace_path, &rules_pack_path)
        .with_context(|| format!("Failed to open workspace {}", workspace_path.display()))?;
    state.scope_context = ScopeContext::for_scope(cli.scope.into(), &state.workspace.genre);

    let proxy = ConsoleProxy { json: false };
    // (mutates the workspace, succeeded)
    let (mutated, ok) = match cli.command {
        Command::Hits => {
            print_hits(&state);
            (false, true)
        }
        Command::Preview => {
            println!("{}", state.preview().render());
            (false, true)
        }
        Command::Export { out } => (false, commands::export_rule_pack(out, proxy.clone(), &mut state)),
        Command::Seed => (true, commands::add_starter_rules(proxy.clone(), &mut state)),
        Command::ClearTmp => (true, commands::clear_temporary_scope(proxy.clone(), &mut state)),
        Command::Promote(args) => {
            let ok = if args.global {
                commands::promote_to_global(args.key, proxy.clone(), &mut state)
            } else {
                commands::promote_to_genre(args.key, proxy.clone(), &mut state)
            };
            (true, ok)
        }
        Command::Ignore { words } => (true, commands::add_ignore_words(words.join(" "), proxy.clone(), &mut state)),
        Command::Genre { name } => {
            if !state.config.genres.iter().any(|g| g == &name) {
                tracing::warn!("Genre '{}' is not one of the configured genres", name);
            }
            (true, commands::set_genre(name, proxy.clone(), &mut state))
        }
        Command::Exclude { titles } => (true, commands::add_exclude_examples(titles, proxy.clone(), &mut state)),
        Command::Keep { titles } => (true, commands::add_keep_examples(titles, proxy.clone(), &mut state)),
        Command::DropExample { list, title } => {
            (true, commands::remove_example(list.into(), title, proxy.clone(), &mut state))
        }
        Command::ClearExamples => (true, commands::clear_examples(proxy.clone(), &mut state)),
        Command::Prompt => (false, commands::build_ai_prompt(proxy.clone(), &mut state)),
        Command::Session => {
            run_session(&mut state)?;
            (false, true)
        }
        Command::Search { .. } => (false, true),
    };

    if !ok {
        bail!("{}", state.status_message);
    }
    if mutated {
        println!("{}", state.status_message);
        if !commands::save_workspace(proxy, &mut state) {
            bail!("{}", state.status_message);
        }
    }
    Ok(())
}

fn print_hits(state: &WorkshopState) {
    let rows = app::view_model::rule_rows(state);
    if rows.is_empty() {
        println!("No rules in scope {}.", state.scope_context.label());
        return;
    }
    for row in rows {
        let mark = if row.enabled { "on " } else { "off" };
        println!(
            "{:>5}  {}  {:<14} {:<24} {}",
            row.hits, mark, row.scope, row.name, row.pattern
        );
        if !row.error.is_empty() {
            println!("       ! {}", row.error);
        }
    }
    println!("{} of {} title(s) matched", state.hits.total(), state.workspace.sample_titles.len());
}

fn search(config: &AppConfig, title: &str, engine: Option<&str>, launch: bool, raw: bool) -> Result<()> {
    let Some((name, template)) = config.engine_template(engine) else {
        bail!("No search engines configured");
    };
    let query = if raw { title.trim().to_string() } else { build_search_key(title) };
    let url = build_search_url(template, &query)?;
    tracing::debug!("Search via {}: {}", name, url);
    println!("{}", url);
    if launch {
        open::that(&url).with_context(|| format!("Failed to open {}", url))?;
    }
    Ok(())
}

fn run_session(state: &mut WorkshopState) -> Result<()> {
    let proxy = ConsoleProxy { json: true };
    commands::refresh(proxy.clone(), state);
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        app::handle_ipc_message(&line, proxy.clone(), state);
        io::stdout().flush()?;
    }
    Ok(())
}
