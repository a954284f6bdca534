pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::rule_pack::DEFAULT_PACK_NAME;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub workspace_path: PathBuf,
    pub rules_pack_path: PathBuf,
    pub rules_pack_name: String,
    pub genres: Vec<String>,
    pub search_engines: BTreeMap<String, String>,
    pub default_engine: String,
    pub seed_empty_workspace: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// Returns the URL template for `engine`, falling back to the default engine.
    pub fn engine_template(&self, engine: Option<&str>) -> Option<(&str, &str)> {
        let name = engine.unwrap_or(&self.default_engine);
        self.search_engines
            .get_key_value(name)
            .or_else(|| self.search_engines.get_key_value(&self.default_engine))
            .or_else(|| self.search_engines.iter().next())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let genres = ["Comics", "Novels", "Anime", "Games", "Music", "Movies", "Documents"]
            .iter()
            .map(|g| g.to_string())
            .collect();

        let engines = [
            ("Perplexity", "https://www.perplexity.ai/search?q={}"),
            ("ChatGPT", "https://chatgpt.com/?q={}"),
            ("Google", "https://www.google.com/search?q={}"),
            ("YouTube", "https://www.youtube.com/results?search_query={}"),
            ("Wikipedia", "https://en.wikipedia.org/w/index.php?search={}"),
        ];
        let search_engines = engines
            .iter()
            .map(|(name, tpl)| (name.to_string(), tpl.to_string()))
            .collect();

        Self {
            workspace_path: PathBuf::from("workspace.json"),
            rules_pack_path: PathBuf::from("rules_pack.json"),
            rules_pack_name: DEFAULT_PACK_NAME.to_string(),
            genres,
            search_engines,
            default_engine: "Google".to_string(),
            seed_empty_workspace: true,
        }
    }
}
