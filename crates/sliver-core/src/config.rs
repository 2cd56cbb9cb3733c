//! Configuration file loading for sliver.
//!
//! Reads `.sliver/sliver.json` and provides typed access to all settings.
//! Falls back to sensible defaults when the config file is missing or
//! incomplete.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory holding sliver state inside a project root.
pub const SLIVER_DIR: &str = ".sliver";
/// Config file name inside [`SLIVER_DIR`].
pub const CONFIG_FILE: &str = "sliver.json";
/// Database file name inside [`SLIVER_DIR`].
pub const DB_FILE: &str = "index.db";

/// Top-level sliver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliverConfig {
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Files larger than this are skipped with a FILE_TOO_LARGE warning.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Recursion ceiling for nested function extraction.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: u32,
    /// Nested functions shorter than this many lines are not emitted.
    #[serde(default = "default_min_nested_lines")]
    pub min_nested_lines: u32,
    /// Emit `_`-prefixed and `private` members.
    #[serde(default)]
    pub include_private: bool,
    /// Watcher stability interval in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Database path, relative to the project root unless absolute.
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default)]
    pub markov: MarkovConfig,
}

/// Defaults for the Markov suggestion queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkovConfig {
    #[serde(default = "default_markov_depth")]
    pub depth: u32,
    #[serde(default = "default_min_probability")]
    pub min_probability: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for MarkovConfig {
    fn default() -> Self {
        Self {
            depth: default_markov_depth(),
            min_probability: default_min_probability(),
            max_results: default_max_results(),
        }
    }
}

fn default_include() -> Vec<String> {
    [
        "**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx", "**/*.py",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(CONFIG_FILE_NAMES.iter().map(|n| format!("**/{n}")))
    .collect()
}

fn default_exclude() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/dist/**",
        "**/build/**",
        "**/.git/**",
        "**/venv/**",
        "**/__pycache__/**",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Configuration files indexed by default, alongside the source globs.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "package.json",
    "tsconfig.json",
    "jsconfig.json",
    "pyproject.toml",
    "Cargo.toml",
    ".eslintrc.json",
    "docker-compose.yml",
    "docker-compose.yaml",
];

fn default_max_file_size() -> u64 {
    1024 * 1024
}

fn default_max_nesting_depth() -> u32 {
    3
}

fn default_min_nested_lines() -> u32 {
    3
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_markov_depth() -> u32 {
    2
}

fn default_min_probability() -> f64 {
    0.05
}

fn default_max_results() -> usize {
    20
}

impl Default for SliverConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            max_file_size_bytes: default_max_file_size(),
            max_nesting_depth: default_max_nesting_depth(),
            min_nested_lines: default_min_nested_lines(),
            include_private: false,
            debounce_ms: default_debounce_ms(),
            db_path: None,
            markov: MarkovConfig::default(),
        }
    }
}

impl SliverConfig {
    /// Load configuration from `<root>/.sliver/sliver.json`.
    ///
    /// A missing file yields defaults; malformed JSON is an error so a typo
    /// does not silently revert the project to defaults.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(SLIVER_DIR).join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| ConfigError::Malformed {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Resolve the database path for a project root.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        match &self.db_path {
            Some(p) => {
                let p = Path::new(p);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    root.join(p)
                }
            }
            None => root.join(SLIVER_DIR).join(DB_FILE),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config {path} is malformed: {message}")]
    Malformed { path: String, message: String },

    #[error("config {path} unreadable: {message}")]
    Io { path: String, message: String },
}
