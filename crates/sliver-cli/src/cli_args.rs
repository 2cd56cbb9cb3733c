//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sliver",
    version,
    about = "Lazy-loading code intelligence: index a source tree, retrieve only the slivers you need"
)]
pub struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Output format: compact, markdown, or json.
    #[arg(long, global = true, default_value = "compact")]
    pub format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a directory tree.
    Index {
        /// Directory to index; defaults to --root.
        path: Option<PathBuf>,
    },
    /// Serve the retrieval API over stdio (JSON-RPC, one request per line).
    Serve,
    /// Watch a directory and re-index changed files.
    Watch {
        /// Directory to watch; defaults to --root.
        path: Option<PathBuf>,
    },
    /// Search symbols by name, qualified name, or signature.
    Search {
        query: String,
        /// Restrict by symbol kind (function, class, interface, ...).
        #[arg(long = "type")]
        kind: Option<String>,
        /// Restrict by language (typescript, javascript, python, config).
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Show one function from one file.
    Function {
        /// File path hint: absolute, relative, or partial.
        file: String,
        name: String,
    },
    /// Show one class (or interface) from one file.
    Class {
        file: String,
        name: String,
    },
    /// List references to a symbol name, grouped by file.
    References { name: String },
    /// Trace the call graph outward from a function.
    Trace {
        function: String,
        #[arg(long, default_value_t = 2)]
        depth: u32,
    },
    /// Bundle a function's source, callees, and referenced types.
    Related { name: String },
    /// Module-level architecture overview.
    Overview {
        /// Restrict to one module.
        #[arg(long)]
        focus: Option<String>,
    },
    /// Probabilistic related-symbol suggestions.
    Suggest {
        name: String,
        #[arg(long)]
        depth: Option<u32>,
        #[arg(long)]
        min_probability: Option<f64>,
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// List indexed files with parse status.
    Files,
    /// Query configuration entries.
    ConfigEntries {
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    /// Index statistics.
    Stats,
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
