//! sliver CLI — lazy-loading code intelligence for LLM agents.
//!
//! `sliver index <path>` runs the full pipeline; `sliver serve` exposes the
//! retrieval API over stdio; `sliver watch` keeps the index current. The
//! remaining subcommands are direct retrieval queries.
//!
//! Exit codes: 0 success, 1 unrecoverable error, 2 argument error (from the
//! argument parser).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cli_args;

use cli_args::{Cli, Commands};

use sliver_core::config::SliverConfig;
use sliver_core::types::{Language, SymbolKind};
use sliver_engine::indexer::Indexer;
use sliver_engine::markov::SuggestOptions;
use sliver_engine::retrieve::RetrievalApi;
use sliver_output::OutputFormat;
use sliver_server::rpc::RpcServer;
use sliver_server::watcher;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(format) = OutputFormat::parse(&cli.format) else {
        eprintln!("unknown format '{}' (expected compact, markdown, or json)", cli.format);
        return ExitCode::from(2);
    };

    match run(cli, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            eprintln!("sliver: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, format: OutputFormat) -> Result<(), String> {
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(
            *shell,
            &mut Cli::command(),
            "sliver",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let indexer = open_indexer(&root)?;
    let formatter = format.formatter();

    match cli.command {
        Commands::Index { path } => {
            let target = path.unwrap_or_else(|| root.clone());
            let indexer = if target == root {
                indexer
            } else {
                open_indexer(&target)?
            };
            let totals = indexer
                .index_directory(None)
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_index_totals(&totals));
            Ok(())
        }
        Commands::Serve => {
            let server = RpcServer::new(Arc::new(indexer));
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            server
                .run(stdin.lock(), stdout.lock())
                .map_err(|e| e.to_string())
        }
        Commands::Watch { path } => {
            let target = path.unwrap_or_else(|| root.clone());
            let indexer = if target == root {
                indexer
            } else {
                open_indexer(&target)?
            };
            run_watch(indexer)
        }
        Commands::Search {
            query,
            kind,
            language,
            limit,
            offset,
        } => {
            let api = api_for(&indexer);
            let kind = match kind {
                Some(k) => Some(SymbolKind::parse(&k).ok_or(format!("unknown symbol kind '{k}'"))?),
                None => None,
            };
            let language = match language {
                Some(l) => Some(Language::parse(&l).ok_or(format!("unknown language '{l}'"))?),
                None => None,
            };
            let results = api
                .search_symbols(&query, kind, language, limit, offset)
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_search(&results));
            Ok(())
        }
        Commands::Function { file, name } => {
            let detail = api_for(&indexer)
                .get_function(&file, &name)
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_function(&detail));
            Ok(())
        }
        Commands::Class { file, name } => {
            let detail = api_for(&indexer)
                .get_class(&file, &name)
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_class(&detail));
            Ok(())
        }
        Commands::References { name } => {
            let result = api_for(&indexer)
                .find_references(&name)
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_references(&result));
            Ok(())
        }
        Commands::Trace { function, depth } => {
            let trace = api_for(&indexer)
                .trace_calls(&function, depth)
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_trace(&trace));
            Ok(())
        }
        Commands::Related { name } => {
            let context = api_for(&indexer)
                .get_related_context(&name)
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_related(&context));
            Ok(())
        }
        Commands::Overview { focus } => {
            let overview = api_for(&indexer)
                .get_architecture_overview(focus.as_deref())
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_overview(&overview));
            Ok(())
        }
        Commands::Suggest {
            name,
            depth,
            min_probability,
            max_results,
        } => {
            let mut options = SuggestOptions::from_config(&indexer.config().markov);
            if let Some(depth) = depth {
                options.depth = depth;
            }
            if let Some(min) = min_probability {
                options.min_probability = min;
            }
            if let Some(max) = max_results {
                options.max_results = max;
            }
            let response = api_for(&indexer)
                .suggest_related(&name, Some(options))
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_suggestions(&response));
            Ok(())
        }
        Commands::Files => {
            let files = api_for(&indexer).list_files().map_err(|e| e.to_string())?;
            print!("{}", formatter.format_files(&files));
            Ok(())
        }
        Commands::ConfigEntries { file, prefix, query } => {
            let entries = api_for(&indexer)
                .get_config_entries(file.as_deref(), prefix.as_deref(), query.as_deref())
                .map_err(|e| e.to_string())?;
            print!("{}", formatter.format_config_entries(&entries));
            Ok(())
        }
        Commands::Stats => {
            let stats = api_for(&indexer).stats().map_err(|e| e.to_string())?;
            print!("{}", formatter.format_stats(&stats));
            Ok(())
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}

fn open_indexer(root: &Path) -> Result<Indexer, String> {
    let config = SliverConfig::load(root).map_err(|e| e.to_string())?;
    Indexer::open(root, config).map_err(|e| e.to_string())
}

fn api_for(indexer: &Indexer) -> RetrievalApi {
    RetrievalApi::new(indexer.store(), indexer.config().markov.clone())
}

/// Index once, then watch until interrupted.
fn run_watch(indexer: Indexer) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    runtime.block_on(async {
        let indexer = Arc::new(indexer);
        indexer.index_directory(None).map_err(|e| e.to_string())?;

        let (_os_watcher, mut events) =
            watcher::start_watching(Arc::clone(&indexer)).map_err(|e| e.to_string())?;
        eprintln!("watching {} (ctrl-c to stop)", indexer.root().display());

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(watcher::WatchEvent::Indexed(path)) => {
                            eprintln!("indexed {}", path.display());
                        }
                        Some(watcher::WatchEvent::Removed(path)) => {
                            eprintln!("removed {}", path.display());
                        }
                        Some(watcher::WatchEvent::Skipped(_)) => {}
                        Some(watcher::WatchEvent::Error(message)) => {
                            eprintln!("watch error: {message}");
                        }
                        None => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        Ok(())
    })
}
