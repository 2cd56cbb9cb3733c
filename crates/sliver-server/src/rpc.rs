//! JSON-RPC 2.0 request/response server over stdin/stdout.
//!
//! Each request names a retrieval method and gets back either rendered text
//! (`content`) in the requested format or a structured error. Ambiguity
//! errors carry their candidate lists so the caller can requalify.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use sliver_core::error::{ResolveError, StoreError};
use sliver_core::types::{Language, SymbolKind};
use sliver_engine::indexer::Indexer;
use sliver_engine::markov::SuggestOptions;
use sliver_engine::retrieve::{RetrievalApi, RetrieveError};
use sliver_output::{OutputFormat, OutputFormatter};

#[derive(Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    params: Option<Value>,
    id: Option<Value>,
}

#[derive(Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

#[derive(Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

const CODE_METHOD_NOT_FOUND: i64 = -32601;
const CODE_INVALID_PARAMS: i64 = -32602;
const CODE_NOT_FOUND: i64 = -32001;
const CODE_AMBIGUOUS: i64 = -32002;
const CODE_STORE: i64 = -32000;

pub struct RpcServer {
    indexer: Arc<Indexer>,
    api: RetrievalApi,
}

impl RpcServer {
    pub fn new(indexer: Arc<Indexer>) -> Self {
        let api = RetrievalApi::new(indexer.store(), indexer.config().markov.clone());
        RpcServer { indexer, api }
    }

    /// Serve until stdin closes. One request per line, one response per line.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> std::io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            serde_json::to_writer(&mut output, &response)?;
            output.write_all(b"\n")?;
            output.flush()?;
        }
        Ok(())
    }

    fn handle_line(&self, line: &str) -> JsonRpcResponse {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return error_response(
                    Value::Null,
                    CODE_INVALID_PARAMS,
                    format!("malformed request: {e}"),
                    None,
                );
            }
        };
        let id = request.id.clone().unwrap_or(Value::Null);
        debug!("rpc {}", request.method);

        let params = request.params.unwrap_or_else(|| json!({}));
        match self.dispatch(&request.method, &params) {
            Ok(result) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                result: Some(result),
                error: None,
                id,
            },
            Err(e) => {
                let (code, data) = classify(&e);
                error_response(id, code, e.to_string(), data)
            }
        }
    }

    fn dispatch(&self, method: &str, params: &Value) -> Result<Value, RpcError> {
        let format = params
            .get("format")
            .and_then(Value::as_str)
            .map(|f| OutputFormat::parse(f).ok_or(RpcError::BadFormat(f.to_string())))
            .transpose()?
            .unwrap_or_default();
        let formatter = format.formatter();

        let content = match method {
            "search_symbols" => {
                let query = required_str(params, "query")?;
                let kind = params
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(SymbolKind::parse);
                let language = params
                    .get("language")
                    .and_then(Value::as_str)
                    .and_then(Language::parse);
                let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(20) as usize;
                let offset = params.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
                let results = self
                    .api
                    .search_symbols(query, kind, language, limit, offset)?;
                formatter.format_search(&results)
            }
            "get_function" => {
                let detail = self
                    .api
                    .get_function(required_str(params, "file")?, required_str(params, "name")?)?;
                formatter.format_function(&detail)
            }
            "get_class" => {
                let detail = self
                    .api
                    .get_class(required_str(params, "file")?, required_str(params, "name")?)?;
                formatter.format_class(&detail)
            }
            "find_references" => {
                let result = self.api.find_references(required_str(params, "name")?)?;
                formatter.format_references(&result)
            }
            "trace_calls" => {
                let depth = params.get("depth").and_then(Value::as_u64).unwrap_or(2) as u32;
                let trace = self
                    .api
                    .trace_calls(required_str(params, "function")?, depth)?;
                formatter.format_trace(&trace)
            }
            "get_related_context" => {
                let context = self
                    .api
                    .get_related_context(required_str(params, "name")?)?;
                formatter.format_related(&context)
            }
            "get_architecture_overview" => {
                let focus = params.get("focus").and_then(Value::as_str);
                let overview = self.api.get_architecture_overview(focus)?;
                formatter.format_overview(&overview)
            }
            "suggest_related" => {
                let name = required_str(params, "name")?;
                let mut options =
                    SuggestOptions::from_config(&self.indexer.config().markov);
                if let Some(depth) = params.get("depth").and_then(Value::as_u64) {
                    options.depth = depth as u32;
                }
                if let Some(min) = params.get("min_probability").and_then(Value::as_f64) {
                    options.min_probability = min;
                }
                if let Some(max) = params.get("max_results").and_then(Value::as_u64) {
                    options.max_results = max as usize;
                }
                let response = self.api.suggest_related(name, Some(options))?;
                formatter.format_suggestions(&response)
            }
            "list_files" => formatter.format_files(&self.api.list_files()?),
            "get_config_entries" => {
                let entries = self.api.get_config_entries(
                    params.get("file").and_then(Value::as_str),
                    params.get("prefix").and_then(Value::as_str),
                    params.get("query").and_then(Value::as_str),
                )?;
                formatter.format_config_entries(&entries)
            }
            "dependencies" => {
                let deps = self.api.dependencies(required_str(params, "file")?)?;
                return Ok(json!({ "files": deps }));
            }
            "dependents" => {
                let deps = self.api.dependents(required_str(params, "file")?)?;
                return Ok(json!({ "files": deps }));
            }
            "sync_index" => {
                let files: Vec<PathBuf> = params
                    .get("files")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(PathBuf::from)
                            .collect()
                    })
                    .unwrap_or_default();
                let totals = self
                    .indexer
                    .sync_index(&files)
                    .map_err(|e| RpcError::Index(e.to_string()))?;
                formatter.format_index_totals(&totals)
            }
            "stats" => formatter.format_stats(&self.api.stats()?),
            other => return Err(RpcError::UnknownMethod(other.to_string())),
        };

        Ok(json!({ "content": content }))
    }
}

#[derive(Debug, thiserror::Error)]
enum RpcError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("missing required parameter '{0}'")]
    MissingParam(&'static str),

    #[error("unknown format '{0}' (expected compact, markdown, or json)")]
    BadFormat(String),

    #[error("index error: {0}")]
    Index(String),

    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
}

fn required_str<'a>(params: &'a Value, key: &'static str) -> Result<&'a str, RpcError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or(RpcError::MissingParam(key))
}

fn classify(error: &RpcError) -> (i64, Option<Value>) {
    match error {
        RpcError::UnknownMethod(_) => (CODE_METHOD_NOT_FOUND, None),
        RpcError::MissingParam(_) | RpcError::BadFormat(_) => (CODE_INVALID_PARAMS, None),
        RpcError::Index(_) => (CODE_STORE, None),
        RpcError::Retrieve(retrieve) => match retrieve {
            RetrieveError::Store(StoreError::NotFound(_)) => (CODE_NOT_FOUND, None),
            RetrieveError::Store(StoreError::Ambiguous { candidates, .. }) => (
                CODE_AMBIGUOUS,
                Some(json!({ "candidates": candidates })),
            ),
            RetrieveError::Resolve(ResolveError::NotFound(_)) => (CODE_NOT_FOUND, None),
            RetrieveError::Resolve(ResolveError::Ambiguous { candidates, .. }) => (
                CODE_AMBIGUOUS,
                Some(json!({ "candidates": candidates })),
            ),
            _ => (CODE_STORE, None),
        },
    }
}

fn error_response(id: Value, code: i64, message: String, data: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(JsonRpcError {
            code,
            message,
            data,
        }),
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sliver_core::config::SliverConfig;
    use sliver_core::store::SymbolStore;
    use std::fs;
    use std::sync::Mutex;

    fn server_over(dir: &std::path::Path) -> RpcServer {
        let store = SymbolStore::in_memory().unwrap();
        let indexer = Indexer::new(dir, SliverConfig::default(), Arc::new(Mutex::new(store)));
        indexer.index_directory(None).unwrap();
        RpcServer::new(Arc::new(indexer))
    }

    fn call(server: &RpcServer, method: &str, params: Value) -> Value {
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let response = server.handle_line(&request.to_string());
        serde_json::to_value(&response).unwrap()
    }

    #[test]
    fn test_search_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "export function greet() {\n  return 1;\n}\n")
            .unwrap();
        let server = server_over(dir.path());

        let response = call(&server, "search_symbols", json!({ "query": "greet" }));
        let content = response["result"]["content"].as_str().unwrap();
        assert!(content.starts_with("[SYMBOLS]"));
        assert!(content.contains("greet"));
    }

    #[test]
    fn test_markdown_format_option() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "export function greet() {\n  return 1;\n}\n")
            .unwrap();
        let server = server_over(dir.path());

        let response = call(
            &server,
            "search_symbols",
            json!({ "query": "greet", "format": "markdown" }),
        );
        let content = response["result"]["content"].as_str().unwrap();
        assert!(content.starts_with("## Symbols"));
    }

    #[test]
    fn test_ambiguous_error_carries_candidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("r.ts"),
            "class A {\n  go() {\n    return 1;\n  }\n}\nclass B {\n  go() {\n    return 2;\n  }\n}\n",
        )
        .unwrap();
        let server = server_over(dir.path());

        let response = call(&server, "get_function", json!({ "file": "r.ts", "name": "go" }));
        assert_eq!(response["error"]["code"], CODE_AMBIGUOUS);
        let candidates = response["error"]["data"]["candidates"].as_array().unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_unknown_method() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "function x() {}\n").unwrap();
        let server = server_over(dir.path());

        let response = call(&server, "does_not_exist", json!({}));
        assert_eq!(response["error"]["code"], CODE_METHOD_NOT_FOUND);
    }

    #[test]
    fn test_sync_index_forces_reindex() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "function x() {\n  return 1;\n}\n").unwrap();
        let server = server_over(dir.path());

        let response = call(
            &server,
            "sync_index",
            json!({ "files": [file.to_string_lossy()] }),
        );
        let content = response["result"]["content"].as_str().unwrap();
        assert!(content.starts_with("[INDEX]"));
    }
}
