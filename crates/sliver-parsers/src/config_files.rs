//! Configuration file parser.
//!
//! JSON, YAML, and TOML documents are flattened into dotted-path entries:
//! one row per node, each with its value type, a human rendering, the raw
//! value, and a best-effort line number found by scanning the source text.
//! Recognized config files get a type tag and per-key descriptions from a
//! static schema table.

use std::path::Path;

use serde_json::Value;

use sliver_core::id;
use sliver_core::types::{ConfigEntry, ConfigFormat, Language, ParseWarning, WarningCode};

use crate::parser::{LanguageParser, ParseOptions, ParseOutput};

pub struct ConfigParser;

impl ConfigParser {
    pub fn new() -> Self {
        ConfigParser
    }
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for ConfigParser {
    fn language(&self) -> Language {
        Language::Config
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json", "yaml", "yml", "toml"]
    }

    fn parse(&self, path: &Path, content: &str, _options: &ParseOptions) -> ParseOutput {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        };

        let value = match parse_document(content, format) {
            Ok(v) => v,
            Err(message) => {
                return ParseOutput::warning_only(ParseWarning::new(
                    WarningCode::ParseError,
                    message,
                ));
            }
        };

        let file_path = path.to_string_lossy().replace('\\', "/");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let config_type = config_type_for(&file_name);

        let mut flattener = Flattener {
            file_path: &file_path,
            content,
            format,
            config_type,
            entries: Vec::new(),
        };
        flattener.flatten(&value, "", 0, 1);

        ParseOutput {
            config_entries: flattener.entries,
            ..Default::default()
        }
    }
}

fn parse_document(content: &str, format: ConfigFormat) -> Result<Value, String> {
    match format {
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))
        }
        ConfigFormat::Yaml => {
            let parsed: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| format!("invalid YAML: {e}"))?;
            serde_json::to_value(parsed).map_err(|e| format!("YAML conversion: {e}"))
        }
        ConfigFormat::Toml => {
            let parsed: toml::Value =
                toml::from_str(content).map_err(|e| format!("invalid TOML: {e}"))?;
            serde_json::to_value(parsed).map_err(|e| format!("TOML conversion: {e}"))
        }
    }
}

struct Flattener<'a> {
    file_path: &'a str,
    content: &'a str,
    format: ConfigFormat,
    config_type: Option<&'static str>,
    entries: Vec<ConfigEntry>,
}

impl Flattener<'_> {
    fn flatten(&mut self, value: &Value, path: &str, depth: u32, parent_line: u32) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = join_path(path, key);
                    let line = self.find_line(key, parent_line);
                    self.emit(&child_path, child, depth, path, line);
                    self.flatten(child, &child_path, depth + 1, line);
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    let child_path = join_path(path, &index.to_string());
                    self.emit(&child_path, child, depth, path, parent_line);
                    self.flatten(child, &child_path, depth + 1, parent_line);
                }
            }
            _ => {}
        }
    }

    fn emit(&mut self, key_path: &str, value: &Value, depth: u32, parent: &str, line: u32) {
        let leaf_name = key_path.rsplit('.').next().unwrap_or(key_path).to_string();
        self.entries.push(ConfigEntry {
            id: id::config_entry_id(self.file_path, key_path),
            file_path: self.file_path.to_string(),
            key_path: key_path.to_string(),
            leaf_name,
            value_type: value_type_tag(value).to_string(),
            rendered_value: render_value(value),
            raw_value: serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()),
            depth,
            parent_path: if parent.is_empty() {
                None
            } else {
                Some(parent.to_string())
            },
            format: self.format,
            config_type: self.config_type.map(String::from),
            description: self
                .config_type
                .and_then(|t| key_description(t, key_path))
                .map(String::from),
            line,
        });
    }

    /// Best-effort source line of a key, scanning from the parent's line.
    fn find_line(&self, key: &str, start_from: u32) -> u32 {
        let needle = match self.format {
            ConfigFormat::Json => format!("\"{key}\""),
            ConfigFormat::Yaml => format!("{key}:"),
            ConfigFormat::Toml => key.to_string(),
        };
        let start = start_from.saturating_sub(1) as usize;
        for (offset, line) in self.content.lines().skip(start).enumerate() {
            let trimmed = line.trim_start();
            let hit = match self.format {
                ConfigFormat::Json => trimmed.starts_with(&needle),
                ConfigFormat::Yaml => trimmed.starts_with(&needle),
                ConfigFormat::Toml => {
                    trimmed.starts_with(&format!("{needle} ="))
                        || trimmed.starts_with(&format!("{needle}="))
                        || trimmed.starts_with(&format!("[{needle}]"))
                        || trimmed.starts_with(&format!("[{needle}."))
                        || trimmed.contains(&format!(".{needle}]"))
                }
            };
            if hit {
                return (start + offset + 1) as u32;
            }
        }
        start_from
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn value_type_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(map) => format!("{{{} keys}}", map.len()),
    }
}

/// File name → recognized config type tag.
fn config_type_for(file_name: &str) -> Option<&'static str> {
    match file_name {
        "package.json" => Some("package"),
        "tsconfig.json" | "jsconfig.json" => Some("tsconfig"),
        "pyproject.toml" => Some("pyproject"),
        "Cargo.toml" => Some("cargo"),
        ".eslintrc.json" => Some("eslint"),
        "docker-compose.yml" | "docker-compose.yaml" => Some("docker-compose"),
        _ => None,
    }
}

/// Static schema table of human descriptions for well-known keys.
fn key_description(config_type: &str, key_path: &str) -> Option<&'static str> {
    let table: &[(&str, &str)] = match config_type {
        "package" => &[
            ("name", "Package name"),
            ("version", "Package version"),
            ("main", "CommonJS entry point"),
            ("module", "ES module entry point"),
            ("types", "TypeScript declaration entry"),
            ("bin", "Executable entry points"),
            ("exports", "Export map"),
            ("scripts", "npm scripts"),
            ("dependencies", "Runtime dependencies"),
            ("devDependencies", "Development dependencies"),
        ],
        "tsconfig" => &[
            ("compilerOptions", "TypeScript compiler settings"),
            ("compilerOptions.target", "Emitted JavaScript version"),
            ("compilerOptions.module", "Module system for emitted code"),
            ("compilerOptions.strict", "Enable all strict type checks"),
            ("compilerOptions.paths", "Module path aliases"),
            ("include", "Files included in the program"),
            ("exclude", "Files excluded from the program"),
        ],
        "pyproject" => &[
            ("project", "Project metadata (PEP 621)"),
            ("project.name", "Distribution name"),
            ("project.dependencies", "Runtime dependencies"),
            ("build-system", "Build backend configuration"),
            ("tool", "Tool-specific settings"),
        ],
        "cargo" => &[
            ("package", "Crate metadata"),
            ("dependencies", "Runtime dependencies"),
            ("dev-dependencies", "Test and bench dependencies"),
            ("features", "Conditional compilation features"),
            ("workspace", "Workspace configuration"),
        ],
        "eslint" => &[
            ("rules", "Lint rule configuration"),
            ("extends", "Inherited configurations"),
            ("env", "Predefined global environments"),
        ],
        "docker-compose" => &[
            ("services", "Container definitions"),
            ("volumes", "Named volumes"),
            ("networks", "Network definitions"),
        ],
        _ => &[],
    };
    table
        .iter()
        .find(|(key, _)| *key == key_path)
        .map(|(_, description)| *description)
}
