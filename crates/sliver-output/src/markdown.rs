//! Human-readable markdown rendering. Derived from the same records as the
//! compact form, so both expose the same facts.

use std::fmt::Write;

use sliver_core::store::{FileSummary, StoreStats};
use sliver_core::types::{ConfigEntry, IndexTotals};
use sliver_engine::markov::SuggestResponse;
use sliver_engine::retrieve::{
    ArchitectureOverview, CallTrace, ClassDetail, FunctionDetail, ReferencesResult,
    RelatedContext, SearchResults, SymbolRow,
};

use crate::OutputFormatter;

pub struct MarkdownFormatter;

fn push_symbol_list(out: &mut String, rows: &[SymbolRow]) {
    for row in rows {
        let score = row
            .score
            .map(|s| format!(" (score {s:.2})"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "- **{}** `{}` — {}:{}{}",
            row.name,
            row.kind.as_str(),
            row.file_path,
            row.line,
            score
        );
        if !row.signature.is_empty() {
            let _ = writeln!(out, "  `{}`", row.signature);
        }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_search(&self, results: &SearchResults) -> String {
        let mut out = format!("## Symbols matching `{}`\n\n", results.query);
        if results.hits.is_empty() {
            out.push_str("No matches.\n");
            return out;
        }
        push_symbol_list(&mut out, &results.hits);
        out
    }

    fn format_function(&self, detail: &FunctionDetail) -> String {
        let symbol = &detail.symbol;
        let mut out = format!(
            "## {} ({})\n\n`{}`\n\n{}:{}-{}\n",
            symbol.qualified_name,
            symbol.kind.as_str(),
            symbol.signature,
            detail.file_path,
            symbol.location.start_line,
            symbol.location.end_line,
        );
        if let Some(doc) = &symbol.doc {
            let _ = writeln!(out, "\n> {doc}");
        }
        if let Some(data) = symbol.as_function() {
            if let Some(parent) = &data.parent_function {
                let _ = writeln!(out, "\nNested in `{parent}` (depth {})", data.nesting_depth);
            }
            if !data.params.is_empty() {
                out.push_str("\nParameters:\n");
                for param in &data.params {
                    let ty = param.type_text.as_deref().unwrap_or("_");
                    let _ = writeln!(out, "- `{}`: `{}`", param.name, ty);
                }
            }
            if let Some(ret) = &data.return_type {
                let _ = writeln!(out, "\nReturns `{ret}`");
            }
        }
        out
    }

    fn format_class(&self, detail: &ClassDetail) -> String {
        let symbol = &detail.symbol;
        let label = if detail.is_class { "class" } else { "interface" };
        let mut out = format!(
            "## {} ({label})\n\n`{}`\n\n{}:{}-{}\n",
            symbol.name,
            symbol.signature,
            detail.file_path,
            symbol.location.start_line,
            symbol.location.end_line,
        );
        if let Some(class) = symbol.as_class() {
            if let Some(extends) = &class.extends {
                let _ = writeln!(out, "\nExtends `{extends}`");
            }
            if !class.implements.is_empty() {
                let _ = writeln!(out, "Implements {}", code_list(&class.implements));
            }
            if !class.method_names.is_empty() {
                out.push_str("\nMethods:\n");
                for method in &class.method_names {
                    let _ = writeln!(out, "- `{method}`");
                }
            }
            if !class.properties.is_empty() {
                out.push_str("\nProperties:\n");
                for property in &class.properties {
                    let ty = property.type_text.as_deref().unwrap_or("_");
                    let _ = writeln!(out, "- `{}`: `{}`", property.name, ty);
                }
            }
        }
        if let Some(interface) = symbol.as_interface() {
            if !interface.extends.is_empty() {
                let _ = writeln!(out, "\nExtends {}", code_list(&interface.extends));
            }
            if !interface.methods.is_empty() {
                out.push_str("\nMethods:\n");
                for method in &interface.methods {
                    let _ = writeln!(out, "- `{}`", method.signature);
                }
            }
            if !interface.properties.is_empty() {
                out.push_str("\nProperties:\n");
                for property in &interface.properties {
                    let ty = property.type_text.as_deref().unwrap_or("_");
                    let _ = writeln!(out, "- `{}`: `{}`", property.name, ty);
                }
            }
        }
        out
    }

    fn format_references(&self, result: &ReferencesResult) -> String {
        let mut out = format!(
            "## References to `{}` ({} total)\n",
            result.symbol_name, result.total
        );
        for group in &result.groups {
            let _ = writeln!(out, "\n### {}\n", group.file_path);
            for reference in &group.references {
                let context = reference
                    .referencing_symbol_name
                    .as_deref()
                    .map(|name| format!(" in `{name}`"))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "- line {} ({}{}): `{}`",
                    reference.line,
                    reference.kind.as_str(),
                    context,
                    reference.snippet
                );
            }
        }
        out
    }

    fn format_trace(&self, trace: &CallTrace) -> String {
        let mut out = format!("## Call trace from `{}` (depth {})\n\n", trace.root, trace.depth);
        for entry in &trace.entries {
            let indent = "  ".repeat(entry.depth.saturating_sub(1) as usize);
            let mut notes = Vec::new();
            if entry.call_count > 1 {
                notes.push(format!("x{}", entry.call_count));
            }
            if entry.is_async {
                notes.push("await".to_string());
            }
            if entry.is_conditional {
                notes.push("conditional".to_string());
            }
            if !entry.resolved {
                notes.push("unresolved".to_string());
            }
            let suffix = if notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", notes.join(", "))
            };
            let _ = writeln!(
                out,
                "{}- `{}` → `{}`{}",
                indent, entry.caller_name, entry.callee_name, suffix
            );
        }
        out
    }

    fn format_related(&self, context: &RelatedContext) -> String {
        let mut out = self.format_function(&FunctionDetail {
            symbol: context.function.clone(),
            file_path: context.function.location.file_path.clone(),
        });
        if !context.callees.is_empty() {
            out.push_str("\n### Calls\n\n");
            push_symbol_list(&mut out, &context.callees);
        }
        if !context.types.is_empty() {
            out.push_str("\n### Types used\n\n");
            push_symbol_list(&mut out, &context.types);
        }
        if let Some(source) = &context.source {
            out.push_str("\n### Source\n\n```\n");
            out.push_str(source);
            out.push_str("\n```\n");
        }
        out
    }

    fn format_overview(&self, overview: &ArchitectureOverview) -> String {
        let mut out = String::from("## Architecture\n");
        for module in &overview.modules {
            let _ = writeln!(
                out,
                "\n### {} ({} files, {} lines)",
                module.name, module.file_count, module.line_count
            );
            if let Some(narrative) = &module.narrative {
                let _ = writeln!(out, "\n{narrative}");
            }
            if !module.top_exports.is_empty() {
                out.push_str("\nKey exports:\n");
                for export in &module.top_exports {
                    let _ = writeln!(
                        out,
                        "- `{}` ({} references)",
                        export.name, export.reference_count
                    );
                }
            }
        }
        if !overview.dependencies.is_empty() {
            out.push_str("\n### Module dependencies\n\n");
            for dep in &overview.dependencies {
                let type_only = if dep.type_only_count > 0 {
                    format!(" (+{} type-only)", dep.type_only_count)
                } else {
                    String::new()
                };
                let _ = writeln!(
                    out,
                    "- `{}` → `{}`: {} imports{}",
                    dep.from, dep.to, dep.import_count, type_only
                );
            }
        }
        if !overview.entry_points.is_empty() {
            out.push_str("\n### Entry points\n\n");
            for entry in &overview.entry_points {
                let _ = writeln!(out, "- `{entry}`");
            }
        }
        out
    }

    fn format_suggestions(&self, response: &SuggestResponse) -> String {
        let mut out = format!("## Related to `{}`\n\n", response.symbol_name);
        if response.chains_used.is_empty() {
            out.push_str("No chains have transitions for this symbol.\n");
            return out;
        }
        for suggestion in &response.suggestions {
            let _ = writeln!(
                out,
                "- **{}** (score {:.2}, depth {}) — {}",
                suggestion.symbol_name, suggestion.score, suggestion.depth, suggestion.file_path
            );
            if let Some(explanation) = &suggestion.explanation {
                let _ = writeln!(out, "  {explanation}");
            }
        }
        let _ = writeln!(out, "\nChains: {}", response.chains_used.join(", "));
        out
    }

    fn format_files(&self, files: &[FileSummary]) -> String {
        let mut out = String::from("## Indexed files\n\n");
        for file in files {
            let badge = if file.warnings.is_empty() {
                String::new()
            } else {
                let codes: Vec<&str> = file.warnings.iter().map(|w| w.code.as_str()).collect();
                format!(" ⚠ {}", codes.join(","))
            };
            let _ = writeln!(
                out,
                "- `{}` ({}, {} lines, {}){}",
                file.relative_path,
                file.language.as_str(),
                file.line_count,
                file.parse_status.as_str(),
                badge
            );
        }
        out
    }

    fn format_config_entries(&self, entries: &[ConfigEntry]) -> String {
        let mut out = String::from("## Configuration\n\n");
        for entry in entries {
            let description = entry
                .description
                .as_deref()
                .map(|d| format!(" — {d}"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "- `{}` = `{}` ({}:{}){}",
                entry.key_path, entry.rendered_value, entry.file_path, entry.line, description
            );
        }
        out
    }

    fn format_stats(&self, stats: &StoreStats) -> String {
        let mut out = String::from("## Index statistics\n\n");
        let _ = writeln!(out, "- files: {}", stats.file_count);
        let _ = writeln!(out, "- symbols: {}", stats.symbol_count);
        let _ = writeln!(out, "- references: {}", stats.reference_count);
        let _ = writeln!(out, "- call edges: {}", stats.call_edge_count);
        let _ = writeln!(out, "- type relations: {}", stats.type_relation_count);
        let _ = writeln!(out, "- config entries: {}", stats.config_entry_count);
        for (language, count) in &stats.files_by_language {
            let _ = writeln!(out, "- {language}: {count} files");
        }
        out
    }

    fn format_index_totals(&self, totals: &IndexTotals) -> String {
        let mut out = format!(
            "Indexed {} of {} files ({} unchanged, {} errors)\n",
            totals.files_indexed,
            totals.files_found,
            totals.files_skipped,
            totals.errors.len()
        );
        for error in &totals.errors {
            let _ = writeln!(out, "- {}: {}", error.file_path, error.message);
        }
        out
    }
}

fn code_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("`{i}`"))
        .collect::<Vec<_>>()
        .join(", ")
}
