//! Module specifier resolution.
//!
//! Relative specifiers resolve against the importing file's directory with
//! extension probing and `index.*` handling. Bare specifiers are classified
//! as external (package or built-in) and keep no resolved path. Resolution
//! never escapes the configured root.

use std::path::{Component, Path, PathBuf};

use sliver_core::types::{Import, Language};

/// Node built-in modules (both bare and `node:`-prefixed forms occur).
const NODE_BUILTINS: &[&str] = &[
    "assert", "buffer", "child_process", "cluster", "console", "crypto", "dns", "events", "fs",
    "http", "http2", "https", "net", "os", "path", "perf_hooks", "process", "querystring",
    "readline", "stream", "string_decoder", "timers", "tls", "url", "util", "v8", "vm", "worker_threads",
    "zlib",
];

/// Python standard-library roots we classify as built-in.
const PYTHON_BUILTINS: &[&str] = &[
    "abc", "argparse", "asyncio", "collections", "contextlib", "copy", "dataclasses", "datetime",
    "enum", "functools", "io", "itertools", "json", "logging", "math", "os", "pathlib", "re",
    "shutil", "subprocess", "sys", "tempfile", "threading", "time", "typing", "unittest", "uuid",
];

const TS_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A file inside the root; forward-slash absolute path.
    Resolved(String),
    /// Package or built-in module; no path.
    External,
    /// Relative specifier that matched nothing on disk. Not an error.
    Unresolved,
}

pub struct ImportResolver {
    root: PathBuf,
}

impl ImportResolver {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Resolve one import of `importing_file` and update its record fields.
    pub fn apply(&self, importing_file: &Path, language: Language, import: &mut Import) {
        match self.resolve(importing_file, language, &import.module) {
            Resolution::Resolved(path) => {
                import.resolved_path = Some(path);
                import.is_external = false;
            }
            Resolution::External => {
                import.resolved_path = None;
                import.is_external = true;
            }
            Resolution::Unresolved => {
                import.resolved_path = None;
                import.is_external = false;
            }
        }
    }

    pub fn resolve(&self, importing_file: &Path, language: Language, specifier: &str) -> Resolution {
        match language {
            Language::Python => self.resolve_python(importing_file, specifier),
            _ => self.resolve_ts(importing_file, specifier),
        }
    }

    fn resolve_ts(&self, importing_file: &Path, specifier: &str) -> Resolution {
        if !specifier.starts_with('.') {
            return Resolution::External;
        }

        let dir = importing_file.parent().unwrap_or(Path::new("."));
        let joined = normalize(&dir.join(specifier));
        if !joined.starts_with(&self.root) {
            return Resolution::Unresolved;
        }

        // Exact file, then extension probing, then directory index.
        if joined.is_file() {
            return Resolution::Resolved(to_slash(&joined));
        }
        for ext in TS_EXTENSIONS {
            let candidate = joined.with_extension(ext);
            if candidate.is_file() {
                return Resolution::Resolved(to_slash(&candidate));
            }
        }
        if joined.is_dir() {
            for ext in TS_EXTENSIONS {
                let candidate = joined.join(format!("index.{ext}"));
                if candidate.is_file() {
                    return Resolution::Resolved(to_slash(&candidate));
                }
            }
        }
        Resolution::Unresolved
    }

    fn resolve_python(&self, importing_file: &Path, specifier: &str) -> Resolution {
        let leading_dots = specifier.chars().take_while(|c| *c == '.').count();

        if leading_dots == 0 {
            let head = specifier.split('.').next().unwrap_or(specifier);
            if PYTHON_BUILTINS.contains(&head) {
                return Resolution::External;
            }
            // Absolute imports try root-relative module paths before being
            // classified as third-party.
            let candidate = self.root.join(specifier.replace('.', "/"));
            if let Some(found) = probe_python(&candidate) {
                if found.starts_with(&self.root) {
                    return Resolution::Resolved(to_slash(&found));
                }
            }
            return Resolution::External;
        }

        // Relative import: first dot is the current package, each additional
        // dot walks one directory up.
        let mut dir = importing_file.parent().unwrap_or(Path::new(".")).to_path_buf();
        for _ in 1..leading_dots {
            dir = match dir.parent() {
                Some(parent) => parent.to_path_buf(),
                None => return Resolution::Unresolved,
            };
        }
        let remainder = &specifier[leading_dots..];
        let target = if remainder.is_empty() {
            dir
        } else {
            dir.join(remainder.replace('.', "/"))
        };
        let target = normalize(&target);
        if !target.starts_with(&self.root) {
            return Resolution::Unresolved;
        }
        match probe_python(&target) {
            Some(found) => Resolution::Resolved(to_slash(&found)),
            None => Resolution::Unresolved,
        }
    }
}

fn probe_python(candidate: &Path) -> Option<PathBuf> {
    let as_file = candidate.with_extension("py");
    if as_file.is_file() {
        return Some(as_file);
    }
    let as_package = candidate.join("__init__.py");
    if as_package.is_file() {
        return Some(as_package);
    }
    None
}

/// Resolve `.` / `..` components lexically, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Platform separators normalized to forward slashes.
fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Whether a bare TS/JS specifier names a Node built-in.
pub fn is_node_builtin(specifier: &str) -> bool {
    let name = specifier.strip_prefix("node:").unwrap_or(specifier);
    let head = name.split('/').next().unwrap_or(name);
    NODE_BUILTINS.contains(&head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_relative_with_extension_probe() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/util.ts"), "export {}").unwrap();
        fs::write(root.join("src/main.ts"), "import './util'").unwrap();

        let resolver = ImportResolver::new(root);
        let res = resolver.resolve(&root.join("src/main.ts"), Language::Typescript, "./util");
        assert_eq!(res, Resolution::Resolved(to_slash(&root.join("src/util.ts"))));
    }

    #[test]
    fn test_directory_index_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/models")).unwrap();
        fs::write(root.join("src/models/index.ts"), "export {}").unwrap();
        fs::write(root.join("src/main.ts"), "").unwrap();

        let resolver = ImportResolver::new(root);
        let res = resolver.resolve(&root.join("src/main.ts"), Language::Typescript, "./models");
        assert_eq!(
            res,
            Resolution::Resolved(to_slash(&root.join("src/models/index.ts")))
        );
    }

    #[test]
    fn test_bare_specifiers_are_external() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ImportResolver::new(dir.path());
        let file = dir.path().join("a.ts");

        assert_eq!(
            resolver.resolve(&file, Language::Typescript, "express"),
            Resolution::External
        );
        assert_eq!(
            resolver.resolve(&file, Language::Typescript, "@scope/pkg"),
            Resolution::External
        );
        assert!(is_node_builtin("fs"));
        assert!(is_node_builtin("node:path"));
        assert!(!is_node_builtin("express"));
    }

    #[test]
    fn test_never_escapes_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(dir.path().join("outside.ts"), "export {}").unwrap();
        fs::write(root.join("src/main.ts"), "").unwrap();

        let resolver = ImportResolver::new(&root);
        let res = resolver.resolve(
            &root.join("src/main.ts"),
            Language::Typescript,
            "../../outside",
        );
        assert_eq!(res, Resolution::Unresolved);
    }

    #[test]
    fn test_python_relative_and_package() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::write(root.join("pkg/__init__.py"), "").unwrap();
        fs::write(root.join("pkg/util.py"), "").unwrap();
        fs::write(root.join("pkg/sub/mod.py"), "").unwrap();

        let resolver = ImportResolver::new(root);

        // from .util import x  (inside pkg/sub/mod.py's sibling package)
        let res = resolver.resolve(&root.join("pkg/mod.py"), Language::Python, ".util");
        assert_eq!(res, Resolution::Resolved(to_slash(&root.join("pkg/util.py"))));

        // from ..util import x  (inside pkg/sub/mod.py)
        let res = resolver.resolve(&root.join("pkg/sub/mod.py"), Language::Python, "..util");
        assert_eq!(res, Resolution::Resolved(to_slash(&root.join("pkg/util.py"))));

        // absolute import of a root-level package
        let res = resolver.resolve(&root.join("main.py"), Language::Python, "pkg");
        assert_eq!(
            res,
            Resolution::Resolved(to_slash(&root.join("pkg/__init__.py")))
        );

        // stdlib
        let res = resolver.resolve(&root.join("main.py"), Language::Python, "os");
        assert_eq!(res, Resolution::External);
    }

    #[test]
    fn test_unresolved_stays_unresolved_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ImportResolver::new(dir.path());
        let res = resolver.resolve(
            &dir.path().join("a.ts"),
            Language::Typescript,
            "./does-not-exist",
        );
        assert_eq!(res, Resolution::Unresolved);
    }
}
