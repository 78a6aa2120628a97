//! Import table discovery.
//!
//! Scans a module repository (normally `node_modules`) for packages and maps every
//! TypeScript declaration file inside them to the statement that imports it:
//! `ui/view/Button.d.ts` in package `yunos` becomes
//! `Button -> import Button = require("yunos/ui/view/Button");`.

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::error::{GenError, Result};

const PACKAGE_MANIFEST: &str = "package.json";
const DECLARATION_SUFFIX: &str = ".d.ts";

/// Type name → import statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    entries: IndexMap<String, String>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` imported from `module`. The first registration of a name wins.
    pub fn insert_module(&mut self, name: &str, module: &str) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries
            .insert(name.to_string(), import_statement(name, module));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub fn import_statement(name: &str, module: &str) -> String {
    format!("import {} = require(\"{}\");", name, module)
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Build the table for a module repository. A missing repository yields an empty table.
pub fn build_import_table(repo_root: &Path) -> Result<ImportTable> {
    let mut table = ImportTable::new();
    if !repo_root.is_dir() {
        log::warn!(
            "module repository {} not found, no view types will resolve",
            repo_root.display()
        );
        return Ok(table);
    }

    for package in find_package_dirs(repo_root)? {
        for (name, module) in find_declarations(repo_root, &package) {
            if !table.insert_module(&name, &module) {
                log::debug!("'{}' from {} shadowed by an earlier package", name, module);
            }
        }
    }

    log::info!(
        "import table built from {}: {} types",
        repo_root.display(),
        table.len()
    );
    Ok(table)
}

/// Breadth-first search for directories holding a package manifest. Packages are not
/// searched for nested packages.
fn find_package_dirs(repo_root: &Path) -> Result<Vec<PathBuf>> {
    let mut packages = Vec::new();
    let mut queue = VecDeque::from([repo_root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        if dir.join(PACKAGE_MANIFEST).is_file() {
            packages.push(dir);
            continue;
        }

        let mut subdirs: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| GenError::io(&dir, e))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        subdirs.sort();
        queue.extend(subdirs);
    }

    Ok(packages)
}

/// Depth-first walk of one package for `*.d.ts` files.
fn find_declarations(repo_root: &Path, package: &Path) -> Vec<(String, String)> {
    let mut found = Vec::new();

    for entry in WalkDir::new(package).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry in {}: {}", package.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        let Some(name) = file_name.strip_suffix(DECLARATION_SUFFIX) else {
            continue;
        };

        let Ok(relative) = entry.path().strip_prefix(repo_root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        let module = relative
            .strip_suffix(DECLARATION_SUFFIX)
            .unwrap_or(&relative)
            .to_string();
        found.push((name.to_string(), module));
    }

    found
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROCESS-WIDE CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Lazily built, shared, read-only import table for one module repository.
#[derive(Debug)]
pub struct ImportTableCache {
    repo_root: PathBuf,
    table: OnceCell<Arc<ImportTable>>,
}

impl ImportTableCache {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            table: OnceCell::new(),
        }
    }

    /// A cache that is already filled, for callers that build the table themselves.
    pub fn with_table(repo_root: impl Into<PathBuf>, table: ImportTable) -> Self {
        Self {
            repo_root: repo_root.into(),
            table: OnceCell::with_value(Arc::new(table)),
        }
    }

    /// Builds on first use. A failed build is not cached, the next call retries.
    pub fn get(&self) -> Result<Arc<ImportTable>> {
        self.table
            .get_or_try_init(|| build_import_table(&self.repo_root).map(Arc::new))
            .map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.table.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempWorkspace;

    fn module_repo() -> TempWorkspace {
        let ws = TempWorkspace::new("imports");
        ws.write("node_modules/yunos/package.json", "{}");
        ws.write("node_modules/yunos/ui/view/Button.d.ts", "");
        ws.write("node_modules/yunos/ui/view/CompositeView.d.ts", "");
        ws.write("node_modules/yunos/ui/event/TouchEvent.d.ts", "");
        ws.write("node_modules/yunos/ui/view/Button.js", "");
        ws.write("node_modules/@scope/widgets/package.json", "{}");
        ws.write("node_modules/@scope/widgets/lib/Button.d.ts", "");
        ws.write("node_modules/@scope/widgets/lib/Slider.d.ts", "");
        ws.write("node_modules/loose/NotAPackage.d.ts", "");
        ws
    }

    #[test]
    fn test_declarations_map_to_require_imports() {
        let ws = module_repo();
        let table = build_import_table(&ws.path("node_modules")).unwrap();

        assert_eq!(
            table.get("CompositeView"),
            Some("import CompositeView = require(\"yunos/ui/view/CompositeView\");")
        );
        assert_eq!(
            table.get("Slider"),
            Some("import Slider = require(\"@scope/widgets/lib/Slider\");")
        );
        assert!(table.get("TouchEvent").is_some());
        assert!(table.get("NotAPackage").is_none());
    }

    #[test]
    fn test_shallower_package_wins_name_clash() {
        let ws = module_repo();
        let table = build_import_table(&ws.path("node_modules")).unwrap();
        assert_eq!(
            table.get("Button"),
            Some("import Button = require(\"yunos/ui/view/Button\");")
        );
    }

    #[test]
    fn test_missing_repository_is_empty() {
        let ws = TempWorkspace::new("imports-missing");
        let table = build_import_table(&ws.path("node_modules")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_cache_builds_once() {
        let ws = module_repo();
        let cache = ImportTableCache::new(ws.path("node_modules"));
        assert!(!cache.is_initialized());

        let first = cache.get().unwrap();
        ws.write("node_modules/yunos/ui/view/Late.d.ts", "");
        let second = cache.get().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.get("Late").is_none());
    }
}
