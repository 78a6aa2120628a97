//! Per-save orchestration.
//!
//! One save of a layout file runs: normalize → persist → flatten, then parameter sync,
//! theme sync and code generation side by side on the shared index. Every stage
//! outcome lands in a `ProcessReport`; nothing is returned as an error to the caller.

use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::codegen::{
    check_typescript, generate_binding, generate_event, generate_factory,
    generate_presenter_base, CodegenInput, EventRules,
};
use crate::config::GeneratorConfig;
use crate::error::{GenError, Result};
use crate::flatten::{flatten_with, FlatNodeIndex, FlattenOptions};
use crate::imports::{ImportTable, ImportTableCache};
use crate::normalize::normalize;
use crate::params::sync_params;
use crate::paths::{find_layout_files, LayoutPaths};
use crate::theme::{load_theme, sync_theme};
use crate::xml::{parse_document, to_xml_string};

// ═══════════════════════════════════════════════════════════════════════════════
// REPORTING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "camelCase")]
pub enum StageStatus {
    Written,
    Unchanged,
    #[default]
    Skipped,
    Failed(String),
}

impl StageStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageStatus::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    pub path: PathBuf,
    pub status: StageStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub layout: PathBuf,
    /// The path was not a layout file; nothing ran.
    pub not_applicable: bool,
    pub normalize: StageStatus,
    pub params: StageStatus,
    pub themes: Vec<FileStatus>,
    pub sources: Vec<FileStatus>,
}

impl ProcessReport {
    fn new(layout: &Path) -> Self {
        Self {
            layout: layout.to_path_buf(),
            ..Default::default()
        }
    }

    pub fn not_applicable(layout: &Path) -> Self {
        Self {
            not_applicable: true,
            ..Self::new(layout)
        }
    }

    /// Every stage status, paired with the file it concerns.
    pub fn statuses(&self) -> Vec<(&Path, &StageStatus)> {
        let mut all = vec![
            (self.layout.as_path(), &self.normalize),
            (self.layout.as_path(), &self.params),
        ];
        all.extend(self.themes.iter().map(|f| (f.path.as_path(), &f.status)));
        all.extend(self.sources.iter().map(|f| (f.path.as_path(), &f.status)));
        all
    }

    pub fn has_failures(&self) -> bool {
        self.statuses().iter().any(|(_, s)| s.is_failed())
    }

    /// True when the run left every file as it found it.
    pub fn is_unchanged(&self) -> bool {
        self.statuses()
            .iter()
            .all(|(_, s)| matches!(s, StageStatus::Unchanged | StageStatus::Skipped))
    }
}

fn stage_status(target: &Path, what: &str, result: Result<bool>) -> StageStatus {
    match result {
        Ok(true) => {
            log::info!("wrote {} {}", what, target.display());
            StageStatus::Written
        }
        Ok(false) => {
            log::debug!("{} {} unchanged", what, target.display());
            StageStatus::Unchanged
        }
        Err(e) => {
            log::error!("{} {} failed: {}", what, target.display(), e);
            StageStatus::Failed(e.to_string())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Writes only when the bytes differ, so a watcher never sees its own no-op output.
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    match fs::read(path) {
        Ok(current) if current == content.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(GenError::io(path, e)),
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| GenError::io(path, e))?;
    Ok(true)
}

/// `None` for a missing file.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GenError::io(path, e)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Generator {
    workspace: PathBuf,
    config: GeneratorConfig,
    rules: EventRules,
    imports: ImportTableCache,
}

impl Generator {
    pub fn new(workspace: impl Into<PathBuf>, config: GeneratorConfig) -> Result<Self> {
        let workspace = workspace.into();
        let rules = EventRules::compile(&config.event_rules)?;
        let imports = ImportTableCache::new(workspace.join(&config.module_root));
        Ok(Self {
            workspace,
            config,
            rules,
            imports,
        })
    }

    /// Generator for `workspace` using its `layoutgen.json`, if any.
    pub fn load(workspace: impl Into<PathBuf>) -> Result<Self> {
        let workspace = workspace.into();
        let config = GeneratorConfig::load(&workspace)?;
        Self::new(workspace, config)
    }

    /// Use a prebuilt import table instead of scanning the module repository.
    pub fn with_import_table(mut self, table: ImportTable) -> Self {
        self.imports = ImportTableCache::with_table(self.workspace.join(&self.config.module_root), table);
        self
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn import_table(&self) -> Result<std::sync::Arc<ImportTable>> {
        self.imports.get()
    }

    /// Handle one saved file. Paths outside `res/*/layout/*.xml` are not applicable.
    pub fn process_layout(&self, layout: &Path) -> ProcessReport {
        let Some(paths) = LayoutPaths::derive(&self.workspace, layout, &self.config) else {
            log::debug!("{} is not a layout file, ignored", layout.display());
            return ProcessReport::not_applicable(layout);
        };
        let mut report = ProcessReport::new(layout);
        let origin = layout.display().to_string();

        let source = match fs::read_to_string(layout) {
            Ok(s) => s,
            Err(e) => {
                report.normalize = stage_status(layout, "layout", Err(GenError::io(layout, e)));
                return report;
            }
        };
        let mut doc = match parse_document(&source, &origin) {
            Ok(doc) => doc,
            Err(e) => {
                report.normalize = stage_status(layout, "layout", Err(e));
                return report;
            }
        };

        let result = if normalize(&mut doc.root, &paths.base_name) {
            to_xml_string(&doc).and_then(|text| write_if_changed(layout, &text))
        } else {
            Ok(false)
        };
        report.normalize = stage_status(layout, "layout", result);

        let index = flatten_with(
            &doc.root,
            FlattenOptions {
                parent_policy: self.config.parent_policy,
            },
        );

        let (params, (themes, sources)) = rayon::join(
            || self.sync_param_file(&paths, &index),
            || {
                rayon::join(
                    || self.sync_theme_files(&paths, &index),
                    || self.write_sources(&paths, &index),
                )
            },
        );
        report.params = params;
        report.themes = themes;
        report.sources = sources;

        if report.has_failures() {
            log::warn!("{} processed with failures", layout.display());
        } else {
            log::info!("{} processed ({} views)", layout.display(), index.len());
        }
        report
    }

    /// Regenerate every layout of the workspace. Layouts share theme files, so they
    /// are processed one at a time.
    pub fn process_workspace(&self) -> Vec<ProcessReport> {
        find_layout_files(&self.workspace)
            .iter()
            .map(|layout| self.process_layout(layout))
            .collect()
    }

    fn sync_param_file(&self, paths: &LayoutPaths, index: &FlatNodeIndex) -> StageStatus {
        let origin = paths.params.display().to_string();
        let result = read_optional(&paths.params).and_then(|existing| {
            let outcome = sync_params(
                index,
                existing.as_deref(),
                &self.config.default_container_type,
                &origin,
            )?;
            if !outcome.changed {
                return Ok(false);
            }
            write_if_changed(&paths.params, &outcome.to_json_string()?)
        });
        stage_status(&paths.params, "parameter file", result)
    }

    fn sync_theme_files(&self, paths: &LayoutPaths, index: &FlatNodeIndex) -> Vec<FileStatus> {
        let property_set = index.root().and_then(|r| r.property_set_name.clone());

        paths
            .themes
            .par_iter()
            .map(|theme_path| {
                let status = match property_set.as_deref() {
                    Some(name) => {
                        stage_status(theme_path, "theme", self.sync_theme_file(theme_path, index, name))
                    }
                    None => {
                        log::debug!("root has no property set, {} skipped", theme_path.display());
                        StageStatus::Skipped
                    }
                };
                FileStatus {
                    path: theme_path.clone(),
                    status,
                }
            })
            .collect()
    }

    fn sync_theme_file(&self, path: &Path, index: &FlatNodeIndex, property_set: &str) -> Result<bool> {
        let existing = read_optional(path)?;
        let mut doc = load_theme(existing.as_deref(), path, &self.config.base_theme)?;
        let report = sync_theme(&mut doc.root, index, property_set);
        if !report.changed() {
            return Ok(false);
        }
        log::debug!(
            "{}: +{} ids, +{} tags, {} filled",
            path.display(),
            report.added_ids.len(),
            report.added_tags.len(),
            report.filled.len()
        );
        write_if_changed(path, &to_xml_string(&doc)?)
    }

    fn write_sources(&self, paths: &LayoutPaths, index: &FlatNodeIndex) -> Vec<FileStatus> {
        let table = match self.imports.get() {
            Ok(table) => table,
            Err(e) => {
                return vec![FileStatus {
                    path: paths.output_dir.clone(),
                    status: stage_status(&paths.output_dir, "generated sources", Err(e)),
                }]
            }
        };

        let input = CodegenInput {
            base_name: &paths.base_name,
            index,
            imports: &table,
            rules: &self.rules,
            root_container: &self.config.root_container,
            presenter_base_class: &self.config.presenter_base_class,
        };

        let mut files = vec![
            (&paths.output_dir, generate_binding(&input)),
            (&paths.output_dir, generate_event(&input)),
            (&paths.output_dir, generate_factory(&input)),
        ];
        if self.config.presenter_base {
            files.push((&paths.presenter_dir, generate_presenter_base(&input)));
        }

        files
            .into_iter()
            .map(|(dir, file)| {
                let path = dir.join(&file.file_name);
                let source = file.render();
                if self.config.check_syntax {
                    for error in check_typescript(&source) {
                        log::warn!("{}: generated code does not parse: {}", path.display(), error);
                    }
                }
                let status = stage_status(&path, "generated source", write_if_changed(&path, &source));
                FileStatus { path, status }
            })
            .collect()
    }
}
