//! Layout file activation and target path derivation.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::codegen::file_prefix;
use crate::config::GeneratorConfig;

lazy_static! {
    static ref LAYOUT_PATH: Regex = Regex::new(r"^res/[^/]+/layout/[^/]+\.xml$").unwrap();
}

const RESOURCE_DIR: &str = "res";
const THEME_DIR: &str = "theme";

/// True for `<workspace>/res/<any>/layout/<name>.xml`. Anything else is ignored.
pub fn is_layout_file(workspace: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(workspace) else {
        return false;
    };
    let relative = relative.to_string_lossy().replace('\\', "/");
    LAYOUT_PATH.is_match(&relative)
}

/// Every layout file of the workspace, sorted.
pub fn find_layout_files(workspace: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(workspace.join(RESOURCE_DIR))
        .min_depth(3)
        .max_depth(3)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_layout_file(workspace, p))
        .collect();
    found.sort();
    found
}

/// Everything one layout save reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPaths {
    pub layout: PathBuf,
    /// File stem: `login` for `login.xml`.
    pub base_name: String,
    /// Base name with its first letter upper-cased.
    pub prefix: String,
    pub params: PathBuf,
    pub themes: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub presenter_dir: PathBuf,
}

impl LayoutPaths {
    /// `None` when `layout` is not a layout file of `workspace`.
    pub fn derive(workspace: &Path, layout: &Path, config: &GeneratorConfig) -> Option<Self> {
        if !is_layout_file(workspace, layout) {
            return None;
        }
        let base_name = layout.file_stem()?.to_str()?.to_string();
        // res/<any>/layout/x.xml -> res/theme
        let theme_dir = layout.parent()?.parent()?.parent()?.join(THEME_DIR);

        Some(Self {
            layout: layout.to_path_buf(),
            prefix: file_prefix(&base_name),
            params: layout.with_extension("json"),
            themes: config
                .theme_variants
                .iter()
                .map(|variant| theme_dir.join(variant))
                .collect(),
            output_dir: workspace.join(&config.output_dir),
            presenter_dir: workspace.join(&config.presenter_dir),
            base_name,
        })
    }
}
