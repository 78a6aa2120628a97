//! Generator configuration.
//!
//! Read from `layoutgen.json` at the workspace root when present. Every field has a
//! default, so an empty object (or no file at all) reproduces the stock behavior.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GenError, Result};
use crate::flatten::ParentPolicy;

pub const CONFIG_FILE_NAME: &str = "layoutgen.json";

/// A type name together with the module it is imported from when the import table
/// has no entry for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub type_name: String,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpec {
    /// Name passed to `view.on(...)`.
    pub event_name: String,
    /// Suffix of the generated handler method.
    pub handler_name: String,
    #[serde(default)]
    pub params: Vec<EventParam>,
}

/// Element names matching `pattern` (unanchored regex) get handlers for `events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRuleConfig {
    pub pattern: String,
    pub events: Vec<EventSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Module repository scanned for `.d.ts` files, relative to the workspace.
    pub module_root: PathBuf,
    /// Where the binding, event and factory modules are written.
    pub output_dir: PathBuf,
    pub presenter_dir: PathBuf,
    /// Theme files, resolved against `<layout dir>/../../theme`.
    pub theme_variants: Vec<String>,
    /// Parent theme of newly created theme files.
    pub base_theme: String,
    /// `type` given to new parameter file entries.
    pub default_container_type: String,
    pub root_container: TypeRef,
    pub presenter_base_class: TypeRef,
    pub event_rules: Vec<EventRuleConfig>,
    pub parent_policy: ParentPolicy,
    /// Also emit the abstract presenter base class.
    pub presenter_base: bool,
    /// Parse generated modules as TypeScript and warn on syntax errors.
    pub check_syntax: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module_root: PathBuf::from("node_modules"),
            output_dir: PathBuf::from("ts/presenter/viewHelper"),
            presenter_dir: PathBuf::from("ts/presenter/base_with_view_and_event"),
            theme_variants: vec!["default.xml".to_string(), "default.light.xml".to_string()],
            base_theme: "hdt".to_string(),
            default_container_type: "RelativeLayout".to_string(),
            root_container: TypeRef {
                type_name: "CompositeView".to_string(),
                module: "yunos/ui/view/CompositeView".to_string(),
            },
            presenter_base_class: TypeRef {
                type_name: "Presenter".to_string(),
                module: "yunos/appmodel/Presenter".to_string(),
            },
            event_rules: default_event_rules(),
            parent_policy: ParentPolicy::default(),
            presenter_base: false,
            check_syntax: true,
        }
    }
}

/// Touch events for every element name containing `View`.
pub fn default_event_rules() -> Vec<EventRuleConfig> {
    let touch = |event_name: &str, handler_name: &str| EventSpec {
        event_name: event_name.to_string(),
        handler_name: handler_name.to_string(),
        params: vec![EventParam {
            name: "event".to_string(),
            ty: "TouchEvent".to_string(),
        }],
    };

    vec![EventRuleConfig {
        pattern: ".*View".to_string(),
        events: vec![
            touch("touchend", "TouchEnd"),
            touch("touchstart", "TouchStart"),
            touch("touchmove", "TouchMove"),
        ],
    }]
}

impl GeneratorConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| GenError::InvalidConfig(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        Self::from_json(&source)
    }

    /// `<workspace>/layoutgen.json` if it exists, defaults otherwise.
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let path = workspace_root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            log::info!("using configuration {}", path.display());
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}
