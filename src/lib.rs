//! # Layout Codegen
//!
//! Keeps the artifacts around a UI layout file in step with the layout itself. Every
//! save of `res/<dir>/layout/<name>.xml` runs:
//!
//! 1. **Normalize**: the root takes `id = <name>`, `propertySetName` and
//!    `layout = "{layout.<name>}"`; containers reference `{layout.<id>}`, leaves drop
//!    `layout`. The layout file is rewritten only when an attribute changed.
//! 2. **Flatten**: the tree becomes a `FlatNodeIndex` of identified views.
//! 3. **Sync** (independent, run in parallel):
//!    - the sibling `<name>.json` gains an entry per container and a key per child
//!    - each theme variant gains `id` / `tag` entries in the layout's property-set
//!    - `<Name>ViewBinding`, `<Name>ViewEvent` and `create<Name>ViewBindingAndEvent`
//!      are regenerated from the module repository's `.d.ts` files
//!
//! All passes are additive and idempotent: hand-written values are never replaced and
//! a save with nothing new writes nothing.

mod codegen;
mod config;
mod error;
mod flatten;
mod imports;
mod normalize;
mod params;
mod paths;
mod pipeline;
mod theme;
mod tree;
mod xml;

#[cfg(feature = "napi")]
mod bridge;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod pipeline_tests;

pub use codegen::{
    camel_case, check_typescript, file_prefix, generate_binding, generate_event,
    generate_factory, generate_presenter_base, handler_method_name, CodegenInput, EventRules,
    ModuleNames, Section, SourceFile,
};
pub use config::{
    default_event_rules, EventParam, EventRuleConfig, EventSpec, GeneratorConfig, TypeRef,
    CONFIG_FILE_NAME,
};
pub use error::{GenError, Result};
pub use flatten::{flatten, flatten_with, FlatNodeIndex, FlattenOptions, NodeRecord, NodeRef, ParentPolicy};
pub use imports::{build_import_table, import_statement, ImportTable, ImportTableCache};
pub use normalize::{layout_reference, normalize};
pub use params::{parse_param_document, sync_params, to_pretty_json, ParamDocument, ParamSyncOutcome};
pub use paths::{find_layout_files, is_layout_file, LayoutPaths};
pub use pipeline::{write_if_changed, FileStatus, Generator, ProcessReport, StageStatus};
pub use theme::{
    load_theme, new_theme_document, summarize, sync_theme, theme_name_for, EntrySummary,
    PropertySetSummary, ThemeSummary, ThemeSyncReport,
};
pub use tree::{XmlDocument, XmlNode};
pub use xml::{parse_document, to_xml_string};

#[cfg(feature = "napi")]
pub use bridge::{clear_generators_native, process_layout_native};
