//! Theme property-set synchronization.
//!
//! A theme file groups styling entries by property-set:
//!
//! ```xml
//! <theme name="default" extend="hdt">
//!   <property-set name="login">
//!     <id name="loginBtn"> </id>
//!     <tag name="primary"> </tag>
//!   </property-set>
//! </theme>
//! ```
//!
//! Sync guarantees one `id` entry per view id and one `tag` entry per distinct tag
//! attribute value in the layout's property-set. Entries are matched by name; new
//! ones get a single-space body so they never serialize as empty elements.

use std::path::Path;

use crate::error::{GenError, Result};
use crate::flatten::FlatNodeIndex;
use crate::tree::{XmlDocument, XmlNode, ATTR_NAME};
use crate::xml::parse_document;

pub const THEME_ELEMENT: &str = "theme";
pub const PROPERTY_SET_ELEMENT: &str = "property-set";
pub const ID_ENTRY: &str = "id";
pub const TAG_ENTRY: &str = "tag";
const ATTR_EXTEND: &str = "extend";
const CONTENT_PLACEHOLDER: &str = " ";

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT MODEL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub name: String,
    pub has_content: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySetSummary {
    pub name: String,
    pub id_entries: Vec<EntrySummary>,
    pub tag_entries: Vec<EntrySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSummary {
    pub theme_name: String,
    pub property_sets: Vec<PropertySetSummary>,
}

impl ThemeSummary {
    pub fn property_set(&self, name: &str) -> Option<&PropertySetSummary> {
        self.property_sets.iter().find(|s| s.name == name)
    }
}

pub fn summarize(theme: &XmlNode) -> ThemeSummary {
    let entries = |set: &XmlNode, kind: &str| {
        set.children_named(kind)
            .map(|e| EntrySummary {
                name: e.attr(ATTR_NAME).unwrap_or_default().to_string(),
                has_content: e.has_content(),
            })
            .collect::<Vec<_>>()
    };

    ThemeSummary {
        theme_name: theme.attr(ATTR_NAME).unwrap_or_default().to_string(),
        property_sets: theme
            .children_named(PROPERTY_SET_ELEMENT)
            .map(|set| PropertySetSummary {
                name: set.attr(ATTR_NAME).unwrap_or_default().to_string(),
                id_entries: entries(set, ID_ENTRY),
                tag_entries: entries(set, TAG_ENTRY),
            })
            .collect(),
    }
}

/// `default.light.xml` → `default`.
pub fn theme_name_for(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or_default()
        .to_string()
}

pub fn new_theme_document(theme_name: &str, base_theme: &str) -> XmlDocument {
    XmlDocument::new(
        XmlNode::new(THEME_ELEMENT)
            .with_attr(ATTR_NAME, theme_name)
            .with_attr(ATTR_EXTEND, base_theme),
    )
}

/// Parses an existing theme file, or starts a fresh one when the file is missing or blank.
pub fn load_theme(existing: Option<&str>, path: &Path, base_theme: &str) -> Result<XmlDocument> {
    let source = match existing {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            log::info!("creating theme {}", path.display());
            return Ok(new_theme_document(&theme_name_for(path), base_theme));
        }
    };

    let doc = parse_document(source, &path.display().to_string())?;
    if doc.root.tag != THEME_ELEMENT {
        return Err(GenError::InvalidTheme {
            path: path.to_path_buf(),
            reason: format!("root element is <{}>, expected <{}>", doc.root.tag, THEME_ELEMENT),
        });
    }
    Ok(doc)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNCHRONIZATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeSyncReport {
    pub created_property_set: bool,
    pub added_ids: Vec<String>,
    pub added_tags: Vec<String>,
    /// Existing entries that had no body and received the placeholder.
    pub filled: Vec<String>,
}

impl ThemeSyncReport {
    pub fn changed(&self) -> bool {
        self.created_property_set
            || !self.added_ids.is_empty()
            || !self.added_tags.is_empty()
            || !self.filled.is_empty()
    }
}

enum EntryChange {
    Added,
    Filled,
    Present,
}

pub fn sync_theme(theme: &mut XmlNode, index: &FlatNodeIndex, property_set_name: &str) -> ThemeSyncReport {
    let mut report = ThemeSyncReport::default();

    let position = theme
        .children
        .iter()
        .position(|c| c.tag == PROPERTY_SET_ELEMENT && c.attr(ATTR_NAME) == Some(property_set_name));
    let position = match position {
        Some(p) => p,
        None => {
            theme
                .children
                .push(XmlNode::new(PROPERTY_SET_ELEMENT).with_attr(ATTR_NAME, property_set_name));
            report.created_property_set = true;
            theme.children.len() - 1
        }
    };
    let set = &mut theme.children[position];

    for record in index.iter() {
        match ensure_entry(set, ID_ENTRY, &record.id) {
            EntryChange::Added => report.added_ids.push(record.id.clone()),
            EntryChange::Filled => report.filled.push(record.id.clone()),
            EntryChange::Present => {}
        }

        if let Some(tag) = record.tag_attribute.as_deref() {
            match ensure_entry(set, TAG_ENTRY, tag) {
                EntryChange::Added => report.added_tags.push(tag.to_string()),
                EntryChange::Filled => report.filled.push(tag.to_string()),
                EntryChange::Present => {}
            }
        }
    }

    report
}

fn ensure_entry(set: &mut XmlNode, kind: &str, name: &str) -> EntryChange {
    if let Some(entry) = set.find_child_mut(kind, name) {
        if entry.has_content() {
            return EntryChange::Present;
        }
        entry.text = Some(CONTENT_PLACEHOLDER.to_string());
        return EntryChange::Filled;
    }

    // Keep entries of one kind together: after the last of its kind, ids before tags.
    let at = set
        .children
        .iter()
        .rposition(|c| c.tag == kind)
        .map(|p| p + 1)
        .or_else(|| {
            (kind == ID_ENTRY)
                .then(|| set.children.iter().position(|c| c.tag == TAG_ENTRY))
                .flatten()
        })
        .unwrap_or(set.children.len());

    set.children.insert(
        at,
        XmlNode::new(kind)
            .with_attr(ATTR_NAME, name)
            .with_text(CONTENT_PLACEHOLDER),
    );
    EntryChange::Added
}
