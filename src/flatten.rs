//! Layout tree flattening.
//!
//! Turns a nested layout into a `FlatNodeIndex`: an arena owning one `NodeRecord`
//! per visited element, plus an ordered id → slot map for the identified ones.
//! Records link to each other by slot, so parent back-references never own anything
//! and the whole structure is dropped in one piece when the next save rebuilds it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tree::{XmlNode, ATTR_LAYOUT, ATTR_PROPERTY_SET_NAME, ATTR_TAG};

/// Slot of a record inside its `FlatNodeIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(usize);

/// Which node a record's `parent` link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentPolicy {
    /// The enclosing XML element, even when it has no id.
    #[default]
    Structural,
    /// The closest enclosing element that has an id.
    NearestIdentified,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenOptions {
    pub parent_policy: ParentPolicy,
}

#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// Empty for unidentified elements, which are never indexed.
    pub id: String,
    /// XML element name, i.e. the view class.
    pub tag: String,
    pub is_root: bool,
    pub is_leaf: bool,
    pub has_layout: bool,
    pub has_property_set: bool,
    pub property_set_name: Option<String>,
    pub layout: Option<String>,
    /// Value of the `tag` attribute (the theme tag), not the element name.
    pub tag_attribute: Option<String>,
    pub attributes: IndexMap<String, String>,
    pub parent: Option<NodeRef>,
    children: IndexMap<String, NodeRef>,
}

impl NodeRecord {
    pub fn is_identified(&self) -> bool {
        !self.id.is_empty()
    }

    /// Ids of identified descendants owned by this record, in document order.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(|k| k.as_str())
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlatNodeIndex {
    arena: Vec<NodeRecord>,
    by_id: IndexMap<String, NodeRef>,
    duplicates: Vec<String>,
}

impl FlatNodeIndex {
    pub fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.by_id.get(id).map(|r| &self.arena[r.0])
    }

    pub fn record(&self, node: NodeRef) -> &NodeRecord {
        &self.arena[node.0]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Identified records in document order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.by_id.values().map(move |r| &self.arena[r.0])
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(|k| k.as_str())
    }

    /// The root record, whether or not it carries an id.
    pub fn root(&self) -> Option<&NodeRecord> {
        self.arena.first()
    }

    pub fn parent_of(&self, record: &NodeRecord) -> Option<&NodeRecord> {
        record.parent.map(|p| &self.arena[p.0])
    }

    pub fn children_of<'a>(&'a self, record: &'a NodeRecord) -> impl Iterator<Item = &'a NodeRecord> {
        record.children.values().map(move |r| &self.arena[r.0])
    }

    pub fn leaves(&self) -> impl Iterator<Item = &NodeRecord> {
        self.iter().filter(|r| r.is_leaf)
    }

    pub fn non_leaves(&self) -> impl Iterator<Item = &NodeRecord> {
        self.iter().filter(|r| !r.is_leaf)
    }

    /// Ids that appeared more than once; only their first occurrence is indexed.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLATTENING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn flatten(root: &XmlNode) -> FlatNodeIndex {
    flatten_with(root, FlattenOptions::default())
}

pub fn flatten_with(root: &XmlNode, options: FlattenOptions) -> FlatNodeIndex {
    let mut index = FlatNodeIndex::default();
    visit(root, None, None, true, options, &mut index);
    if !index.duplicates.is_empty() {
        log::warn!(
            "duplicate view ids ignored after first occurrence: {}",
            index.duplicates.join(", ")
        );
    }
    index
}

/// `parent` is the recursion parent, `owner` the nearest identified ancestor.
fn visit(
    node: &XmlNode,
    parent: Option<NodeRef>,
    owner: Option<NodeRef>,
    is_root: bool,
    options: FlattenOptions,
    index: &mut FlatNodeIndex,
) -> NodeRef {
    let property_set_name = node.non_empty_attr(ATTR_PROPERTY_SET_NAME).map(str::to_string);
    let layout = node.non_empty_attr(ATTR_LAYOUT).map(str::to_string);

    let this = NodeRef(index.arena.len());
    index.arena.push(NodeRecord {
        id: node.id().unwrap_or_default().to_string(),
        tag: node.tag.clone(),
        is_root,
        is_leaf: node.is_leaf(),
        has_layout: layout.is_some(),
        has_property_set: property_set_name.is_some(),
        property_set_name,
        layout,
        tag_attribute: node.non_empty_attr(ATTR_TAG).map(str::to_string),
        attributes: node.attributes.clone(),
        parent: match options.parent_policy {
            ParentPolicy::Structural => parent,
            ParentPolicy::NearestIdentified => owner,
        },
        children: IndexMap::new(),
    });

    let mut owner_for_children = owner;
    if let Some(id) = node.id() {
        if index.by_id.contains_key(id) {
            index.duplicates.push(id.to_string());
        } else {
            index.by_id.insert(id.to_string(), this);
            if let Some(o) = owner {
                index.arena[o.0].children.entry(id.to_string()).or_insert(this);
            }
            owner_for_children = Some(this);
        }
    }

    for (_, group) in node.child_groups() {
        for child in group {
            visit(child, Some(this), owner_for_children, false, options, index);
        }
    }

    this
}
