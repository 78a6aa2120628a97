//! Attributed tree: the in-memory form of a parsed XML document.
//!
//! Child elements are stored in document order. The "children keyed by tag name"
//! shape is a derived view (`child_groups`) in which a lone child is simply a
//! one-element sequence, so callers never branch on single-vs-array.

use indexmap::IndexMap;

pub const ATTR_ID: &str = "id";
pub const ATTR_LAYOUT: &str = "layout";
pub const ATTR_PROPERTY_SET_NAME: &str = "propertySetName";
pub const ATTR_TAG: &str = "tag";
pub const ATTR_NAME: &str = "name";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNode {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    /// Character data before the first child element; the whole text of a leaf.
    /// Leaf text is kept verbatim, whitespace-only runs between elements are dropped.
    pub text: Option<String>,
    /// Character data following this element inside its parent.
    pub tail: Option<String>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Attribute value, treating an empty string as absent.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    /// Returns true when the stored value actually changed.
    pub fn set_attr(&mut self, name: &str, value: &str) -> bool {
        if self.attr(name) == Some(value) {
            return false;
        }
        self.attributes.insert(name.to_string(), value.to_string());
        true
    }

    /// Removes the attribute keeping the order of the remaining ones.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        self.attributes.shift_remove(name).is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.non_empty_attr(ATTR_ID)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True when the element carries text or child elements.
    pub fn has_content(&self) -> bool {
        !self.children.is_empty() || self.text.as_deref().map_or(false, |t| !t.is_empty())
    }

    /// Children grouped by tag name, groups ordered by first appearance.
    pub fn child_groups(&self) -> IndexMap<&str, Vec<&XmlNode>> {
        let mut groups: IndexMap<&str, Vec<&XmlNode>> = IndexMap::new();
        for child in &self.children {
            groups.entry(child.tag.as_str()).or_default().push(child);
        }
        groups
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    pub fn find_child_mut(&mut self, tag: &str, name: &str) -> Option<&mut XmlNode> {
        self.children
            .iter_mut()
            .find(|c| c.tag == tag && c.attr(ATTR_NAME) == Some(name))
    }
}

/// A parsed XML file. Prolog, comments and processing instructions are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlNode,
}

impl XmlDocument {
    pub fn new(root: XmlNode) -> Self {
        Self { root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_groups_are_uniform_sequences() {
        let node = XmlNode::new("CompositeView")
            .with_child(XmlNode::new("Button").with_attr("id", "a"))
            .with_child(XmlNode::new("TextView").with_attr("id", "b"))
            .with_child(XmlNode::new("Button").with_attr("id", "c"));

        let groups = node.child_groups();
        let keys: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["Button", "TextView"]);
        assert_eq!(groups["Button"].len(), 2);
        assert_eq!(groups["TextView"].len(), 1);
    }

    #[test]
    fn test_set_and_remove_attr_report_changes() {
        let mut node = XmlNode::new("View");
        assert!(node.set_attr("id", "x"));
        assert!(!node.set_attr("id", "x"));
        assert!(node.remove_attr("id"));
        assert!(!node.remove_attr("id"));
    }

    #[test]
    fn test_empty_id_is_absent() {
        let node = XmlNode::new("View").with_attr("id", "");
        assert_eq!(node.id(), None);
    }

    #[test]
    fn test_has_content() {
        assert!(!XmlNode::new("id").has_content());
        assert!(XmlNode::new("id").with_text(" ").has_content());
        assert!(XmlNode::new("id").with_child(XmlNode::new("p")).has_content());
    }
}
