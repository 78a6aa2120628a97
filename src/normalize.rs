//! Layout attribute injection.
//!
//! The root takes its id from the layout file name and is the only node carrying a
//! `propertySetName`. Every non-leaf node (and the root) references its layout
//! parameters as `{layout.<id>}`; leaves carry no `layout`, and neither does a
//! container without an id since no reference can be formed. Decisions depend on tree
//! shape only, so a second pass over the output changes nothing.

use crate::tree::{XmlNode, ATTR_ID, ATTR_LAYOUT, ATTR_PROPERTY_SET_NAME};

pub fn layout_reference(id: &str) -> String {
    format!("{{layout.{}}}", id)
}

/// Returns true when any attribute was added, changed or removed.
pub fn normalize(root: &mut XmlNode, base_name: &str) -> bool {
    let mut changed = root.set_attr(ATTR_ID, base_name);
    changed |= root.set_attr(ATTR_PROPERTY_SET_NAME, base_name);
    changed |= root.set_attr(ATTR_LAYOUT, &layout_reference(base_name));

    for child in &mut root.children {
        changed |= normalize_descendant(child);
    }
    changed
}

fn normalize_descendant(node: &mut XmlNode) -> bool {
    let mut changed = node.remove_attr(ATTR_PROPERTY_SET_NAME);

    if node.is_leaf() {
        changed |= node.remove_attr(ATTR_LAYOUT);
        return changed;
    }

    match node.id().map(layout_reference) {
        Some(reference) => changed |= node.set_attr(ATTR_LAYOUT, &reference),
        None => {
            log::debug!("<{}> has children but no id, leaving it without layout", node.tag);
            changed |= node.remove_attr(ATTR_LAYOUT);
        }
    }

    for child in &mut node.children {
        changed |= normalize_descendant(child);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> XmlNode {
        XmlNode::new("CompositeView")
            .with_attr("id", "stale")
            .with_child(
                XmlNode::new("Button")
                    .with_attr("id", "ok")
                    .with_attr("layout", "{layout.ok}")
                    .with_attr("propertySetName", "ok"),
            )
            .with_child(
                XmlNode::new("CompositeView")
                    .with_attr("id", "panel")
                    .with_attr("layout", "{layout.old}")
                    .with_child(XmlNode::new("TextView").with_attr("id", "label")),
            )
            .with_child(
                XmlNode::new("CompositeView")
                    .with_attr("layout", "{layout.undefined}")
                    .with_child(XmlNode::new("TextView").with_attr("id", "deep")),
            )
    }

    #[test]
    fn test_root_takes_file_name() {
        let mut root = sample();
        assert!(normalize(&mut root, "login"));
        assert_eq!(root.attr("id"), Some("login"));
        assert_eq!(root.attr("propertySetName"), Some("login"));
        assert_eq!(root.attr("layout"), Some("{layout.login}"));
    }

    #[test]
    fn test_leaf_and_container_attributes() {
        let mut root = sample();
        normalize(&mut root, "login");

        let ok = &root.children[0];
        assert_eq!(ok.attr("layout"), None);
        assert_eq!(ok.attr("propertySetName"), None);

        let panel = &root.children[1];
        assert_eq!(panel.attr("layout"), Some("{layout.panel}"));
        assert_eq!(panel.children[0].attr("layout"), None);

        let anonymous = &root.children[2];
        assert_eq!(anonymous.attr("layout"), None);
    }

    #[test]
    fn test_leaf_root_still_gets_layout() {
        let mut root = XmlNode::new("CompositeView");
        normalize(&mut root, "empty");
        assert_eq!(root.attr("layout"), Some("{layout.empty}"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut root = sample();
        assert!(normalize(&mut root, "login"));
        let once = root.clone();
        assert!(!normalize(&mut root, "login"));
        assert_eq!(root, once);
    }
}
