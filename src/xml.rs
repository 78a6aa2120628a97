//! XML I/O for layout and theme documents.
//!
//! Reads UTF-8 XML into an `XmlDocument` with quick-xml and writes it back with an
//! XML declaration and two-space indentation. Attribute values and mixed content
//! round-trip exactly; element order is preserved. Comments and processing
//! instructions are dropped.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{GenError, Result};
use crate::tree::{XmlDocument, XmlNode};

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse XML text. `origin` names the source in error messages.
pub fn parse_document(source: &str, origin: &str) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(false);
    reader.check_end_names(true);

    let mut buf = Vec::new();
    let mut stack: Vec<(XmlNode, String)> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let node = start_node(&e, origin)?;
                if let Some((parent, pending)) = stack.last_mut() {
                    flush_text(parent, pending);
                }
                stack.push((node, String::new()));
            }
            Ok(Event::Empty(e)) => {
                let node = start_node(&e, origin)?;
                if let Some((parent, pending)) = stack.last_mut() {
                    flush_text(parent, pending);
                }
                attach(node, &mut stack, &mut root, origin)?;
            }
            Ok(Event::End(_)) => {
                let (node, text) = stack
                    .pop()
                    .ok_or_else(|| GenError::xml(origin, "unbalanced closing tag"))?;
                attach(finish_node(node, text), &mut stack, &mut root, origin)?;
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| {
                    GenError::xml(origin, format!("at byte {}: {}", reader.buffer_position(), e))
                })?;
                match stack.last_mut() {
                    Some((_, acc)) => acc.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(GenError::xml(origin, "text outside of the root element")),
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, acc)) = stack.last_mut() {
                    acc.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GenError::xml(
                    origin,
                    format!("at byte {}: {}", reader.buffer_position(), e),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some((open, _)) = stack.last() {
        return Err(GenError::xml(origin, format!("unclosed element <{}>", open.tag)));
    }

    root.map(XmlDocument::new)
        .ok_or_else(|| GenError::xml(origin, "document has no root element"))
}

fn start_node(e: &BytesStart, origin: &str) -> Result<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| GenError::xml(origin, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| GenError::xml(origin, err))?
            .into_owned();
        node.attributes.insert(key, value);
    }
    Ok(node)
}

/// A leaf keeps its text verbatim; in mixed content the last segment becomes the
/// tail of the last child.
fn finish_node(mut node: XmlNode, mut pending: String) -> XmlNode {
    if node.children.is_empty() {
        node.text = Some(pending).filter(|t| !t.is_empty());
    } else {
        flush_text(&mut node, &mut pending);
    }
    node
}

/// Moves pending character data into `node`: before its first child it is the node's
/// own text, after a child it is that child's tail. Whitespace-only runs are
/// indentation and are dropped.
fn flush_text(node: &mut XmlNode, pending: &mut String) {
    let text = std::mem::take(pending);
    if text.trim().is_empty() {
        return;
    }
    let slot = match node.children.last_mut() {
        Some(child) => &mut child.tail,
        None => &mut node.text,
    };
    slot.get_or_insert_with(String::new).push_str(&text);
}

fn attach(
    node: XmlNode,
    stack: &mut [(XmlNode, String)],
    root: &mut Option<XmlNode>,
    origin: &str,
) -> Result<()> {
    if let Some((parent, _)) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(GenError::xml(origin, "multiple root elements"));
    }
    *root = Some(node);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERIALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn to_xml_string(doc: &XmlDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| GenError::xml("serializer", e))?;
    write_node(&mut writer, &doc.root)?;

    let mut out = String::from_utf8(writer.into_inner())
        .map_err(|e| GenError::xml("serializer", e))?;
    out.push('\n');
    Ok(out)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = node.text.as_deref().filter(|t| !t.is_empty());
    if node.children.is_empty() && text.is_none() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| GenError::xml("serializer", e));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| GenError::xml("serializer", e))?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| GenError::xml("serializer", e))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
        if let Some(tail) = child.tail.as_deref().filter(|t| !t.is_empty()) {
            writer
                .write_event(Event::Text(BytesText::new(tail)))
                .map_err(|e| GenError::xml("serializer", e))?;
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.tag.as_str())))
        .map_err(|e| GenError::xml("serializer", e))
}
