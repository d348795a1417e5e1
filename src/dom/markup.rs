//! Load saved sidebar markup into a [`Document`].
//!
//! Snapshots are XHTML-ish fragments captured from the host page. Parsing is
//! lenient about HTML habits: void elements need no closing tag, end tags
//! close the nearest open element with the same name, and unmatched end tags
//! are ignored.

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{Document, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parse a document whose body holds the given markup.
pub fn load(markup: &str) -> Result<Document> {
    let mut doc = Document::new();
    let nodes = parse_fragment(&mut doc, markup)?;
    let root = doc.root();
    for node in nodes {
        doc.append_child(root, node)
            .context("Failed to attach parsed markup")?;
    }
    Ok(doc)
}

/// Parse `markup` into detached nodes owned by `doc`, returning the top-level
/// elements in source order.
pub fn parse_fragment(doc: &mut Document, markup: &str) -> Result<Vec<NodeId>> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut top_level = Vec::new();
    // (tag, node) of every open element
    let mut open: Vec<(String, NodeId)> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed markup near byte {}", reader.buffer_position()))?;
        match event {
            Event::Eof => break,
            Event::Start(start) => {
                let (tag, node) = build_element(doc, &start)?;
                attach(doc, &open, &mut top_level, node)?;
                if !is_void(&tag) {
                    open.push((tag, node));
                }
            }
            Event::Empty(start) => {
                let (_, node) = build_element(doc, &start)?;
                attach(doc, &open, &mut top_level, node)?;
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                if let Some(pos) = open.iter().rposition(|(tag, _)| *tag == name) {
                    open.truncate(pos);
                }
            }
            Event::Text(text) => {
                let Some((_, parent)) = open.last() else {
                    continue;
                };
                let value = match text.unescape() {
                    Ok(value) => value.into_owned(),
                    Err(_) => String::from_utf8_lossy(&text).into_owned(),
                };
                let mut combined = doc
                    .get(*parent)
                    .map(|el| el.own_text().to_string())
                    .unwrap_or_default();
                if !combined.is_empty() {
                    combined.push(' ');
                }
                combined.push_str(&value);
                doc.set_text(*parent, &combined)
                    .context("Failed to set element text")?;
            }
            _ => {}
        }
    }

    Ok(top_level)
}

fn build_element(doc: &mut Document, start: &BytesStart<'_>) -> Result<(String, NodeId)> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let node = doc.create_element(&tag);
    for attr in start.html_attributes() {
        let attr = attr.with_context(|| format!("Bad attribute on <{}>", tag))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        doc.set_attribute(node, &key, &value)
            .context("Failed to set attribute")?;
    }
    Ok((tag, node))
}

fn attach(
    doc: &mut Document,
    open: &[(String, NodeId)],
    top_level: &mut Vec<NodeId>,
    node: NodeId,
) -> Result<()> {
    match open.last() {
        Some((_, parent)) => doc
            .append_child(*parent, node)
            .context("Failed to attach element")?,
        None => top_level.push(node),
    }
    Ok(())
}
