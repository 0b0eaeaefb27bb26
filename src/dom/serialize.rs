//! HTML serialization of arena documents.

use crate::dom::{Document, NodeId, NodeType};

/// Elements that never have children or an end tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text content is emitted verbatim.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Serialize the whole document, including the doctype if one was parsed.
pub fn to_html(doc: &Document) -> String {
    let mut buf = String::new();
    if let Some(ref name) = doc.doctype {
        buf.push_str("<!DOCTYPE ");
        buf.push_str(name);
        buf.push('>');
    }
    for &child in doc.node(doc.root()).children() {
        write_node(doc, child, false, &mut buf);
    }
    buf
}

pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut buf = String::new();
    write_node(doc, id, false, &mut buf);
    buf
}

fn write_node(doc: &Document, id: NodeId, raw_text: bool, buf: &mut String) {
    let node = doc.node(id);
    match node.node_type {
        NodeType::Text => {
            if raw_text {
                buf.push_str(&node.text);
            } else {
                escape_into(&node.text, false, buf);
            }
        }
        NodeType::Comment => {
            buf.push_str("<!--");
            buf.push_str(&node.text);
            buf.push_str("-->");
        }
        NodeType::Document => {
            for &child in node.children() {
                write_node(doc, child, false, buf);
            }
        }
        NodeType::Element => {
            buf.push('<');
            buf.push_str(&node.tag);
            for (k, v) in &node.attributes {
                buf.push(' ');
                buf.push_str(k);
                buf.push_str("=\"");
                escape_into(v, true, buf);
                buf.push('"');
            }
            buf.push('>');
            if VOID_TAGS.contains(&node.tag.as_str()) {
                return;
            }
            let raw = RAW_TEXT_TAGS.contains(&node.tag.as_str());
            for &child in node.children() {
                write_node(doc, child, raw, buf);
            }
            buf.push_str("</");
            buf.push_str(&node.tag);
            buf.push('>');
        }
    }
}

fn escape_into(s: &str, attribute: bool, buf: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => buf.push_str("&amp;"),
            '"' if attribute => buf.push_str("&quot;"),
            '<' if !attribute => buf.push_str("&lt;"),
            '>' if !attribute => buf.push_str("&gt;"),
            '\u{a0}' => buf.push_str("&nbsp;"),
            c => buf.push(c),
        }
    }
}
