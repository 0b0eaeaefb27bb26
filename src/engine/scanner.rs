//! Container discovery.
//!
//! Each scan marks what it hands out, so a container is attached once no
//! matter how many load, settle, or mutation scans run. Clearing the marker
//! re-arms a container for the next scan.

use crate::dom::{Document, NodeId};
use crate::embed::feature::{is_embed_container, is_fullwidth};

pub const PROCESSED_ATTR: &str = "data-embed-sync";
const PROCESSED_VALUE: &str = "attached";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// `fullwidth` marker: tier-driven refetching.
    Adaptive,
    /// Toggles only: rewrite the live iframe once.
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discovered {
    pub node: NodeId,
    pub kind: ContainerKind,
}

/// Find every connected, unmarked container and mark it.
pub fn scan(doc: &mut Document) -> Vec<Discovered> {
    let root = doc.root();
    let found: Vec<Discovered> = doc
        .find_all(root, |n| is_embed_container(n) && n.attr(PROCESSED_ATTR).is_none())
        .into_iter()
        .map(|node| Discovered {
            node,
            kind: if is_fullwidth(doc.node(node)) {
                ContainerKind::Adaptive
            } else {
                ContainerKind::Static
            },
        })
        .collect();

    for d in &found {
        doc.set_attr(d.node, PROCESSED_ATTR, PROCESSED_VALUE);
    }
    if !found.is_empty() {
        log::debug!("scan found {} new container(s)", found.len());
    }
    found
}

pub fn is_processed(doc: &Document, node: NodeId) -> bool {
    doc.attr(node, PROCESSED_ATTR).is_some()
}

/// Drop the processed marker so the next scan hands the node out again.
pub fn clear_marker(doc: &mut Document, node: NodeId) {
    doc.remove_attr(node, PROCESSED_ATTR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parser::parse_document;

    const PAGE: &str = r#"<html><body>
        <figure class="wp-block-embed has-fullwidth-youtube" data-fullwidth="true">
            <iframe src="https://www.youtube.com/embed/aaa"></iframe>
        </figure>
        <figure class="wp-block-embed has-autoplay-youtube" data-autoplay="true">
            <iframe src="https://www.youtube.com/embed/bbb"></iframe>
        </figure>
        <figure class="wp-block-embed">
            <iframe src="https://www.youtube.com/embed/ccc"></iframe>
        </figure>
    </body></html>"#;

    #[test]
    fn discovers_each_container_once() {
        let mut doc = parse_document(PAGE);
        let first = scan(&mut doc);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].kind, ContainerKind::Adaptive);
        assert_eq!(first[1].kind, ContainerKind::Static);
        assert!(first.iter().all(|d| is_processed(&doc, d.node)));
        assert!(scan(&mut doc).is_empty());
    }

    #[test]
    fn picks_up_inserted_and_rearmed_containers() {
        let mut doc = parse_document(PAGE);
        let first = scan(&mut doc);

        let body = doc.body();
        doc.append_html(
            body,
            r#"<figure class="wp-block-embed has-fullwidth-youtube"><iframe src="https://youtu.be/ddd"></iframe></figure>"#,
        );
        let second = scan(&mut doc);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, ContainerKind::Adaptive);

        clear_marker(&mut doc, first[0].node);
        let third = scan(&mut doc);
        assert_eq!(third.iter().map(|d| d.node).collect::<Vec<_>>(), vec![first[0].node]);
    }

    #[test]
    fn ignores_detached_containers() {
        let mut doc = parse_document(PAGE);
        let fig = doc
            .find_descendant(doc.root(), |n| n.has_class("has-fullwidth-youtube"))
            .unwrap();
        doc.detach(fig);
        let found = scan(&mut doc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ContainerKind::Static);
    }
}
