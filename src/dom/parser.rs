use crate::dom::{Document, NodeId};
use scraper::{ElementRef, Html, Node};

/// Parse a full HTML page into an arena [`Document`].
pub fn parse_document(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let mut doc = Document::new();
    let root = doc.root();

    for child in parsed.tree.root().children() {
        match ElementRef::wrap(child) {
            Some(el) => convert_element(&mut doc, root, el),
            None => convert_leaf(&mut doc, root, child.value()),
        }
    }
    doc
}

/// Parse an HTML fragment (e.g. an oEmbed `html` payload). The fragment's
/// top-level nodes become children of the document root, with no
/// `<html>`/`<body>` scaffolding.
pub fn parse_fragment(html: &str) -> Document {
    let parsed = Html::parse_fragment(html);
    let mut doc = Document::new();
    let root = doc.root();

    // html5ever wraps fragments in a synthetic <html> element.
    for child in parsed.root_element().children() {
        match ElementRef::wrap(child) {
            Some(el) => convert_element(&mut doc, root, el),
            None => convert_leaf(&mut doc, root, child.value()),
        }
    }
    doc
}

fn convert_element(doc: &mut Document, parent: NodeId, el: ElementRef<'_>) {
    let id = doc.create_element(el.value().name.local.as_ref());
    for (k, v) in el.value().attrs() {
        doc.set_attr(id, k, v);
    }
    doc.append_child(parent, id);

    for child in el.children() {
        match ElementRef::wrap(child) {
            Some(child_el) => convert_element(doc, id, child_el),
            None => convert_leaf(doc, id, child.value()),
        }
    }
}

fn convert_leaf(doc: &mut Document, parent: NodeId, node: &Node) {
    match node {
        Node::Text(t) => {
            let id = doc.create_text(&t.text);
            doc.append_child(parent, id);
        }
        Node::Comment(c) => {
            let id = doc.create_comment(&c.comment);
            doc.append_child(parent, id);
        }
        Node::Doctype(d) => {
            doc.doctype = Some(d.name().to_string());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_page() {
        let html = r#"
        <!DOCTYPE html>
        <html>
            <head><title>Test Page</title></head>
            <body>
                <figure class="wp-block-embed has-fullwidth-youtube" data-autoplay="true">
                    <div class="wp-block-embed__wrapper">
                        <iframe src="https://www.youtube.com/embed/abc123"></iframe>
                    </div>
                </figure>
            </body>
        </html>
        "#;

        let doc = parse_document(html);
        assert_eq!(doc.doctype.as_deref(), Some("html"));
        let figure = doc
            .find_descendant(doc.root(), |n| n.tag == "figure")
            .expect("figure");
        assert!(doc.has_class(figure, "has-fullwidth-youtube"));
        assert_eq!(doc.attr(figure, "data-autoplay"), Some("true"));
        let iframe = doc
            .find_descendant(figure, |n| n.tag == "iframe")
            .expect("iframe");
        assert_eq!(
            doc.attr(iframe, "src"),
            Some("https://www.youtube.com/embed/abc123")
        );
    }

    #[test]
    fn fragment_has_no_scaffolding() {
        let doc = parse_fragment(
            r#"<iframe width="640" height="360" src="https://www.youtube.com/embed/x?feature=oembed"></iframe>"#,
        );
        let top = doc.node(doc.root()).children();
        assert_eq!(top.len(), 1);
        assert_eq!(doc.node(top[0]).tag, "iframe");
        assert_eq!(doc.attr(top[0], "width"), Some("640"));
    }

    #[test]
    fn keeps_comments() {
        let doc = parse_fragment("<!-- wp:embed --><p>x</p>");
        let top = doc.node(doc.root()).children();
        assert_eq!(doc.node(top[0]).text, " wp:embed ");
    }
}
