use std::collections::HashMap;

use crate::dom::{Document, NodeId};

/// Width measurements the engine cannot compute itself.
///
/// A browser host answers from `getBoundingClientRect`; the CLI and tests
/// use [`StaticLayout`].
pub trait Layout {
    /// Rendered width of `node` in CSS px, or `None` when it is not laid out.
    fn width_of(&self, doc: &Document, node: NodeId) -> Option<f32>;

    fn viewport_width(&self) -> f32;
}

/// Fixed measurements: explicit per-node widths, then an inline `width: Npx`,
/// then the viewport width. `display: none` and detached nodes are unmeasured.
#[derive(Debug, Clone)]
pub struct StaticLayout {
    viewport: f32,
    widths: HashMap<NodeId, f32>,
}

impl StaticLayout {
    pub fn new(viewport_width: f32) -> Self {
        Self {
            viewport: viewport_width,
            widths: HashMap::new(),
        }
    }

    pub fn set_width(&mut self, node: NodeId, width: f32) {
        self.widths.insert(node, width);
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport = width;
    }
}

impl Layout for StaticLayout {
    fn width_of(&self, doc: &Document, node: NodeId) -> Option<f32> {
        if !doc.is_connected(node) {
            return None;
        }
        if let Some(&w) = self.widths.get(&node) {
            return Some(w);
        }
        let style = doc.style(node);
        if style.get("display") == Some("none") {
            return None;
        }
        Some(style.px("width").unwrap_or(self.viewport).min(self.viewport))
    }

    fn viewport_width(&self) -> f32 {
        self.viewport
    }
}
