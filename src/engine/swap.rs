//! Iframe replacement inside an embed container.
//!
//! The swap is idempotent: applying the same fragment twice yields the same
//! DOM shape (fresh node handles, identical markup).

use std::collections::BTreeMap;

use crate::dom::css::parse_css_px;
use crate::dom::parser::parse_fragment;
use crate::dom::{Document, NodeId};
use crate::embed::feature::{FeatureFlag, FeatureSet};
use crate::embed::params::compose;
use crate::embed::tier::{Tier, ASPECT_RATIO_16_9};
use crate::error::EmbedError;

pub const WRAPPER_CLASS: &str = "wp-block-embed__wrapper";
pub const RESPONSIVE_CLASS: &str = "wp-embed-responsive";
pub const HAS_ASPECT_CLASS: &str = "wp-has-aspect-ratio";
const ASPECT_CLASS_PREFIX: &str = "wp-embed-aspect-";

/// WordPress embed aspect classes, widest first: (width/height, class suffix,
/// height/width).
const ASPECT_TABLE: &[(f64, &str, f64)] = &[
    (2.33, "21-9", 9.0 / 21.0),
    (2.00, "18-9", 9.0 / 18.0),
    (1.78, "16-9", ASPECT_RATIO_16_9),
    (1.33, "4-3", 3.0 / 4.0),
    (1.00, "1-1", 1.0),
    (0.56, "9-16", 16.0 / 9.0),
    (0.50, "1-2", 2.0),
];

/// Declared aspect ratio of a fetched player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aspect {
    suffix: &'static str,
    height_ratio: f64,
}

impl Default for Aspect {
    fn default() -> Self {
        Self {
            suffix: "16-9",
            height_ratio: ASPECT_RATIO_16_9,
        }
    }
}

impl Aspect {
    /// Map intrinsic dimensions onto the nearest aspect class, the way the
    /// block editor does: the first class whose ratio does not exceed the
    /// measured one, if it is within 0.1 of it.
    pub fn from_dimensions(width: f32, height: f32) -> Option<Self> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let ratio = ((width as f64 / height as f64) * 100.0).round() / 100.0;
        let &(r, suffix, height_ratio) = ASPECT_TABLE.iter().find(|(r, _, _)| ratio >= *r)?;
        if ratio - r > 0.1 {
            return None;
        }
        Some(Self {
            suffix,
            height_ratio,
        })
    }

    pub fn class(&self) -> String {
        format!("{}{}", ASPECT_CLASS_PREFIX, self.suffix)
    }

    pub fn height_ratio(&self) -> f64 {
        self.height_ratio
    }
}

/// The iframe extracted from an oEmbed `html` payload, with its fixed
/// `width`/`height` already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub attributes: BTreeMap<String, String>,
    pub aspect: Aspect,
}

impl Fragment {
    pub fn parse(html: &str) -> Result<Self, EmbedError> {
        let doc = parse_fragment(html);
        let iframe = doc
            .find_descendant(doc.root(), |n| n.tag == "iframe")
            .ok_or(EmbedError::FragmentFailure)?;

        let mut attributes = doc.node(iframe).attributes.clone();
        let width = attributes.remove("width").and_then(|v| parse_css_px(&v));
        let height = attributes.remove("height").and_then(|v| parse_css_px(&v));
        let aspect = match (width, height) {
            (Some(w), Some(h)) => Aspect::from_dimensions(w, h).unwrap_or_default(),
            _ => Aspect::default(),
        };
        Ok(Self { attributes, aspect })
    }

    /// Rewrite the player URL for the container's feature flags.
    pub fn compose_src(&mut self, flags: FeatureSet, video_id: Option<&str>) {
        if let Some(src) = self.attributes.get_mut("src") {
            *src = compose(src, flags, video_id);
        }
    }
}

/// Handles the swapper touched, for callers that want to inspect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub wrapper: NodeId,
    pub iframe: NodeId,
}

/// Existing wrapper, or a new one placed where the live iframe sat.
pub fn ensure_wrapper(doc: &mut Document, container: NodeId) -> NodeId {
    if let Some(w) = doc.find_descendant(container, |n| n.has_class(WRAPPER_CLASS)) {
        return w;
    }
    let reference = doc
        .find_descendant(container, |n| n.tag == "iframe")
        .filter(|&i| doc.node(i).parent() == Some(container));
    let wrapper = doc.create_element("div");
    doc.set_attr(wrapper, "class", WRAPPER_CLASS);
    doc.insert_before(container, wrapper, reference);
    wrapper
}

/// Replace every iframe in `container` with the fragment's iframe.
pub fn swap(
    doc: &mut Document,
    container: NodeId,
    fragment: &Fragment,
    flags: FeatureSet,
    tier: Tier,
) -> SwapOutcome {
    let wrapper = ensure_wrapper(doc, container);

    for old in doc.find_all(container, |n| n.tag == "iframe") {
        doc.detach(old);
    }
    doc.clear_children(wrapper);

    let iframe = doc.create_element("iframe");
    for (k, v) in &fragment.attributes {
        doc.set_attr(iframe, k, v.as_str());
    }
    doc.append_child(wrapper, iframe);

    doc.set_style(wrapper, "position", "relative");
    doc.set_style(wrapper, "width", "100%");
    let height = tier.height_at(fragment.aspect.height_ratio());
    doc.set_style(wrapper, "height", &format!("{}px", height));

    doc.set_style(iframe, "position", "absolute");
    doc.set_style(iframe, "top", "0");
    doc.set_style(iframe, "left", "0");
    doc.set_style(iframe, "width", "100%");
    doc.set_style(iframe, "height", "100%");
    if flags.contains(FeatureFlag::DisableInteraction) {
        block_pointer_events(doc, iframe);
    }

    let aspect_class = fragment.aspect.class();
    let stale: Vec<String> = doc
        .node(container)
        .classes()
        .filter(|c| c.starts_with(ASPECT_CLASS_PREFIX) && *c != aspect_class)
        .map(str::to_string)
        .collect();
    for class in stale {
        doc.remove_class(container, &class);
    }
    doc.add_class(container, RESPONSIVE_CLASS);
    doc.add_class(container, HAS_ASPECT_CLASS);
    doc.add_class(container, &aspect_class);

    SwapOutcome { wrapper, iframe }
}

/// Parse `html` and swap it in. A fragment without an iframe leaves the
/// document untouched.
pub fn swap_html(
    doc: &mut Document,
    container: NodeId,
    html: &str,
    flags: FeatureSet,
    video_id: Option<&str>,
    tier: Tier,
) -> Result<SwapOutcome, EmbedError> {
    let mut fragment = Fragment::parse(html)?;
    fragment.compose_src(flags, video_id);
    Ok(swap(doc, container, &fragment, flags, tier))
}

/// Clicks and drags must not reach the player.
pub fn block_pointer_events(doc: &mut Document, iframe: NodeId) {
    doc.set_style(iframe, "pointer-events", "none");
}

/// Apply flags to the live iframe without refetching. Used for containers
/// that carry toggles but not the adaptive `fullwidth` marker.
pub fn rewrite_in_place(
    doc: &mut Document,
    container: NodeId,
    flags: FeatureSet,
) -> Option<NodeId> {
    let iframe = doc.find_descendant(container, |n| n.tag == "iframe")?;
    let src = doc.attr(iframe, "src")?.to_string();
    let composed = compose(&src, flags, None);
    if composed != src {
        doc.set_attr(iframe, "src", composed);
    }
    if flags.contains(FeatureFlag::DisableInteraction) {
        block_pointer_events(doc, iframe);
    }
    Some(iframe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parser::parse_fragment;
    use crate::dom::serialize::outer_html;

    const FRAGMENT: &str = r#"<iframe title="Demo" width="640" height="360" src="https://www.youtube.com/embed/abc?feature=oembed" frameborder="0" allowfullscreen></iframe>"#;

    fn container_doc(inner: &str) -> (Document, NodeId) {
        let doc = parse_fragment(&format!(
            r#"<figure class="wp-block-embed is-type-video has-fullwidth-youtube">{}</figure>"#,
            inner
        ));
        let fig = doc.node(doc.root()).children()[0];
        (doc, fig)
    }

    #[test]
    fn swaps_into_existing_wrapper() {
        let (mut doc, fig) = container_doc(
            r#"<div class="wp-block-embed__wrapper"><iframe src="https://www.youtube.com/embed/abc" width="500" height="281"></iframe></div>"#,
        );
        let out = swap_html(
            &mut doc,
            fig,
            FRAGMENT,
            FeatureSet::empty().with(FeatureFlag::Autoplay),
            Some("abc"),
            Tier(640),
        )
        .unwrap();

        assert_eq!(doc.find_all(fig, |n| n.tag == "iframe"), vec![out.iframe]);
        assert_eq!(doc.attr(out.iframe, "width"), None);
        assert_eq!(doc.attr(out.iframe, "height"), None);
        assert_eq!(
            doc.attr(out.iframe, "src"),
            Some("https://www.youtube.com/embed/abc?feature=oembed&autoplay=1&mute=1")
        );
        assert_eq!(doc.style(out.wrapper).get("height"), Some("360px"));
        assert_eq!(doc.style(out.iframe).get("position"), Some("absolute"));
        assert_eq!(doc.style(out.iframe).get("pointer-events"), None);
        for class in [RESPONSIVE_CLASS, HAS_ASPECT_CLASS, "wp-embed-aspect-16-9"] {
            assert!(doc.has_class(fig, class), "missing {}", class);
        }
    }

    #[test]
    fn creates_wrapper_where_iframe_was() {
        let (mut doc, fig) = container_doc(
            r#"<iframe src="https://www.youtube.com/embed/abc"></iframe><figcaption>cap</figcaption>"#,
        );
        let out =
            swap_html(&mut doc, fig, FRAGMENT, FeatureSet::empty(), None, Tier(1024)).unwrap();
        let children = doc.node(fig).children();
        assert_eq!(children[0], out.wrapper);
        assert_eq!(doc.node(children[1]).tag, "figcaption");
        assert_eq!(doc.find_all(fig, |n| n.tag == "iframe").len(), 1);
        assert_eq!(doc.style(out.wrapper).get("height"), Some("576px"));
    }

    #[test]
    fn fragment_without_iframe_is_a_no_op() {
        let (mut doc, fig) =
            container_doc(r#"<iframe src="https://www.youtube.com/embed/abc"></iframe>"#);
        let before = outer_html(&doc, fig);
        let res = swap_html(
            &mut doc,
            fig,
            "<blockquote>no player</blockquote>",
            FeatureSet::empty(),
            None,
            Tier(640),
        );
        assert_eq!(res, Err(EmbedError::FragmentFailure));
        assert_eq!(outer_html(&doc, fig), before);
    }

    #[test]
    fn swap_is_idempotent() {
        let (mut doc, fig) =
            container_doc(r#"<iframe src="https://www.youtube.com/embed/abc"></iframe>"#);
        let flags = FeatureSet::empty()
            .with(FeatureFlag::HideControls)
            .with(FeatureFlag::DisableInteraction);
        swap_html(&mut doc, fig, FRAGMENT, flags, None, Tier(640)).unwrap();
        let first = outer_html(&doc, fig);
        swap_html(&mut doc, fig, FRAGMENT, flags, None, Tier(640)).unwrap();
        assert_eq!(outer_html(&doc, fig), first);
        assert!(first.contains("pointer-events: none"));
        assert!(first.contains("controls=0"));
    }

    #[test]
    fn honours_declared_aspect() {
        let (mut doc, fig) = container_doc("");
        doc.add_class(fig, "wp-embed-aspect-16-9");
        let out = swap_html(
            &mut doc,
            fig,
            r#"<iframe width="480" height="360" src="https://www.youtube.com/embed/abc"></iframe>"#,
            FeatureSet::empty(),
            None,
            Tier(640),
        )
        .unwrap();
        assert!(doc.has_class(fig, "wp-embed-aspect-4-3"));
        assert!(!doc.has_class(fig, "wp-embed-aspect-16-9"));
        assert_eq!(doc.style(out.wrapper).get("height"), Some("480px"));
    }

    #[test]
    fn aspect_table_matches_editor_buckets() {
        let class = |w: f32, h: f32| Aspect::from_dimensions(w, h).map(|a| a.class());
        assert_eq!(class(640.0, 360.0).as_deref(), Some("wp-embed-aspect-16-9"));
        assert_eq!(class(360.0, 640.0).as_deref(), Some("wp-embed-aspect-9-16"));
        assert_eq!(class(500.0, 500.0).as_deref(), Some("wp-embed-aspect-1-1"));
        assert_eq!(Aspect::from_dimensions(1000.0, 300.0), None);
        assert_eq!(Aspect::from_dimensions(0.0, 300.0), None);
    }

    #[test]
    fn rewrites_static_container_in_place() {
        let (mut doc, fig) = container_doc(
            r#"<iframe src="https://www.youtube.com/embed/abc?feature=oembed"></iframe>"#,
        );
        let flags = FeatureSet::empty()
            .with(FeatureFlag::Loop)
            .with(FeatureFlag::DisableInteraction);
        let iframe = rewrite_in_place(&mut doc, fig, flags).unwrap();
        assert_eq!(
            doc.attr(iframe, "src"),
            Some("https://www.youtube.com/embed/abc?feature=oembed&loop=1&playlist=abc&disablekb=1")
        );
        assert_eq!(doc.style(iframe).get("pointer-events"), Some("none"));
    }
}
