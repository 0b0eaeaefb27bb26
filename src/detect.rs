//! Decide whether a page needs the embed engine at all.
//!
//! Two sources feed one [`DetectionResult`]: the stored post content, where
//! blocks are serialized as `<!-- wp:name {json} -->` comments, and the
//! rendered markup, which also covers widgets and templates that never pass
//! through post content.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::dom::parser::parse_document;
use crate::embed::feature::is_embed_container;

/// Block attributes that need the frontend engine when set in post content.
const ENGINE_ATTRIBUTES: [&str; 4] = ["fullwidth", "autoplay", "hideControls", "loop"];

const EMBED_BLOCK: &str = "core/embed";

static BLOCK_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<!--\s+(/)?wp:([a-z][a-z0-9_-]*/)?([a-z][a-z0-9_-]*)\s+(?:(\{.*?\})\s+)?(/)?-->",
    )
    .expect("valid block comment regex")
});

/// One serialized block with its attributes and nested blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Fully qualified, e.g. `core/embed`.
    pub name: String,
    pub attrs: Map<String, Value>,
    pub inner_blocks: Vec<Block>,
}

impl Block {
    fn new(namespace: Option<&str>, name: &str, attrs: Option<&str>) -> Self {
        let attrs = attrs
            .and_then(|json| match serde_json::from_str::<Value>(json) {
                Ok(Value::Object(map)) => Some(map),
                Ok(_) => None,
                Err(e) => {
                    log::debug!("ignoring malformed attributes on wp:{}: {}", name, e);
                    None
                }
            })
            .unwrap_or_default();
        Self {
            name: format!("{}{}", namespace.unwrap_or("core/"), name),
            attrs,
            inner_blocks: Vec::new(),
        }
    }

    pub fn is_youtube_embed(&self) -> bool {
        if self.name != EMBED_BLOCK {
            return false;
        }
        let provider = self.attrs.get("providerNameSlug").and_then(Value::as_str);
        let url = self.attrs.get("url").and_then(Value::as_str).unwrap_or("");
        provider == Some("youtube") || url.contains("youtube.com") || url.contains("youtu.be")
    }

    /// Whether any engine-relevant toggle is switched on.
    pub fn wants_engine(&self) -> bool {
        ENGINE_ATTRIBUTES
            .iter()
            .any(|key| self.attrs.get(*key).is_some_and(truthy))
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

/// Parse block comments into a tree. Unbalanced closers are ignored and
/// unclosed openers are kept with whatever they contained.
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let mut stack: Vec<Block> = Vec::new();
    let mut top: Vec<Block> = Vec::new();

    for cap in BLOCK_COMMENT_RE.captures_iter(content) {
        let closer = cap.get(1).is_some();
        let self_closing = cap.get(5).is_some();
        let namespace = cap.get(2).map(|m| m.as_str());
        let name = &cap[3];

        if closer {
            let qualified = format!("{}{}", namespace.unwrap_or("core/"), name);
            if !stack.iter().any(|b| b.name == qualified) {
                continue;
            }
            while let Some(block) = stack.pop() {
                let done = block.name == qualified;
                push_block(&mut stack, &mut top, block);
                if done {
                    break;
                }
            }
            continue;
        }

        let block = Block::new(namespace, name, cap.get(4).map(|m| m.as_str()));
        if self_closing {
            push_block(&mut stack, &mut top, block);
        } else {
            stack.push(block);
        }
    }

    while let Some(block) = stack.pop() {
        push_block(&mut stack, &mut top, block);
    }
    top
}

fn push_block(stack: &mut [Block], top: &mut Vec<Block>, block: Block) {
    match stack.last_mut() {
        Some(parent) => parent.inner_blocks.push(block),
        None => top.push(block),
    }
}

fn count_engine_embeds(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|b| {
            let own = usize::from(b.is_youtube_embed() && b.wants_engine());
            own + count_engine_embeds(&b.inner_blocks)
        })
        .sum()
}

/// What detection found across both phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionResult {
    /// YouTube embed blocks in post content with an engine toggle set.
    pub content_embeds: usize,
    /// Rendered containers carrying any feature marker class.
    pub rendered_containers: usize,
}

impl DetectionResult {
    /// Phase one: stored post content.
    pub fn from_post_content(content: &str) -> Self {
        if !content.contains("wp:embed") {
            return Self::default();
        }
        let found = count_engine_embeds(&parse_blocks(content));
        log::debug!("post content: {} engine embed block(s)", found);
        Self {
            content_embeds: found,
            rendered_containers: 0,
        }
    }

    /// Phase two: fold in containers found in rendered markup. Any
    /// registered marker counts, since even toggle-only containers get
    /// their player rewritten in place.
    pub fn merge_rendered(&mut self, html: &str) {
        let doc = parse_document(html);
        let found = doc.find_all(doc.root(), is_embed_container).len();
        log::debug!("rendered markup: {} embed container(s)", found);
        self.rendered_containers += found;
    }

    pub fn should_load_engine(&self) -> bool {
        self.content_embeds > 0 || self.rendered_containers > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = r#"
<!-- wp:paragraph -->
<p>Intro</p>
<!-- /wp:paragraph -->

<!-- wp:group {"layout":{"type":"constrained"}} -->
<div class="wp-block-group">
<!-- wp:embed {"url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ","type":"video","providerNameSlug":"youtube","fullwidth":true} -->
<figure class="wp-block-embed"></figure>
<!-- /wp:embed -->
</div>
<!-- /wp:group -->
"#;

    #[test]
    fn parses_nested_blocks() {
        let blocks = parse_blocks(POST);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "core/paragraph");
        assert_eq!(blocks[1].name, "core/group");
        let embed = &blocks[1].inner_blocks[0];
        assert!(embed.is_youtube_embed());
        assert!(embed.wants_engine());
    }

    #[test]
    fn finds_engine_embed_in_inner_blocks() {
        let result = DetectionResult::from_post_content(POST);
        assert_eq!(result.content_embeds, 1);
        assert!(result.should_load_engine());
    }

    #[test]
    fn plain_or_foreign_embeds_do_not_count() {
        let post = r#"
<!-- wp:embed {"url":"https://youtu.be/abc","providerNameSlug":"youtube"} /-->
<!-- wp:embed {"url":"https://vimeo.com/1","providerNameSlug":"vimeo","autoplay":true} /-->
<!-- wp:embed {"url":"https://youtu.be/abc","hideRelatedVideos":true} /-->
<!-- wp:embed {"url":"https://youtu.be/abc","loop":false} /-->
"#;
        let result = DetectionResult::from_post_content(post);
        assert_eq!(result.content_embeds, 0);
        assert!(!result.should_load_engine());
    }

    #[test]
    fn url_alone_identifies_youtube() {
        let post = r#"<!-- wp:embed {"url":"https://youtu.be/abc","hideControls":true} /-->"#;
        assert_eq!(DetectionResult::from_post_content(post).content_embeds, 1);
    }

    #[test]
    fn malformed_attributes_are_ignored() {
        let blocks = parse_blocks("<!-- wp:embed {not json} /-->");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].attrs.is_empty());
        assert!(!blocks[0].is_youtube_embed());
    }

    #[test]
    fn rendered_markup_phase() {
        let mut result = DetectionResult::from_post_content("<p>no blocks</p>");
        assert!(!result.should_load_engine());

        result.merge_rendered(
            r#"<aside class="widget"><figure class="wp-block-embed"></figure></aside>"#,
        );
        assert!(!result.should_load_engine());

        result.merge_rendered(
            r#"<aside class="widget"><figure class="wp-block-embed has-autoplay-youtube"></figure></aside>"#,
        );
        assert_eq!(result.rendered_containers, 1);
        assert!(result.should_load_engine());
    }

    #[test]
    fn toggle_only_containers_still_load_the_engine() {
        for class in ["has-hide-related-videos-youtube", "has-disable-interaction-youtube"] {
            let mut result = DetectionResult::default();
            result.merge_rendered(&format!(
                r#"<figure class="wp-block-embed {}"><iframe src="https://www.youtube.com/embed/abc"></iframe></figure>"#,
                class
            ));
            assert_eq!(result.rendered_containers, 1, "{}", class);
            assert!(result.should_load_engine(), "{}", class);
        }
    }
}
