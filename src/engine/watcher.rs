//! Per-container fetch state machine.
//!
//! ```text
//!            signal, tier changed
//!   Idle ───────────────────────────▶ Fetching
//!    ▲                                   │
//!    └──────── fetch resolved ───────────┘
//! ```
//!
//! Signals that arrive while Fetching do not start a second request; they
//! are remembered and replayed once the in-flight fetch resolves.

use crate::dom::{Document, NodeId};
use crate::embed::feature::FeatureSet;
use crate::embed::tier::{Tier, TierTable};
use crate::embed::video_id::{extract_video_id, watch_url};
use crate::net::fetch::FragmentRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Idle,
    Fetching,
}

/// Why an evaluation did not start a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No YouTube id in the live iframe; the container is not ours.
    NoVideoId,
    /// Not laid out (hidden or detached), width unknown.
    Unmeasured,
    /// Width moved within the current tier.
    SameTier,
    /// A fetch is already outstanding.
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fetch(Tier),
    Skip(SkipReason),
}

/// State for one adaptive embed container.
#[derive(Debug, Clone)]
pub struct ContainerWatcher {
    container: NodeId,
    video_id: Option<String>,
    flags: FeatureSet,
    current_tier: Option<Tier>,
    pending_tier: Option<Tier>,
    state: ProcessingState,
    deferred: bool,
    fetches_issued: usize,
}

impl ContainerWatcher {
    /// Read the video id and flags once; both are fixed for the watcher's
    /// lifetime.
    pub fn attach(doc: &Document, container: NodeId) -> Self {
        let video_id = doc
            .find_descendant(container, |n| n.tag == "iframe")
            .and_then(|iframe| doc.attr(iframe, "src"))
            .and_then(extract_video_id)
            .map(str::to_string);
        Self {
            container,
            video_id,
            flags: FeatureSet::read_from(doc, container),
            current_tier: None,
            pending_tier: None,
            state: ProcessingState::Idle,
            deferred: false,
            fetches_issued: 0,
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn flags(&self) -> FeatureSet {
        self.flags
    }

    pub fn current_tier(&self) -> Option<Tier> {
        self.current_tier
    }

    pub fn state(&self) -> ProcessingState {
        self.state
    }

    pub fn fetches_issued(&self) -> usize {
        self.fetches_issued
    }

    /// Decide whether a freshly measured width warrants a fetch. On
    /// `Fetch` the watcher has already moved to `Fetching`.
    pub fn evaluate(&mut self, width: Option<f32>, tiers: &TierTable) -> Decision {
        if self.state == ProcessingState::Fetching {
            self.deferred = true;
            return Decision::Skip(SkipReason::InFlight);
        }
        if self.video_id.is_none() {
            return Decision::Skip(SkipReason::NoVideoId);
        }
        let Some(width) = width else {
            return Decision::Skip(SkipReason::Unmeasured);
        };

        let tier = tiers.resolve(width);
        if self.current_tier == Some(tier) {
            return Decision::Skip(SkipReason::SameTier);
        }

        self.state = ProcessingState::Fetching;
        self.pending_tier = Some(tier);
        self.fetches_issued += 1;
        Decision::Fetch(tier)
    }

    /// Proxy request for the tier chosen by the last `Fetch` decision.
    pub fn request(&self, nonce: Option<&str>) -> Option<FragmentRequest> {
        let id = self.video_id.as_deref()?;
        let tier = self.pending_tier?;
        Some(FragmentRequest::new(
            watch_url(id),
            tier,
            nonce.map(str::to_string),
        ))
    }

    /// Release the Fetching lock. The tier is recorded only when the swap
    /// succeeded. Returns whether signals were deferred meanwhile.
    pub fn complete(&mut self, succeeded: bool) -> bool {
        if let (true, Some(tier)) = (succeeded, self.pending_tier.take()) {
            self.current_tier = Some(tier);
        }
        self.pending_tier = None;
        self.state = ProcessingState::Idle;
        std::mem::take(&mut self.deferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parser::parse_fragment;
    use crate::embed::feature::FeatureFlag;

    fn watcher(src: &str) -> ContainerWatcher {
        let doc = parse_fragment(&format!(
            r#"<figure class="has-fullwidth-youtube" data-autoplay="true"><iframe src="{}"></iframe></figure>"#,
            src
        ));
        let fig = doc.node(doc.root()).children()[0];
        ContainerWatcher::attach(&doc, fig)
    }

    #[test]
    fn attach_reads_id_and_flags() {
        let w = watcher("https://www.youtube.com/embed/abc?feature=oembed");
        assert_eq!(w.video_id(), Some("abc"));
        assert!(w.flags().contains(FeatureFlag::Autoplay));
        assert_eq!(w.state(), ProcessingState::Idle);
        assert_eq!(w.current_tier(), None);
    }

    #[test]
    fn fetches_only_on_tier_change() {
        let tiers = TierTable::default();
        let mut w = watcher("https://youtu.be/abc");

        assert_eq!(w.evaluate(Some(500.0), &tiers), Decision::Fetch(Tier(640)));
        let req = w.request(Some("n")).unwrap();
        assert_eq!(req.watch_url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(req.max_width(), 640);
        assert_eq!(req.nonce.as_deref(), Some("n"));

        assert!(!w.complete(true));
        assert_eq!(w.current_tier(), Some(Tier(640)));
        assert_eq!(w.evaluate(Some(600.0), &tiers), Decision::Skip(SkipReason::SameTier));
        assert_eq!(w.evaluate(Some(700.0), &tiers), Decision::Fetch(Tier(1024)));
        assert_eq!(w.fetches_issued(), 2);
    }

    #[test]
    fn signals_while_fetching_are_deferred() {
        let tiers = TierTable::default();
        let mut w = watcher("https://youtu.be/abc");
        assert!(matches!(w.evaluate(Some(500.0), &tiers), Decision::Fetch(_)));
        for width in [700.0, 900.0, 1200.0] {
            assert_eq!(w.evaluate(Some(width), &tiers), Decision::Skip(SkipReason::InFlight));
        }
        assert_eq!(w.fetches_issued(), 1);
        assert!(w.complete(true));
        assert!(!w.complete(true));
    }

    #[test]
    fn failure_keeps_previous_tier() {
        let tiers = TierTable::default();
        let mut w = watcher("https://youtu.be/abc");
        w.evaluate(Some(500.0), &tiers);
        w.complete(true);
        w.evaluate(Some(700.0), &tiers);
        w.complete(false);
        assert_eq!(w.current_tier(), Some(Tier(640)));
        assert_eq!(w.state(), ProcessingState::Idle);
        assert_eq!(w.evaluate(Some(700.0), &tiers), Decision::Fetch(Tier(1024)));
    }

    #[test]
    fn skips_without_id_or_width() {
        let tiers = TierTable::default();
        let mut w = watcher("https://vimeo.com/123");
        assert_eq!(w.evaluate(Some(500.0), &tiers), Decision::Skip(SkipReason::NoVideoId));
        let mut w = watcher("https://youtu.be/abc");
        assert_eq!(w.evaluate(None, &tiers), Decision::Skip(SkipReason::Unmeasured));
        assert!(w.request(None).is_none());
    }
}
