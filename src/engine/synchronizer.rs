use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use crate::config::{SyncConfig, TierBasis};
use crate::dom::{Document, NodeId};
use crate::embed::feature::FeatureSet;
use crate::embed::tier::{Tier, TierTable};
use crate::engine::debounce::Debouncer;
use crate::engine::layout::Layout;
use crate::engine::scanner::{self, ContainerKind};
use crate::engine::swap::{rewrite_in_place, swap_html};
use crate::engine::watcher::{ContainerWatcher, Decision, SkipReason};
use crate::error::{ConfigError, EmbedError};
use crate::net::fetch::{FetchResult, FragmentRequest, FragmentSource};

/// Upper bound on load/settle/debounce cycles in [`Synchronizer::run_until_idle`].
const MAX_CYCLES: usize = 64;

/// Counters for one page's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub attached: usize,
    pub rewritten_in_place: usize,
    pub fetches: usize,
    pub swaps: usize,
    pub failures: usize,
}

#[derive(Debug)]
struct PendingFetch {
    container: NodeId,
    request: FragmentRequest,
}

/// Single-threaded embed engine for one page.
///
/// The host feeds it events (`load`, `resized`, `mutated`,
/// `viewport_resized`) and time (`advance`), and lets in-flight fetches
/// resolve with `complete_fetches`. Each container has at most one fetch
/// outstanding.
pub struct Synchronizer<S, L> {
    doc: Document,
    layout: L,
    source: S,
    tiers: TierTable,
    basis: TierBasis,
    nonce: Option<String>,
    debouncer: Debouncer,
    settle_delay: Duration,
    settle_at: Option<Instant>,
    watchers: BTreeMap<NodeId, ContainerWatcher>,
    in_flight: VecDeque<PendingFetch>,
    viewport_tier: Option<Tier>,
    stats: SyncStats,
}

impl<S: FragmentSource, L: Layout> Synchronizer<S, L> {
    pub fn new(
        doc: Document,
        layout: L,
        source: S,
        config: &SyncConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            doc,
            layout,
            source,
            tiers: config.tier_table()?,
            basis: config.tier_basis,
            nonce: config.nonce.clone(),
            debouncer: Debouncer::new(config.debounce()),
            settle_delay: config.settle_delay(),
            settle_at: None,
            watchers: BTreeMap::new(),
            in_flight: VecDeque::new(),
            viewport_tier: None,
            stats: SyncStats::default(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// For host-side DOM changes; follow up with [`Self::mutated`].
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// For host-side size changes; follow up with [`Self::resized`] or
    /// [`Self::viewport_resized`].
    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    pub fn watcher(&self, container: NodeId) -> Option<&ContainerWatcher> {
        self.watchers.get(&container)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Earliest pending timer (settle scan or debounce window).
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.settle_at, self.debouncer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Initial page settle: scan now, and once more after the settle delay.
    pub fn load(&mut self, now: Instant) {
        self.viewport_tier = Some(self.tiers.resolve(self.layout.viewport_width()));
        self.scan();
        self.settle_at = Some(now + self.settle_delay);
    }

    /// A size change was observed on `node` (the container or anything
    /// inside it).
    pub fn resized(&mut self, node: NodeId, now: Instant) {
        match self.owning_container(node) {
            Some(container) => self.debouncer.signal(container, now),
            None => log::trace!("resize on unwatched node {:?}", node),
        }
    }

    /// A batch of DOM mutations happened somewhere on the page.
    pub fn mutated(&mut self, now: Instant) {
        self.debouncer.signal_rescan(now);
        let containers: Vec<NodeId> = self.watchers.keys().copied().collect();
        for c in containers {
            self.debouncer.signal(c, now);
        }
    }

    /// The device viewport changed width.
    ///
    /// With viewport-based tiers, crossing a tier boundary clears every
    /// processed marker so the next scan re-arms all containers. With
    /// container-based tiers it simply re-measures every container.
    pub fn viewport_resized(&mut self, now: Instant) {
        let tier = self.tiers.resolve(self.layout.viewport_width());
        let containers: Vec<NodeId> = self.watchers.keys().copied().collect();
        match self.basis {
            TierBasis::Viewport => {
                if self.viewport_tier == Some(tier) {
                    return;
                }
                log::info!(
                    "viewport crossed into tier {}; re-arming {} container(s)",
                    tier,
                    containers.len()
                );
                self.viewport_tier = Some(tier);
                for c in containers {
                    scanner::clear_marker(&mut self.doc, c);
                }
                self.debouncer.signal_rescan(now);
            }
            TierBasis::Container => {
                self.viewport_tier = Some(tier);
                for c in containers {
                    self.debouncer.signal(c, now);
                }
            }
        }
    }

    /// Fire every timer due at `now`.
    pub fn advance(&mut self, now: Instant) {
        if matches!(self.settle_at, Some(t) if t <= now) {
            self.settle_at = None;
            self.scan();
        }
        if let Some(batch) = self.debouncer.take_due(now) {
            if batch.rescan {
                self.scan();
            }
            for container in batch.containers {
                self.evaluate(container);
            }
        }
    }

    /// Resolve every in-flight fetch and apply the results. Returns how
    /// many fetches completed.
    pub fn complete_fetches(&mut self, now: Instant) -> usize {
        let mut completed = 0;
        while let Some(pending) = self.in_flight.pop_front() {
            let result = self.source.fetch(&pending.request);
            self.apply(pending.container, pending.request.tier, result, now);
            completed += 1;
        }
        completed
    }

    /// Drive timers and fetches until nothing is pending, jumping the clock
    /// to each deadline. Returns the final simulated time.
    pub fn run_until_idle(&mut self, start: Instant) -> Instant {
        let mut now = start;
        for _ in 0..MAX_CYCLES {
            self.advance(now);
            self.complete_fetches(now);
            match self.next_deadline() {
                Some(deadline) => now = now.max(deadline),
                None if self.in_flight.is_empty() => return now,
                None => {}
            }
        }
        log::warn!("engine still busy after {} cycles", MAX_CYCLES);
        now
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn owning_container(&self, node: NodeId) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if self.watchers.contains_key(&id) {
                return Some(id);
            }
            cur = self.doc.node(id).parent();
        }
        None
    }

    fn scan(&mut self) {
        for found in scanner::scan(&mut self.doc) {
            match found.kind {
                ContainerKind::Adaptive => {
                    if self.watchers.contains_key(&found.node) {
                        log::debug!("re-arming container {:?}", found.node);
                    } else {
                        let watcher = ContainerWatcher::attach(&self.doc, found.node);
                        self.watchers.insert(found.node, watcher);
                        self.stats.attached += 1;
                    }
                    self.evaluate(found.node);
                }
                ContainerKind::Static => {
                    let flags = FeatureSet::read_from(&self.doc, found.node);
                    if rewrite_in_place(&mut self.doc, found.node, flags).is_some() {
                        self.stats.rewritten_in_place += 1;
                    }
                }
            }
        }
    }

    fn measure(&self, container: NodeId) -> Option<f32> {
        match self.basis {
            TierBasis::Container => self.layout.width_of(&self.doc, container),
            TierBasis::Viewport => self
                .doc
                .is_connected(container)
                .then(|| self.layout.viewport_width()),
        }
    }

    fn evaluate(&mut self, container: NodeId) {
        if !self.doc.is_connected(container) {
            log::trace!("container {:?} left the document", container);
            return;
        }
        let width = self.measure(container);
        let Some(watcher) = self.watchers.get_mut(&container) else {
            return;
        };

        match watcher.evaluate(width, &self.tiers) {
            Decision::Fetch(tier) => {
                if let Some(request) = watcher.request(self.nonce.as_deref()) {
                    log::debug!("container {:?}: fetching {} player", container, tier);
                    self.stats.fetches += 1;
                    self.in_flight.push_back(PendingFetch { container, request });
                }
            }
            Decision::Skip(SkipReason::NoVideoId) => {
                let src = self
                    .doc
                    .find_descendant(container, |n| n.tag == "iframe")
                    .and_then(|iframe| self.doc.attr(iframe, "src"))
                    .unwrap_or_default()
                    .to_string();
                log::debug!("container {:?}: {}", container, EmbedError::ParseFailure(src));
            }
            Decision::Skip(reason) => {
                log::trace!("container {:?}: {:?}", container, reason);
            }
        }
    }

    fn apply(&mut self, container: NodeId, tier: Tier, result: FetchResult, now: Instant) {
        let Some(watcher) = self.watchers.get(&container) else {
            return;
        };
        let flags = watcher.flags();
        let video_id = watcher.video_id().map(str::to_string);

        let succeeded = match result {
            _ if !self.doc.is_connected(container) => {
                log::debug!("container {:?} left the document; dropping response", container);
                false
            }
            FetchResult::Success(html) => {
                match swap_html(&mut self.doc, container, &html, flags, video_id.as_deref(), tier) {
                    Ok(_) => {
                        log::info!("container {:?}: swapped in {} player", container, tier);
                        self.stats.swaps += 1;
                        true
                    }
                    Err(e) => {
                        log::warn!("container {:?}: {}", container, e);
                        false
                    }
                }
            }
            FetchResult::Empty => {
                log::warn!("container {:?}: oEmbed proxy returned no html", container);
                false
            }
            FetchResult::NetworkError(e) => {
                log::debug!("container {:?}: keeping current player ({})", container, e);
                false
            }
        };
        if !succeeded {
            self.stats.failures += 1;
        }

        let replay = self
            .watchers
            .get_mut(&container)
            .map(|w| w.complete(succeeded))
            .unwrap_or(false);
        if replay {
            self.debouncer.signal(container, now);
        }
    }
}
