//! Feature registry: the single source of truth for toggle names.
//!
//! Each feature has a camelCase block-attribute key, a kebab-case slug, and
//! derives its container marker class (`has-<slug>-youtube`) and data
//! attribute (`data-<slug>`) from the slug.

use crate::dom::{DomNode, Document, NodeId};

/// Playback/display toggle that changes the iframe URL or its styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureFlag {
    Autoplay,
    Loop,
    HideControls,
    DisableInteraction,
    HideRelatedVideos,
}

impl FeatureFlag {
    pub const ALL: [FeatureFlag; 5] = [
        FeatureFlag::Autoplay,
        FeatureFlag::Loop,
        FeatureFlag::HideControls,
        FeatureFlag::DisableInteraction,
        FeatureFlag::HideRelatedVideos,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            FeatureFlag::Autoplay => "autoplay",
            FeatureFlag::Loop => "loop",
            FeatureFlag::HideControls => "hide-controls",
            FeatureFlag::DisableInteraction => "disable-interaction",
            FeatureFlag::HideRelatedVideos => "hide-related-videos",
        }
    }

    pub fn def(self) -> &'static FeatureDef {
        FEATURES
            .iter()
            .find(|d| d.flag == Some(self))
            .unwrap_or(&FEATURES[0])
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Registry entry for one editor toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDef {
    /// Block attribute name as stored in post content.
    pub key: &'static str,
    pub slug: &'static str,
    pub label: &'static str,
    pub help: &'static str,
    /// `None` for layout-only toggles that do not touch the player URL.
    pub flag: Option<FeatureFlag>,
}

impl FeatureDef {
    pub fn marker_class(&self) -> String {
        marker_class(self.slug)
    }

    pub fn data_attribute(&self) -> String {
        format!("data-{}", self.slug)
    }

    /// Whether a container element has this feature switched on, by data
    /// attribute first and marker class second.
    pub fn enabled_on(&self, node: &DomNode) -> bool {
        match node.attr(&self.data_attribute()) {
            Some(v) => v == "true",
            None => node.has_class(&self.marker_class()),
        }
    }
}

pub const FULLWIDTH_SLUG: &str = "fullwidth";

/// Editor toggles in panel order. `fullwidth` selects the adaptive engine;
/// the rest map to [`FeatureFlag`]s.
pub const FEATURES: &[FeatureDef] = &[
    FeatureDef {
        key: "fullwidth",
        slug: FULLWIDTH_SLUG,
        label: "Fullwidth",
        help: "",
        flag: None,
    },
    FeatureDef {
        key: "autoplay",
        slug: "autoplay",
        label: "Autoplay",
        help: "Note: Video will be muted.",
        flag: Some(FeatureFlag::Autoplay),
    },
    FeatureDef {
        key: "loop",
        slug: "loop",
        label: "Loop Video",
        help: "",
        flag: Some(FeatureFlag::Loop),
    },
    FeatureDef {
        key: "hideControls",
        slug: "hide-controls",
        label: "Hide Controls",
        help: "",
        flag: Some(FeatureFlag::HideControls),
    },
    FeatureDef {
        key: "hideRelatedVideos",
        slug: "hide-related-videos",
        label: "Hide Related Videos",
        help: "Hide related video thumbnails at the end of the video. (Related videos may still appear on pause.)",
        flag: Some(FeatureFlag::HideRelatedVideos),
    },
    FeatureDef {
        key: "disableInteraction",
        slug: "disable-interaction",
        label: "Disable Interaction",
        help: "Prevent all mouse and keyboard interactions with the video player.",
        flag: Some(FeatureFlag::DisableInteraction),
    },
];

pub fn marker_class(slug: &str) -> String {
    format!("has-{}-youtube", slug)
}

pub fn find_by_key(key: &str) -> Option<&'static FeatureDef> {
    FEATURES.iter().find(|d| d.key == key)
}

fn fullwidth_def() -> &'static FeatureDef {
    &FEATURES[0]
}

/// Whether the element carries any registered marker class.
pub fn is_embed_container(node: &DomNode) -> bool {
    node.is_element() && FEATURES.iter().any(|d| node.has_class(&d.marker_class()))
}

/// Whether the container asked for the adaptive (tier-refetching) engine.
pub fn is_fullwidth(node: &DomNode) -> bool {
    fullwidth_def().enabled_on(node)
}

/// Compact set of [`FeatureFlag`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeatureSet(u8);

impl FeatureSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, flag: FeatureFlag) -> Self {
        self.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: FeatureFlag) {
        self.0 |= flag.bit();
    }

    pub fn contains(self, flag: FeatureFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = FeatureFlag> {
        FeatureFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// Read the enabled flags from a container's attributes.
    pub fn read_from(doc: &Document, container: NodeId) -> Self {
        let node = doc.node(container);
        FEATURES
            .iter()
            .filter(|d| d.enabled_on(node))
            .filter_map(|d| d.flag)
            .collect()
    }
}

impl FromIterator<FeatureFlag> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = FeatureFlag>>(iter: I) -> Self {
        let mut set = Self::empty();
        for f in iter {
            set.insert(f);
        }
        set
    }
}
