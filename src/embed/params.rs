//! Player URL parameter composition.
//!
//! Every flag *sets* its parameters: existing occurrences are replaced by a
//! single one, so composing twice with the same flags is a no-op.

use url::{form_urlencoded, Url};

use crate::embed::feature::{FeatureFlag, FeatureSet};
use crate::embed::video_id::extract_video_id;

/// Query parameters a single flag writes.
pub fn flag_params(flag: FeatureFlag, video_id: Option<&str>) -> Vec<(&'static str, String)> {
    match flag {
        // Browsers only allow unattended autoplay when muted.
        FeatureFlag::Autoplay => vec![("autoplay", "1".into()), ("mute", "1".into())],
        FeatureFlag::HideControls => vec![("controls", "0".into())],
        // Single-video loop only repeats when the video is also the playlist.
        FeatureFlag::Loop => match video_id {
            Some(id) => vec![("loop", "1".into()), ("playlist", id.to_string())],
            None => {
                log::debug!("loop requested but no video id resolved; skipping loop params");
                Vec::new()
            }
        },
        // Pointer blocking is a style on the iframe, not a URL parameter.
        FeatureFlag::DisableInteraction => vec![("disablekb", "1".into())],
        FeatureFlag::HideRelatedVideos => vec![("rel", "0".into())],
    }
}

/// Apply `flags` to an iframe `src`.
///
/// `video_id` is used for the loop playlist; when absent it is extracted
/// from `src`. Unparseable sources are returned unchanged.
pub fn compose(src: &str, flags: FeatureSet, video_id: Option<&str>) -> String {
    let video_id = video_id.or_else(|| extract_video_id(src));
    let updates: Vec<(&str, String)> = flags
        .iter()
        .flat_map(|f| flag_params(f, video_id))
        .collect();
    if updates.is_empty() {
        return src.to_string();
    }

    let protocol_relative = src.starts_with("//");
    let parsed = if protocol_relative {
        Url::parse(&format!("https:{}", src))
    } else {
        Url::parse(src)
    };
    let mut url = match parsed {
        Ok(u) => u,
        Err(e) => {
            log::debug!("cannot compose params onto `{}`: {}", src, e);
            return src.to_string();
        }
    };

    set_query_params(&mut url, &updates);

    let out = url.to_string();
    match out.strip_prefix("https:") {
        Some(rest) if protocol_relative => rest.to_string(),
        _ => out,
    }
}

/// URLSearchParams-style `set` for each pair, preserving the position of the
/// first existing occurrence. Segments for other keys are kept verbatim.
fn set_query_params(url: &mut Url, updates: &[(&str, String)]) {
    let mut segments: Vec<String> = url
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|seg| !seg.is_empty())
        .map(str::to_string)
        .collect();

    for (key, value) in updates {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .append_pair(key, value)
            .finish();
        let mut seen = false;
        segments.retain_mut(|seg| {
            if segment_key(seg) != *key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *seg = encoded.clone();
            true
        });
        if !seen {
            segments.push(encoded);
        }
    }
    url.set_query(Some(&segments.join("&")));
}

/// Decoded key of one `k=v` query segment.
fn segment_key(segment: &str) -> String {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}
