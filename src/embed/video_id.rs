use regex::Regex;
use std::sync::LazyLock;

/// `youtube.com/watch?v=<id>`, `youtu.be/<id>`, or `youtube.com/embed/<id>`
/// (also on `youtube-nocookie.com`). The host must start the string or follow
/// a `/` or `.`; the id runs up to the next `&`, newline, `?` or `#`.
static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[/.])(?:youtube(?:-nocookie)?\.com/(?:watch\?v=|embed/)|youtu\.be/)([^&\n?#]+)",
    )
    .expect("valid video id regex")
});

/// Extract the YouTube video id from a watch URL or iframe `src`.
///
/// `None` means "not a YouTube embed"; callers skip the container.
pub fn extract_video_id(src: &str) -> Option<&str> {
    VIDEO_ID_RE
        .captures(src)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Canonical watch URL sent to the oEmbed proxy.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_shapes() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?feature=oembed",
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ#t=3",
            "//www.youtube.com/embed/dQw4w9WgXcQ",
        ];
        for url in cases {
            assert_eq!(extract_video_id(url), Some("dQw4w9WgXcQ"), "{}", url);
        }
    }

    #[test]
    fn non_matching_sources() {
        for url in [
            "",
            "https://vimeo.com/12345",
            "https://www.youtube.com/",
            "https://www.youtube.com/watch?list=PL123",
            "https://www.youtube.com/embed/",
            "https://www.dailymotion.com/embed/video/x7tgad0",
            "https://open.spotify.com/embed/track/4uLU6hMCjMI75M1A2tKUQC",
            "https://example.com/watch?v=abc",
            "https://notyoutube.com/watch?v=abc",
            "https://player.example/?next=youtube.com/embed/abc",
        ] {
            assert_eq!(extract_video_id(url), None, "{}", url);
        }
    }

    #[test]
    fn builds_watch_url() {
        assert_eq!(watch_url("abc"), "https://www.youtube.com/watch?v=abc");
    }
}
