//! Embed URL acceptance for video and social-post cards

use regex::Regex;
use std::sync::OnceLock;

pub const VIDEO_WIDTH: &str = "560";
pub const VIDEO_HEIGHT: &str = "315";

fn video_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]{11})(?:$|[&?#/])",
        )
        .expect("video pattern is valid")
    })
}

fn embed_src_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:https?:)?//(?:www\.)?youtube(?:-nocookie)?\.com/embed/([A-Za-z0-9_-]{11})(?:$|[&?#/])")
            .expect("embed pattern is valid")
    })
}

fn social_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://(?:www\.)?(twitter\.com|x\.com)/([A-Za-z0-9_]+)/status/(\d+)")
            .expect("social pattern is valid")
    })
}

/// An accepted video link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEmbed {
    pub id: String,
}

impl VideoEmbed {
    /// Accept `youtube.com/watch?v=<id>` and `youtu.be/<id>` links
    pub fn parse(url: &str) -> Option<Self> {
        let captures = video_pattern().captures(url.trim())?;
        Some(Self {
            id: captures[1].to_string(),
        })
    }

    /// Recover the video from a stored player source
    pub fn from_embed_src(src: &str) -> Option<Self> {
        let captures = embed_src_pattern().captures(src.trim())?;
        Some(Self {
            id: captures[1].to_string(),
        })
    }

    pub fn embed_src(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.id)
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// An accepted social-post link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialPost {
    /// The link exactly as given
    pub url: String,
    pub handle: String,
    pub status_id: String,
}

impl SocialPost {
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        let captures = social_pattern().captures(url)?;
        Some(Self {
            url: url.to_string(),
            handle: captures[2].to_string(),
            status_id: captures[3].to_string(),
        })
    }

    /// The link shown in the rendered card; `x.com` hosts become `twitter.com`
    pub fn canonical_url(&self) -> String {
        canonical_social_url(&self.url)
    }
}

/// Rewrite an `x.com` host to `twitter.com`, leaving everything else alone
pub fn canonical_social_url(url: &str) -> String {
    match social_pattern().captures(url) {
        Some(captures) if &captures[1] == "x.com" => {
            let host = captures.get(1).map(|m| m.range());
            match host {
                Some(range) => format!("{}twitter.com{}", &url[..range.start], &url[range.end..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_links() {
        let short = VideoEmbed::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(short.id, "dQw4w9WgXcQ");
        assert_eq!(short.embed_src(), "https://www.youtube.com/embed/dQw4w9WgXcQ");

        let long = VideoEmbed::parse("www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").unwrap();
        assert_eq!(long.id, "dQw4w9WgXcQ");

        assert!(VideoEmbed::parse("https://vimeo.com/12345").is_none());
        assert!(VideoEmbed::parse("https://youtu.be/short").is_none());
        assert!(VideoEmbed::parse("https://youtu.be/dQw4w9WgXcQextra").is_none());
        assert!(VideoEmbed::parse("https://evil.example/?u=youtu.be/dQw4w9WgXcQ").is_none());
    }

    #[test]
    fn test_embed_src_roundtrip() {
        let video = VideoEmbed::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(VideoEmbed::from_embed_src(&video.embed_src()), Some(video));
    }

    #[test]
    fn test_social_links() {
        let post = SocialPost::parse("https://x.com/acct/status/1234567890").unwrap();
        assert_eq!(post.url, "https://x.com/acct/status/1234567890");
        assert_eq!(post.canonical_url(), "https://twitter.com/acct/status/1234567890");
        assert_eq!(post.handle, "acct");

        let post = SocialPost::parse("https://www.twitter.com/acct/status/42?s=20").unwrap();
        assert_eq!(post.canonical_url(), post.url);

        assert!(SocialPost::parse("https://x.com/acct").is_none());
        assert!(SocialPost::parse("ftp://x.com/acct/status/1").is_none());
    }

    #[test]
    fn test_canonical_keeps_handle_with_x() {
        assert_eq!(
            canonical_social_url("https://www.x.com/max.com/status/1"),
            "https://www.x.com/max.com/status/1"
        );
        assert_eq!(
            canonical_social_url("https://www.x.com/xcom/status/1"),
            "https://www.twitter.com/xcom/status/1"
        );
    }
}
