use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use ecnn_schema::embed::{VIDEO_HEIGHT, VIDEO_WIDTH};
use ecnn_schema::{SocialPost, VideoEmbed};

#[derive(Debug, Args)]
pub struct EmbedArgs {
    /// Link to check
    pub url: String,
}

/// What an accepted link becomes in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedPreview {
    Video { id: String, src: String },
    SocialPost { handle: String, status_id: String, stored: String, shown: String },
}

pub fn classify(url: &str) -> Option<EmbedPreview> {
    if let Some(video) = VideoEmbed::parse(url) {
        return Some(EmbedPreview::Video {
            src: video.embed_src(),
            id: video.id,
        });
    }
    SocialPost::parse(url).map(|post| EmbedPreview::SocialPost {
        shown: post.canonical_url(),
        handle: post.handle,
        status_id: post.status_id,
        stored: post.url,
    })
}

pub fn embed(args: EmbedArgs) -> Result<()> {
    match classify(&args.url) {
        Some(EmbedPreview::Video { id, src }) => {
            println!("{} video {}", "✓".green(), id.bright_white());
            println!("   Player: {} ({}x{})", src, VIDEO_WIDTH, VIDEO_HEIGHT);
        }
        Some(EmbedPreview::SocialPost {
            handle,
            status_id,
            stored,
            shown,
        }) => {
            println!("{} post {} by @{}", "✓".green(), status_id.bright_white(), handle);
            println!("   Stored: {}", stored);
            println!("   Shown:  {}", shown);
        }
        None => {
            return Err(anyhow!(
                "Not an accepted video or post link: {}",
                args.url
            ))
        }
    }
    Ok(())
}
