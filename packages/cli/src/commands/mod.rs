pub mod check;
pub mod embed;
pub mod init;
pub mod inspect;
pub mod normalize;

pub use check::{check, CheckArgs};
pub use embed::{embed, EmbedArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use normalize::{normalize, NormalizeArgs};

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use ecnn_schema::Theme;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

fn is_markup(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e == "html" || e == "htm")
}

/// The input file itself, or every markup file under a directory
pub(crate) fn find_markup_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_markup(path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
