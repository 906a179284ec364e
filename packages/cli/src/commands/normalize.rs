use super::{find_markup_files, ThemeArg};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use ecnn_html::{deserialize_with_report, serialize_with};
use ecnn_schema::{article_schema, RenderContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Markup file or directory to normalize
    pub input: PathBuf,

    /// Write normalized files here instead of printing them
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Theme override (defaults to the config)
    #[arg(short, long, value_enum)]
    pub theme: Option<ThemeArg>,

    /// Put each top-level block on its own line
    #[arg(short, long)]
    pub pretty: bool,
}

/// Read markup through the article schema and write it back out
pub fn normalize(args: NormalizeArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let schema = Arc::new(article_schema()?);
    let ctx = match args.theme {
        Some(theme) => RenderContext { theme: theme.into() },
        None => config.render_context(),
    };
    let mut options = config.serialize_options();
    options.pretty |= args.pretty;

    let files = find_markup_files(&args.input)?;
    let root = if args.input.is_dir() {
        args.input.clone()
    } else {
        args.input.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    for file in &files {
        let source = fs::read_to_string(file)?;
        let (doc, report) = deserialize_with_report(schema.clone(), &source);
        let output = serialize_with(&doc, &ctx, &options);
        tracing::debug!(file = %file.display(), repairs = report.repairs.len(), "normalized");

        match &args.out_dir {
            Some(out_dir) => {
                let relative = file.strip_prefix(&root).unwrap_or(file);
                let target = out_dir.join(relative);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, output)?;
                let note = if report.is_clean() {
                    String::new()
                } else {
                    format!(" ({} repairs)", report.repairs.len()).yellow().to_string()
                };
                println!(
                    "  {} {} → {}{}",
                    "✓".green(),
                    relative.display(),
                    target.display(),
                    note
                );
            }
            None => println!("{}", output),
        }
    }

    if files.is_empty() {
        println!("{}", "⚠️  No markup files found".yellow());
    }
    Ok(())
}
