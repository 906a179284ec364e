use super::find_markup_files;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use ecnn_html::{deserialize, deserialize_with_report, serialize};
use ecnn_schema::{article_schema, RenderContext, Schema};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Markup file or directory to check
    pub input: PathBuf,

    /// Treat repaired markup as a failure
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Repairs needed to read the markup
    pub warnings: Vec<String>,
    /// Problems with the document itself
    pub errors: Vec<String>,
}

/// Read markup and confirm that writing it back and reading again is stable
pub fn check_markup(schema: Arc<Schema>, source: &str, ctx: &RenderContext) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();
    let (doc, report) = deserialize_with_report(schema.clone(), source);
    outcome.warnings = report.repairs;

    if let Err(err) = doc.validate() {
        outcome.errors.push(err.to_string());
    }

    let first = serialize(&doc, ctx);
    let reread = deserialize(schema, &first);
    if reread.root() != doc.root() {
        outcome.errors.push("tree changes after a round trip".to_string());
    } else if serialize(&reread, ctx) != first {
        outcome.errors.push("markup changes after a round trip".to_string());
    }
    outcome
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let ctx = config.render_context();
    let schema = Arc::new(article_schema()?);

    println!("🔍 {} {}", "Checking".green().bold(), args.input.display());
    let files = find_markup_files(&args.input)?;
    println!("   Found {} markup files", files.len());
    println!();

    let mut warnings = 0;
    let mut failures = 0;
    for file in &files {
        let source = fs::read_to_string(file)?;
        let outcome = check_markup(schema.clone(), &source, &ctx);

        let failed = !outcome.errors.is_empty() || (args.strict && !outcome.warnings.is_empty());
        if failed {
            failures += 1;
            println!("   {} {}", "✗".red(), file.display());
        } else if !outcome.warnings.is_empty() {
            println!("   {} {}", "!".yellow(), file.display());
        } else {
            println!("   {} {}", "✓".green(), file.display());
        }
        for error in &outcome.errors {
            println!("     {} {}", "error:".red(), error);
        }
        for warning in &outcome.warnings {
            println!("     {} {}", "repair:".yellow(), warning);
        }
        warnings += outcome.warnings.len();
    }

    println!();
    if failures > 0 {
        return Err(anyhow!("{} of {} files failed", failures, files.len()));
    }
    println!(
        "✨ {} {} files, {} repairs",
        "Done".green().bold(),
        files.len(),
        warnings
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(article_schema().unwrap())
    }

    #[test]
    fn test_clean_markup_passes() {
        let outcome = check_markup(
            schema(),
            "<h2>Title</h2><p>Body <em>text</em></p><hr><p></p>",
            &RenderContext::default(),
        );
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    }

    #[test]
    fn test_repairs_are_warnings() {
        let outcome = check_markup(
            schema(),
            "loose text<ul><li>item</li></ul>",
            &RenderContext::default(),
        );
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert!(!outcome.warnings.is_empty());
    }
}
