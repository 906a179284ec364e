use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use ecnn_html::deserialize_with_report;
use ecnn_model::Node;
use ecnn_schema::article_schema;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InspectFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Markup file to read
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: InspectFormat,
}

/// Indented outline of a tree, one node per line
pub fn outline(root: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, root, 0);
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    if let Some(text) = &node.text {
        let marks: Vec<&str> = node.marks.iter().map(|m| m.kind.as_str()).collect();
        if marks.is_empty() {
            let _ = writeln!(out, "{}{:?}", indent, text);
        } else {
            let _ = writeln!(out, "{}{:?} [{}]", indent, text, marks.join(", "));
        }
        return;
    }

    let attrs: Vec<String> = node
        .attrs
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    if attrs.is_empty() {
        let _ = writeln!(out, "{}{}", indent, node.kind);
    } else {
        let _ = writeln!(out, "{}{} ({})", indent, node.kind, attrs.join(" "));
    }
    for child in &node.content {
        write_node(out, child, depth + 1);
    }
}

pub fn inspect(args: InspectArgs, _cwd: &str) -> Result<()> {
    let schema = Arc::new(article_schema()?);
    let source = fs::read_to_string(&args.input)?;
    let (doc, report) = deserialize_with_report(schema, &source);

    match args.format {
        InspectFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&doc.to_json())?);
        }
        InspectFormat::Text => {
            print!("{}", outline(doc.root()));
            if !report.is_clean() {
                println!();
                println!("{} {} repairs", "⚠️".yellow(), report.repairs.len());
                for repair in &report.repairs {
                    println!("   {}", repair);
                }
            }
        }
    }
    Ok(())
}
