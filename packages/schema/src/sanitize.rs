//! Value checks shared by mark parse rules and the commands that create marks

use regex::Regex;
use std::sync::OnceLock;

/// Schemes a link may not use
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#?[0-9A-Za-z(),.% ]+$").expect("color pattern is valid"))
}

/// Whether a link target survives parsing. Whitespace and control
/// characters inside the scheme are ignored, as browsers do.
pub fn is_safe_href(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return false;
    }
    let scheme: String = href
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    !BLOCKED_SCHEMES.iter().any(|blocked| scheme.starts_with(blocked))
}

/// A single CSS colour value: a name, hex code or functional notation
pub fn is_safe_color(color: &str) -> bool {
    let color = color.trim();
    !color.is_empty() && color_pattern().is_match(color)
}
