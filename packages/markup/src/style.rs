//! Inline `style` attribute parsing

/// Parse `color: red; font-weight:bold` into lowercase property names and
/// trimmed values. Declarations without a colon are skipped.
pub fn parse_style(source: &str) -> Vec<(String, String)> {
    source
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some((property, value.to_string()))
        })
        .collect()
}

/// Look up a single property; the last declaration wins, as in CSS.
pub fn style_property(source: &str, property: &str) -> Option<String> {
    parse_style(source)
        .into_iter()
        .rev()
        .find(|(name, _)| name.eq_ignore_ascii_case(property))
        .map(|(_, value)| value)
}
