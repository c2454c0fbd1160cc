use scraper::Html;

/// Decode HTML entities and drop any markup, keeping the text content.
pub fn unescape_html(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.to_string();
    }
    Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<String>()
}

/// Replace tags with whitespace so adjacent list items don't run together.
pub fn strip_tags(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.to_string();
    }
    Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn every non-breaking space variant into a plain space and collapse runs.
pub fn normalize_spaces(text: &str) -> String {
    let replaced = text.replace("&nbsp;", " ");
    replaced
        .split(|c: char| c.is_whitespace() || c == '\u{a0}' || c == '\u{202f}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tag-free, space-normalized text of a markup fragment.
pub fn clean_fragment(text: &str) -> String {
    normalize_spaces(&strip_tags(text))
}
