use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Format ISO datetime string to simple date format
///
/// # Examples
/// ```
/// use shopdesk_core::utils::text::format_datetime;
/// assert_eq!(format_datetime("2024-03-01T09:15:00.000Z"), "2024-03-01");
/// ```
pub fn format_datetime(datetime: &str) -> String {
    match datetime.split_once('T') {
        Some((date_part, _)) => date_part.to_string(),
        None => datetime.to_string(),
    }
}

/// Truncate to a display width, counting wide characters, with a trailing ellipsis
pub fn truncate_text(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    const ELLIPSIS: &str = "...";
    let ellipsis_width = ELLIPSIS.width();

    if max_width <= ellipsis_width {
        return ELLIPSIS[..max_width].to_string();
    }

    let target_width = max_width - ellipsis_width;
    let mut result = String::new();
    let mut current_width = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if current_width + ch_width > target_width {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }

    result.push_str(ELLIPSIS);
    result
}

/// Render a JSON value as a single table cell.
///
/// Strings are printed bare, arrays are comma-joined, objects prefer their
/// `name`/`title` field, timestamps are shortened to the date.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) if looks_like_timestamp(s) => format_datetime(s),
        Value::String(s) => s.clone(),
        Value::Bool(b) => (if *b { "yes" } else { "no" }).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_cell)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => ["name", "title", "email", "product", "_id"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(value_to_cell)
            .unwrap_or_else(|| value.to_string()),
    }
}

fn looks_like_timestamp(s: &str) -> bool {
    s.len() >= 19
        && s.as_bytes().get(4) == Some(&b'-')
        && s.as_bytes().get(10) == Some(&b'T')
        && s[..4].chars().all(|c| c.is_ascii_digit())
}

/// Format a metric key like `totalActiveProducts` as `Total Active Products`.
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out
}
