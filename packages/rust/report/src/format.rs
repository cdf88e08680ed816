//! Text helpers for the report: money, slugs, wrapping, and font-safe text.

use pitchlens_shared::ResearchFindings;
use serde_json::Value;

/// `$1.50B`, `$2.30M`, `$12.5K`, `$950`, or `Not disclosed`.
pub fn format_currency(value: Option<f64>) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return "Not disclosed".to_string();
    };

    let abs = value.abs();
    if abs >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("${:.1}K", value / 1e3)
    } else {
        format!("${value:.0}")
    }
}

/// `12.5%` or `Not disclosed`.
pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{v:.1}%"),
        None => "Not disclosed".to_string(),
    }
}

/// Lowercase ASCII slug for file names; `startup` when nothing is left.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    let out = out.trim_end_matches('_').to_string();
    if out.is_empty() { "startup".to_string() } else { out }
}

/// Replace characters the built-in PDF fonts cannot draw.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' => Some('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' => Some('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => Some('-'),
            '\u{2022}' | '\u{25CF}' => Some('-'),
            '\u{2026}' => Some('.'),
            '\u{00A0}' => Some(' '),
            '\t' => Some(' '),
            '\r' => None,
            c if (c as u32) < 0x20 && c != '\n' => None,
            c if (c as u32) <= 0xFF => Some(c),
            _ => Some('?'),
        })
        .collect()
}

/// Greedy word wrap at `max_chars` characters. Always returns at least one line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let current_len = current.chars().count();
        let word_len = word.chars().count();
        if current_len + word_len + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Split prose into bullet items.
///
/// Short single statements stay whole. Otherwise newlines, then `•`, then
/// `- ` markers, then sentence ends are used as separators.
pub fn bullet_items(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() < 100 && !text.contains('.') && !text.contains('\n') {
        return vec![text.to_string()];
    }

    let items: Vec<String> = if text.contains('\n') {
        text.lines().map(str::to_string).collect()
    } else if text.contains('•') {
        text.split('•').map(str::to_string).collect()
    } else if text.matches("- ").count() > 1 {
        text.split("- ").map(str::to_string).collect()
    } else {
        text.split(". ")
            .map(|s| {
                let s = s.trim();
                if s.ends_with('.') { s.to_string() } else { format!("{s}.") }
            })
            .collect()
    };

    items
        .into_iter()
        .map(|item| item.trim().trim_start_matches(['•', '-', ' ']).trim().to_string())
        .filter(|item| !item.is_empty() && item != ".")
        .collect()
}

/// Flatten a loosely-typed value to display text.
///
/// Objects contribute their non-empty string values except market figures;
/// arrays are comma-joined; a string that itself holds a JSON object is
/// unpacked the same way.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('{') {
                if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(trimmed) {
                    return object_text(&obj);
                }
            }
            trimmed.to_string()
        }
        Value::Object(obj) => object_text(obj),
        Value::Array(items) => items
            .iter()
            .map(display_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn object_text(obj: &serde_json::Map<String, Value>) -> String {
    obj.iter()
        .filter(|(k, _)| !ResearchFindings::FIGURE_KEYS.contains(&k.as_str()))
        .filter_map(|(_, v)| v.as_str().filter(|s| !s.is_empty()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn currency_suffixes() {
        assert_eq!(format_currency(Some(1_500_000_000.0)), "$1.50B");
        assert_eq!(format_currency(Some(2_300_000.0)), "$2.30M");
        assert_eq!(format_currency(Some(12_500.0)), "$12.5K");
        assert_eq!(format_currency(Some(950.0)), "$950");
        assert_eq!(format_currency(None), "Not disclosed");
        assert_eq!(format_currency(Some(f64::NAN)), "Not disclosed");
    }

    #[test]
    fn slug_collapses_separators() {
        assert_eq!(slug("Acme Robotics, Inc."), "acme_robotics_inc");
        assert_eq!(slug("  --  "), "startup");
        assert_eq!(slug("Zürich AI"), "z_rich_ai");
    }

    #[test]
    fn sanitize_maps_typography() {
        assert_eq!(sanitize("“Hi” – it’s • ok…"), "\"Hi\" - it's - ok.");
        assert_eq!(sanitize("café"), "café");
        assert_eq!(sanitize("数据"), "??");
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn bullets_split_on_sentences_and_lines() {
        assert_eq!(bullet_items("Fast growth"), vec!["Fast growth"]);
        assert_eq!(bullet_items("- a\n- b"), vec!["a", "b"]);

        let long = "Strong founding team with prior exits. Large market. Early revenue";
        assert_eq!(
            bullet_items(long),
            vec!["Strong founding team with prior exits.", "Large market.", "Early revenue."]
        );
    }

    #[test]
    fn display_text_unpacks_objects() {
        let v = json!({ "summary": "Big market", "tam": "5B", "notes": "" });
        assert_eq!(display_text(&v), "Big market");

        let s = json!("{\"text\": \"Embedded\"}");
        assert_eq!(display_text(&s), "Embedded");

        assert_eq!(display_text(&json!(["a", "b"])), "a, b");
    }
}
