use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::GenerationError;

const EXCERPT_CHARS: usize = 200;

fn fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)(?:```|\z)").expect("valid regex")
    })
}

// Tracks whether a left-to-right walk is inside a string literal.
#[derive(Default)]
struct StringTracker {
    in_string: bool,
    escaped: bool,
}

impl StringTracker {
    // True when `c` belongs to a string literal, quotes included.
    fn feed(&mut self, c: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            true
        } else if c == '"' {
            self.in_string = true;
            true
        } else {
            false
        }
    }
}

pub fn extract_json(raw: &str) -> Result<Value, GenerationError> {
    if let Some(value) = parse_with_repairs(raw) {
        return Ok(value);
    }

    if let Some(fenced) = fenced_block(raw) {
        if let Some(value) = parse_with_repairs(fenced) {
            tracing::debug!("Recovered JSON from fenced block");
            return Ok(value);
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        for span in balanced_spans(raw, open, close) {
            if let Some(value) = parse_with_repairs(span) {
                tracing::debug!("Recovered JSON from embedded {}...{} span", open, close);
                return Ok(value);
            }
        }
    }

    Err(GenerationError::MalformedOutput {
        excerpt: excerpt(raw),
    })
}

fn parse_with_repairs(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(value) = parse_structured(text) {
        return Some(value);
    }
    let light = light_repair(text);
    if let Some(value) = parse_structured(&light) {
        return Some(value);
    }
    parse_structured(&heavy_repair(&light))
}

// Only objects and arrays count; a bare `true` or `3` in prose is not a payload.
fn parse_structured(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

// Drops trailing commas and separates `}{` pairs. String contents are
// left untouched.
fn light_repair(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut strings = StringTracker::default();

    for (i, c) in text.char_indices() {
        if strings.feed(c) {
            out.push(c);
            continue;
        }
        let rest = text[i + c.len_utf8()..].trim_start();
        match c {
            ',' if rest.starts_with(|n: char| n == '}' || n == ']') => {}
            '}' if rest.starts_with('{') => out.push_str("},"),
            _ => out.push(c),
        }
    }

    out
}

// Adds a comma between a line ending in a string, digit or closing bracket
// and a following line that starts with a quote.
fn heavy_repair(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut strings = StringTracker::default();

    for (i, c) in text.char_indices() {
        let was_in_string = strings.in_string;
        let in_string = strings.feed(c);
        out.push(c);

        let ends_value = if was_in_string {
            !strings.in_string
        } else {
            !in_string && (c.is_ascii_digit() || c == '}' || c == ']')
        };
        if ends_value && next_line_opens_string(&text[i + c.len_utf8()..]) {
            out.push(',');
        }
    }

    out
}

fn next_line_opens_string(rest: &str) -> bool {
    let rest = rest.trim_start_matches(|c: char| c == ' ' || c == '\t');
    rest.strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .is_some_and(|next| next.trim_start().starts_with('"'))
}

fn fenced_block(raw: &str) -> Option<&str> {
    fence()
        .captures(raw)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

// Every balanced span starting at an `open` character, in order of
// appearance. Brackets inside string literals are ignored.
fn balanced_spans(raw: &str, open: char, close: char) -> impl Iterator<Item = &str> + '_ {
    raw.match_indices(open)
        .filter_map(move |(start, _)| balanced_span_at(raw, start, open, close))
}

fn balanced_span_at(raw: &str, start: usize, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut strings = StringTracker::default();

    for (offset, c) in raw[start..].char_indices() {
        if strings.feed(c) {
            continue;
        }
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                let end = start + offset + c.len_utf8();
                return Some(&raw[start..end]);
            }
        }
    }

    None
}

fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    if trimmed.chars().count() > EXCERPT_CHARS {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = extract_json(r#"{"title": "天气", "n": 2}"#).unwrap();
        assert_eq!(value, json!({"title": "天气", "n": 2}));
    }

    #[test]
    fn test_prose_fence_and_trailing_comma() {
        let raw = r#"Here is the article you asked for:

```json
{
  "title": "城市里的新公园",
  "tags": ["city", "park",],
}
```

Let me know if you need changes."#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"title": "城市里的新公园", "tags": ["city", "park"]}));
    }

    #[test]
    fn test_adjacent_objects_get_separator() {
        let raw = r#"[{"a": 1} {"a": 2}]"#;
        assert_eq!(extract_json(raw).unwrap(), json!([{"a": 1}, {"a": 2}]));
    }

    #[test]
    fn test_missing_comma_between_lines() {
        let raw = "{\n  \"title\": \"x\"\n  \"count\": 3\n  \"ok\": true\n}";
        assert_eq!(
            extract_json(raw).unwrap(),
            json!({"title": "x", "count": 3, "ok": true})
        );
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let raw = r#"Sure! {"body": "use {{new:经济}} here \" } tricky", "n": 1} Hope that helps."#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value["n"], json!(1));
        assert_eq!(value["body"], json!("use {{new:经济}} here \" } tricky"));
    }

    #[test]
    fn test_repairs_leave_adjacent_markers_alone() {
        let raw = "```json\n{\"body\": \"{{new:经济}}{{review:发展}}很快\", \"n\": [1,],}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["body"], json!("{{new:经济}}{{review:发展}}很快"));
        assert_eq!(value["n"], json!([1]));
    }

    #[test]
    fn test_line_repair_skips_string_contents() {
        let raw = "{\n  \"body\": \"第1段 ,}\"\n  \"count\": 3\n}";
        assert_eq!(
            extract_json(raw).unwrap(),
            json!({"body": "第1段 ,}", "count": 3})
        );
    }

    #[test]
    fn test_skips_unbalanced_leading_brace() {
        let raw = r#"Notes { unfinished. Result: {"ok": true}"#;
        assert_eq!(extract_json(raw).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_bare_array_in_prose() {
        let raw = "The questions are: [\"a\", \"b\"] as requested.";
        assert_eq!(extract_json(raw).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_unclosed_fence() {
        let raw = "```json\n{\"a\": [1, 2,]}\n";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_failure_carries_bounded_excerpt() {
        let raw = "no payload here ".repeat(50);
        match extract_json(&raw) {
            Err(GenerationError::MalformedOutput { excerpt }) => {
                assert!(excerpt.chars().count() <= EXCERPT_CHARS + 1);
                assert!(excerpt.starts_with("no payload here"));
            }
            other => panic!("expected MalformedOutput, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_is_not_a_payload() {
        assert!(extract_json("42").is_err());
    }
}
