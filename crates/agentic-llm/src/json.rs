//! Robust JSON decoding for model output
//!
//! Models are asked for JSON but routinely wrap it in prose or markdown,
//! answer with Python literals, or leave trailing commas behind. Decoding
//! walks through fallback tiers, each tried only when the previous one
//! produced nothing:
//!
//! 1. strict parse of the whole trimmed text
//! 2. the body of the first fenced code block (` ```json ... ``` `)
//! 3. the first balanced `{...}` / `[...]` block, found by a quote-aware scan
//! 4. that same block after literal normalization: single-quoted strings,
//!    Python `True` / `False` / `None`, trailing commas
//!
//! Nothing in this module panics or returns an error. Callers choose their
//! own degenerate structure, usually through [`decode_or`].

use serde_json::{Map, Value};

/// Upper bound on candidate blocks examined per input
const MAX_CANDIDATES: usize = 16;

/// Decode the first JSON object or array found in `text`.
///
/// Scalars (`"general"`, `42`) are not considered structured output and
/// yield `None`.
///
/// # Examples
/// ```
/// use agentic_llm::json::decode_json;
/// let v = decode_json("Sure! ```json\n{\"action\": \"add\"}\n```").unwrap();
/// assert_eq!(v["action"], "add");
/// assert!(decode_json("no json here").is_none());
/// ```
#[must_use]
pub fn decode_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(value) = parse_structured(trimmed) {
        return Some(value);
    }

    if let Some(fenced) = strip_code_fence(trimmed) {
        if let Some(value) = parse_structured(fenced.trim()) {
            return Some(value);
        }
        if let Some(value) = decode_from_blocks(fenced) {
            return Some(value);
        }
    }

    decode_from_blocks(trimmed)
}

/// Decode the first JSON object found in `text`.
#[must_use]
pub fn decode_object(text: &str) -> Option<Map<String, Value>> {
    match decode_json(text)? {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.into_iter().find_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        }),
        _ => None,
    }
}

/// Decode an object, or fall back to `{field: raw_text}`.
#[must_use]
pub fn decode_or(text: &str, field: &str) -> Value {
    match decode_object(text) {
        Some(map) => Value::Object(map),
        None => {
            let mut map = Map::new();
            map.insert(field.to_string(), Value::String(text.trim().to_string()));
            Value::Object(map)
        }
    }
}

/// Body of the first fenced code block, language tag removed.
///
/// An unterminated fence yields everything after the opening ticks.
#[must_use]
pub fn strip_code_fence(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_ticks = &text[open + 3..];
    let first_line_end = after_ticks.find('\n');
    let tag = first_line_end.map_or(after_ticks, |end| &after_ticks[..end]);

    // Keep the first line when it is content rather than a language tag.
    let body = match first_line_end {
        Some(end) if !tag.trim_start().starts_with(['{', '[']) => &after_ticks[end + 1..],
        _ => after_ticks,
    };

    let close = body.find("```").unwrap_or(body.len());
    Some(&body[..close])
}

fn parse_structured(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

fn decode_from_blocks(text: &str) -> Option<Value> {
    balanced_blocks(text)
        .take(MAX_CANDIDATES)
        .find_map(|block| parse_structured(block).or_else(|| parse_structured(&normalize_literals(block))))
}

/// Every balanced bracket block in `text`, in order of its opening bracket.
fn balanced_blocks(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, c)| matches!(c, '{' | '['))
        .filter_map(move |(start, _)| balanced_block_at(text, start))
}

fn balanced_block_at(text: &str, start: usize) -> Option<&str> {
    let mut closers: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                if closers.pop() != Some(c) {
                    return None;
                }
                if closers.is_empty() {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Rewrite Python-flavoured literals into JSON.
fn normalize_literals(block: &str) -> String {
    let chars: Vec<char> = block.chars().collect();
    let mut out = String::with_capacity(block.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let s = chars[i];
                    out.push(s);
                    i += 1;
                    if s == '\\' && i < chars.len() {
                        out.push(chars[i]);
                        i += 1;
                    } else if s == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let s = chars[i];
                    i += 1;
                    match s {
                        '\\' if i < chars.len() && chars[i] == '\'' => {
                            out.push('\'');
                            i += 1;
                        }
                        '\\' if i < chars.len() => {
                            out.push('\\');
                            out.push(chars[i]);
                            i += 1;
                        }
                        '"' => out.push_str("\\\""),
                        '\'' => break,
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    _ => &word,
                });
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_object() {
        assert_eq!(decode_json(r#"{"a": 1}"#), Some(json!({"a": 1})));
        assert_eq!(decode_json("  [1, 2]  "), Some(json!([1, 2])));
    }

    #[test]
    fn test_scalars_are_not_structured() {
        assert!(decode_json(r#""general""#).is_none());
        assert!(decode_json("42").is_none());
        assert!(decode_json("").is_none());
        assert!(decode_json("   \n ").is_none());
    }

    #[test]
    fn test_fenced_block_with_language_tag() {
        let text = "Here you go:\n```json\n{\"summary\": \"회의\", \"location\": \"\"}\n```\nAnything else?";
        let v = decode_json(text).unwrap();
        assert_eq!(v["summary"], "회의");
    }

    #[test]
    fn test_fenced_block_without_tag_or_newline() {
        assert_eq!(decode_json("```{\"a\":true}```"), Some(json!({"a": true})));
        assert_eq!(
            decode_json("```\n{\"a\": [1,2]}\n```"),
            Some(json!({"a": [1, 2]}))
        );
    }

    #[test]
    fn test_unterminated_fence() {
        assert_eq!(
            decode_json("```json\n{\"id\": \"evt_1\"}"),
            Some(json!({"id": "evt_1"}))
        );
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let text = "The event you mean is {\"id\": \"abc\"} as far as I can tell.";
        assert_eq!(decode_json(text), Some(json!({"id": "abc"})));
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_scan() {
        let text = r#"result: {"content": "use } and { freely", "n": 2} trailing"#;
        let v = decode_json(text).unwrap();
        assert_eq!(v["content"], "use } and { freely");
        assert_eq!(v["n"], 2);
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let text = r#"x {"quote": "she said \"hi}\"", "ok": 1} y"#;
        let v = decode_json(text).unwrap();
        assert_eq!(v["ok"], 1);
    }

    #[test]
    fn test_apostrophe_inside_double_quoted_string() {
        let text = r#"answer: {"title": "It's done", "tags": ["a"]}"#;
        let v = decode_json(text).unwrap();
        assert_eq!(v["title"], "It's done");
    }

    #[test]
    fn test_single_quoted_python_dict() {
        let text = "{'education': ['서울대학교'], 'certifications': []}";
        let v = decode_json(text).unwrap();
        assert_eq!(v["education"][0], "서울대학교");
        assert_eq!(v["certifications"], json!([]));
    }

    #[test]
    fn test_single_quotes_with_embedded_double_quotes() {
        let v = decode_json(r#"{'a': 'say "hi"'}"#).unwrap();
        assert_eq!(v["a"], "say \"hi\"");
    }

    #[test]
    fn test_python_literals() {
        let v = decode_json("{'done': True, 'failed': False, 'note': None}").unwrap();
        assert_eq!(v, json!({"done": true, "failed": false, "note": null}));
    }

    #[test]
    fn test_literal_words_inside_strings_untouched() {
        let v = decode_json("{'text': 'True story', 'flag': True}").unwrap();
        assert_eq!(v["text"], "True story");
        assert_eq!(v["flag"], true);
    }

    #[test]
    fn test_trailing_commas() {
        let v = decode_json("{\"a\": [1, 2, ], \"b\": 3, }").unwrap();
        assert_eq!(v, json!({"a": [1, 2], "b": 3}));
    }

    #[test]
    fn test_first_invalid_block_skipped() {
        let text = "[Note] see {\"a\": 1}";
        assert_eq!(decode_json(text), Some(json!({"a": 1})));

        let text = "{not json at all} then {\"b\": 2}";
        assert_eq!(decode_json(text), Some(json!({"b": 2})));
    }

    #[test]
    fn test_truncated_output_yields_none() {
        assert!(decode_json("{\"summary\": \"meeting\", \"start\": ").is_none());
        assert!(decode_json("}{").is_none());
    }

    #[test]
    fn test_mismatched_brackets_fall_through_to_inner_block() {
        let text = "{ [ } {\"ok\": 1}";
        assert_eq!(decode_json(text), Some(json!({"ok": 1})));
    }

    #[test]
    fn test_decode_object_from_array() {
        let map = decode_object("[{\"id\": \"1\"}, {\"id\": \"2\"}]").unwrap();
        assert_eq!(map["id"], "1");
        assert!(decode_object("[1, 2]").is_none());
    }

    #[test]
    fn test_decode_or_degenerate_fallback() {
        let v = decode_or("  I studied at KAIST  ", "education");
        assert_eq!(v, json!({"education": "I studied at KAIST"}));

        let v = decode_or("{\"education\": [\"KAIST\"]}", "education");
        assert_eq!(v, json!({"education": ["KAIST"]}));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\nabc\n```"), Some("abc\n"));
        assert_eq!(strip_code_fence("no fence"), None);
    }
}
