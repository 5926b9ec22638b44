//! HTML assembly for generated documents

use serde_json::{Map, Value};

/// Escape text for HTML element content and attribute values
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Full HTML page with print styles
#[must_use]
pub fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: 'Noto Sans KR', 'Apple SD Gothic Neo', sans-serif; margin: 40px; line-height: 1.6; color: #222; }}
h1 {{ border-bottom: 2px solid #333; padding-bottom: 8px; }}
h2 {{ margin-top: 28px; color: #444; }}
ul {{ padding-left: 20px; }}
</style>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>"#,
        title = escape_html(title),
    )
}

/// `<h2>` section for a field, or nothing when the field is empty
#[must_use]
pub fn section(heading: &str, value: Option<&Value>) -> String {
    match value.map(render_value) {
        Some(content) if !content.is_empty() => {
            format!("<h2>{}</h2>\n{content}\n", escape_html(heading))
        }
        _ => String::new(),
    }
}

/// Paragraphs from plain text separated by blank lines
#[must_use]
pub fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p).replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => paragraphs(s),
        Value::Array(items) => {
            let items: Vec<String> = items
                .iter()
                .map(inline_value)
                .filter(|item| !item.is_empty())
                .map(|item| format!("<li>{item}</li>"))
                .collect();
            if items.is_empty() {
                String::new()
            } else {
                format!("<ul>\n{}\n</ul>", items.join("\n"))
            }
        }
        other => format!("<p>{}</p>", inline_value(other)),
    }
}

/// One line: objects become `value · value`, nested lists are joined
fn inline_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_html(s.trim()),
        Value::Array(items) => items
            .iter()
            .map(inline_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => object_line(map),
        other => escape_html(&other.to_string()),
    }
}

fn object_line(map: &Map<String, Value>) -> String {
    map.values()
        .map(inline_value)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_section_renders_lists_and_objects() {
        let value = json!([
            {"school": "KAIST", "major": "CS"},
            "TOPIK 6",
            null
        ]);
        let html = section("Education", Some(&value));
        assert!(html.starts_with("<h2>Education</h2>"));
        assert!(html.contains("<li>CS · KAIST</li>"));
        assert!(html.contains("<li>TOPIK 6</li>"));
        assert_eq!(html.matches("<li>").count(), 2);
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        assert!(section("Skills", Some(&json!([]))).is_empty());
        assert!(section("Skills", Some(&json!(""))).is_empty());
        assert!(section("Skills", None).is_empty());
    }

    #[test]
    fn test_page_escapes_title_and_paragraphs() {
        let html = page("<script>", &paragraphs("one\n\ntwo\nlines"));
        assert!(html.contains("<h1>&lt;script&gt;</h1>"));
        assert!(html.contains("<p>one</p>"));
        assert!(html.contains("<p>two<br>lines</p>"));
    }
}
