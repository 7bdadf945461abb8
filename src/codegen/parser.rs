//! HTML API reference parsing
//!
//! The reference is a flat HTML page. Every endpoint starts with an `<h2>`
//! holding its URL, optionally followed by a `<p>` description, followed by
//! tables classed `parameters`, `errors` and `response`. Rows are read
//! positionally; header rows (`<th>`) are skipped.

use crate::domain::{AmbraError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// One request parameter row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameter {
    pub name: String,
    pub kind: String,
    pub description: String,
    /// The description contains `(optional)`
    pub optional: bool,
}

/// One documented error row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorParameter {
    pub error_type: String,
    pub error_subtype: Option<String>,
    pub description: String,
}

/// One response field row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseParameter {
    pub name: String,
    pub kind: String,
    pub description: String,
}

/// Everything documented about one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Endpoint {
    /// Path such as `/study/list`
    pub url: String,
    pub description: String,
    pub parameters: Vec<RequestParameter>,
    pub errors: Vec<ErrorParameter>,
    pub response: Vec<ResponseParameter>,
}

impl Endpoint {
    /// First path segment
    pub fn namespace(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    /// Remaining segments, e.g. `["user", "add"]` for `/group/user/add`
    pub fn action_segments(&self) -> Vec<&str> {
        self.segments().skip(1).collect()
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.url.split('/').filter(|s| !s.is_empty())
    }
}

/// Parsed document
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub endpoints: Vec<Endpoint>,
    /// Headings that were not endpoint URLs
    pub skipped: Vec<String>,
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            PATTERN.get_or_init(|| Regex::new($re).expect("static pattern is a valid regex"))
        }
    };
}

pattern!(heading_pattern, r"(?is)<h2[^>]*>(.*?)</h2>");
pattern!(paragraph_pattern, r"(?is)<p(?:\s[^>]*)?>(.*?)</p>");
pattern!(table_start_pattern, r"(?i)<table\b");
pattern!(
    table_pattern,
    r#"(?is)<table[^>]*class\s*=\s*["']([^"']*)["'][^>]*>(.*?)</table>"#
);
pattern!(row_pattern, r"(?is)<tr[^>]*>(.*?)</tr>");
pattern!(cell_pattern, r"(?is)<td[^>]*>(.*?)</td>");
pattern!(tag_pattern, r"(?s)<[^>]*>");
pattern!(entity_pattern, r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);");
pattern!(space_pattern, r"\s+");

/// Parse an API reference page
///
/// # Errors
///
/// Returns `Codegen` when the page contains no `<h2>` headings at all.
pub fn parse_document(html: &str) -> Result<Document> {
    let headings: Vec<_> = heading_pattern().captures_iter(html).collect();
    if headings.is_empty() {
        return Err(AmbraError::Codegen(
            "No <h2> endpoint headings found in input".to_string(),
        ));
    }

    let mut document = Document::default();
    for (i, heading) in headings.iter().enumerate() {
        let whole = heading.get(0).map(|m| m.end()).unwrap_or_default();
        let end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());
        let title = clean_cell(heading.get(1).map(|m| m.as_str()).unwrap_or_default());
        let body = &html[whole..end];

        match parse_section(&title, body) {
            Some(endpoint) => document.endpoints.push(endpoint),
            None => {
                tracing::warn!(heading = %title, "Skipping section without an endpoint URL");
                document.skipped.push(title);
            }
        }
    }

    tracing::debug!(
        endpoints = document.endpoints.len(),
        skipped = document.skipped.len(),
        "Parsed API reference"
    );
    Ok(document)
}

fn parse_section(title: &str, body: &str) -> Option<Endpoint> {
    let url = title.split_whitespace().find(|t| t.starts_with('/'))?;
    if url.len() < 2 {
        return None;
    }

    let first_table = table_start_pattern()
        .find(body)
        .map_or(body.len(), |m| m.start());
    let description = paragraph_pattern()
        .captures(&body[..first_table])
        .and_then(|c| c.get(1))
        .map(|m| clean_cell(m.as_str()))
        .unwrap_or_default();

    let mut endpoint = Endpoint {
        url: url.to_string(),
        description,
        ..Endpoint::default()
    };

    for table in table_pattern().captures_iter(body) {
        let class = table.get(1).map(|m| m.as_str()).unwrap_or_default();
        let rows = table_rows(table.get(2).map(|m| m.as_str()).unwrap_or_default());

        for class in class.split_whitespace() {
            match class {
                "parameters" => {
                    endpoint.parameters.extend(rows.iter().filter_map(|r| request_parameter(r)))
                }
                "errors" => endpoint.errors.extend(rows.iter().filter_map(|r| error_parameter(r))),
                "response" => {
                    endpoint.response.extend(rows.iter().filter_map(|r| response_parameter(r)))
                }
                _ => continue,
            }
        }
    }

    Some(endpoint)
}

/// Cleaned `<td>` cells of every data row
fn table_rows(table: &str) -> Vec<Vec<String>> {
    row_pattern()
        .captures_iter(table)
        .filter_map(|row| row.get(1))
        .map(|row| {
            cell_pattern()
                .captures_iter(row.as_str())
                .filter_map(|c| c.get(1))
                .map(|c| clean_cell(c.as_str()))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect()
}

fn request_parameter(cells: &[String]) -> Option<RequestParameter> {
    let (name, kind, description) = match cells {
        [name, kind, description, ..] => (name, kind.clone(), description.clone()),
        [name, description] => (name, String::new(), description.clone()),
        [name] => (name, String::new(), String::new()),
        [] => return None,
    };
    if name.is_empty() {
        return None;
    }
    Some(RequestParameter {
        name: name.clone(),
        kind,
        optional: description.contains("(optional)"),
        description,
    })
}

fn error_parameter(cells: &[String]) -> Option<ErrorParameter> {
    let (error_type, error_subtype, description) = match cells {
        [error_type, subtype, description, ..] => (
            error_type,
            Some(subtype.clone()).filter(|s| !s.is_empty()),
            description.clone(),
        ),
        [error_type, description] => (error_type, None, description.clone()),
        [error_type] => (error_type, None, String::new()),
        [] => return None,
    };
    if error_type.is_empty() {
        return None;
    }
    Some(ErrorParameter {
        error_type: error_type.clone(),
        error_subtype,
        description,
    })
}

fn response_parameter(cells: &[String]) -> Option<ResponseParameter> {
    let (name, kind, description) = match cells {
        [name, kind, description, ..] => (name, kind.clone(), description.clone()),
        [name, kind] => (name, kind.clone(), String::new()),
        [name] => (name, String::new(), String::new()),
        [] => return None,
    };
    if name.is_empty() {
        return None;
    }
    Some(ResponseParameter {
        name: name.clone(),
        kind,
        description,
    })
}

/// Strip tags, decode entities and collapse whitespace
pub fn clean_cell(raw: &str) -> String {
    let text = tag_pattern().replace_all(raw, " ");
    let text = entity_pattern().replace_all(&text, |caps: &regex::Captures<'_>| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    space_pattern().replace_all(text.trim(), " ").into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    let decoded = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const PAGE: &str = r#"
<html><body>
<h1>Ambra API</h1>
<h2>/study/list</h2>
<p>List the studies. This call supports pagination, filtering and sorting.</p>
<table class="parameters">
  <tr><th>Name</th><th>Type</th><th>Description</th></tr>
  <tr><td>account_id</td><td>uuid</td><td>Account to list (optional)</td></tr>
  <tr><td>page.number</td><td>integer</td><td>Page number</td></tr>
</table>
<table class="errors">
  <tr><td>INVALID_CONDITION</td><td>The condition is not supported</td></tr>
  <tr><td>NOT_PERM</td><td>SHARE_CODE</td><td>The share code &amp; user do not match</td></tr>
</table>
<table class="response">
  <tr><td>studies</td><td>list</td><td>A list of <b>study</b> objects</td></tr>
</table>
<h2>Overview notes</h2>
<p>Not an endpoint.</p>
<h2><code>/group/user/add</code></h2>
<table class="parameters">
  <tr><td>uuid</td><td>uuid</td><td>Group id</td></tr>
</table>
</body></html>
"#;

    #[test]
    fn test_parse_endpoints() {
        let doc = parse_document(PAGE).unwrap();
        assert_eq!(doc.endpoints.len(), 2);
        assert_eq!(doc.skipped, vec!["Overview notes".to_string()]);

        let list = &doc.endpoints[0];
        assert_eq!(list.url, "/study/list");
        assert!(list.description.contains("supports pagination"));
        assert_eq!(list.parameters.len(), 2);
        assert!(list.parameters[0].optional);
        assert!(!list.parameters[1].optional);
        assert_eq!(list.response[0].description, "A list of study objects");
    }

    #[test]
    fn test_error_rows() {
        let doc = parse_document(PAGE).unwrap();
        let errors = &doc.endpoints[0].errors;
        assert_eq!(errors[0].error_subtype, None);
        assert_eq!(errors[1].error_subtype.as_deref(), Some("SHARE_CODE"));
        assert_eq!(errors[1].description, "The share code & user do not match");
    }

    #[test]
    fn test_nested_path_segments() {
        let doc = parse_document(PAGE).unwrap();
        let add = &doc.endpoints[1];
        assert_eq!(add.namespace(), "group");
        assert_eq!(add.action_segments(), vec!["user", "add"]);
        assert!(add.description.is_empty());
    }

    #[test]
    fn test_description_skips_other_tags() {
        let page = r#"
<h2>/study/set</h2>
<pre>study.set(uuid)</pre>
<P class="summary">Update a study.</P>
<TABLE CLASS="parameters"><tr><td>uuid</td><td>uuid</td><td>Study id</td></tr></TABLE>
<p>Printed after the tables.</p>
<h2>/study/get</h2>
<TABLE class="parameters"><tr><td>uuid</td><td>uuid</td><td>Study id</td></tr></TABLE>
<p>Not a description either.</p>
"#;
        let doc = parse_document(page).unwrap();
        assert_eq!(doc.endpoints[0].description, "Update a study.");
        assert_eq!(doc.endpoints[0].parameters.len(), 1);
        assert!(doc.endpoints[1].description.is_empty());
    }

    #[test]
    fn test_no_headings() {
        assert!(matches!(
            parse_document("<p>nothing</p>"),
            Err(AmbraError::Codegen(_))
        ));
    }

    #[test_case("a &lt;b&gt;", "a <b>" ; "named entities")]
    #[test_case("caf&#233;", "café" ; "decimal entity")]
    #[test_case("&#x41;&nbsp;B", "A B" ; "hex entity and nbsp")]
    #[test_case("<i>two\n   lines</i>", "two lines" ; "tags and whitespace")]
    #[test_case("&bogus;", "&bogus;" ; "unknown entity kept")]
    fn test_clean_cell(raw: &str, expected: &str) {
        assert_eq!(clean_cell(raw), expected);
    }
}
