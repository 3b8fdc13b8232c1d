//! HTTP-backed bibliographic formatter.
//!
//! Resolution backends per identifier kind:
//!
//! | Kind | Backend                                                  |
//! |------|----------------------------------------------------------|
//! | DOI  | doi.org content negotiation (`text/x-bibliography`)      |
//! | ISBN | Open Library records (`/isbn/{isbn}.json`)               |
//! | URL  | the page itself (title extraction), cited as a link      |
//!
//! The formatter returns formatted markup or an error; inline error
//! presentation is owned by the citation pipeline, not here.

use super::citations::{CitationError, FormatOptions, Formatter};
use crate::content::footnote::IdentifierKind;
use crate::utils::html::{escape_attr, escape_text};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

const DOI_BASE_URL: &str = "https://doi.org";
const OPENLIBRARY_BASE_URL: &str = "https://openlibrary.org";

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Bibliographic formatter over public citation services.
pub struct HttpFormatter {
    client: Client,
}

impl HttpFormatter {
    pub fn new(timeout: Duration) -> Result<Self, CitationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// DOI content negotiation: doi.org formats the entry server-side
    /// according to the requested CSL style and locale.
    async fn resolve_doi(
        &self,
        doi: &str,
        options: &FormatOptions,
    ) -> Result<String, CitationError> {
        let url = format!("{DOI_BASE_URL}/{doi}");
        let accept = format!(
            "text/x-bibliography; style={}; locale={}",
            options.style, options.locale
        );

        let response = self.client.get(&url).header("Accept", accept).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CitationError::Status {
                kind: IdentifierKind::Doi,
                identifier: doi.to_owned(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(escape_text(text.trim()).into_owned())
    }

    /// Open Library record lookup, formatted locally.
    async fn resolve_isbn(&self, isbn: &str) -> Result<String, CitationError> {
        let url = format!("{OPENLIBRARY_BASE_URL}/isbn/{isbn}.json");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CitationError::Status {
                kind: IdentifierKind::Isbn,
                identifier: isbn.to_owned(),
                status: status.as_u16(),
            });
        }

        let record: Value = response.json().await?;
        Ok(format_book_entry(&record, isbn))
    }

    /// Cite a plain URL as a link entry, using the page title when the
    /// page is reachable and has one.
    async fn resolve_url(&self, url: &str) -> Result<String, CitationError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CitationError::Status {
                kind: IdentifierKind::Url,
                identifier: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let title = RE_TITLE
            .captures(&body)
            .and_then(|c| c.get(1))
            .map(|m| collapse_whitespace(m.as_str()))
            .filter(|t| !t.is_empty());

        Ok(format_link_entry(url, title.as_deref()))
    }
}

#[async_trait]
impl Formatter for HttpFormatter {
    async fn resolve(
        &self,
        kind: IdentifierKind,
        identifier: &str,
        options: &FormatOptions,
    ) -> Result<String, CitationError> {
        match kind {
            IdentifierKind::Doi => self.resolve_doi(identifier, options).await,
            IdentifierKind::Isbn => self.resolve_isbn(identifier).await,
            IdentifierKind::Url => self.resolve_url(identifier).await,
        }
    }
}

// ============================================================================
// Entry Formatting
// ============================================================================

/// Build a bibliography entry from an Open Library book record.
fn format_book_entry(record: &Value, isbn: &str) -> String {
    let title = record
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("Untitled");

    let mut entry = String::new();
    if let Some(by) = record.get("by_statement").and_then(Value::as_str) {
        entry.push_str(&escape_text(by.trim_end_matches(['.', ' '])));
        entry.push_str(". ");
    }
    entry.push_str("<i>");
    entry.push_str(&escape_text(title));
    entry.push_str("</i>.");

    let publishers = record
        .get("publishers")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|p| !p.is_empty());
    if let Some(publishers) = publishers {
        entry.push(' ');
        entry.push_str(&escape_text(&publishers));
        if let Some(date) = record.get("publish_date").and_then(Value::as_str) {
            entry.push_str(", ");
            entry.push_str(&escape_text(date));
        }
        entry.push('.');
    } else if let Some(date) = record.get("publish_date").and_then(Value::as_str) {
        entry.push(' ');
        entry.push_str(&escape_text(date));
        entry.push('.');
    }

    entry.push_str(&format!(" ISBN {}.", escape_text(isbn)));
    entry
}

/// Build a link entry for a plain URL citation.
fn format_link_entry(url: &str, title: Option<&str>) -> String {
    let label = title.unwrap_or(url);
    format!(
        r#"<a href="{}">{}</a>"#,
        escape_attr(url),
        escape_text(label)
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_book_entry_full_record() {
        let record = json!({
            "title": "Immunobiology",
            "by_statement": "Charles A. Janeway ... [et al.].",
            "publishers": ["Garland Science"],
            "publish_date": "2001"
        });

        let entry = format_book_entry(&record, "9780815336426");
        assert_eq!(
            entry,
            "Charles A. Janeway ... [et al.]. <i>Immunobiology</i>. Garland Science, 2001. ISBN 9780815336426."
        );
    }

    #[test]
    fn test_format_book_entry_minimal_record() {
        let record = json!({ "title": "Some Book" });
        let entry = format_book_entry(&record, "123");
        assert_eq!(entry, "<i>Some Book</i>. ISBN 123.");
    }

    #[test]
    fn test_format_book_entry_escapes_markup() {
        let record = json!({ "title": "Tags <& their uses>" });
        let entry = format_book_entry(&record, "123");
        assert!(entry.contains("Tags &lt;&amp; their uses&gt;"));
    }

    #[test]
    fn test_format_link_entry_with_title() {
        let entry = format_link_entry("https://example.com/post", Some("A page"));
        assert_eq!(entry, r#"<a href="https://example.com/post">A page</a>"#);
    }

    #[test]
    fn test_format_link_entry_without_title_falls_back_to_url() {
        let entry = format_link_entry("https://example.com", None);
        assert_eq!(entry, r#"<a href="https://example.com">https://example.com</a>"#);
    }

    #[test]
    fn test_title_regex_multiline() {
        let body = "<html><head>\n<title>\n  Split  title\n</title></head></html>";
        let title = RE_TITLE
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| collapse_whitespace(m.as_str()));
        assert_eq!(title.as_deref(), Some("Split title"));
    }
}
