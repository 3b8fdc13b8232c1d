//! Footnote descriptors authored alongside post content.
//!
//! Each post may declare a `[[footnotes]]` table per citation in its front
//! matter. A descriptor names a stable id (the anchor target used by in-text
//! markers) and one source for its display text: a DOI, an ISBN, a URL, or
//! literal pre-formatted HTML.
//!
//! ```toml
//! [[footnotes]]
//! id = "fn1"
//! doi = "10.1126/science.add2187"
//!
//! [[footnotes]]
//! id = "fn2"
//! manual = "<i>Personal communication</i>, 2025."
//! ```

use serde::Deserialize;
use std::fmt;

/// A single citation source declared in post front matter.
///
/// Immutable after parsing; the id must be unique within one post.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FootnoteDescriptor {
    /// Stable key, referenced by in-text markers as `#<id>`.
    pub id: String,

    /// DOI, resolved through the bibliographic formatter.
    #[serde(default)]
    doi: Option<String>,

    /// ISBN, resolved through the bibliographic formatter.
    #[serde(default)]
    isbn: Option<String>,

    /// Plain URL, cited as a link entry.
    #[serde(default)]
    url: Option<String>,

    /// Pre-formatted HTML, used verbatim without any formatter call.
    #[serde(default)]
    manual: Option<String>,
}

/// Identifier kinds accepted by the bibliographic formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Doi,
    Isbn,
    Url,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Doi => "DOI",
            Self::Isbn => "ISBN",
            Self::Url => "URL",
        })
    }
}

/// Resolved source of a descriptor's display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    /// Literal pre-formatted HTML, passed through unmodified.
    Manual(&'a str),
    /// Identifier to hand to the bibliographic formatter.
    Identifier(IdentifierKind, &'a str),
}

impl FootnoteDescriptor {
    /// Select the display-text source for this descriptor.
    ///
    /// Manual text always wins; otherwise the first present identifier in
    /// DOI > ISBN > URL priority. Returns `None` when the descriptor carries
    /// no usable source at all.
    pub fn source(&self) -> Option<Source<'_>> {
        if let Some(html) = self.manual.as_deref() {
            return Some(Source::Manual(html));
        }
        if let Some(doi) = self.doi.as_deref() {
            return Some(Source::Identifier(IdentifierKind::Doi, doi));
        }
        if let Some(isbn) = self.isbn.as_deref() {
            return Some(Source::Identifier(IdentifierKind::Isbn, isbn));
        }
        if let Some(url) = self.url.as_deref() {
            return Some(Source::Identifier(IdentifierKind::Url, url));
        }
        None
    }
}

#[cfg(test)]
impl FootnoteDescriptor {
    pub fn with_doi(id: &str, doi: &str) -> Self {
        Self {
            id: id.into(),
            doi: Some(doi.into()),
            isbn: None,
            url: None,
            manual: None,
        }
    }

    pub fn with_isbn(id: &str, isbn: &str) -> Self {
        Self {
            id: id.into(),
            doi: None,
            isbn: Some(isbn.into()),
            url: None,
            manual: None,
        }
    }

    pub fn with_url(id: &str, url: &str) -> Self {
        Self {
            id: id.into(),
            doi: None,
            isbn: None,
            url: Some(url.into()),
            manual: None,
        }
    }

    pub fn with_manual(id: &str, html: &str) -> Self {
        Self {
            id: id.into(),
            doi: None,
            isbn: None,
            url: None,
            manual: Some(html.into()),
        }
    }

    pub fn empty(id: &str) -> Self {
        Self {
            id: id.into(),
            doi: None,
            isbn: None,
            url: None,
            manual: None,
        }
    }
}
