//! TOML front matter parsing for Markdown posts.
//!
//! Posts open with a `+++` fenced TOML block:
//!
//! ```markdown
//! +++
//! title = "Getting started"
//! date = "2025-04-13"
//! excerpt = "Setting things up..."
//!
//! [[footnotes]]
//! id = "fn1"
//! doi = "10.1101/2024.03.14.585103"
//! +++
//!
//! Post body...
//! ```

use super::footnote::FootnoteDescriptor;
use anyhow::{Result, bail};
use serde::Deserialize;

/// Front matter delimiter line
const FENCE: &str = "+++";

/// Parsed post metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrontMatter {
    /// Post title.
    pub title: String,

    /// Publication date, "YYYY-MM-DD" or RFC 3339.
    pub date: String,

    /// Optional category shown in the post list.
    #[serde(default)]
    pub category: Option<String>,

    /// Short summary for the index page and feeds.
    #[serde(default)]
    pub excerpt: Option<String>,

    /// Drafts are excluded from the build entirely.
    #[serde(default)]
    pub draft: bool,

    /// Citation descriptors for this post's footnotes.
    #[serde(default)]
    pub footnotes: Vec<FootnoteDescriptor>,
}

/// Split a post source into front matter and Markdown body.
///
/// The front matter block is mandatory: every post needs at least a title
/// and a date.
pub fn split_front_matter(source: &str) -> Result<(FrontMatter, &str)> {
    let trimmed = source.trim_start_matches('\u{feff}');
    let Some(rest) = strip_fence_line(trimmed) else {
        bail!("post must start with a `+++` front matter block");
    };

    let Some(end) = find_closing_fence(rest) else {
        bail!("unterminated `+++` front matter block");
    };

    let matter: FrontMatter = toml::from_str(&rest[..end])?;
    validate(&matter)?;

    // Body starts after the closing fence line
    let body = rest[end..]
        .trim_start_matches(FENCE)
        .trim_start_matches(['\r', '\n']);
    Ok((matter, body))
}

fn validate(matter: &FrontMatter) -> Result<()> {
    if matter.title.trim().is_empty() {
        bail!("front matter `title` must not be empty");
    }
    for descriptor in &matter.footnotes {
        if descriptor.id.trim().is_empty() {
            bail!("footnote descriptor with empty `id`");
        }
    }
    Ok(())
}

/// Strip the opening fence line, returning the remainder.
fn strip_fence_line(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(FENCE)?;
    // The fence must be alone on its line
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    rest.strip_prefix('\n')
}

/// Byte offset of the closing fence within `rest`, which must appear at the
/// start of a line.
fn find_closing_fence(rest: &str) -> Option<usize> {
    if rest.starts_with(FENCE) {
        return Some(0);
    }
    let mut search_from = 0;
    while let Some(pos) = rest[search_from..].find(&format!("\n{FENCE}")) {
        let fence_start = search_from + pos + 1;
        let after = &rest[fence_start + FENCE.len()..];
        if after.is_empty() || after.starts_with('\n') || after.starts_with('\r') {
            return Some(fence_start);
        }
        search_from = fence_start;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::footnote::{IdentifierKind, Source};

    const POST: &str = r#"+++
title = "Observations on how antibodies evolve"
date = "2025-02-14"
category = "Bio/ML"
excerpt = "A recent study on anti-SARS-CoV-2 antibodies."

[[footnotes]]
id = "fn1"
doi = "10.1126/science.add2187"

[[footnotes]]
id = "fn2"
manual = "<i>Lab notebook</i>, 2025."
+++

Body text with a marker[^fn1].
"#;

    #[test]
    fn test_split_full_post() {
        let (matter, body) = split_front_matter(POST).unwrap();

        assert_eq!(matter.title, "Observations on how antibodies evolve");
        assert_eq!(matter.date, "2025-02-14");
        assert_eq!(matter.category.as_deref(), Some("Bio/ML"));
        assert!(!matter.draft);
        assert_eq!(matter.footnotes.len(), 2);
        assert_eq!(
            matter.footnotes[0].source(),
            Some(Source::Identifier(
                IdentifierKind::Doi,
                "10.1126/science.add2187"
            ))
        );
        assert!(body.starts_with("Body text"));
    }

    #[test]
    fn test_missing_front_matter_rejected() {
        let err = split_front_matter("Just some markdown.").unwrap_err();
        assert!(err.to_string().contains("front matter"));
    }

    #[test]
    fn test_unterminated_front_matter_rejected() {
        let err = split_front_matter("+++\ntitle = \"x\"\ndate = \"2025-01-01\"\n").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_empty_title_rejected() {
        let src = "+++\ntitle = \"  \"\ndate = \"2025-01-01\"\n+++\nbody";
        assert!(split_front_matter(src).is_err());
    }

    #[test]
    fn test_empty_footnote_id_rejected() {
        let src = r#"+++
title = "x"
date = "2025-01-01"

[[footnotes]]
id = ""
doi = "10.1/x"
+++
body"#;
        assert!(split_front_matter(src).is_err());
    }

    #[test]
    fn test_empty_body() {
        let src = "+++\ntitle = \"x\"\ndate = \"2025-01-01\"\n+++";
        let (matter, body) = split_front_matter(src).unwrap();
        assert_eq!(matter.title, "x");
        assert_eq!(body, "");
    }

    #[test]
    fn test_fence_inside_body_untouched() {
        let src = "+++\ntitle = \"x\"\ndate = \"2025-01-01\"\n+++\nsome `+++` inline\n";
        let (_, body) = split_front_matter(src).unwrap();
        assert!(body.contains("`+++` inline"));
    }

    #[test]
    fn test_draft_flag() {
        let src = "+++\ntitle = \"x\"\ndate = \"2025-01-01\"\ndraft = true\n+++\nbody";
        let (matter, _) = split_front_matter(src).unwrap();
        assert!(matter.draft);
    }
}
