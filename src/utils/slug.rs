//! URL slugification and path utilities.
//!
//! Converts post filenames to URL-safe path segments.

use crate::config::{SiteConfig, SlugMode};
use deunicode::deunicode;

/// Characters forbidden in file paths and fragments
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '\t', '\r', '\n',
];

// ============================================================================
// Slugification
// ============================================================================

/// Convert a post file stem to its URL path segment based on config.
pub fn slugify_stem(stem: &str, config: &SiteConfig) -> String {
    match config.build.slug.path {
        SlugMode::Safe => sanitize_text(stem),
        SlugMode::On => slugify(stem),
        SlugMode::No => stem.to_owned(),
    }
}

/// Full slugification: ASCII transliteration, lowercase, dash-separated.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut prev_dash = true;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }

    // Trim a trailing separator left by non-alphanumeric suffixes
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn config_with_mode(mode: &str) -> SiteConfig {
        SiteConfig::from_str(&format!(
            r#"
            [base]
            title = "Test"
            description = "Test"

            [build.slug]
            path = "{mode}"
        "#
        ))
        .unwrap()
    }

    // ------------------------------------------------------------------------
    // slugify tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn test_slugify_date_prefix() {
        assert_eq!(
            slugify("2025-05-16-ablang-mpnn"),
            "2025-05-16-ablang-mpnn"
        );
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("Füßnoten & Zitate"), "fussnoten-zitate");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("a -- b"), "a-b");
    }

    #[test]
    fn test_slugify_trailing_punctuation() {
        assert_eq!(slugify("hello!"), "hello");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
    }

    // ------------------------------------------------------------------------
    // sanitize_text tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_sanitize_removes_forbidden() {
        assert_eq!(sanitize_text("a<b>c?d"), "abcd");
    }

    #[test]
    fn test_sanitize_whitespace_to_underscore() {
        assert_eq!(sanitize_text("my post title"), "my_post_title");
    }

    // ------------------------------------------------------------------------
    // slugify_stem tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_slugify_stem_modes() {
        assert_eq!(
            slugify_stem("My Post", &config_with_mode("safe")),
            "My_Post"
        );
        assert_eq!(slugify_stem("My Post", &config_with_mode("on")), "my-post");
        assert_eq!(slugify_stem("My Post", &config_with_mode("no")), "My Post");
    }
}
