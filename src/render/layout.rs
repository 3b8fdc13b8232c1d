//! Page shell and content fragments.
//!
//! The site layout is embedded at compile time and filled with simple
//! placeholder substitution. Fragments (post article, previews, CV) are
//! assembled here so the compiler only deals with whole pages.

use crate::config::SiteConfig;
use crate::content::{Post, Registry};
use crate::utils::html::escape_text;

/// Page shell template (embedded at compile time)
const LAYOUT_TEMPLATE: &str = include_str!("../embed/layout.html");

/// Site stylesheet, written to `/style.css` during build
pub const STYLE_SHEET: &str = include_str!("../embed/style.css");

// ============================================================================
// Page Shell
// ============================================================================

/// Wrap page content in the site shell.
#[allow(clippy::literal_string_with_formatting_args)]
// These are template placeholders, not format args
pub fn page(config: &SiteConfig, title: &str, content: &str) -> String {
    let page_title = if title.is_empty() {
        config.base.title.clone()
    } else {
        format!("{} | {}", title, config.base.title)
    };

    let mut nav = String::from(r#"<a href="/">Posts</a>"#);
    if config.build.cv.enable {
        nav.push_str(r#"<a href="/cv/">CV</a>"#);
    }

    LAYOUT_TEMPLATE
        .replace("{lang}", &config.base.language)
        .replace("{title}", &escape_text(&page_title))
        .replace("{description}", &escape_text(&config.base.description))
        .replace("{site_title}", &escape_text(&config.base.title))
        .replace("{nav}", &nav)
        .replace("{content}", content)
        .replace("{copyright}", &escape_text(&config.base.copyright))
}

// ============================================================================
// Fragments
// ============================================================================

/// Full post article: title, meta line, body, bibliography, back link.
pub fn post_article(post: &Post, body: &str, notes: &str) -> String {
    let mut meta_line = format!("Published on: {}", post.meta.date);
    if let Some(category) = &post.meta.category {
        meta_line.push_str(" · ");
        meta_line.push_str(category);
    }

    format!(
        "<article>\n<h1>{title}</h1>\n<p class=\"post-meta\">{meta}</p>\n\
         <div class=\"content-container\">\n{body}</div>\n{notes}\
         <hr/>\n<p><a href=\"/\">&laquo; Back to all posts</a></p>\n</article>\n",
        title = escape_text(&post.meta.title),
        meta = escape_text(&meta_line),
        body = body,
        notes = notes,
    )
}

/// Post index: previews in registry order, or a placeholder when empty.
pub fn index_page(registry: &Registry) -> String {
    let mut content = String::from("<h1>Blog Posts</h1>\n");

    if registry.is_empty() {
        content.push_str("<p>No posts yet!</p>\n");
        return content;
    }

    for post in registry.iter() {
        content.push_str(&post_preview(post));
    }
    content
}

/// One entry on the index page.
fn post_preview(post: &Post) -> String {
    let mut meta_line = post.meta.date.clone();
    if let Some(category) = &post.meta.category {
        meta_line.push_str(" · ");
        meta_line.push_str(category);
    }

    let excerpt = post
        .meta
        .excerpt
        .as_deref()
        .map(|e| format!("<p>{}</p>\n", escape_text(e)))
        .unwrap_or_default();

    format!(
        "<article class=\"post-preview\">\n<h2><a href=\"{url}\">{title}</a></h2>\n\
          <p class=\"post-meta\">{meta}</p>\n{excerpt}</article>\n",
        url = post.paths.url_path,
        title = escape_text(&post.meta.title),
        meta = escape_text(&meta_line),
        excerpt = excerpt,
    )
}

/// CV page content.
pub fn cv_content(rendered: &str) -> String {
    format!("<div class=\"cv-content\">\n{rendered}</div>\n")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Registry;

    fn test_config() -> SiteConfig {
        SiteConfig::from_str(
            r#"
            [base]
            title = "nlb's blog"
            description = "Notes & experiments"
            copyright = "2026 nlb"
        "#,
        )
        .unwrap()
    }

    #[test]
    fn test_page_substitutes_placeholders() {
        let config = test_config();
        let html = page(&config, "A post", "<p>hello</p>");

        assert!(html.contains("<title>A post | nlb's blog</title>"));
        assert!(html.contains("<p>hello</p>"));
        assert!(html.contains("Notes &amp; experiments"));
        assert!(html.contains("2026 nlb"));
        assert!(!html.contains("{content}"));
        assert!(!html.contains("{title}"));
    }

    #[test]
    fn test_page_empty_title_uses_site_title() {
        let config = test_config();
        let html = page(&config, "", "x");
        assert!(html.contains("<title>nlb's blog</title>"));
    }

    #[test]
    fn test_nav_omits_cv_when_disabled() {
        let mut config = test_config();
        config.build.cv.enable = false;
        let html = page(&config, "t", "x");
        assert!(!html.contains(r#"href="/cv/""#));

        config.build.cv.enable = true;
        let html = page(&config, "t", "x");
        assert!(html.contains(r#"href="/cv/""#));
    }

    #[test]
    fn test_index_page_empty_placeholder() {
        let content = index_page(&Registry::default());
        assert!(content.contains("No posts yet!"));
    }

    #[test]
    fn test_cv_content_wrapper() {
        assert!(cv_content("<h1>CV</h1>").contains("cv-content"));
    }
}
