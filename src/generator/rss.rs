//! rss feed generation.
//!
//! Maps post metadata onto an rss channel and writes the validated feed.

use crate::{
    config::SiteConfig,
    content::{Post, Registry},
    log,
    utils::{
        date::DateTimeUtc,
        minify::{MinifyType, minify},
    },
};
use anyhow::{Result, anyhow};
use regex::Regex;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::{fs, sync::LazyLock};

// ============================================================================
// Public API
// ============================================================================

/// Build rss feed if enabled in config.
pub fn build_rss(config: &SiteConfig, registry: &Registry) -> Result<()> {
    if config.build.rss.enable {
        RssFeed::build(config, registry).write(config)?;
    }
    Ok(())
}

// ============================================================================
// RssFeed Implementation
// ============================================================================

/// rss feed builder
struct RssFeed<'a> {
    config: &'a SiteConfig,
    posts: Vec<&'a Post>,
}

impl<'a> RssFeed<'a> {
    /// Collect feed-worthy posts (all published posts, newest first).
    fn build(config: &'a SiteConfig, registry: &'a Registry) -> Self {
        Self {
            config,
            posts: registry.iter().collect(),
        }
    }

    /// Generate rss xml string
    fn into_xml(self) -> Result<String> {
        let items: Vec<_> = self
            .posts
            .iter()
            .filter_map(|post| post_to_rss_item(post, self.config))
            .collect();

        let channel = ChannelBuilder::default()
            .title(&self.config.base.title)
            .link(self.config.base.url.as_deref().unwrap_or_default())
            .description(&self.config.base.description)
            .language(self.config.base.language.clone())
            .generator("folio".to_string())
            .items(items)
            .build();

        channel
            .validate()
            .map_err(|e| anyhow!("rss validation failed: {e}"))?;
        Ok(channel.to_string())
    }

    /// Write rss feed to file
    fn write(self, config: &SiteConfig) -> Result<()> {
        let xml = self.into_xml()?;
        let xml = minify(MinifyType::Xml(xml.as_bytes()), config);
        let rss_path = &config.build.rss.path;

        if let Some(parent) = rss_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(rss_path, &*xml)?;

        log!("rss"; "{}", rss_path.file_name().unwrap_or_default().to_string_lossy());
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a post to an rss item.
/// Returns None if the date cannot be parsed.
fn post_to_rss_item(post: &Post, config: &SiteConfig) -> Option<rss::Item> {
    let pub_date = DateTimeUtc::parse(&post.meta.date).map(DateTimeUtc::to_rfc2822)?;
    let link = post.paths.full_url.clone();
    let author = normalize_rss_author(config);

    Some(
        ItemBuilder::default()
            .title(post.meta.title.clone())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build())
            .description(post.meta.excerpt.clone())
            .pub_date(pub_date)
            .author(author)
            .build(),
    )
}

/// Normalize author field to rss format: "email@example.com (Name)"
fn normalize_rss_author(config: &SiteConfig) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap()
    });

    let site_author = &config.base.author;
    if RE_VALID_AUTHOR.is_match(site_author) {
        return Some(site_author.clone());
    }

    // Combine email and author name
    Some(format!("{} ({})", config.base.email, site_author))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_config(author: &str, email: &str) -> SiteConfig {
        let mut config = SiteConfig::from_str(
            r#"
            [base]
            title = "Test"
            description = "Test blog"
            url = "https://example.com"
        "#,
        )
        .unwrap();
        config.base.author = author.to_string();
        config.base.email = email.to_string();
        config
    }

    fn make_post(title: &str, date: &str, excerpt: Option<&str>) -> Post {
        let matter = format!(
            "+++\ntitle = \"{title}\"\ndate = \"{date}\"\n{}+++\n",
            excerpt.map(|e| format!("excerpt = \"{e}\"\n")).unwrap_or_default()
        );
        let (meta, _) = crate::content::frontmatter::split_front_matter(&matter).unwrap();

        Post {
            slug: "test".into(),
            paths: crate::content::PostPaths {
                source: PathBuf::from("content/posts/test.md"),
                html: PathBuf::from("public/posts/test/index.html"),
                relative: "posts/test".into(),
                url_path: "/posts/test/".into(),
                full_url: "https://example.com/posts/test/".into(),
            },
            meta,
            body: String::new(),
        }
    }

    #[test]
    fn test_normalize_rss_author() {
        // Site author already in valid format
        let config = make_config("site@example.com (Site Author)", "");
        assert_eq!(
            normalize_rss_author(&config),
            Some("site@example.com (Site Author)".to_string())
        );

        // Plain name: combined with email
        let config = make_config("Site Author", "site@example.com");
        assert_eq!(
            normalize_rss_author(&config),
            Some("site@example.com (Site Author)".to_string())
        );
    }

    #[test]
    fn test_post_to_rss_item() {
        let config = make_config("Site Author", "site@example.com");
        let post = make_post("Test Title", "2024-01-01", Some("Test Summary"));

        let item = post_to_rss_item(&post, &config).expect("Should convert to RSS item");
        assert_eq!(item.title(), Some("Test Title"));
        assert_eq!(item.link(), Some("https://example.com/posts/test/"));
        assert_eq!(item.description(), Some("Test Summary"));
        // RFC2822 format check
        assert!(item.pub_date().unwrap().contains("Jan 2024"));
    }

    #[test]
    fn test_post_without_excerpt_has_no_description() {
        let config = make_config("Site Author", "site@example.com");
        let post = make_post("Test Title", "2024-01-01", None);

        let item = post_to_rss_item(&post, &config).unwrap();
        assert_eq!(item.description(), None);
    }
}
