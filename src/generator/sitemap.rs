//! Sitemap generation.
//!
//! Generates a sitemap.xml file listing all pages for search engine indexing.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{
    config::SiteConfig,
    content::Registry,
    log,
    utils::{
        date::DateTimeUtc,
        html::escape_text,
        minify::{MinifyType, minify},
    },
};
use anyhow::{Context, Result};
use std::fs;

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Public API
// ============================================================================

/// Build sitemap if enabled in config.
pub fn build_sitemap(config: &SiteConfig, registry: &Registry) -> Result<()> {
    if config.build.sitemap.enable {
        let sitemap = Sitemap::from_site(config, registry);
        sitemap.write(config)?;
    }
    Ok(())
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

/// Sitemap data structure
struct Sitemap {
    /// List of URL entries
    urls: Vec<UrlEntry>,
}

/// Single URL entry in the sitemap
struct UrlEntry {
    /// Full URL location
    loc: String,
    /// Last modification date (optional, YYYY-MM-DD format)
    lastmod: Option<String>,
}

impl Sitemap {
    /// Build sitemap entries: index, posts, and the CV page.
    fn from_site(config: &SiteConfig, registry: &Registry) -> Self {
        let base_url = config.base.url.clone().unwrap_or_default();
        let base_url = base_url.trim_end_matches('/');

        let mut urls = vec![UrlEntry {
            loc: format!("{base_url}/"),
            lastmod: registry
                .iter()
                .next()
                .and_then(|post| DateTimeUtc::parse(&post.meta.date))
                .map(DateTimeUtc::to_ymd),
        }];

        urls.extend(registry.iter().map(|post| UrlEntry {
            loc: post.paths.full_url.clone(),
            lastmod: DateTimeUtc::parse(&post.meta.date).map(DateTimeUtc::to_ymd),
        }));

        if config.build.cv.enable {
            urls.push(UrlEntry {
                loc: format!("{base_url}/cv/"),
                lastmod: None,
            });
        }

        Self { urls }
    }

    /// Generate sitemap XML string.
    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_text(&entry.loc)));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Write sitemap to output file.
    fn write(self, config: &SiteConfig) -> Result<()> {
        let sitemap_path = &config.build.sitemap.path;
        let xml = self.into_xml();
        let xml = minify(MinifyType::Xml(xml.as_bytes()), config);

        if let Some(parent) = sitemap_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(sitemap_path, &*xml)
            .with_context(|| format!("Failed to write sitemap to {}", sitemap_path.display()))?;

        log!("sitemap"; "{}", sitemap_path.file_name().unwrap_or_default().to_string_lossy());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> SiteConfig {
        SiteConfig::from_str(
            r#"
            [base]
            title = "Test"
            description = "Test blog"
            url = "https://example.com"
        "#,
        )
        .unwrap()
    }

    #[test]
    fn test_sitemap_includes_index_and_cv() {
        let config = make_config();
        let sitemap = Sitemap::from_site(&config, &Registry::default());
        let xml = sitemap.into_xml();

        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/cv/</loc>"));
        assert!(xml.contains(SITEMAP_NS));
    }

    #[test]
    fn test_sitemap_cv_disabled() {
        let mut config = make_config();
        config.build.cv.enable = false;

        let xml = Sitemap::from_site(&config, &Registry::default()).into_xml();
        assert!(!xml.contains("/cv/"));
    }

    #[test]
    fn test_sitemap_escapes_loc() {
        let entry = UrlEntry {
            loc: "https://example.com/?a=1&b=2".into(),
            lastmod: None,
        };
        let xml = Sitemap { urls: vec![entry] }.into_xml();
        assert!(xml.contains("a=1&amp;b=2"));
    }
}
