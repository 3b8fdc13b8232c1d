//! `[build]` section configuration.
//!
//! Build paths, minification, slug policy, feeds and the citation pipeline.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in folio.toml.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"
/// output = "public"
/// minify = true
///
/// [build.rss]
/// enable = true
///
/// [build.citations]
/// style = "apa"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root (set from CLI, not from the config file).
    #[serde(skip)]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content directory containing posts and the CV source.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Output directory for the generated site.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Static assets directory, copied through verbatim.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Minify generated HTML/XML output.
    #[serde(default = "defaults::r#false")]
    pub minify: bool,

    /// Clean output directory before building (set from CLI).
    #[serde(skip)]
    pub clean: bool,

    /// Slug policy for output paths.
    #[serde(default)]
    pub slug: SlugConfig,

    /// RSS feed generation.
    #[serde(default)]
    pub rss: RssConfig,

    /// Sitemap generation.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// CV page generation.
    #[serde(default)]
    pub cv: CvConfig,

    /// Citation resolution for post footnotes.
    #[serde(default)]
    pub citations: CitationsConfig,
}

// ============================================================================
// Slug
// ============================================================================

/// How post filenames are mapped to URL path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Strip forbidden characters, replace whitespace with underscores.
    #[default]
    Safe,
    /// Full slugification: ASCII transliteration, lowercase, dashes.
    On,
    /// Use the filename verbatim.
    No,
}

/// `[build.slug]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlugConfig {
    /// Slug mode applied to post output paths.
    #[serde(default)]
    pub path: SlugMode,
}

// ============================================================================
// Feeds
// ============================================================================

/// `[build.rss]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    /// Generate an RSS feed at `path`.
    #[serde(default = "defaults::r#false")]
    pub enable: bool,

    /// Feed path relative to the output directory.
    #[serde(default = "defaults::build::rss::path")]
    #[educe(Default = defaults::build::rss::path())]
    pub path: PathBuf,
}

/// `[build.sitemap]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    /// Generate a sitemap at `path`.
    #[serde(default = "defaults::r#false")]
    pub enable: bool,

    /// Sitemap path relative to the output directory.
    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,
}

// ============================================================================
// CV
// ============================================================================

/// `[build.cv]` section.
///
/// The CV page is rendered from a Markdown file in the content directory
/// to `/cv/` in the output.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CvConfig {
    /// Render the CV page.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// CV source file relative to the content directory.
    #[serde(default = "defaults::build::cv::source")]
    #[educe(Default = defaults::build::cv::source())]
    pub source: PathBuf,
}

// ============================================================================
// Citations
// ============================================================================

/// `[build.citations]` section.
///
/// Controls the bibliographic formatter used to resolve post footnote
/// descriptors (DOI, ISBN, URL) into formatted bibliography entries.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CitationsConfig {
    /// Resolve citations during build. When disabled, posts render without
    /// a bibliography section.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// CSL citation style template (e.g., "apa", "vancouver").
    #[serde(default = "defaults::build::citations::style")]
    #[educe(Default = defaults::build::citations::style())]
    pub style: String,

    /// Citation locale (e.g., "en-US").
    #[serde(default = "defaults::build::citations::locale")]
    #[educe(Default = defaults::build::citations::locale())]
    pub locale: String,

    /// Per-request timeout in seconds for formatter lookups.
    #[serde(default = "defaults::build::citations::timeout")]
    #[educe(Default = defaults::build::citations::timeout())]
    pub timeout: u64,
}
