//! Post content model.
//!
//! `Post` is the **primary metadata structure** for blog posts, containing
//! parsed front matter plus all path and URL information needed across the
//! build pipeline.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     └── Registry::load() ──► one Post per content/posts/**/*.md
//!                                      │
//!                                      ▼
//!                          sort by date (descending)
//!                                      │
//!                 ┌────────────────────┼────────────────────┐
//!                 ▼                    ▼                    ▼
//!          compile posts         write_index()      build_rss()/sitemap
//!          (numbering +          (post previews)    (uses post.paths)
//!           citations)
//! ```

pub mod footnote;
pub mod frontmatter;

pub use frontmatter::FrontMatter;

use crate::config::SiteConfig;
use crate::utils::{date::DateTimeUtc, slug::slugify_stem};
use anyhow::{Context, Result, anyhow, bail};
use frontmatter::split_front_matter;
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

// ============================================================================
// Paths
// ============================================================================

/// Computed locations for a single post.
#[derive(Debug, Clone)]
pub struct PostPaths {
    /// Source Markdown file.
    pub source: PathBuf,

    /// Output HTML path, e.g. `public/posts/hello/index.html`.
    pub html: PathBuf,

    /// Relative path for logging, e.g. `posts/hello`.
    pub relative: String,

    /// Site-absolute URL path, e.g. `/posts/hello/`.
    pub url_path: String,

    /// Complete URL including the configured base url.
    pub full_url: String,
}

// ============================================================================
// Post
// ============================================================================

/// A loaded, parsed post.
#[derive(Debug, Clone)]
pub struct Post {
    /// URL slug derived from the file stem.
    pub slug: String,

    /// Source/output locations.
    pub paths: PostPaths,

    /// Parsed front matter.
    pub meta: FrontMatter,

    /// Markdown body (front matter stripped).
    pub body: String,
}

impl Post {
    /// Load and parse a post from disk.
    pub fn load(path: &Path, config: &SiteConfig) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let (meta, body) = split_front_matter(&source)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if DateTimeUtc::parse(&meta.date).is_none() {
            bail!(
                "invalid date `{}` in {} (expected YYYY-MM-DD)",
                meta.date,
                path.display()
            );
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("invalid post filename: {}", path.display()))?;
        let slug = slugify_stem(stem, config);

        let url_path = format!("/posts/{slug}/");
        let base_url = config.base.url.as_deref().unwrap_or_default();
        let paths = PostPaths {
            source: path.to_path_buf(),
            html: config
                .build
                .output
                .join("posts")
                .join(&slug)
                .join("index.html"),
            relative: format!("posts/{slug}"),
            full_url: format!("{}{}", base_url.trim_end_matches('/'), url_path),
            url_path,
        };

        Ok(Self {
            slug,
            paths,
            meta,
            body: body.to_owned(),
        })
    }

    /// Parsed publication date. Always valid after `load`.
    pub fn date(&self) -> Option<DateTimeUtc> {
        DateTimeUtc::parse(&self.meta.date)
    }

    /// Sort key: newest first, ties broken by slug for a stable order.
    fn sort_key(&self) -> (std::cmp::Reverse<(u16, u8, u8, u8, u8, u8)>, String) {
        let d = self.date().unwrap_or(DateTimeUtc::new(0, 1, 1, 0, 0, 0));
        (
            std::cmp::Reverse((d.year, d.month, d.day, d.hour, d.minute, d.second)),
            self.slug.clone(),
        )
    }
}

// ============================================================================
// Registry
// ============================================================================

/// All published posts, sorted date-descending.
#[derive(Debug, Default)]
pub struct Registry {
    posts: Vec<Post>,
}

impl Registry {
    /// Load every post under `content/posts/`, skipping drafts.
    ///
    /// Fails on the first unparseable post rather than silently dropping it.
    pub fn load(config: &SiteConfig) -> Result<Self> {
        let posts_dir = config.build.content.join("posts");
        if !posts_dir.exists() {
            return Ok(Self::default());
        }

        let files: Vec<PathBuf> = WalkDir::new(&posts_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();

        let mut posts: Vec<Post> = files
            .par_iter()
            .map(|path| Post::load(path, config))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|post| !post.meta.draft)
            .collect();

        posts.sort_by_key(Post::sort_key);

        // Duplicate slugs would silently overwrite each other's output
        let mut seen = rustc_hash::FxHashSet::default();
        for post in &posts {
            if !seen.insert(post.slug.as_str()) {
                bail!(
                    "duplicate post slug `{}` ({})",
                    post.slug,
                    post.paths.source.display()
                );
            }
        }

        Ok(Self { posts })
    }

    /// Find a post by its slug.
    #[allow(dead_code)]
    pub fn find(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }

    /// All posts as a slice (for parallel iteration).
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
