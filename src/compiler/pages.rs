//! Page compilation: posts, the index, and the CV.
//!
//! Per-post pipeline:
//!
//! ```text
//! Markdown body ──► render_markdown()
//!                        │
//!                        ▼
//!              NumberingPass::run()  ──► numbered region + id→number map
//!                        │
//! front matter ──► resolver.resolve_all() ──► id→entry list
//!                        │
//!                        ▼
//!              render_bibliography() ──► notes section
//!                        │
//!                        ▼
//!              layout::page() ──► minify ──► posts/<slug>/index.html
//! ```

use crate::compiler::is_up_to_date;
use crate::config::SiteConfig;
use crate::content::{Post, Registry};
use crate::log;
use crate::render::citations::CitationResolver;
use crate::render::footnotes::NumberingPass;
use crate::render::markdown::render_markdown;
use crate::render::{bibliography, layout};
use crate::utils::minify::{MinifyType, minify};
use anyhow::{Context, Result};
use std::{fs, path::Path, time::SystemTime};

// ============================================================================
// Posts
// ============================================================================

/// Compile one post to a full HTML page.
pub fn compile_post(
    post: &Post,
    resolver: Option<&CitationResolver>,
    config: &SiteConfig,
) -> Result<String> {
    let rendered = render_markdown(&post.body);

    let mut pass = NumberingPass::new();
    let region = pass.run(&rendered);

    // The notes section appears when the post declares descriptors or
    // references any footnote in text; resolution itself is config-gated.
    let notes = match resolver {
        Some(resolver) if !post.meta.footnotes.is_empty() || !region.numbers.is_empty() => {
            let set = resolver.resolve_all(&post.meta.footnotes);
            bibliography::render_bibliography(&set, &region.numbers)
        }
        _ => String::new(),
    };

    let article = layout::post_article(post, &region.html, &notes);
    Ok(layout::page(config, &post.meta.title, &article))
}

/// Compile and write one post, skipping up-to-date outputs.
///
/// Returns `true` if the post was (re)written.
pub fn process_post(
    post: &Post,
    resolver: Option<&CitationResolver>,
    config: &SiteConfig,
    clean: bool,
    deps_mtime: Option<SystemTime>,
    log_file: bool,
) -> Result<bool> {
    if !clean && is_up_to_date(&post.paths.source, &post.paths.html, deps_mtime) {
        return Ok(false);
    }

    if log_file {
        log!("content"; "{}", post.paths.relative);
    }

    let html = compile_post(post, resolver, config)
        .with_context(|| format!("Failed to compile {}", post.paths.source.display()))?;
    write_page(&post.paths.html, &html, config)?;
    Ok(true)
}

// ============================================================================
// Index
// ============================================================================

/// Write the post index to `index.html`.
///
/// Always rewritten: it depends on every post's metadata.
pub fn write_index(registry: &Registry, config: &SiteConfig) -> Result<()> {
    let content = layout::index_page(registry);
    let html = layout::page(config, "", &content);
    write_page(&config.build.output.join("index.html"), &html, config)
}

// ============================================================================
// CV
// ============================================================================

/// Render the CV page from its Markdown source to `/cv/`.
///
/// A missing source is logged and skipped, not an error: the CV page is
/// optional content.
pub fn write_cv(config: &SiteConfig) -> Result<()> {
    if !config.build.cv.enable {
        return Ok(());
    }

    let source = config.build.content.join(&config.build.cv.source);
    if !source.exists() {
        log!("cv"; "source {} not found, skipping", config.build.cv.source.display());
        return Ok(());
    }

    let markdown = fs::read_to_string(&source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let content = layout::cv_content(&render_markdown(&markdown));
    let html = layout::page(config, "CV", &content);
    write_page(&config.build.output.join("cv/index.html"), &html, config)
}

// ============================================================================
// Output
// ============================================================================

/// Minify and write a finished page, creating parent directories.
pub fn write_page(path: &Path, html: &str, config: &SiteConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let bytes = minify(MinifyType::Html(html.as_bytes()), config);
    fs::write(path, &*bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
