//! Site building orchestration.
//!
//! Coordinates content compilation and asset processing.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── Registry::load() ──► parse all posts (front matter + body)
//!     │
//!     ├── rayon::join
//!     │       ├── compile posts (numbering + citations + layout)
//!     │       └── process assets (copy-through)
//!     │
//!     ├── write index, CV page, stylesheet
//!     │
//!     └── build_rss() / build_sitemap() from collected metadata
//! ```
//!
//! Citation results are cached across builds (watch mode), so rebuilding
//! an unchanged post never refires formatter lookups.

use crate::{
    compiler::{assets, mtime, pages},
    config::SiteConfig,
    content::Registry,
    generator::{rss::build_rss, sitemap::build_sitemap},
    log,
    render::{citations::CitationResolver, layout},
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::{
    fs,
    sync::atomic::{AtomicBool, Ordering},
};

/// Build the entire site, processing posts and assets in parallel.
///
/// Returns the loaded registry for callers that need post metadata.
/// If `config.build.clean` is true, clears the entire output directory first.
pub fn build_site(config: &SiteConfig) -> Result<Registry> {
    let output = &config.build.output;
    let clean = config.build.clean;

    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    let registry = Registry::load(config)?;
    log!("content"; "found {} posts", registry.len());

    let resolver = if config.build.citations.enable {
        Some(CitationResolver::from_config(config)?)
    } else {
        None
    };

    // Posts also depend on the config file (layout fields, citation style)
    let deps_mtime = mtime(&config.config_path);
    let has_error = AtomicBool::new(false);

    // ========================================================================
    // Compile pages + Process assets
    // ========================================================================
    let (pages_result, assets_result) = rayon::join(
        || {
            registry.posts().par_iter().try_for_each(|post| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                match pages::process_post(post, resolver.as_ref(), config, clean, deps_mtime, false)
                {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        if !has_error.swap(true, Ordering::Relaxed) {
                            log!("error"; "{}: {:#}", post.paths.relative, e);
                        }
                        Err(anyhow!("Build failed"))
                    }
                }
            })
        },
        || {
            assets::process_all(config, clean).inspect_err(|e| {
                if !has_error.swap(true, Ordering::Relaxed) {
                    log!("error"; "assets: {e:#}");
                }
            })
        },
    );

    pages_result?;
    assets_result?;

    // Site-level pages and artifacts
    pages::write_index(&registry, config)?;
    pages::write_cv(config)?;
    fs::write(output.join("style.css"), layout::STYLE_SHEET)?;

    build_rss(config, &registry)?;
    build_sitemap(config, &registry)?;

    log_build_result(&registry);
    Ok(registry)
}

/// Log build result based on output contents.
fn log_build_result(registry: &Registry) {
    if registry.is_empty() {
        log!("warn"; "no posts found, check if content/posts has .md files");
    } else {
        log!("build"; "done ({} posts)", registry.len());
    }
}
