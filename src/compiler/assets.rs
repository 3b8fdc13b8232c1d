//! Static asset processing.
//!
//! Two sources feed the output directory:
//! - `assets/` is mirrored under `public/assets/`
//! - non-Markdown files in `content/` (post images, data files for plots)
//!   are mirrored at their relative location

use crate::compiler::{collect_all_files, is_up_to_date};
use crate::config::SiteConfig;
use crate::log;
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::{fs, path::Path};

/// Copy all assets and content-relative assets to the output directory.
pub fn process_all(config: &SiteConfig, clean: bool) -> Result<()> {
    let asset_files = collect_all_files(&config.build.assets);
    asset_files
        .par_iter()
        .try_for_each(|path| process_asset(path, config, clean, false))?;

    let content_asset_files: Vec<_> = collect_all_files(&config.build.content)
        .into_iter()
        .filter(|p| p.extension().is_none_or(|ext| ext != "md"))
        .collect();
    content_asset_files
        .par_iter()
        .try_for_each(|path| process_rel_asset(path, config, clean, false))?;

    Ok(())
}

/// Process an asset file from the assets directory.
pub fn process_asset(
    asset_path: &Path,
    config: &SiteConfig,
    clean: bool,
    log_file: bool,
) -> Result<()> {
    let rel_path = asset_path
        .strip_prefix(&config.build.assets)?
        .to_str()
        .ok_or_else(|| anyhow!("Invalid path"))?;
    let output_path = config.build.output.join("assets").join(rel_path);

    copy_if_stale(asset_path, &output_path, clean, log_file, rel_path)
}

/// Process an asset file from the content directory (non-.md files).
pub fn process_rel_asset(
    path: &Path,
    config: &SiteConfig,
    clean: bool,
    log_file: bool,
) -> Result<()> {
    let rel_path = path
        .strip_prefix(&config.build.content)?
        .to_str()
        .ok_or_else(|| anyhow!("Invalid path"))?;
    let output_path = config.build.output.join(rel_path);

    copy_if_stale(path, &output_path, clean, log_file, rel_path)
}

fn copy_if_stale(
    source: &Path,
    dest: &Path,
    clean: bool,
    log_file: bool,
    rel_path: &str,
) -> Result<()> {
    if !clean && is_up_to_date(source, dest, None) {
        return Ok(());
    }

    if log_file {
        log!("assets"; "{rel_path}");
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(source, dest)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_config(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::from_str(
            r#"
            [base]
            title = "Test"
            description = "Test blog"
        "#,
        )
        .unwrap();
        config.build.content = root.join("content");
        config.build.assets = root.join("assets");
        config.build.output = root.join("public");
        config
    }

    #[test]
    fn test_assets_mirrored_under_assets_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        fs::create_dir_all(config.build.assets.join("images")).unwrap();
        fs::write(config.build.assets.join("images/plot.svg"), "<svg/>").unwrap();

        process_all(&config, false).unwrap();

        assert!(config.build.output.join("assets/images/plot.svg").exists());
    }

    #[test]
    fn test_content_markdown_not_copied() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        fs::create_dir_all(config.build.content.join("posts")).unwrap();
        fs::write(config.build.content.join("posts/post.md"), "+++").unwrap();
        fs::write(config.build.content.join("posts/data.csv"), "a,b").unwrap();

        process_all(&config, false).unwrap();

        assert!(!config.build.output.join("posts/post.md").exists());
        assert!(config.build.output.join("posts/data.csv").exists());
    }
}
