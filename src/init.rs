//! Site initialization module.
//!
//! Creates new site structure with default configuration, a sample post
//! and a CV stub.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Default config filename
const CONFIG_FILE: &str = "folio.toml";

/// Default site directory structure
const SITE_DIRS: &[&str] = &["content/posts", "assets/images", "assets/styles"];

/// Sample post demonstrating footnotes and citations
const SAMPLE_POST: &str = r#"+++
title = "Getting started"
date = "2025-04-13"
excerpt = "This is the first post on my new blog, setting things up..."

[[footnotes]]
id = "fn1"
doi = "10.1038/s41586-023-06415-8"

[[footnotes]]
id = "fn2"
manual = "<i>Personal notes</i>, 2025."
+++

Welcome! Posts are written in Markdown with TOML front matter.

Footnote markers like this one[^fn1] are numbered in order of first
appearance, and repeats[^fn1] reuse their number. Each referenced id
is resolved into a formatted bibliography entry[^fn2] below the post.
"#;

/// CV stub rendered to /cv/
const SAMPLE_CV: &str = "# Your Name\n\n## Experience\n\n- Something impressive\n";

/// Create a new site with default structure
pub fn new_site(config: &SiteConfig) -> Result<()> {
    let root = config.get_root();

    // If init runs in the current dir (no name given), require it empty
    let has_name = matches!(
        config.cli.map(|cli| &cli.command),
        Some(crate::cli::Commands::Init { name: Some(_) })
    );
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `folio init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(root)?;
    init_default_config(root)?;
    init_sample_content(root)?;
    init_ignored_files(root, &["public"])?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `folio init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write the sample post and CV stub
fn init_sample_content(root: &Path) -> Result<()> {
    fs::write(
        root.join("content/posts/getting-started.md"),
        SAMPLE_POST,
    )?;
    fs::write(root.join("content/CV.md"), SAMPLE_CV)?;
    Ok(())
}

/// Initialize .gitignore and .ignore files with specified paths
fn init_ignored_files(root: &Path, paths: &[&str]) -> Result<()> {
    let content = paths.join("\n");

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_dir_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(is_dir_empty(tmp.path()).unwrap());

        fs::write(tmp.path().join("file"), "x").unwrap();
        assert!(!is_dir_empty(tmp.path()).unwrap());

        assert!(is_dir_empty(&tmp.path().join("missing")).unwrap());
    }

    #[test]
    fn test_init_structure_and_content() {
        let tmp = tempfile::tempdir().unwrap();

        init_site_structure(tmp.path()).unwrap();
        init_default_config(tmp.path()).unwrap();
        init_sample_content(tmp.path()).unwrap();
        init_ignored_files(tmp.path(), &["public"]).unwrap();

        assert!(tmp.path().join("content/posts/getting-started.md").exists());
        assert!(tmp.path().join("content/CV.md").exists());
        assert!(tmp.path().join("folio.toml").exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join(".gitignore")).unwrap(),
            "public"
        );

        // The generated config must parse back
        let config = SiteConfig::from_path(&tmp.path().join("folio.toml")).unwrap();
        assert!(config.build.citations.enable);
    }

    #[test]
    fn test_init_refuses_existing_structure() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("content/posts")).unwrap();

        assert!(init_site_structure(tmp.path()).is_err());
    }

    #[test]
    fn test_sample_post_parses() {
        let (matter, body) =
            crate::content::frontmatter::split_front_matter(SAMPLE_POST).unwrap();
        assert_eq!(matter.footnotes.len(), 2);
        assert!(body.contains("[^fn1]"));
    }
}
