//! Site configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                      |
//! |-------------|----------------------------------------------|
//! | `[base]`    | Site metadata (title, author, url)           |
//! | `[build]`   | Build paths, feeds, citations, minify        |
//! | `[serve]`   | Development server (port, interface, watch)  |
//! | `[extra]`   | User-defined custom fields                   |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//! description = "A personal blog"
//! url = "https://example.com"
//!
//! [build]
//! content = "content"
//! output = "public"
//! minify = true
//!
//! [build.rss]
//! enable = true
//!
//! [serve]
//! port = 4280
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

// Re-export public types used by other modules
pub use build::SlugMode;

// Internal imports used in this module
use base::BaseConfig;
use build::BuildConfig;
use error::ConfigError;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    env, fs,
    path::{Component, Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    /// Get CLI arguments reference
    #[allow(dead_code)]
    pub fn get_cli(&self) -> Option<&'static Cli> {
        self.cli
    }

    /// Validate configuration consistency before building.
    pub fn validate(&self) -> Result<()> {
        if self.base.title.is_empty() {
            bail!(ConfigError::Validation("base.title must not be empty".into()));
        }
        if (self.build.rss.enable || self.build.sitemap.enable) && self.base.url.is_none() {
            bail!(ConfigError::Validation(
                "base.url is required when rss or sitemap generation is enabled".into()
            ));
        }
        if self.build.citations.enable && self.build.citations.timeout == 0 {
            bail!(ConfigError::Validation(
                "build.citations.timeout must be at least 1 second".into()
            ));
        }
        Ok(())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        // Determine the final root path based on command
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => {
                let base = cli
                    .root
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| self.get_root().to_owned());
                base.join(name)
            }
            _ => cli
                .root
                .as_ref()
                .cloned()
                .unwrap_or_else(|| self.get_root().to_owned()),
        };

        self.set_root(&root);
        self.update_path_with_root(&root, cli);

        if let Some(build_args) = cli.build_args() {
            self.build.clean = build_args.clean;
            Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
            Self::update_option(&mut self.build.rss.enable, build_args.rss.as_ref());
            Self::update_option(&mut self.build.sitemap.enable, build_args.sitemap.as_ref());
            Self::update_option(&mut self.build.citations.enable, build_args.citations.as_ref());
            if let Some(base_url) = &build_args.base_url {
                self.base.url = Some(base_url.clone());
            }
        }

        if let Commands::Serve {
            interface,
            port,
            watch,
            ..
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
            self.base.url = Some(format!(
                "http://{}:{}",
                self.serve.interface, self.serve.port
            ));
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, cli: &'static Cli) {
        // Apply CLI overrides first
        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.assets, cli.assets.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        // Normalize root to absolute path
        let root = Self::normalize_path(root);
        self.set_root(&root);

        // Normalize config path
        self.config_path = Self::normalize_path(&root.join(&cli.config));

        // Normalize all directory paths
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.assets = Self::normalize_path(&root.join(&self.build.assets));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        // Feed paths live inside the output directory
        self.build.rss.path = self.build.output.join(&self.build.rss.path);
        self.build.sitemap.path = self.build.output.join(&self.build.sitemap.path);
    }

    /// Normalize a path to an absolute, lexically cleaned form.
    ///
    /// Does not touch the filesystem, so paths that do not exist yet
    /// (like the output directory) normalize fine.
    fn normalize_path(path: &Path) -> PathBuf {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };

        let mut normalized = PathBuf::new();
        for component in absolute.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other),
            }
        }
        normalized
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "Test"
            description = "Test blog"
        "#,
        )
        .unwrap();

        assert_eq!(config.base.title, "Test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = ""
            description = "Test blog"
        "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rss_requires_url() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "Test"
            description = "Test blog"

            [build.rss]
            enable = true
        "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("base.url"));
    }

    #[test]
    fn test_zero_citation_timeout_rejected() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "Test"
            description = "Test blog"

            [build.citations]
            timeout = 0
        "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extra_section() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "Test"
            description = "Test blog"

            [extra]
            analytics_id = "UA-12345"
        "#,
        )
        .unwrap();

        assert_eq!(
            config.extra.get("analytics_id").and_then(|v| v.as_str()),
            Some("UA-12345")
        );
    }

    #[test]
    fn test_normalize_path_removes_dot_segments() {
        let normalized = SiteConfig::normalize_path(Path::new("/a/b/./../c"));
        assert_eq!(normalized, PathBuf::from("/a/c"));
    }
}
