//! Citation resolution pipeline.
//!
//! Resolves a post's footnote descriptors into formatted bibliography
//! entries. All descriptors are resolved concurrently (fan-out) and the
//! pipeline waits for every outcome before returning (fan-in barrier).
//! One descriptor's failure never fails the batch: a failed resolution
//! becomes an entry with inline error text naming the identifier and its
//! kind.
//!
//! # Architecture
//!
//! ```text
//! resolve_all(descriptors)
//!     │
//!     ├── cache hit? ──► return cached CitationSet (no network refire)
//!     │
//!     └── JoinSet fan-out, one task per descriptor
//!             │
//!             ├── manual html  ──► entry verbatim, no formatter call
//!             ├── identifier   ──► formatter.resolve() ──► extract entry
//!             │                        │
//!             │                        └── error ──► inline placeholder
//!             └── no source    ──► "missing identifier" placeholder
//!             │
//!             ▼
//!      fan-in barrier (await all) ──► CitationSet { entries, error }
//! ```
//!
//! Results are cached by a content hash of the descriptor list and format
//! options, so rebuilding an unchanged post (watch mode) never refires
//! network calls. A task that dies outside the per-item guard (panic,
//! runtime abort) sets the aggregate error slot; the surviving entries are
//! still returned.

use crate::config::SiteConfig;
use crate::content::footnote::{FootnoteDescriptor, IdentifierKind, Source};
use crate::log;
use crate::render::http::HttpFormatter;
use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tokio::{runtime::Runtime, task::JoinSet};

// ============================================================================
// Types
// ============================================================================

/// Citation formatting options (output is always HTML bibliography entries).
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// CSL style template, e.g. "apa".
    pub style: String,
    /// Locale, e.g. "en-US".
    pub locale: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            style: "apa".into(),
            locale: "en-US".into(),
        }
    }
}

/// Resolved bibliography entry for one descriptor.
///
/// `formatted_html` is either the formatted entry or an inline error
/// placeholder; pairing with the input is by `id`.
#[derive(Debug, Clone)]
pub struct CitationEntry {
    pub id: String,
    pub formatted_html: String,
    pub identifier: Option<String>,
}

/// Outcome of one batch resolution.
#[derive(Debug, Clone, Default)]
pub struct CitationSet {
    /// One entry per input descriptor, paired by id.
    pub entries: Vec<CitationEntry>,
    /// Aggregate error from batch orchestration (not per-item failures).
    pub error: Option<String>,
}

/// Errors from the bibliographic formatter.
#[derive(Debug, Error)]
pub enum CitationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{kind} {identifier} returned status {status}")]
    Status {
        kind: IdentifierKind,
        identifier: String,
        status: u16,
    },

    #[error("record parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("record has no `{0}` field")]
    MissingField(&'static str),
}

/// External bibliographic formatter capability.
///
/// Implementations turn an identifier into formatted bibliography markup or
/// fail; the pipeline owns error presentation and wrapper stripping.
#[async_trait]
pub trait Formatter: Send + Sync {
    async fn resolve(
        &self,
        kind: IdentifierKind,
        identifier: &str,
        options: &FormatOptions,
    ) -> Result<String, CitationError>;
}

// ============================================================================
// Resolver
// ============================================================================

type Cache = Mutex<FxHashMap<[u8; 32], Arc<CitationSet>>>;

/// Cache shared by every resolver built from config, so watch-mode rebuilds
/// reuse results across builds.
static BUILD_CACHE: LazyLock<Arc<Cache>> = LazyLock::new(Arc::default);

/// Synchronous facade over the async citation pipeline.
///
/// Owns its runtime so callers (the rayon page compiler) stay synchronous.
pub struct CitationResolver {
    formatter: Arc<dyn Formatter>,
    options: FormatOptions,
    runtime: Runtime,
    cache: Arc<Cache>,
}

impl CitationResolver {
    /// Build the production resolver from site config, backed by the shared
    /// build cache.
    pub fn from_config(config: &SiteConfig) -> anyhow::Result<Self> {
        let citations = &config.build.citations;
        let formatter = HttpFormatter::new(Duration::from_secs(citations.timeout))?;
        let options = FormatOptions {
            style: citations.style.clone(),
            locale: citations.locale.clone(),
        };
        Ok(Self::with_cache(
            Arc::new(formatter),
            options,
            BUILD_CACHE.clone(),
        ))
    }

    /// Build a resolver around any formatter, with a private cache.
    pub fn new(formatter: Arc<dyn Formatter>, options: FormatOptions) -> Self {
        Self::with_cache(formatter, options, Arc::default())
    }

    fn with_cache(formatter: Arc<dyn Formatter>, options: FormatOptions, cache: Arc<Cache>) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("failed to start citation runtime");
        Self {
            formatter,
            options,
            runtime,
            cache,
        }
    }

    /// Resolve all descriptors, returning one entry per input.
    ///
    /// An identical descriptor list resolves at most once per cache
    /// lifetime; repeat invocations return the cached set.
    pub fn resolve_all(&self, descriptors: &[FootnoteDescriptor]) -> Arc<CitationSet> {
        if descriptors.is_empty() {
            return Arc::new(CitationSet::default());
        }

        let key = cache_key(descriptors, &self.options);
        if let Some(hit) = self.cache.lock().get(&key) {
            return Arc::clone(hit);
        }

        let set = self.runtime.block_on(resolve_batch(
            Arc::clone(&self.formatter),
            self.options.clone(),
            descriptors.to_vec(),
        ));

        let set = Arc::new(set);
        self.cache.lock().insert(key, Arc::clone(&set));
        set
    }
}

/// Content hash of the descriptor list and options.
fn cache_key(descriptors: &[FootnoteDescriptor], options: &FormatOptions) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(options.style.as_bytes());
    hasher.update(b"\0");
    hasher.update(options.locale.as_bytes());
    for descriptor in descriptors {
        hasher.update(b"\0");
        hasher.update(descriptor.id.as_bytes());
        hasher.update(b"\0");
        match descriptor.source() {
            Some(Source::Manual(html)) => {
                hasher.update(b"manual:");
                hasher.update(html.as_bytes());
            }
            Some(Source::Identifier(kind, value)) => {
                hasher.update(kind.to_string().as_bytes());
                hasher.update(b":");
                hasher.update(value.as_bytes());
            }
            None => {
                hasher.update(b"none");
            }
        }
    }
    *hasher.finalize().as_bytes()
}

// ============================================================================
// Batch Orchestration
// ============================================================================

/// Fan out one task per descriptor, then gather everything.
async fn resolve_batch(
    formatter: Arc<dyn Formatter>,
    options: FormatOptions,
    descriptors: Vec<FootnoteDescriptor>,
) -> CitationSet {
    let count = descriptors.len();
    let mut tasks = JoinSet::new();

    for (index, descriptor) in descriptors.into_iter().enumerate() {
        let formatter = Arc::clone(&formatter);
        let options = options.clone();
        tasks.spawn(async move {
            (
                index,
                resolve_descriptor(formatter.as_ref(), &options, descriptor).await,
            )
        });
    }

    let mut slots: Vec<Option<CitationEntry>> = vec![None; count];
    let mut error = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, entry)) => slots[index] = Some(entry),
            Err(join_error) => {
                error = Some(format!("citation batch failed: {join_error}"));
            }
        }
    }

    CitationSet {
        entries: slots.into_iter().flatten().collect(),
        error,
    }
}

/// Resolve a single descriptor. Never fails: errors become inline text.
async fn resolve_descriptor(
    formatter: &dyn Formatter,
    options: &FormatOptions,
    descriptor: FootnoteDescriptor,
) -> CitationEntry {
    let id = descriptor.id.clone();

    match descriptor.source() {
        Some(Source::Manual(html)) => CitationEntry {
            id,
            formatted_html: html.to_owned(),
            identifier: None,
        },
        Some(Source::Identifier(kind, value)) => {
            match formatter.resolve(kind, value, options).await {
                Ok(raw) => CitationEntry {
                    id,
                    formatted_html: extract_entry(&raw),
                    identifier: Some(value.to_owned()),
                },
                Err(err) => {
                    log!("cite"; "{kind} {value} failed for {id}: {err}");
                    CitationEntry {
                        id,
                        formatted_html: format!(
                            "<i>Error loading citation for {kind}: {value}</i>"
                        ),
                        identifier: Some(value.to_owned()),
                    }
                }
            }
        }
        None => CitationEntry {
            id,
            formatted_html: "<i>Missing citation identifier</i>".to_owned(),
            identifier: None,
        },
    }
}

// ============================================================================
// Formatter Output Post-Processing
// ============================================================================

static RE_CSL_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="csl-entry"[^>]*>(.*?)</div>"#).unwrap());

static RE_ORDINAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\.\s*").unwrap());

/// Extract the inner bibliographic entry from raw formatter output.
///
/// Strips a `csl-entry` wrapper when present, plus any leading ordinal the
/// formatter injects - display numbers belong to the numbering pass.
fn extract_entry(raw: &str) -> String {
    let inner = RE_CSL_ENTRY
        .captures(raw)
        .and_then(|c| c.get(1))
        .map_or(raw, |m| m.as_str());
    RE_ORDINAL.replace(inner.trim(), "").into_owned()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Formatter stub: counts calls, fails identifiers listed as bad.
    struct MockFormatter {
        calls: AtomicUsize,
        bad: Vec<String>,
    }

    impl MockFormatter {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                bad: Vec::new(),
            }
        }

        fn failing_on(identifier: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                bad: vec![identifier.to_owned()],
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Formatter for MockFormatter {
        async fn resolve(
            &self,
            kind: IdentifierKind,
            identifier: &str,
            _options: &FormatOptions,
        ) -> Result<String, CitationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.bad.iter().any(|b| b == identifier) {
                return Err(CitationError::Status {
                    kind,
                    identifier: identifier.to_owned(),
                    status: 404,
                });
            }
            Ok(format!(
                r#"<div class="csl-entry">1. Formatted {identifier}</div>"#
            ))
        }
    }

    fn resolver_with(formatter: Arc<MockFormatter>) -> CitationResolver {
        CitationResolver::new(formatter, FormatOptions::default())
    }

    // ------------------------------------------------------------------------
    // Batch semantics
    // ------------------------------------------------------------------------

    #[test]
    fn test_one_entry_per_descriptor_despite_failure() {
        let formatter = Arc::new(MockFormatter::failing_on("bad"));
        let resolver = resolver_with(Arc::clone(&formatter));

        let descriptors = vec![
            FootnoteDescriptor::with_doi("fn1", "10.1/x"),
            FootnoteDescriptor::with_doi("fn2", "bad"),
        ];
        let set = resolver.resolve_all(&descriptors);

        assert_eq!(set.entries.len(), 2);
        assert!(set.error.is_none());

        let ok = set.entries.iter().find(|e| e.id == "fn1").unwrap();
        assert_eq!(ok.formatted_html, "Formatted 10.1/x");
        assert_eq!(ok.identifier.as_deref(), Some("10.1/x"));

        let failed = set.entries.iter().find(|e| e.id == "fn2").unwrap();
        assert_eq!(
            failed.formatted_html,
            "<i>Error loading citation for DOI: bad</i>"
        );
    }

    #[test]
    fn test_empty_descriptor_list() {
        let formatter = Arc::new(MockFormatter::new());
        let resolver = resolver_with(Arc::clone(&formatter));

        let set = resolver.resolve_all(&[]);
        assert!(set.entries.is_empty());
        assert!(set.error.is_none());
        assert_eq!(formatter.call_count(), 0);
    }

    #[test]
    fn test_manual_entry_bypasses_formatter() {
        let formatter = Arc::new(MockFormatter::new());
        let resolver = resolver_with(Arc::clone(&formatter));

        let descriptors = vec![FootnoteDescriptor::with_manual(
            "fn1",
            "<i>Personal communication</i>, 2025.",
        )];
        let set = resolver.resolve_all(&descriptors);

        assert_eq!(
            set.entries[0].formatted_html,
            "<i>Personal communication</i>, 2025."
        );
        assert_eq!(set.entries[0].identifier, None);
        assert_eq!(formatter.call_count(), 0);
    }

    #[test]
    fn test_missing_identifier_placeholder() {
        let formatter = Arc::new(MockFormatter::new());
        let resolver = resolver_with(Arc::clone(&formatter));

        let set = resolver.resolve_all(&[FootnoteDescriptor::empty("fn1")]);

        assert_eq!(
            set.entries[0].formatted_html,
            "<i>Missing citation identifier</i>"
        );
        assert_eq!(formatter.call_count(), 0);
    }

    #[test]
    fn test_all_entries_paired_by_id() {
        let formatter = Arc::new(MockFormatter::new());
        let resolver = resolver_with(formatter);

        let descriptors: Vec<_> = (0..12)
            .map(|i| FootnoteDescriptor::with_doi(&format!("fn{i}"), &format!("10.1/{i}")))
            .collect();
        let set = resolver.resolve_all(&descriptors);

        assert_eq!(set.entries.len(), 12);
        for descriptor in &descriptors {
            assert!(set.entries.iter().any(|e| e.id == descriptor.id));
        }
    }

    // ------------------------------------------------------------------------
    // One-shot guard (cache)
    // ------------------------------------------------------------------------

    #[test]
    fn test_same_list_resolves_once() {
        let formatter = Arc::new(MockFormatter::new());
        let resolver = resolver_with(Arc::clone(&formatter));

        let descriptors = vec![FootnoteDescriptor::with_doi("fn1", "10.1/x")];
        let first = resolver.resolve_all(&descriptors);
        let second = resolver.resolve_all(&descriptors);

        assert_eq!(formatter.call_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_changed_list_resolves_again() {
        let formatter = Arc::new(MockFormatter::new());
        let resolver = resolver_with(Arc::clone(&formatter));

        resolver.resolve_all(&[FootnoteDescriptor::with_doi("fn1", "10.1/x")]);
        resolver.resolve_all(&[FootnoteDescriptor::with_doi("fn1", "10.1/y")]);

        assert_eq!(formatter.call_count(), 2);
    }

    // ------------------------------------------------------------------------
    // Formatter output post-processing
    // ------------------------------------------------------------------------

    #[test]
    fn test_extract_entry_strips_wrapper_and_ordinal() {
        let raw = r#"<div class="csl-entry">1. Bennett, N. (2024). Atomically accurate.</div>"#;
        assert_eq!(extract_entry(raw), "Bennett, N. (2024). Atomically accurate.");
    }

    #[test]
    fn test_extract_entry_plain_text_passthrough() {
        assert_eq!(extract_entry("  Rees, A. (2019). mAbs.  "), "Rees, A. (2019). mAbs.");
    }

    #[test]
    fn test_extract_entry_ordinal_only() {
        assert_eq!(extract_entry("12. Watson et al."), "Watson et al.");
    }

    #[test]
    fn test_extract_entry_keeps_inner_markup() {
        let raw = r#"<div class="csl-entry"><i>Nature</i>, 620.</div>"#;
        assert_eq!(extract_entry(raw), "<i>Nature</i>, 620.");
    }
}
