//! In-text footnote numbering pass.
//!
//! Scans a rendered content region for footnote-reference markers and
//! assigns each distinct target a sequential display number on first
//! encounter, writing the number back into the marker text.
//!
//! A marker is an anchor inside a `footnote-ref` wrapper whose `href` is a
//! local fragment:
//!
//! ```html
//! <sup class="footnote-ref"><a href="#fn1"></a></sup>
//! ```
//!
//! Guarantees:
//! - identical targets always receive identical numbers
//! - numbers are dense and start at 1
//! - order is determined solely by first occurrence in the rendered region,
//!   not by descriptor list order
//!
//! The first marker for each target additionally gets `id="fnref{n}"` so
//! bibliography back-links (built from the number) land on the first
//! in-text reference.
//!
//! The pass runs at most once per region: re-running a completed pass
//! returns the cached result instead of re-deriving numbers from text that
//! already had numbers injected, which would corrupt the mapping.

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

/// Footnote id → assigned display number, in first-appearance order.
pub type IdToNumberMap = FxHashMap<String, usize>;

/// A footnote-reference wrapper and everything inside it.
static RE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<sup\b[^>]*\bclass="footnote-ref"[^>]*>.*?</sup>"#).unwrap()
});

/// An anchor within a marker: attributes and visible text.
static RE_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<a\b([^>]*)>(.*?)</a>").unwrap());

/// Local fragment target within anchor attributes.
static RE_HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r##"href="#([^"]+)""##).unwrap());

/// An existing id attribute (replaced on first-occurrence markers).
static RE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\s+id="[^"]*""#).unwrap());

// ============================================================================
// Numbering Pass
// ============================================================================

/// Output of a completed numbering pass.
#[derive(Debug, Clone)]
pub struct NumberedRegion {
    /// The content region with display numbers injected into markers.
    pub html: String,

    /// Mapping from footnote id to assigned number.
    pub numbers: IdToNumberMap,
}

/// One-shot numbering pass over a rendered content region.
///
/// The not-started → completed transition happens before any output is
/// observable, and the single-threaded build of one page means there is no
/// window for a second pass to interleave.
pub struct NumberingPass {
    state: PassState,
}

enum PassState {
    NotStarted,
    Completed(NumberedRegion),
}

impl NumberingPass {
    pub const fn new() -> Self {
        Self {
            state: PassState::NotStarted,
        }
    }

    /// Run the pass, or return the cached result if it already ran.
    pub fn run(&mut self, rendered: &str) -> &NumberedRegion {
        if let PassState::NotStarted = self.state {
            self.state = PassState::Completed(number_markers(rendered));
        }
        match &self.state {
            PassState::Completed(region) => region,
            PassState::NotStarted => unreachable!("pass state set above"),
        }
    }

    #[allow(dead_code)]
    pub const fn has_run(&self) -> bool {
        matches!(self.state, PassState::Completed(_))
    }
}

// ============================================================================
// Marker Scanning
// ============================================================================

/// Single scan over the region in document order.
fn number_markers(rendered: &str) -> NumberedRegion {
    let mut numbers = IdToNumberMap::default();
    let mut counter = 0usize;

    let html = RE_MARKER
        .replace_all(rendered, |marker: &Captures| {
            RE_ANCHOR
                .replace_all(&marker[0], |anchor: &Captures| {
                    let attrs = anchor.get(1).map_or("", |m| m.as_str());

                    // A marker without a resolvable target is skipped silently
                    let Some(target) = RE_HREF
                        .captures(attrs)
                        .and_then(|c| c.get(1))
                        .map(|m| m.as_str())
                    else {
                        return anchor[0].to_string();
                    };

                    let (number, first_seen) = match numbers.get(target) {
                        Some(&n) => (n, false),
                        None => {
                            counter += 1;
                            numbers.insert(target.to_owned(), counter);
                            (counter, true)
                        }
                    };

                    if first_seen {
                        let attrs = RE_ID.replace(attrs, "");
                        format!(
                            r#"<a{} id="fnref{number}">{number}</a>"#,
                            attrs.trim_end()
                        )
                    } else {
                        format!("<a{attrs}>{number}</a>")
                    }
                })
                .into_owned()
        })
        .into_owned();

    NumberedRegion { html, numbers }
}

// ============================================================================
// Tests
// ============================================================================
