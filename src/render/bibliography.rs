//! Bibliography join/render.
//!
//! Joins the numbering map (id → number) with the resolved citation list
//! (id → entry) into the final ordered bibliography:
//!
//! - entries whose id was never referenced in text are dropped
//! - surviving entries sort by assigned number ascending
//! - each renders with its number, formatted text, and a back-link built
//!   from the number to the first in-text marker (`#fnref{n}`)
//!
//! The three terminal states are mutually exclusive and exhaustive:
//! aggregate error, empty list ("No citations found."), or the list.

use super::citations::{CitationEntry, CitationSet};
use super::footnotes::IdToNumberMap;
use crate::utils::html::{escape_attr, escape_text};

/// Render the bibliography section for one post.
pub fn render_bibliography(set: &CitationSet, numbers: &IdToNumberMap) -> String {
    let mut html = String::with_capacity(256);
    html.push_str("<section class=\"footnotes-section\">\n<hr/>\n<h2>Notes</h2>\n");
    html.push_str("<div class=\"citation-list\">\n");

    if let Some(error) = &set.error {
        html.push_str(&format!(
            "<p>Error loading citations: {}</p>\n",
            escape_text(error)
        ));
    } else {
        let cited = join_entries(set, numbers);
        if cited.is_empty() {
            html.push_str("<p>No citations found.</p>\n");
        } else {
            for (number, entry) in cited {
                html.push_str(&render_item(number, entry));
            }
        }
    }

    html.push_str("</div>\n</section>\n");
    html
}

/// Filter to referenced entries and sort by assigned number.
fn join_entries<'a>(
    set: &'a CitationSet,
    numbers: &IdToNumberMap,
) -> Vec<(usize, &'a CitationEntry)> {
    let mut cited: Vec<_> = set
        .entries
        .iter()
        .filter_map(|entry| numbers.get(&entry.id).map(|&n| (n, entry)))
        .collect();
    cited.sort_by_key(|(number, _)| *number);
    cited
}

fn render_item(number: usize, entry: &CitationEntry) -> String {
    format!(
        concat!(
            "<div class=\"citation-item\" id=\"{id}\">",
            "<span class=\"footnote-list-number\">{n}.</span> ",
            "<span class=\"citation-content\">{entry}</span> ",
            "<a href=\"#fnref{n}\" class=\"footnote-back-link\" ",
            "title=\"Jump back to footnote {n} in the text\">\u{21a9}</a>",
            "</div>\n"
        ),
        id = escape_attr(&entry.id),
        n = number,
        entry = entry.formatted_html,
    )
}

// ============================================================================
// Tests
// ============================================================================
