//! Markdown rendering for posts and the CV page.
//!
//! Wraps pulldown-cmark with the extensions the site needs (footnotes,
//! tables, strikethrough) and lowers footnote syntax into the marker shape
//! the numbering pass recognizes.
//!
//! A native reference like `[^fn1]` becomes:
//!
//! ```html
//! <sup class="footnote-ref"><a href="#fn1"></a></sup>
//! ```
//!
//! The anchor text stays empty here: display numbers are assigned later by
//! the numbering pass, in first-appearance order over the rendered region.
//! Inline footnote *definitions* are suppressed entirely - bibliographies
//! are generated from front matter descriptors, not from definition blocks.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

/// Render Markdown to HTML.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, options());
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, lower_events(parser).into_iter());
    out
}

const fn options() -> Options {
    Options::ENABLE_OLD_FOOTNOTES
        .union(Options::ENABLE_TABLES)
        .union(Options::ENABLE_STRIKETHROUGH)
}

/// Lower footnote events into raw marker HTML, dropping definition blocks.
fn lower_events(parser: Parser<'_>) -> Vec<Event<'_>> {
    let mut events = Vec::new();
    let mut definition_depth = 0usize;

    for event in parser {
        match event {
            Event::Start(Tag::FootnoteDefinition(_)) => definition_depth += 1,
            Event::End(TagEnd::FootnoteDefinition) => {
                definition_depth = definition_depth.saturating_sub(1);
            }
            // Definition content never reaches the output
            _ if definition_depth > 0 => {}
            Event::FootnoteReference(name) => {
                events.push(Event::InlineHtml(
                    format!(r##"<sup class="footnote-ref"><a href="#{name}"></a></sup>"##).into(),
                ));
            }
            other => events.push(other),
        }
    }

    events
}
