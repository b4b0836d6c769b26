//! HTML rendering for the cached markup.

use mirror_core::RenderedContent;
use pulldown_cmark::{html, Options, Parser};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const CONTENT_SLOT: &str = "{{content}}";
const LAST_UPDATE_SLOT: &str = "{{last_update}}";

pub fn markup_to_html(markup: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let mut out = String::with_capacity(markup.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markup, options));
    out
}

/// `Last updated: June 1, 2024`, or `never` before the first sync.
pub fn last_update_line(content: &RenderedContent) -> String {
    if content.is_initial() {
        return "Last updated: never".to_string();
    }
    format!("Last updated: {}", content.rendered_at.format("%B %-d, %Y"))
}

pub fn render_index(content: &RenderedContent) -> String {
    // Fill the last-update slot first; the document body is user content
    // and may itself contain the slot text.
    INDEX_TEMPLATE
        .replacen(LAST_UPDATE_SLOT, &last_update_line(content), 1)
        .replacen(CONTENT_SLOT, &markup_to_html(&content.markup), 1)
}
