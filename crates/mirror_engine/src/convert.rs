use std::fmt::Write as _;

use mirror_core::{Block, InlineRun, Paragraph, StructuredDocument};
use mirror_logging::mirror_warn;

use crate::asset::AssetSink;

pub trait Converter: Send + Sync {
    fn to_markup(&self, doc: &StructuredDocument) -> String;
}

/// Flattens a structured document into lightweight markup.
///
/// Never fails. Images that cannot be resolved or stored are left out and
/// the rest of the document still converts.
#[derive(Debug, Clone)]
pub struct MarkupConverter<A> {
    assets: A,
}

impl<A: AssetSink> MarkupConverter<A> {
    pub fn new(assets: A) -> Self {
        Self { assets }
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    fn write_paragraph(&self, doc: &StructuredDocument, paragraph: &Paragraph, out: &mut String) {
        out.push_str(paragraph.style.markup_prefix());
        for run in &paragraph.runs {
            match run {
                InlineRun::Text { text, link_url } => write_text(text, link_url.as_deref(), out),
                InlineRun::Image { object_id } => self.write_image(doc, object_id, out),
            }
        }
        out.push('\n');
    }

    fn write_image(&self, doc: &StructuredDocument, object_id: &str, out: &mut String) {
        let Some(uri) = doc.resolve_image(object_id) else {
            return;
        };

        if uri.starts_with("data:image/") {
            match self.assets.materialize(uri) {
                Ok(path) => write_image_ref(&path, out),
                Err(err) => {
                    mirror_warn!("Skipping inline image {}: {}", object_id, err);
                }
            }
            return;
        }
        write_image_ref(uri, out);
    }
}

impl<A: AssetSink> Converter for MarkupConverter<A> {
    fn to_markup(&self, doc: &StructuredDocument) -> String {
        let mut out = String::new();
        for block in &doc.blocks {
            match block {
                Block::Paragraph(paragraph) => self.write_paragraph(doc, paragraph, &mut out),
            }
        }
        out
    }
}

// Unlinked runs are emitted verbatim: runs are concatenated without
// separators, so their own whitespace is the only spacing there is.
fn write_text(text: &str, link_url: Option<&str>, out: &mut String) {
    match link_url {
        Some(url) => {
            let _ = write!(out, "[{}]({})", text.trim(), url);
        }
        None => out.push_str(text),
    }
}

fn write_image_ref(target: &str, out: &mut String) {
    let _ = write!(out, "\n![image]({target})\n");
}
