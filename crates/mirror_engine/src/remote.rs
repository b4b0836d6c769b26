//! Wire shape of the remote document resource and its mapping onto the
//! core document model.
//!
//! Only the fields the converter uses are declared; everything else in the
//! payload is ignored by serde.

use std::collections::BTreeMap;

use mirror_core::{
    Block, EmbeddedObject, ImageProperties, InlineRun, Paragraph, ParagraphStyle,
    StructuredDocument,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteDocument {
    #[serde(default)]
    body: Option<Body>,
    #[serde(default)]
    inline_objects: BTreeMap<String, RemoteInlineObject>,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
struct StructuralElement {
    #[serde(default)]
    paragraph: Option<RemoteParagraph>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteParagraph {
    #[serde(default)]
    elements: Vec<ParagraphElement>,
    #[serde(default)]
    paragraph_style: Option<RemoteParagraphStyle>,
    #[serde(default)]
    bullet: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteParagraphStyle {
    #[serde(default)]
    named_style_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParagraphElement {
    #[serde(default)]
    text_run: Option<TextRun>,
    #[serde(default)]
    inline_object_element: Option<InlineObjectElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextRun {
    #[serde(default)]
    content: String,
    #[serde(default)]
    text_style: Option<TextStyle>,
}

#[derive(Debug, Deserialize)]
struct TextStyle {
    #[serde(default)]
    link: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineObjectElement {
    inline_object_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteInlineObject {
    #[serde(default)]
    inline_object_properties: Option<InlineObjectProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineObjectProperties {
    #[serde(default)]
    embedded_object: Option<RemoteEmbeddedObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteEmbeddedObject {
    #[serde(default)]
    image_properties: Option<RemoteImageProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteImageProperties {
    #[serde(default)]
    content_uri: Option<String>,
}

/// Parses a document resource body.
///
/// Tables, section breaks and other non-paragraph elements are skipped, as
/// are paragraph elements that are neither text nor inline objects.
pub fn parse_document(json: &[u8]) -> Result<StructuredDocument, serde_json::Error> {
    let remote: RemoteDocument = serde_json::from_slice(json)?;
    Ok(remote.into())
}

impl From<RemoteDocument> for StructuredDocument {
    fn from(remote: RemoteDocument) -> Self {
        let blocks = remote
            .body
            .map(|body| body.content)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|element| element.paragraph)
            .map(|paragraph| Block::Paragraph(paragraph.into()))
            .collect();

        let inline_objects = remote
            .inline_objects
            .into_iter()
            .map(|(id, object)| (id, object.into()))
            .collect();

        StructuredDocument {
            blocks,
            inline_objects,
        }
    }
}

impl From<RemoteParagraph> for Paragraph {
    fn from(remote: RemoteParagraph) -> Self {
        let style = paragraph_style(&remote);
        let runs = remote
            .elements
            .into_iter()
            .filter_map(|element| {
                if let Some(run) = element.text_run {
                    // Bookmark and heading links have no url. They become plain
                    // text rather than an empty `[text]()` link.
                    let link_url = run
                        .text_style
                        .and_then(|style| style.link)
                        .and_then(|link| link.url)
                        .filter(|url| !url.is_empty());
                    return Some(InlineRun::Text {
                        text: run.content,
                        link_url,
                    });
                }
                element
                    .inline_object_element
                    .map(|object| InlineRun::Image {
                        object_id: object.inline_object_id,
                    })
            })
            .collect();

        Paragraph { style, runs }
    }
}

fn paragraph_style(remote: &RemoteParagraph) -> ParagraphStyle {
    if remote.bullet.is_some() {
        return ParagraphStyle::BulletItem;
    }
    let named = remote
        .paragraph_style
        .as_ref()
        .and_then(|style| style.named_style_type.as_deref());
    match named {
        Some("HEADING_1") => ParagraphStyle::Heading1,
        Some("HEADING_2") => ParagraphStyle::Heading2,
        Some("HEADING_3") => ParagraphStyle::Heading3,
        _ => ParagraphStyle::Normal,
    }
}

impl From<RemoteInlineObject> for EmbeddedObject {
    fn from(remote: RemoteInlineObject) -> Self {
        let image = remote
            .inline_object_properties
            .and_then(|props| props.embedded_object)
            .and_then(|embedded| embedded.image_properties)
            .map(|props| ImageProperties {
                content_uri: props.content_uri,
            });
        EmbeddedObject { image }
    }
}
