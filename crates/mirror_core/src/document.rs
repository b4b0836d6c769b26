use std::collections::BTreeMap;

/// A remotely authored document, reduced to what the markup converter needs.
///
/// `inline_objects` is the side table that `InlineRun::Image` entries point
/// into. A run whose id is missing from the table is dropped during
/// conversion, never reported as an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredDocument {
    pub blocks: Vec<Block>,
    pub inline_objects: BTreeMap<String, EmbeddedObject>,
}

impl StructuredDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, block: impl Into<Block>) -> Self {
        self.blocks.push(block.into());
        self
    }

    pub fn with_inline_object(mut self, object_id: impl Into<String>, object: EmbeddedObject) -> Self {
        self.inline_objects.insert(object_id.into(), object);
        self
    }

    /// Content URI of an inline image, if the side table can resolve it.
    ///
    /// Returns `None` when the id is unknown, when the entry carries no image
    /// properties, or when the content URI is absent or empty.
    pub fn resolve_image(&self, object_id: &str) -> Option<&str> {
        self.inline_objects
            .get(object_id)?
            .image
            .as_ref()?
            .content_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
}

impl From<Paragraph> for Block {
    fn from(paragraph: Paragraph) -> Self {
        Block::Paragraph(paragraph)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub runs: Vec<InlineRun>,
}

impl Paragraph {
    pub fn new(style: ParagraphStyle) -> Self {
        Self {
            style,
            runs: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.runs.push(InlineRun::Text {
            text: text.into(),
            link_url: None,
        });
        self
    }

    pub fn with_link(mut self, text: impl Into<String>, url: impl Into<String>) -> Self {
        self.runs.push(InlineRun::Text {
            text: text.into(),
            link_url: Some(url.into()),
        });
        self
    }

    pub fn with_image(mut self, object_id: impl Into<String>) -> Self {
        self.runs.push(InlineRun::Image {
            object_id: object_id.into(),
        });
        self
    }
}

/// Paragraph style. A bulleted paragraph is always `BulletItem`, even when
/// the source also names a heading style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphStyle {
    #[default]
    Normal,
    Heading1,
    Heading2,
    Heading3,
    BulletItem,
}

impl ParagraphStyle {
    pub fn markup_prefix(self) -> &'static str {
        match self {
            ParagraphStyle::Normal => "",
            ParagraphStyle::Heading1 => "# ",
            ParagraphStyle::Heading2 => "## ",
            ParagraphStyle::Heading3 => "### ",
            ParagraphStyle::BulletItem => "* ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineRun {
    Text {
        text: String,
        link_url: Option<String>,
    },
    Image {
        object_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbeddedObject {
    pub image: Option<ImageProperties>,
}

impl EmbeddedObject {
    pub fn image(content_uri: impl Into<String>) -> Self {
        Self {
            image: Some(ImageProperties {
                content_uri: Some(content_uri.into()),
            }),
        }
    }

    /// An embedded object that is not an image (drawings, charts).
    pub fn opaque() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageProperties {
    pub content_uri: Option<String>,
}
