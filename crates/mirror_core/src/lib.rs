//! Mirror core: document model, viewer events and the pure sync state machine.
mod document;
mod effect;
mod event;
mod msg;
mod rendered;
mod state;
mod update;

pub use document::{
    Block, EmbeddedObject, ImageProperties, InlineRun, Paragraph, ParagraphStyle,
    StructuredDocument,
};
pub use effect::Effect;
pub use event::{Event, CONTENT_UPDATED, ERROR_PREFIX};
pub use msg::Msg;
pub use rendered::RenderedContent;
pub use state::{SyncPhase, SyncState};
pub use update::update;
