use crate::{Event, RenderedContent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the document and convert it; the driver reports back with
    /// `Msg::Rendered` or `Msg::FetchFailed`.
    BeginCycle,
    ReplaceContent(RenderedContent),
    Broadcast(Event),
    Halt,
}
