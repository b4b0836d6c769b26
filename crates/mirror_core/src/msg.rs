use crate::RenderedContent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Driver came up; triggers the eager first cycle.
    Started,
    /// Interval timer fired.
    Tick,
    /// The fetch collaborator failed. Payload is its message.
    FetchFailed(String),
    /// Fetch and conversion succeeded.
    Rendered(RenderedContent),
    /// Graceful shutdown was requested.
    StopRequested,
}
