use std::fmt;

pub const CONTENT_UPDATED: &str = "contentUpdated";
pub const ERROR_PREFIX: &str = "error:";

/// Signal pushed to live viewers. Carries no content: on `ContentUpdated`
/// a viewer re-reads the cached render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ContentUpdated,
    Error(String),
}

impl Event {
    pub fn error(message: impl Into<String>) -> Self {
        Event::Error(message.into())
    }

    /// Parses the wire form produced by `Display`.
    pub fn parse(wire: &str) -> Option<Self> {
        if wire == CONTENT_UPDATED {
            return Some(Event::ContentUpdated);
        }
        wire.strip_prefix(ERROR_PREFIX)
            .map(|message| Event::Error(message.to_string()))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ContentUpdated => f.write_str(CONTENT_UPDATED),
            Event::Error(message) => write!(f, "{ERROR_PREFIX}{message}"),
        }
    }
}
