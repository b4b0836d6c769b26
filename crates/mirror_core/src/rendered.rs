use chrono::{DateTime, Duration, Utc};

/// One rendered snapshot of the mirrored document. Never mutated after
/// construction; the cache swaps whole snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub markup: String,
    pub rendered_at: DateTime<Utc>,
}

impl RenderedContent {
    pub fn new(markup: impl Into<String>, rendered_at: DateTime<Utc>) -> Self {
        Self {
            markup: markup.into(),
            rendered_at,
        }
    }

    /// The snapshot served before the first successful sync: no markup,
    /// timestamp at the Unix epoch.
    pub fn empty() -> Self {
        Self::new(String::new(), DateTime::<Utc>::default())
    }

    pub fn is_initial(&self) -> bool {
        self.markup.is_empty() && self.rendered_at == DateTime::<Utc>::default()
    }

    /// Timestamp for the snapshot that replaces `self`.
    ///
    /// Uses `now` unless the clock has not moved past the current snapshot,
    /// in which case it steps one microsecond forward.
    pub fn successor_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if now > self.rendered_at {
            now
        } else {
            self.rendered_at + Duration::microseconds(1)
        }
    }
}

impl Default for RenderedContent {
    fn default() -> Self {
        Self::empty()
    }
}
