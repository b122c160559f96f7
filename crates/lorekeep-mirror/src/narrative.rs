//! Streaming narrative assembly.

/// Accumulates `NARRATIVE_CHUNK` fragments until a terminal fragment
/// closes the entry.
///
/// The buffer lives beside the [`GameState`](crate::GameState), not inside
/// it. Its only visible effect is the `current_narrative` projection while
/// streaming and the single log entry produced on flush.
#[derive(Debug, Clone, Default)]
pub struct NarrativeBuffer {
    text: String,
    /// Fragments appended since the last flush.
    fragments: u32,
}

impl NarrativeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment in receipt order.
    ///
    /// `index` is the server's sequence number for the fragment, when it
    /// sends one. A mismatch is logged and otherwise ignored: fragments
    /// are never reordered.
    pub fn append(&mut self, index: Option<u32>, content: &str) {
        if let Some(index) = index {
            if index != self.fragments {
                tracing::warn!(
                    received = index,
                    expected = self.fragments,
                    "out of sequence narrative chunk"
                );
            }
        }
        self.fragments += 1;
        self.text.push_str(content);
    }

    /// The text accumulated so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.fragments == 0
    }

    /// Takes the accumulated entry and resets the buffer.
    pub fn flush(&mut self) -> String {
        self.fragments = 0;
        std::mem::take(&mut self.text)
    }

    /// Drops any partial entry without producing a log line.
    pub fn discard(&mut self) {
        if !self.is_empty() {
            tracing::debug!(len = self.text.len(), "discarding partial narrative");
        }
        self.fragments = 0;
        self.text.clear();
    }
}
