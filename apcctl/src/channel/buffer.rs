//! Prompt buffer with bounded tail search.
//!
//! Only the last N bytes of accumulated output are searched for prompt
//! patterns, so detection stays cheap across full-screen menu redraws.

use regex::bytes::Regex;

/// Buffer accumulating device output and searching it for prompts.
///
/// The transport appends already-scrubbed bytes (telnet negotiation
/// removed); each prompt wait then consumes the buffer through the end of
/// the match, so the next wait only ever sees fresh screens.
#[derive(Debug)]
pub struct PatternBuffer {
    buffer: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append scrubbed data.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Search the tail of the buffer for the pattern.
    ///
    /// Returns the end offset of the first match, relative to the start of
    /// the whole buffer so it can be handed to [`consume_to`].
    ///
    /// [`consume_to`]: PatternBuffer::consume_to
    pub fn find_tail(&self, pattern: &Regex) -> Option<usize> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.find(&self.buffer[start..]).map(|m| start + m.end())
    }

    /// Drain and return everything up to `end` (exclusive); the remainder
    /// stays buffered for the next wait.
    pub fn consume_to(&mut self, end: usize) -> Vec<u8> {
        let rest = self.buffer.split_off(end);
        std::mem::replace(&mut self.buffer, rest)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
