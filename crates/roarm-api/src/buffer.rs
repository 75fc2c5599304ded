//! Bounded accumulator for response bodies.
//!
//! The arm's replies are small JSON blobs. Anything that would push the
//! buffer past its limit is dropped whole, and the buffer remembers that
//! it happened so callers can log it.

/// Response body accumulator with a hard byte limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBuffer {
    bytes: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl ResponseBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(limit.min(4096)),
            limit,
            truncated: false,
        }
    }

    /// Append `chunk` if it fits strictly inside the remaining space.
    ///
    /// A chunk that does not fit is discarded in full and marks the
    /// buffer as truncated. Returns whether the chunk was kept.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        let remaining = self.limit.saturating_sub(self.bytes.len());
        if chunk.len() < remaining {
            self.bytes.extend_from_slice(chunk);
            true
        } else {
            if !chunk.is_empty() {
                self.truncated = true;
            }
            false
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// `true` if at least one chunk was dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::ResponseBuffer;

    #[test]
    fn keeps_chunks_that_fit() {
        let mut buf = ResponseBuffer::new(16);
        assert!(buf.push(b"hello "));
        assert!(buf.push(b"world"));
        assert_eq!(buf.text(), "hello world");
        assert!(!buf.is_truncated());
    }

    #[test]
    fn drops_chunk_that_would_fill_the_buffer() {
        // One byte is always held back, matching the device firmware's
        // NUL-terminated receive buffer.
        let mut buf = ResponseBuffer::new(8);
        assert!(buf.push(b"1234"));
        assert!(!buf.push(b"5678"));
        assert_eq!(buf.as_bytes(), b"1234");
        assert!(buf.is_truncated());
    }

    #[test]
    fn later_small_chunk_still_fits_after_a_drop() {
        let mut buf = ResponseBuffer::new(8);
        assert!(!buf.push(b"0123456789"));
        assert!(buf.push(b"ok"));
        assert_eq!(buf.text(), "ok");
        assert!(buf.is_truncated());
    }

    #[test]
    fn empty_chunk_is_not_a_truncation() {
        let mut buf = ResponseBuffer::new(0);
        assert!(!buf.push(b""));
        assert!(!buf.is_truncated());
        assert!(buf.is_empty());
    }
}
