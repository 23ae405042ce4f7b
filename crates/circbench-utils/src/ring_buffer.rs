//! Bounded output capture
//!
//! Solver logs can be arbitrarily long while the solution block is printed at
//! the very end, so the buffer keeps the *tail* of the stream.

use std::collections::VecDeque;
use std::fmt;

/// A byte buffer that keeps at most `max_bytes`, dropping the oldest data.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buffer: VecDeque<u8>,
    max_bytes: usize,
    total_bytes_written: usize,
}

impl RingBuffer {
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(max_bytes.min(8192)),
            max_bytes,
            total_bytes_written: 0,
        }
    }

    /// Append data, evicting from the front once `max_bytes` is reached.
    pub fn write(&mut self, data: &[u8]) {
        self.total_bytes_written += data.len();

        if self.max_bytes == 0 {
            return;
        }

        // Only the last `max_bytes` of a large chunk can survive.
        let data = if data.len() > self.max_bytes {
            &data[data.len() - self.max_bytes..]
        } else {
            data
        };

        let overflow = (self.buffer.len() + data.len()).saturating_sub(self.max_bytes);
        self.buffer.drain(..overflow);
        self.buffer.extend(data);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total bytes ever written, including evicted ones.
    #[must_use]
    pub const fn total_bytes_written(&self) -> usize {
        self.total_bytes_written
    }

    #[must_use]
    pub const fn was_truncated(&self) -> bool {
        self.total_bytes_written > self.max_bytes
    }

    /// Copy of the retained bytes, oldest first.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.iter().copied().collect()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into()
    }
}

impl fmt::Display for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_bytes()))
    }
}
