use arrayvec::ArrayString;

/// Maximum number of characters a pending message may hold.
pub const FRAME_CAPACITY: usize = 100;

pub(crate) type FrameStr = ArrayString<FRAME_CAPACITY>;

/// Returned by [`FrameBuffer::push`] when the cap was hit. The buffer has
/// already been cleared when this is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow {
    /// Characters thrown away, including the one that did not fit.
    pub discarded: usize,
}

/// Bounded accumulator for the characters of one message.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: FrameStr,
}

impl FrameBuffer {
    pub fn as_str(&self) -> &str {
        self.data.as_str()
    }

    /// Append one printable ASCII byte.
    pub fn push(&mut self, byte: u8) -> Result<(), Overflow> {
        debug_assert!(is_printable(byte));
        if self.data.try_push(byte as char).is_err() {
            let discarded = self.data.len() + 1;
            self.clear();
            return Err(Overflow { discarded });
        }
        Ok(())
    }

    /// Take the contents, leaving the buffer empty. Returns `None` if there
    /// was nothing to take.
    pub(crate) fn take(&mut self) -> Option<FrameStr> {
        if self.data.is_empty() {
            return None;
        }
        let data = self.data;
        self.clear();
        Some(data)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Printable 7-bit ASCII, space through tilde.
pub const fn is_printable(byte: u8) -> bool {
    matches!(byte, 32..=126)
}
