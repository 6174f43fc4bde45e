//! Reassembly of messages from the raw serial byte stream.
//!
//! The sensor controller terminates every message with three `0xFF` bytes.
//! Everything else that is printable ASCII is message content; other bytes
//! are line noise and get dropped. See [`FrameAssembler`].

use core::fmt;
use core::ops::Deref;

use log::{info, warn};

use crate::buffer::{is_printable, FrameBuffer, FrameStr, Overflow};

/// The delimiter byte.
pub const SENTINEL: u8 = 0xFF;
/// Number of consecutive [`SENTINEL`] bytes that end a frame.
pub const SENTINEL_RUN: u8 = 3;

/// A complete, non-empty message. Only contains printable ASCII.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame(FrameStr);

impl Frame {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Frame {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frame").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Frame {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Frame {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Something noteworthy happened while consuming a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// A delimiter run completed a non-empty message.
    Message(Frame),
    /// The pending message grew past the cap and was thrown away.
    Overflow(Overflow),
}

/// Running counters, for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub frames: u64,
    pub overflows: u64,
    /// Non-printable, non-sentinel bytes that were skipped.
    pub dropped: u64,
}

/// Byte-at-a-time frame reassembly.
///
/// ```
/// use telemetry_bridge::frame::FrameAssembler;
///
/// let mut assembler = FrameAssembler::new();
/// let frames: Vec<_> = assembler.feed(b"co2V.val=400\xff\xff\xff").collect();
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0], "co2V.val=400");
/// ```
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: FrameBuffer,
    sentinel_run: u8,
    stats: Stats,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one byte from the serial line.
    pub fn consume(&mut self, byte: u8) -> Option<FrameEvent> {
        if byte == SENTINEL {
            self.sentinel_run += 1;
            if self.sentinel_run < SENTINEL_RUN {
                return None;
            }
            // Counter restarts whether or not anything was pending, so a
            // fourth or fifth sentinel can't complete another frame.
            self.sentinel_run = 0;
            let data = self.buffer.take()?;
            self.stats.frames += 1;
            info!("Complete message received: '{}'", data);
            return Some(FrameEvent::Message(Frame(data)));
        }

        self.sentinel_run = 0;
        if !is_printable(byte) {
            self.stats.dropped += 1;
            return None;
        }
        match self.buffer.push(byte) {
            Ok(()) => None,
            Err(overflow) => {
                self.stats.overflows += 1;
                warn!(
                    "Buffer overflow, clearing {} characters",
                    overflow.discarded
                );
                Some(FrameEvent::Overflow(overflow))
            }
        }
    }

    /// Iterate over the frames completed by `bytes`.
    ///
    /// Bytes are consumed lazily as the iterator advances, and the state
    /// carries over to the next call, so a frame may span several chunks.
    pub fn feed<'a, 'b>(&'a mut self, bytes: &'b [u8]) -> Frames<'a, 'b> {
        Frames {
            assembler: self,
            bytes,
        }
    }

    /// The characters collected since the last frame boundary.
    pub fn pending(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Drop any pending content. Counters are kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.sentinel_run = 0;
    }
}

/// Iterator returned by [`FrameAssembler::feed`].
#[derive(Debug)]
pub struct Frames<'a, 'b> {
    assembler: &'a mut FrameAssembler,
    bytes: &'b [u8],
}

impl Frames<'_, '_> {
    /// Bytes not yet handed to the assembler.
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl Iterator for Frames<'_, '_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        while let Some((&byte, rest)) = self.bytes.split_first() {
            self.bytes = rest;
            if let Some(FrameEvent::Message(frame)) = self.assembler.consume(byte) {
                return Some(frame);
            }
        }
        None
    }
}
