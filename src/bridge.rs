//! The serial side of the bridge: bytes in, snapshot updates out.
//!
//! [`Bridge`] owns the frame assembler and a handle to the shared snapshot.
//! Each pass of the control loop drains whatever the serial source has
//! buffered, decodes every completed frame, and then runs the periodic
//! diagnostic tick. Nothing in here ever waits for more bytes than are
//! already available, except [`Bridge::run`] when the line is idle.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use snafu::{ResultExt, Snafu};

use crate::clock::Clock;
use crate::decoder::{decode, DecodeOutcome};
use crate::frame::{Frame, FrameAssembler, FrameEvent, Stats};
use crate::snapshot::SharedSnapshot;
use crate::types::Millis;

/// Default period of the diagnostic tick.
pub const DIAGNOSTIC_INTERVAL: Millis = 5000;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Reading from the serial source failed.
    #[snafu(display("Serial I/O failed: {}", source))]
    Serial { source: io::Error },
}

/// A serial line, as far as the bridge is concerned.
pub trait ByteSource {
    /// Number of bytes that can be read right now without waiting.
    fn available(&mut self) -> io::Result<usize>;

    /// Read a single byte. May wait up to the source's own timeout;
    /// returns `Ok(None)` if nothing arrived.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

/// [`ByteSource`] over a `serialport` handle.
pub struct SerialSource(Box<dyn serialport::SerialPort>);

impl SerialSource {
    pub fn new(port: Box<dyn serialport::SerialPort>) -> Self {
        Self(port)
    }
}

impl ByteSource for SerialSource {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.0.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0; 1];
        match self.0.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// What a drain pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Ingested {
    pub bytes: usize,
    pub applied: usize,
    pub rejected: usize,
    pub unrecognized: usize,
    pub overflows: usize,
}

impl Ingested {
    pub fn frames(&self) -> usize {
        self.applied + self.rejected + self.unrecognized
    }
}

/// One diagnostic tick report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Bytes waiting in the serial source.
    pub available: usize,
    /// Whole seconds since the last successful update.
    pub seconds_since_update: Millis,
}

/// Fires at most once per `interval`.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics {
    interval: Millis,
    last_tick: Millis,
}

impl Diagnostics {
    pub const fn new(interval: Millis) -> Self {
        Self {
            interval,
            last_tick: 0,
        }
    }

    /// True if strictly more than `interval` has passed since the previous
    /// tick; the tick time is then moved to `now`.
    pub fn due(&mut self, now: Millis) -> bool {
        if now.saturating_sub(self.last_tick) > self.interval {
            self.last_tick = now;
            true
        } else {
            false
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DIAGNOSTIC_INTERVAL)
    }
}

pub struct Bridge<C> {
    assembler: FrameAssembler,
    snapshot: SharedSnapshot,
    clock: C,
    diagnostics: Diagnostics,
}

impl<C: Clock> Bridge<C> {
    pub fn new(snapshot: SharedSnapshot, clock: C) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            snapshot,
            clock,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_diagnostic_interval(mut self, interval: Millis) -> Self {
        self.diagnostics = Diagnostics::new(interval);
        self
    }

    pub fn snapshot(&self) -> &SharedSnapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> Stats {
        self.assembler.stats()
    }

    /// Feed a chunk of bytes through the pipeline.
    pub fn ingest(&mut self, bytes: &[u8]) -> Ingested {
        let mut ingested = Ingested::default();
        for &byte in bytes {
            self.ingest_byte(byte, &mut ingested);
        }
        ingested
    }

    /// Read and process every byte the source has available right now.
    pub fn drain<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Ingested, Error> {
        let mut ingested = Ingested::default();
        let available = source.available().context(SerialSnafu)?;
        for _ in 0..available {
            match source.read_byte().context(SerialSnafu)? {
                Some(byte) => self.ingest_byte(byte, &mut ingested),
                None => break,
            }
        }
        Ok(ingested)
    }

    /// Log the line status if the diagnostic interval has elapsed.
    pub fn tick<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Option<Status>, Error> {
        let now = self.clock.now();
        if !self.diagnostics.due(now) {
            return Ok(None);
        }
        let status = Status {
            available: source.available().context(SerialSnafu)?,
            seconds_since_update: self.snapshot.read().age(now) / 1000,
        };
        info!(
            "Serial available: {} bytes, Last update: {} seconds ago",
            status.available, status.seconds_since_update
        );
        Ok(Some(status))
    }

    /// One pass of the control loop: drain, then tick.
    pub fn poll<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Ingested, Error> {
        let ingested = self.drain(source)?;
        self.tick(source)?;
        Ok(ingested)
    }

    /// Poll until `shutdown` is set. When the line is idle, blocks for at
    /// most the source's read timeout waiting for the next byte.
    pub fn run<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        shutdown: &AtomicBool,
    ) -> Result<(), Error> {
        while !shutdown.load(Ordering::Relaxed) {
            if self.poll(source)?.bytes > 0 {
                continue;
            }
            if let Some(byte) = source.read_byte().context(SerialSnafu)? {
                self.ingest(&[byte]);
            }
        }
        debug!("Serial loop stopped, {:?}", self.stats());
        Ok(())
    }

    fn ingest_byte(&mut self, byte: u8, ingested: &mut Ingested) {
        ingested.bytes += 1;
        match self.assembler.consume(byte) {
            Some(FrameEvent::Message(frame)) => self.apply(&frame, ingested),
            Some(FrameEvent::Overflow(_)) => ingested.overflows += 1,
            None => {}
        }
    }

    fn apply(&mut self, frame: &Frame, ingested: &mut Ingested) {
        let now = self.clock.now();
        let outcome = self.snapshot.update(|s| decode(frame, s, now));
        match outcome {
            DecodeOutcome::Applied { .. } => ingested.applied += 1,
            DecodeOutcome::Rejected { .. } => ingested.rejected += 1,
            DecodeOutcome::Unrecognized(_) => ingested.unrecognized += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::Metric;
    use std::collections::VecDeque;

    struct Line {
        rx: VecDeque<u8>,
    }

    impl ByteSource for Line {
        fn available(&mut self) -> io::Result<usize> {
            Ok(self.rx.len())
        }

        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Ok(self.rx.pop_front())
        }
    }

    #[test]
    fn test_diagnostics_due() {
        let mut d = Diagnostics::new(5000);
        assert!(!d.due(0));
        assert!(!d.due(5000));
        assert!(d.due(5001));
        assert!(!d.due(10_001));
        assert!(d.due(10_002));
    }

    #[test]
    fn test_ingest_counts() {
        let clock = ManualClock::new(100);
        let mut bridge = Bridge::new(SharedSnapshot::new(), &clock);
        let ingested = bridge.ingest(b"co2V.val=400\xff\xff\xffco2V.val=0\xff\xff\xffnope\xff\xff\xff");
        assert_eq!(ingested.applied, 1);
        assert_eq!(ingested.rejected, 1);
        assert_eq!(ingested.unrecognized, 1);
        assert_eq!(ingested.frames(), 3);
        let s = bridge.snapshot().read();
        assert_eq!(s.get(Metric::Co2), 400);
        assert_eq!(s.last_update(), 100);
    }

    #[test]
    fn test_drain_and_tick() {
        let clock = ManualClock::new(0);
        let mut bridge = Bridge::new(SharedSnapshot::new(), &clock);
        let mut line = Line {
            rx: b"humV.val=40\xff\xff\xff".iter().copied().collect(),
        };
        clock.set(2000);
        let ingested = bridge.poll(&mut line).unwrap();
        assert_eq!(ingested.bytes, 14);
        assert_eq!(ingested.applied, 1);

        clock.set(9000);
        line.rx.extend(b"tvoc");
        assert_eq!(
            bridge.tick(&mut line).unwrap(),
            Some(Status {
                available: 4,
                seconds_since_update: 7
            })
        );
        assert_eq!(bridge.tick(&mut line).unwrap(), None);
    }
}
