#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Error, ErrorKind};
use std::rc::Rc;

use telemetry_bridge::bridge::ByteSource;

/// A simulated serial line. Data is queued in bursts; only the bytes of
/// the current burst are reported as available, the next burst "arrives"
/// once the current one has been read.
pub struct SerialInterface {
    bursts: VecDeque<Vec<u8>>,
    rx: VecDeque<u8>,
    do_read_error: bool,
    reads: usize,
}

pub struct SerialIOPlane(Rc<RefCell<SerialInterface>>);

impl SerialIOPlane {
    pub fn new(serial_if: &Rc<RefCell<SerialInterface>>) -> SerialIOPlane {
        SerialIOPlane(serial_if.clone())
    }
}

impl SerialInterface {
    pub fn new() -> Rc<RefCell<SerialInterface>> {
        Rc::new(RefCell::new(SerialInterface {
            bursts: VecDeque::new(),
            rx: VecDeque::new(),
            do_read_error: false,
            reads: 0,
        }))
    }

    pub fn push_burst(&mut self, data: &[u8]) {
        self.bursts.push_back(data.to_vec());
    }

    pub fn trigger_read_error(&mut self) {
        self.do_read_error = true;
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn is_drained(&self) -> bool {
        self.rx.is_empty() && self.bursts.is_empty()
    }

    fn arrive(&mut self) {
        if self.rx.is_empty() {
            if let Some(burst) = self.bursts.pop_front() {
                self.rx.extend(burst);
            }
        }
    }
}

impl ByteSource for SerialIOPlane {
    fn available(&mut self) -> std::io::Result<usize> {
        let mut inner = self.0.borrow_mut();
        if inner.do_read_error {
            inner.do_read_error = false;
            return Err(Error::new(ErrorKind::BrokenPipe, "serial line unplugged"));
        }
        inner.arrive();
        Ok(inner.rx.len())
    }

    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let mut inner = self.0.borrow_mut();
        inner.arrive();
        inner.reads += 1;
        Ok(inner.rx.pop_front())
    }
}

/// Wrap `payload` in a complete frame.
pub fn frame(payload: &str) -> Vec<u8> {
    let mut data = payload.as_bytes().to_vec();
    data.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
    data
}

/// Small deterministic PRNG (xorshift64*), enough to shake the framer.
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Rng {
        Rng(seed | 1)
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    pub fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Random bytes biased towards sentinels and printable text.
    pub fn noisy_bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len)
            .map(|_| match self.below(10) {
                0..=2 => 0xFF,
                3 => self.next_u64() as u8,
                _ => b' ' + self.below(95) as u8,
            })
            .collect()
    }
}
