//! Serial-to-JSON telemetry bridge.
//!
//! An air quality sensor controller streams readings such as `co2V.val=400`
//! over a serial line, each terminated by three `0xFF` bytes. This crate
//! reassembles those messages ([`frame`]), decodes and range-checks them
//! ([`decoder`]), keeps the latest value of every metric ([`Snapshot`]) and
//! renders it as a JSON document ([`responder`]).
//!
//! The protocol half is sans-io and works without `std`. With the default
//! `std` feature the crate also provides the serial loop ([`bridge`]), the
//! HTTP routes and the configuration used by the `telemetry_bridge` binary.
//!
//! ```
//! use telemetry_bridge::decoder::decode;
//! use telemetry_bridge::frame::FrameAssembler;
//! use telemetry_bridge::{Metric, Snapshot};
//!
//! let mut assembler = FrameAssembler::new();
//! let mut snapshot = Snapshot::new();
//! for frame in assembler.feed(b"humV.val=45\xff\xff\xfftempV.val=21\xff\xff\xff") {
//!     decode(&frame, &mut snapshot, 0);
//! }
//! assert_eq!(snapshot.get(Metric::Humidity), 45);
//! assert_eq!(snapshot.get(Metric::Temperature), 21);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

mod buffer;
pub mod clock;
pub mod decoder;
pub mod frame;
mod nom_parser;
pub mod snapshot;
pub mod types;

#[cfg(feature = "std")]
pub mod bridge;
#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
pub mod http;
#[cfg(feature = "std")]
pub mod responder;

pub use buffer::{Overflow, FRAME_CAPACITY};
pub use clock::Clock;
pub use decoder::DecodeOutcome;
pub use frame::{Frame, FrameAssembler};
pub use snapshot::Snapshot;
#[cfg(feature = "std")]
pub use snapshot::SharedSnapshot;
pub use types::{Error, Metric, Millis, Value};
