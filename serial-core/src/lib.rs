//! Platform-agnostic serial byte streams and timed text parsing.
//!
//! This crate provides the parts of a microcontroller serial port that do
//! not depend on a particular chip. It can be used both in embedded `no_std`
//! firmware and on host for testing.
//!
//! # Overview
//!
//! - [`source`]: the [`ByteSource`] capability (`available` + `read`)
//! - [`ring`]: the receive ring ([`RingBuffer`], [`SharedRing`]) filled from
//!   interrupt context
//! - [`peripheral`]: the chip-side collaborator trait ([`UartPeripheral`])
//! - [`serial`]: a UART-backed byte source ([`Serial`])
//! - [`stream`]: search and parsing over any byte source ([`TimedStream`])
//! - [`clock`]: the monotonic time collaborator ([`Clock`])
//! - [`config`]: defaults and [`SerialConfig`]
//!
//! # Example
//!
//! ```
//! use embedded_hal::delay::DelayNs;
//! use serial_core::{ByteSource, Clock, TimedStream};
//!
//! /// A clock for data that is already complete: time never needs to pass.
//! struct Frozen;
//!
//! impl DelayNs for Frozen {
//!     fn delay_ns(&mut self, _ns: u32) {}
//! }
//!
//! impl Clock for Frozen {
//!     fn now_ms(&self) -> u64 {
//!         0
//!     }
//! }
//!
//! let input: &[u8] = b"+TEMP: 21.5C\r\n";
//! let mut stream = TimedStream::with_timeout(input, Frozen, 0);
//!
//! assert!(stream.find(b"TEMP:"));
//! let celsius = stream.parse_float();
//! assert!((celsius - 21.5).abs() < 1e-5);
//! assert_eq!(stream.read(), Some(b'C'));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`embedded-io`**: Implement `embedded_io::Write` for [`Serial`]
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the logging macros are visible to the other modules.
mod fmt;

pub mod clock;
pub mod config;
pub mod peripheral;
pub mod ring;
pub mod serial;
pub mod source;
pub mod stream;

// Re-export main types at crate root
pub use clock::Clock;
pub use config::{
    SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS, RX_POLL_WAIT_MS, SERIAL_BUFFER_SIZE,
    TX_MAX_WAIT_MS,
};
pub use peripheral::{TransmitError, UartPeripheral};
pub use ring::{RingBuffer, SharedRing};
pub use serial::Serial;
pub use source::ByteSource;
pub use stream::TimedStream;
