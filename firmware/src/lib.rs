//! Ring-buffered UART console for RP2040.
//!
//! This crate binds the platform-agnostic [`serial_core`] port and parser to
//! the RP2040 UART through embassy-rp.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Receives bytes on UART1 through DMA, one transfer per byte
//! 2. Pushes them into a [`SharedRing`](serial_core::SharedRing) from an
//!    interrupt-priority executor, so reception continues while the
//!    foreground busy-waits
//! 3. Parses line commands in the foreground with
//!    [`TimedStream`](serial_core::TimedStream) and answers on the same UART
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | UART1 TX | 8    | Serial transmit |
//! | UART1 RX | 9    | Serial receive |
//!
//! # Modules
//!
//! - [`uart`]: UART peripheral binding ([`RpUart`], [`RxLink`], [`pump_rx`])
//! - [`clock`]: embassy-time backed [`EmbassyClock`]
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//!
//! # Re-exports
//!
//! This crate re-exports the [`serial_core`] items the firmware uses, so
//! consumers only need to depend on this crate.

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features - they install conflicting panic handlers");

// Re-export core types for convenience
pub use serial_core::{
    ByteSource, Clock, Serial, SerialConfig, SharedRing, TimedStream, TransmitError,
    UartPeripheral, SERIAL_BUFFER_SIZE,
};

pub mod clock;
pub mod uart;

pub use clock::EmbassyClock;
pub use uart::{pump_rx, RpUart, RxLink, RxRing};
