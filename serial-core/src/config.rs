//! Serial defaults and runtime configuration.
//!
//! All timing values are in milliseconds.

/// Baud rate the peripheral is initialised with on construction.
pub const DEFAULT_BAUD_RATE: u32 = 9_600;

/// How long a timed read waits for the next byte before giving up.
pub const DEFAULT_TIMEOUT_MS: u32 = 1_000;

/// Capacity of the receive ring in continuous-receive mode.
pub const SERIAL_BUFFER_SIZE: usize = 256;

/// Hardware wait for a single blocking receive.
pub const RX_POLL_WAIT_MS: u32 = 1;

/// Upper bound on a blocking transmit.
pub const TX_MAX_WAIT_MS: u32 = u32::MAX;

/// Runtime settings for a [`Serial`](crate::Serial) port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate applied on construction.
    pub baud_rate: u32,
    /// Hardware wait for one blocking receive when no ring is attached.
    pub rx_poll_wait_ms: u32,
    /// Maximum time a transmit may block.
    pub tx_max_wait_ms: u32,
}

impl SerialConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            rx_poll_wait_ms: RX_POLL_WAIT_MS,
            tx_max_wait_ms: TX_MAX_WAIT_MS,
        }
    }

    #[must_use]
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub const fn with_rx_poll_wait_ms(mut self, ms: u32) -> Self {
        self.rx_poll_wait_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_tx_max_wait_ms(mut self, ms: u32) -> Self {
        self.tx_max_wait_ms = ms;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new()
    }
}
