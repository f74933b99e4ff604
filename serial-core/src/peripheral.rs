//! UART peripheral collaborator trait and error types.

/// Error type for transmit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitError {
    /// The hardware did not accept every byte within the maximum wait.
    Timeout {
        /// Bytes accepted before the wait ran out.
        written: usize,
    },
    /// The peripheral reported a fault (framing, break, bus error).
    Hardware,
}

impl core::fmt::Display for TransmitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransmitError::Timeout { written } => {
                write!(f, "transmit timed out after {written} bytes")
            }
            TransmitError::Hardware => f.write_str("UART hardware error"),
        }
    }
}

#[cfg(feature = "embedded-io")]
impl embedded_io::Error for TransmitError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            TransmitError::Timeout { .. } => embedded_io::ErrorKind::TimedOut,
            TransmitError::Hardware => embedded_io::ErrorKind::Other,
        }
    }
}

/// Hardware abstraction for one UART peripheral.
///
/// This is the boundary to the chip-specific HAL. Continuous reception
/// delivers bytes into a [`SharedRing`](crate::SharedRing) that the
/// implementation was wired to when it was built; the arm/disarm calls here
/// only start and stop that flow.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait UartPeripheral {
    /// Configure and enable the UART at `baud_rate`.
    fn init(&mut self, baud_rate: u32);

    /// Receive a single byte, waiting at most `max_wait_ms`.
    fn receive_byte(&mut self, max_wait_ms: u32) -> Option<u8>;

    /// Start background reception into the attached ring.
    fn start_continuous_receive(&mut self);

    /// Stop background reception.
    fn stop_continuous_receive(&mut self);

    /// Send `bytes`, blocking until the hardware has accepted all of them or
    /// `max_wait_ms` elapses.
    fn transmit(&mut self, bytes: &[u8], max_wait_ms: u32) -> Result<(), TransmitError>;

    /// Release the hardware. Called once when the owning port is dropped.
    fn deinit(&mut self) {}
}
