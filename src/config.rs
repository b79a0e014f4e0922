//! Peripheral and retry configuration.
//!
//! Everything here is applied once by [`SpiMaster::init`](crate::SpiMaster::init)
//! or read per exchange; nothing changes while a transfer is running.

use embedded_hal::spi::{MODE_1, Mode};

/// Polls per window before the peripheral is considered stalled.
pub const WINDOW_MAX: u8 = 0xFF;

/// Peripheral resets attempted before an exchange gives up.
pub const ESCALATION_MAX: u8 = 2;

/// Byte clocked out by [`SpiMaster::receive`](crate::SpiMaster::receive).
pub const DUMMY_FILL: u8 = 0xFF;

/// Serial clock divisor relative to the peripheral bus clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BaudDivisor {
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
    Div256,
}

impl BaudDivisor {
    /// Encoding of the divisor in a 3-bit baud-rate field.
    pub const fn bits(self) -> u8 {
        match self {
            BaudDivisor::Div2 => 0b000,
            BaudDivisor::Div4 => 0b001,
            BaudDivisor::Div8 => 0b010,
            BaudDivisor::Div16 => 0b011,
            BaudDivisor::Div32 => 0b100,
            BaudDivisor::Div64 => 0b101,
            BaudDivisor::Div128 => 0b110,
            BaudDivisor::Div256 => 0b111,
        }
    }
}

/// Bounds of the stall-recovery loop.
///
/// Each reset follows a full `window` of failed polls, and the poll right
/// after the last reset is the final one. The worst case for one exchange is
/// `max_escalations * window + 1` completion-flag polls and exactly
/// `max_escalations` peripheral resets. With no resets allowed it is a single
/// window.
///
/// A `window` of 0 is treated as 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub window: u8,
    pub max_escalations: u8,
}

impl RetryPolicy {
    pub const fn new(window: u8, max_escalations: u8) -> Self {
        // A zero window would time out without ever reading the flag.
        let window = if window == 0 { 1 } else { window };
        Self {
            window,
            max_escalations,
        }
    }

    /// Upper bound on completion-flag reads for one exchange.
    pub const fn worst_case_polls(&self) -> u32 {
        let window = if self.window == 0 { 1 } else { self.window as u32 };
        match self.max_escalations {
            0 => window,
            resets => resets as u32 * window + 1,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(WINDOW_MAX, ESCALATION_MAX)
    }
}

#[non_exhaustive]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
    pub divisor: BaudDivisor,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_divisor(mut self, divisor: BaudDivisor) -> Self {
        self.divisor = divisor;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for Config {
    /// Idle-low clock, data shifted out on the idle-to-active edge, slowest
    /// serial clock, 255-poll windows with two resets.
    fn default() -> Self {
        Self {
            mode: MODE_1,
            divisor: BaudDivisor::Div256,
            retry: RetryPolicy::default(),
        }
    }
}
