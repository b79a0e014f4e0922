//! Single-byte SPI master transfers with stall recovery.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use log::{debug, trace, warn};

use crate::config::{Config, DUMMY_FILL};
use crate::error::Error;
use crate::poll::{PollLoop, PollState};
use crate::regs::SpiRegisters;

/// Bus master for one fixed slave on a dedicated, active-low chip select.
///
/// The master owns the register block and the chip-select pin for its whole
/// lifetime. Every transfer takes `&mut self`, which is the only
/// exclusivity guarantee: the hardware does no arbitration of its own.
pub struct SpiMaster<R, CS> {
    regs: R,
    cs: CS,
    config: Config,
    initialized: bool,
}

impl<R, CS> SpiMaster<R, CS>
where
    R: SpiRegisters,
    CS: OutputPin<Error = Infallible>,
{
    /// Take ownership of the peripheral. Nothing is written until [`init`].
    ///
    /// [`init`]: SpiMaster::init
    pub fn new(regs: R, cs: CS, config: Config) -> Self {
        Self {
            regs,
            cs,
            config,
            initialized: false,
        }
    }

    /// Give the register block and pin back.
    pub fn free(self) -> (R, CS) {
        (self.regs, self.cs)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configure the peripheral as master and enable it.
    ///
    /// Must run once before any transfer.
    pub fn init(&mut self) {
        // Configuration bits are only writable with the block disabled.
        self.regs.set_enabled(false);
        self.regs.configure(&self.config);
        self.select(false);
        self.regs.set_enabled(true);
        self.initialized = true;

        debug!(
            "SPI master up: mode {:?}, divisor {:?}, retry {:?}",
            self.config.mode, self.config.divisor, self.config.retry
        );
    }

    /// Clock out `byte` and drop whatever the slave sent back.
    pub fn send(&mut self, byte: u8) -> Result<(), Error> {
        self.exchange(byte).map(|_| ())
    }

    /// Clock out the dummy fill byte and return what the slave sent.
    pub fn receive(&mut self) -> Result<u8, Error> {
        self.exchange(DUMMY_FILL)
    }

    /// Full-duplex exchange of one byte.
    pub fn transfer(&mut self, byte: u8) -> Result<u8, Error> {
        self.exchange(byte)
    }

    fn exchange(&mut self, outgoing: u8) -> Result<u8, Error> {
        if !self.initialized {
            warn!("SPI exchange on a master that was never initialized");
        }

        // Whatever is latched now belongs to an earlier exchange.
        let _ = self.regs.read_data();

        self.select(true);
        self.regs.write_data(outgoing);
        let outcome = self.wait_complete();
        self.select(false);

        match outcome {
            Ok(()) => {
                // The read also clears the completion flag.
                let incoming = self.regs.read_data();
                trace!("SPI {:#04x} -> {:#04x}", outgoing, incoming);
                Ok(incoming)
            }
            Err(err) => {
                warn!("SPI {:#04x}: {}", outgoing, err);
                Err(err)
            }
        }
    }

    fn wait_complete(&mut self) -> Result<(), Error> {
        let mut poll = PollLoop::new(self.config.retry);
        loop {
            let complete = self.regs.transfer_complete();
            match poll.step(complete) {
                PollState::Polling => {}
                PollState::Escalating => {
                    debug!(
                        "SPI stalled after {} polls, reset {}/{}",
                        poll.polls(),
                        poll.escalations() + 1,
                        self.config.retry.max_escalations
                    );
                    self.reset_peripheral();
                    poll.escalated();
                }
                PollState::Succeeded => return Ok(()),
                PollState::TimedOut => {
                    return Err(Error::Timeout {
                        resets: poll.escalations(),
                    });
                }
            }
        }
    }

    /// Restart the SPI block from a stalled state.
    ///
    /// Two disable/enable cycles: one cycle can leave the shift register out
    /// of step with the lines. Any exchange in flight is abandoned.
    fn reset_peripheral(&mut self) {
        self.regs.set_enabled(false);
        self.regs.set_enabled(true);
        let _ = self.regs.read_data();
        self.regs.clear_complete();
        self.regs.set_enabled(false);
        self.regs.set_enabled(true);
    }

    /// Drive chip select; `true` selects the slave (line low).
    fn select(&mut self, active: bool) {
        let Ok(()) = if active {
            self.cs.set_low()
        } else {
            self.cs.set_high()
        };
    }
}
