//! Simulated SPI block and chip-select pin for host tests.
//!
//! Both halves append to one shared event log so tests can check the exact
//! ordering of register accesses against slave-select transitions.

use core::convert::Infallible;
use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::config::Config;
use crate::regs::SpiRegisters;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Configure,
    Enable(bool),
    Poll,
    ClearComplete,
    Read(u8),
    Write(u8),
    CsLow,
    CsHigh,
}

/// When a triggered exchange reports completion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Behavior {
    AlwaysReady,
    Never,
    /// Complete on the poll following the first `n` polls after the write.
    AfterPolls(u32),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub struct SimPeripheral {
    log: Log,
    behavior: Behavior,
    response: u8,
    rx: u8,
    complete: bool,
    enabled: bool,
    in_flight: bool,
    polls_since_write: u32,
    pub configured: Option<Config>,
}

impl SimPeripheral {
    pub fn new(log: &Log, behavior: Behavior, response: u8) -> Self {
        Self {
            log: log.clone(),
            behavior,
            response,
            rx: 0,
            complete: false,
            enabled: true,
            in_flight: false,
            polls_since_write: 0,
            configured: None,
        }
    }

    /// Latch a byte from some earlier, unrelated exchange.
    pub fn with_stale(mut self, byte: u8) -> Self {
        self.rx = byte;
        self.complete = true;
        self
    }

    pub fn set_behavior(&mut self, behavior: Behavior) {
        self.behavior = behavior;
    }

    /// Let an exchange still in flight complete without being polled.
    pub fn finish_late(&mut self) {
        if self.in_flight {
            self.in_flight = false;
            self.rx = self.response;
            self.complete = true;
        }
    }

    pub fn set_response(&mut self, byte: u8) {
        self.response = byte;
    }

    pub fn flag_latched(&self) -> bool {
        self.complete
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn record(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }
}

impl SpiRegisters for SimPeripheral {
    fn configure(&mut self, config: &Config) {
        assert!(!self.enabled, "configured while enabled");
        self.record(Event::Configure);
        self.configured = Some(*config);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.record(Event::Enable(enabled));
        self.enabled = enabled;
    }

    fn transfer_complete(&mut self) -> bool {
        self.record(Event::Poll);
        if self.in_flight && self.enabled {
            let done = match self.behavior {
                Behavior::AlwaysReady => true,
                Behavior::Never => false,
                Behavior::AfterPolls(n) => self.polls_since_write >= n,
            };
            self.polls_since_write += 1;
            if done {
                self.in_flight = false;
                self.rx = self.response;
                self.complete = true;
            }
        }
        self.complete
    }

    fn clear_complete(&mut self) {
        self.record(Event::ClearComplete);
        self.complete = false;
    }

    fn read_data(&mut self) -> u8 {
        self.record(Event::Read(self.rx));
        self.complete = false;
        self.rx
    }

    fn write_data(&mut self, byte: u8) {
        self.record(Event::Write(byte));
        self.in_flight = true;
        self.polls_since_write = 0;
    }
}

pub struct SimPin {
    log: Log,
    high: bool,
}

impl SimPin {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            high: true,
        }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Event::CsLow);
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Event::CsHigh);
        self.high = true;
        Ok(())
    }
}

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(log: &Log, event: Event) -> usize {
    log.borrow().iter().filter(|e| **e == event).count()
}
