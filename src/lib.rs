//! Polled SPI master for a single slave on a dedicated chip-select line.
//!
//! Each call exchanges one byte: select the slave, write the data register,
//! busy-wait on the completion flag, release the slave. A peripheral that
//! stops reporting completion is reset a bounded number of times before the
//! exchange fails with [`Error::Timeout`], so a call never blocks for longer
//! than [`RetryPolicy::worst_case_polls`] flag reads.
//!
//! ```ignore
//! unsafe { stm32_spi::init_pins() };
//! let regs = unsafe { stm32_spi::Spi1Registers::steal() };
//! let cs = unsafe { stm32_spi::ChipSelect::steal() };
//! let mut spi = SpiMaster::new(regs, cs, Config::default());
//! spi.init();
//! spi.send(0x42)?;
//! let reply = spi.receive()?;
//! ```

#![cfg_attr(not(test), no_std)]

pub mod config;
mod error;
mod master;
pub mod poll;
pub mod regs;
pub mod stm32_spi;

#[cfg(test)]
mod sim;

pub use config::{BaudDivisor, Config, RetryPolicy};
pub use error::Error;
pub use master::SpiMaster;
