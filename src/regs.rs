//! Register-level capabilities the transfer engine needs from an SPI block.
//!
//! Implemented by the memory-mapped backend in [`crate::stm32_spi`] and by
//! the simulated peripheral used in tests. None of these calls can fail.

use crate::config::Config;

pub trait SpiRegisters {
    /// Write clock polarity/phase, master mode and clock divisor.
    ///
    /// Only called while the peripheral is disabled.
    fn configure(&mut self, config: &Config);

    /// Set or clear the peripheral-enable bit.
    fn set_enabled(&mut self, enabled: bool);

    /// Whether the last triggered exchange has finished clocking.
    fn transfer_complete(&mut self) -> bool;

    /// Clear a latched completion flag without touching the data register.
    fn clear_complete(&mut self);

    /// Read the receive side of the data register.
    fn read_data(&mut self) -> u8;

    /// Write the transmit side of the data register, starting an exchange.
    fn write_data(&mut self, byte: u8);
}

impl<T: SpiRegisters + ?Sized> SpiRegisters for &mut T {
    fn configure(&mut self, config: &Config) {
        T::configure(self, config)
    }

    fn set_enabled(&mut self, enabled: bool) {
        T::set_enabled(self, enabled)
    }

    fn transfer_complete(&mut self) -> bool {
        T::transfer_complete(self)
    }

    fn clear_complete(&mut self) {
        T::clear_complete(self)
    }

    fn read_data(&mut self) -> u8 {
        T::read_data(self)
    }

    fn write_data(&mut self, byte: u8) {
        T::write_data(self, byte)
    }
}
