//! Memory-mapped backend: STM32F4 SPI1 with a GPIO chip select.
//!
//! Register map used:
//!   SPI1 base         = 0x4001_3000
//!     +0x00  CR1      – control 1  (SPE, MSTR, BR, SSM, SSI, CPOL, CPHA)
//!     +0x04  CR2      – control 2  (interrupt/DMA enables, left at zero)
//!     +0x08  SR       – status     (RXNE bit 0, TXE bit 1, OVR bit 6)
//!     +0x0C  DR       – data       (byte-wide access for 8-bit frames)
//!
//!   GPIOA base        = 0x4002_0000
//!     +0x00  MODER    – pin modes
//!     +0x18  BSRR     – bit set/reset  (CS toggle)
//!     +0x20  AFRL     – alternate functions for pins 0..7
//!
//!   RCC base          = 0x4002_3800
//!     +0x30  AHB1ENR  – bit 0  = GPIOA
//!     +0x44  APB2ENR  – bit 12 = SPI1
//!
//! SCK/MISO/MOSI are PA5/PA6/PA7 on AF5; CS is PA4 as a plain output.
//! Completion is RXNE: it sets once the last bit of a frame has been shifted
//! in, and clears when DR is read.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::spi::{Phase, Polarity};

use crate::config::Config;
use crate::regs::SpiRegisters;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const SPI1_BASE: usize = 0x4001_3000;
const SPI1_CR1:  usize = SPI1_BASE + 0x00;
const SPI1_CR2:  usize = SPI1_BASE + 0x04;
const SPI1_SR:   usize = SPI1_BASE + 0x08;
const SPI1_DR:   usize = SPI1_BASE + 0x0C;

const GPIOA_BASE:  usize = 0x4002_0000;
const GPIOA_MODER: usize = GPIOA_BASE + 0x00;
const GPIOA_BSRR:  usize = GPIOA_BASE + 0x18;
const GPIOA_AFRL:  usize = GPIOA_BASE + 0x20;

const RCC_BASE:    usize = 0x4002_3800;
const RCC_AHB1ENR: usize = RCC_BASE + 0x30;
const RCC_APB2ENR: usize = RCC_BASE + 0x44;

/// CS pin index within GPIOA.  PA4 = bit 4.
const CS_PIN:   u32 = 4;
const SCK_PIN:  u32 = 5;
const MISO_PIN: u32 = 6;
const MOSI_PIN: u32 = 7;
const AF_SPI1:  u32 = 5;

const MODER_OUTPUT: u32 = 0b01;
const MODER_AF:     u32 = 0b10;

// CR1 bits
const CR1_CPHA:     u32 = 1 << 0;
const CR1_CPOL:     u32 = 1 << 1;
const CR1_MSTR:     u32 = 1 << 2;
const CR1_BR_SHIFT: u32 = 3;
const CR1_SPE:      u32 = 1 << 6;
const CR1_SSI:      u32 = 1 << 8;   // must be 1 when SSM=1 in master
const CR1_SSM:      u32 = 1 << 9;   // software slave management

// SR bits
const SR_RXNE: u32 = 1 << 0;

// RCC enable bits
const RCC_AHB1ENR_GPIOAEN: u32 = 1 << 0;
const RCC_APB2ENR_SPI1EN:  u32 = 1 << 12;

// ---------------------------------------------------------------------------
// Volatile helpers
// ---------------------------------------------------------------------------

#[inline(always)]
unsafe fn rd(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

#[inline(always)]
unsafe fn wr(addr: usize, val: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, val) }
}

#[inline(always)]
unsafe fn modify(addr: usize, f: impl FnOnce(u32) -> u32) {
    unsafe { wr(addr, f(rd(addr))) }
}

/// Byte-sized volatile write to DR.  A full-word write would still be
/// taken as one 8-bit frame, but byte access keeps the intent obvious.
#[inline(always)]
unsafe fn wr_byte(addr: usize, val: u8) {
    unsafe { core::ptr::write_volatile(addr as *mut u8, val) }
}

/// Byte-sized volatile read from DR (clears RXNE).
#[inline(always)]
unsafe fn rd_byte(addr: usize) -> u8 {
    unsafe { core::ptr::read_volatile(addr as *const u8) }
}

// ---------------------------------------------------------------------------
// Pin setup
// ---------------------------------------------------------------------------

/// Clock GPIOA and SPI1, route PA5..PA7 to SPI1 and make PA4 an output.
///
/// Call once at startup, before [`SpiMaster::init`](crate::SpiMaster::init).
/// CS is driven high before its pin is switched to output so the slave never
/// sees a spurious select.
///
/// # Safety
///
/// Only sound on an STM32F4 with RCC, GPIOA and SPI1 at the addresses above,
/// and only while nothing else reconfigures those blocks.
pub unsafe fn init_pins() {
    unsafe {
        modify(RCC_AHB1ENR, |v| v | RCC_AHB1ENR_GPIOAEN);
        modify(RCC_APB2ENR, |v| v | RCC_APB2ENR_SPI1EN);

        wr(GPIOA_BSRR, 1 << CS_PIN);

        modify(GPIOA_AFRL, |v| {
            let mut v = v;
            for pin in [SCK_PIN, MISO_PIN, MOSI_PIN] {
                v = (v & !(0xF << (pin * 4))) | (AF_SPI1 << (pin * 4));
            }
            v
        });

        modify(GPIOA_MODER, |v| {
            let mut v = v & !(0b11 << (CS_PIN * 2));
            v |= MODER_OUTPUT << (CS_PIN * 2);
            for pin in [SCK_PIN, MISO_PIN, MOSI_PIN] {
                v = (v & !(0b11 << (pin * 2))) | (MODER_AF << (pin * 2));
            }
            v
        });
    }
}

// ---------------------------------------------------------------------------
// SPI1 register block
// ---------------------------------------------------------------------------

/// A zero-sized handle.  All state lives in the hardware registers.
///
/// Only one may exist; construct it once at startup and hand it to
/// [`SpiMaster`](crate::SpiMaster).
pub struct Spi1Registers {
    _private: (),
}

impl Spi1Registers {
    /// # Safety
    ///
    /// Caller must guarantee no other code accesses SPI1 while this handle
    /// (or the master owning it) is alive.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl SpiRegisters for Spi1Registers {
    fn configure(&mut self, config: &Config) {
        let mut cr1 = CR1_MSTR | CR1_SSM | CR1_SSI;
        cr1 |= u32::from(config.divisor.bits()) << CR1_BR_SHIFT;
        if config.mode.polarity == Polarity::IdleHigh {
            cr1 |= CR1_CPOL;
        }
        if config.mode.phase == Phase::CaptureOnSecondTransition {
            cr1 |= CR1_CPHA;
        }
        unsafe {
            // SPE stays clear; enabling is a separate step.
            wr(SPI1_CR1, cr1);
            wr(SPI1_CR2, 0);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        unsafe {
            modify(SPI1_CR1, |v| if enabled { v | CR1_SPE } else { v & !CR1_SPE });
        }
    }

    fn transfer_complete(&mut self) -> bool {
        unsafe { rd(SPI1_SR) & SR_RXNE != 0 }
    }

    /// RXNE itself only clears on a DR read.  Reading SR here finishes the
    /// DR-then-SR sequence that clears a latched overrun.
    fn clear_complete(&mut self) {
        unsafe {
            let _ = rd(SPI1_SR);
        }
    }

    fn read_data(&mut self) -> u8 {
        unsafe { rd_byte(SPI1_DR) }
    }

    fn write_data(&mut self, byte: u8) {
        unsafe { wr_byte(SPI1_DR, byte) }
    }
}

// ---------------------------------------------------------------------------
// Chip select
// ---------------------------------------------------------------------------

/// PA4 driven through GPIOA BSRR.
pub struct ChipSelect {
    _private: (),
}

impl ChipSelect {
    /// # Safety
    ///
    /// Caller must guarantee nothing else drives PA4.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl ErrorType for ChipSelect {
    type Error = Infallible;
}

impl OutputPin for ChipSelect {
    /// BSRR bits [31:16] are reset bits.
    fn set_low(&mut self) -> Result<(), Infallible> {
        unsafe { wr(GPIOA_BSRR, 1 << (16 + CS_PIN)) }
        Ok(())
    }

    /// BSRR bits [15:0] are set bits.
    fn set_high(&mut self) -> Result<(), Infallible> {
        unsafe { wr(GPIOA_BSRR, 1 << CS_PIN) }
        Ok(())
    }
}
