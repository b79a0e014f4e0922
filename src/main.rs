//! Bare-metal smoke test for `SpiMaster` on STM32F4 SPI1.
//!
//! Contains only the entry point, a minimal UART writer (so results show up
//! on a serial console or a Renode analyzer), and the exchange sequence.
//!
//!   cargo build --target thumbv7em-none-eabihf --release --features firmware
//!
//! Expected UART2 output with a responsive slave:
//!
//!   [PASS] send 0x42
//!   [PASS] receive -> 0x..
//!   Done.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use spi_master::{Config, Error, SpiMaster, stm32_spi};

// ---------------------------------------------------------------------------
// Tiny UART2 writer.
// USART2 base on STM32F4 = 0x4000_4400.
//   +0x00  SR   – status register   (TXE is bit 7)
//   +0x04  DR   – data register
//   +0x08  BRR  – baud-rate register
//   +0x0C  CR1  – control register 1
// ---------------------------------------------------------------------------

const USART2_BASE: usize = 0x4000_4400;
const USART2_SR: *const u32 = USART2_BASE as *const u32;
const USART2_DR: *mut u32 = (USART2_BASE + 0x04) as *mut u32;
const USART2_BRR: *mut u32 = (USART2_BASE + 0x08) as *mut u32;
const USART2_CR1: *mut u32 = (USART2_BASE + 0x0C) as *mut u32;

const RCC_APB1ENR: *mut u32 = 0x4002_3840 as *mut u32;
const RCC_APB1ENR_USART2EN: u32 = 1 << 17;

fn uart_init() {
    unsafe {
        core::ptr::write_volatile(
            RCC_APB1ENR,
            core::ptr::read_volatile(RCC_APB1ENR) | RCC_APB1ENR_USART2EN,
        );
        // ~115 200 baud at 16 MHz APB1
        core::ptr::write_volatile(USART2_BRR, 0x8B);
        // TE (bit 3) | UE (bit 13)
        core::ptr::write_volatile(USART2_CR1, (1 << 3) | (1 << 13));
    }
}

fn uart_write_byte(b: u8) {
    unsafe {
        while core::ptr::read_volatile(USART2_SR) & (1 << 7) == 0 {}
        core::ptr::write_volatile(USART2_DR, u32::from(b));
    }
}

fn uart_print(s: &str) {
    for b in s.bytes() {
        uart_write_byte(b);
    }
}

fn uart_println(s: &str) {
    uart_print(s);
    uart_write_byte(b'\r');
    uart_write_byte(b'\n');
}

/// Print a u8 as two hex chars.
fn uart_print_hex(v: u8) {
    const HEX: &[u8] = b"0123456789ABCDEF";
    uart_write_byte(HEX[(v >> 4) as usize]);
    uart_write_byte(HEX[(v & 0x0F) as usize]);
}

fn report_error(what: &str, err: Error) {
    let Error::Timeout { resets } = err;
    uart_print("[FAIL] ");
    uart_print(what);
    uart_print(": timeout after 0x");
    uart_print_hex(resets);
    uart_println(" resets");
}

#[entry]
fn main() -> ! {
    uart_init();
    uart_println("USART2 initialised.");

    // SAFETY: running on the STM32F4 this file targets; these are the only
    // users of RCC, GPIOA and SPI1 in this program.
    unsafe { stm32_spi::init_pins() };
    let regs = unsafe { stm32_spi::Spi1Registers::steal() };
    let cs = unsafe { stm32_spi::ChipSelect::steal() };

    let mut spi = SpiMaster::new(regs, cs, Config::default());
    spi.init();
    uart_println("SPI1 initialised.");

    match spi.send(0x42) {
        Ok(()) => uart_println("[PASS] send 0x42"),
        Err(err) => report_error("send 0x42", err),
    }

    match spi.receive() {
        Ok(v) => {
            uart_print("[PASS] receive -> 0x");
            uart_print_hex(v);
            uart_println("");
        }
        Err(err) => report_error("receive", err),
    }

    uart_println("Done.");

    loop {}
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    uart_println("[PANIC]");
    loop {}
}
