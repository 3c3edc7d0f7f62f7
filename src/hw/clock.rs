// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Time base.
//!
//! SysTick fires every millisecond and bumps a wrapping counter read by [`now_ms`]. TIM2 runs
//! free at 1 MHz for [`now_us`], which the ultrasonic ranger and the short blocking delays use.

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::{syst::SystClkSource, SYST};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use stm32f7xx_hal::{pac, rcc::Clocks};

static MILLIS: AtomicU32 = AtomicU32::new(0);

/// Milliseconds since boot, wrapping.
#[inline]
pub fn now_ms() -> u32 {
    MILLIS.load(Ordering::Relaxed)
}

/// Microseconds from TIM2, wrapping.
#[inline]
pub fn now_us() -> u32 {
    let tim2 = unsafe { &*pac::TIM2::ptr() };
    tim2.cnt.read().bits()
}

/// Called from the SysTick exception handler.
#[inline]
pub fn on_systick() {
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

/// Start both time bases.
pub fn init(mut syst: SYST, tim2: pac::TIM2, clocks: &Clocks) -> SYST {
    let sysclk = clocks.sysclk().raw();
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(sysclk / 1_000 - 1);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();

    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.apb1enr.modify(|_, w| w.tim2en().set_bit());
    // Timer clock is 2x PCLK1 when the APB1 prescaler is not 1.
    let timclk = clocks.timclk1().raw();
    tim2.psc.write(|w| w.psc().bits((timclk / 1_000_000 - 1) as u16));
    tim2.arr.write(|w| w.bits(u32::MAX));
    tim2.egr.write(|w| w.ug().set_bit());
    tim2.cr1.modify(|_, w| w.cen().set_bit());
    core::mem::forget(tim2);
    syst
}

/// Busy-wait delay on the TIM2 microsecond counter. Cheap to copy into every driver.
#[derive(Copy, Clone, Default)]
pub struct TimerDelay;

impl DelayUs<u32> for TimerDelay {
    fn delay_us(&mut self, us: u32) {
        let start = now_us();
        while now_us().wrapping_sub(start) < us {}
    }
}

impl DelayMs<u32> for TimerDelay {
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000);
        }
    }
}
