// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! ADC1 with blocking single-channel reads, using direct PAC register access.
//!
//! The capacitive presence sensor sits on PA3 (IN3) and the photoresistor divider on PC0 (IN10).
//! Both pins must be put in analog mode before reading.
//!
//! Example:
//! ```no_run
//! let adc = RefCell::new(Adc1::new(dp.ADC1));
//! let presence = AnalogProbe::new(Adc1::make_reader(&adc, channel::PRESENCE));
//! ```

use core::cell::RefCell;

use stm32f7xx_hal::pac;

pub mod channel {
    /// PA3
    pub const PRESENCE: u8 = 3;
    /// PC0
    pub const LIGHT: u8 = 10;
}

pub struct Adc1 {
    adc: pac::ADC1,
}

impl Adc1 {
    /// Enable the ADC1 clock and configure 12-bit right-aligned software-triggered conversions.
    pub fn new(adc: pac::ADC1) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.adc1en().set_bit());

        let common = unsafe { &*pac::ADC_COMMON::ptr() };
        // PCLK2 / 4
        common.ccr.modify(|_, w| w.adcpre().div4());

        adc.cr2.modify(|_, w| w.adon().clear_bit());
        adc.cr1.modify(|_, w| w.res().bits(0b00));
        adc.cr2.modify(|_, w| {
            w.cont().clear_bit();
            w.align().right();
            w.exten().disabled();
            w
        });
        // 480 cycles on both inputs; the sensor outputs are high impedance.
        adc.smpr2.modify(|_, w| w.smp3().bits(0b111));
        adc.smpr1.modify(|_, w| w.smp10().bits(0b111));
        adc.sqr1.modify(|_, w| w.l().bits(0));
        adc.cr2.modify(|_, w| w.adon().set_bit());

        Self { adc }
    }

    #[inline]
    pub fn free(self) -> pac::ADC1 {
        self.adc
    }

    /// One conversion on `channel`.
    pub fn read(&mut self, channel: u8) -> u16 {
        self.adc
            .sqr3
            .modify(|_, w| unsafe { w.sq1().bits(channel & 0x1F) });
        self.adc.cr2.modify(|_, w| w.swstart().set_bit());
        while self.adc.sr.read().eoc().bit_is_clear() {}
        self.adc.dr.read().data().bits()
    }

    /// Closure reading `channel` through a shared ADC.
    pub fn make_reader<'a>(adc_ref: &'a RefCell<Self>, channel: u8) -> impl FnMut() -> u16 + 'a {
        move || adc_ref.borrow_mut().read(channel)
    }
}
