// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! 50 Hz servo PWM on TIM3, programmed through the PAC.
//!
//! The counter ticks at 1 MHz with a 20 000-tick period, so a duty value is the pulse width in
//! microseconds. CH1 (PB4, AF2) drives the intake lid and CH2 (PB5, AF2) the drop lid.

use embedded_hal::PwmPin;
use stm32f7xx_hal::{
    gpio::{gpiob, Alternate},
    pac,
    rcc::Clocks,
};

use crate::drivers::servo::PERIOD_US;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Channel {
    C1,
    C2,
}

/// One TIM3 output compare channel.
pub struct Tim3Pwm {
    channel: Channel,
}

/// Start TIM3 in PWM mode 1 on both channels and hand out the channel handles.
pub fn tim3_servo_pair(
    tim3: pac::TIM3,
    _pins: (gpiob::PB4<Alternate<2>>, gpiob::PB5<Alternate<2>>),
    clocks: &Clocks,
) -> (Tim3Pwm, Tim3Pwm) {
    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.apb1enr.modify(|_, w| w.tim3en().set_bit());

    let timclk = clocks.timclk1().raw();
    tim3.psc.write(|w| w.psc().bits((timclk / 1_000_000 - 1) as u16));
    tim3.arr.write(|w| unsafe { w.bits(PERIOD_US - 1) });
    // PWM mode 1 with preload on CH1/CH2
    tim3.ccmr1_output().modify(|_, w| unsafe {
        w.oc1m().bits(0b110).oc1pe().set_bit().oc2m().bits(0b110).oc2pe().set_bit()
    });
    tim3.cr1.modify(|_, w| w.arpe().set_bit());
    tim3.egr.write(|w| w.ug().set_bit());
    tim3.cr1.modify(|_, w| w.cen().set_bit());
    core::mem::forget(tim3);

    (Tim3Pwm { channel: Channel::C1 }, Tim3Pwm { channel: Channel::C2 })
}

impl Tim3Pwm {
    #[inline]
    fn regs() -> &'static pac::tim3::RegisterBlock {
        unsafe { &*pac::TIM3::ptr() }
    }
}

impl PwmPin for Tim3Pwm {
    type Duty = u16;

    fn disable(&mut self) {
        let tim = Self::regs();
        match self.channel {
            Channel::C1 => tim.ccer.modify(|_, w| w.cc1e().clear_bit()),
            Channel::C2 => tim.ccer.modify(|_, w| w.cc2e().clear_bit()),
        }
    }

    fn enable(&mut self) {
        let tim = Self::regs();
        match self.channel {
            Channel::C1 => tim.ccer.modify(|_, w| w.cc1e().set_bit()),
            Channel::C2 => tim.ccer.modify(|_, w| w.cc2e().set_bit()),
        }
    }

    fn get_duty(&self) -> u16 {
        let tim = Self::regs();
        match self.channel {
            Channel::C1 => tim.ccr1.read().bits() as u16,
            Channel::C2 => tim.ccr2.read().bits() as u16,
        }
    }

    fn get_max_duty(&self) -> u16 {
        PERIOD_US as u16
    }

    fn set_duty(&mut self, duty: u16) {
        let tim = Self::regs();
        match self.channel {
            Channel::C1 => tim.ccr1.write(|w| unsafe { w.bits(duty as u32) }),
            Channel::C2 => tim.ccr2.write(|w| unsafe { w.bits(duty as u32) }),
        }
    }
}
