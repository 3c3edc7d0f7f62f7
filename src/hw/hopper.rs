// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Coin hopper: payout relay on PE10 and coin pulse sensor on PE9 (EXTI9, falling edge).
//!
//! The EXTI handler calls [`on_pulse`], which filters bounces with a [`PulseGate`] and counts
//! into an atomic that the dispatcher drains through [`CoinHopper::take_pulses`].

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::interrupt::{self, Mutex};
use embedded_hal::digital::v2::OutputPin;
use stm32f7xx_hal::{
    gpio::{gpioe, Edge, ExtiPin, Input, Output, PullUp, PushPull},
    pac,
};

use crate::control::PulseGate;
use crate::hw::clock;
use crate::io::CoinHopper;

pub type PulsePin = gpioe::PE9<Input<PullUp>>;
pub type RelayPin = gpioe::PE10<Output<PushPull>>;

static PULSES: AtomicU32 = AtomicU32::new(0);
static SENSOR: Mutex<RefCell<Option<(PulsePin, PulseGate)>>> = Mutex::new(RefCell::new(None));

/// Arm the pulse interrupt. The caller unmasks `EXTI9_5`.
pub fn init(mut pin: PulsePin, gate: PulseGate, syscfg: &mut pac::SYSCFG, exti: &mut pac::EXTI, apb2: &mut stm32f7xx_hal::rcc::APB2) {
    pin.make_interrupt_source(syscfg, apb2);
    pin.trigger_on_edge(exti, Edge::Falling);
    pin.enable_interrupt(exti);
    interrupt::free(|cs| SENSOR.borrow(cs).replace(Some((pin, gate))));
}

/// Body of the `EXTI9_5` handler.
pub fn on_pulse() {
    interrupt::free(|cs| {
        if let Some((pin, gate)) = SENSOR.borrow(cs).borrow_mut().as_mut() {
            pin.clear_interrupt_pending_bit();
            if gate.accept(clock::now_ms()) {
                PULSES.fetch_add(1, Ordering::Relaxed);
            }
        }
    });
}

pub struct Hopper {
    relay: RelayPin,
}

impl Hopper {
    pub fn new(mut relay: RelayPin) -> Self {
        let _ = relay.set_low();
        Self { relay }
    }
}

impl CoinHopper for Hopper {
    fn set_relay(&mut self, energized: bool) {
        let _ = if energized {
            self.relay.set_high()
        } else {
            self.relay.set_low()
        };
    }

    fn take_pulses(&mut self) -> u32 {
        PULSES.swap(0, Ordering::Relaxed)
    }
}
