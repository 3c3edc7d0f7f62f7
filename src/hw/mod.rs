// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # MCU-Level Wrappers
//!
//! - [`led`] – LEDs and the tri-color status light
//! - `adc` – ADC1 single-channel reads for the analog sensors
//! - `clock` – SysTick millisecond counter, TIM2 microsecond counter, busy-wait delay
//! - `pwm` – TIM3 50 Hz servo channels
//! - `hopper` – coin pulse interrupt and payout relay
//! - `usart` – debug console and `log` sink
//! - `pins` – board pin map
//!
//! Everything except [`led`] touches the PAC and is built only for the MCU target.

pub mod led;

#[cfg(target_os = "none")]
pub mod adc;
#[cfg(target_os = "none")]
pub mod clock;
#[cfg(target_os = "none")]
pub mod hopper;
#[cfg(target_os = "none")]
pub mod pins;
#[cfg(target_os = "none")]
pub mod pwm;
#[cfg(target_os = "none")]
pub mod usart;

pub use led::{ActiveLevel, Led, StatusLight};
