// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Button debouncing and hold timing.
//!
//! The panel is sampled once per loop iteration. A level change is accepted once it has been
//! stable for `debounce_ms`; held buttons produce auto-repeat events and one long-press event.

use embedded_hal::digital::v2::InputPin;
use heapless::Vec;

use crate::config::InputConfig;
use crate::io::{ButtonLevels, ButtonPanel};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonId {
    Up,
    Down,
    Select,
}

const ALL: [ButtonId; 3] = [ButtonId::Up, ButtonId::Down, ButtonId::Select];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonEvent {
    Pressed(ButtonId),
    /// Every `repeat_ms` while held. `held_ms` counts from the press.
    Repeat { id: ButtonId, held_ms: u32 },
    /// Once, when a button has been held `long_press_ms`.
    LongPress(ButtonId),
    Released { id: ButtonId, held_ms: u32, long: bool },
}

/// Enough room for every button to change in the same sample.
pub type Events = Vec<ButtonEvent, 6>;

#[derive(Copy, Clone, Debug, Default)]
struct Key {
    stable: bool,
    raw: bool,
    raw_since: u32,
    pressed_at: u32,
    last_repeat: u32,
    long_fired: bool,
    suppressed: bool,
}

pub struct Buttons {
    cfg: InputConfig,
    keys: [Key; 3],
}

impl Buttons {
    pub fn new(cfg: InputConfig) -> Self {
        Self {
            cfg,
            keys: [Key::default(); 3],
        }
    }

    /// Feed one sample of the panel.
    pub fn update(&mut self, levels: ButtonLevels, now_ms: u32) -> Events {
        let mut events = Events::new();
        for id in ALL {
            let level = match id {
                ButtonId::Up => levels.up,
                ButtonId::Down => levels.down,
                ButtonId::Select => levels.select,
            };
            let cfg = self.cfg;
            let key = &mut self.keys[id as usize];

            if level != key.raw {
                key.raw = level;
                key.raw_since = now_ms;
            }

            if key.raw != key.stable && now_ms.wrapping_sub(key.raw_since) >= cfg.debounce_ms {
                key.stable = key.raw;
                if key.stable {
                    key.pressed_at = now_ms;
                    key.last_repeat = now_ms;
                    key.long_fired = false;
                    key.suppressed = false;
                    let _ = events.push(ButtonEvent::Pressed(id));
                } else if !key.suppressed {
                    let _ = events.push(ButtonEvent::Released {
                        id,
                        held_ms: now_ms.wrapping_sub(key.pressed_at),
                        long: key.long_fired,
                    });
                }
                continue;
            }

            if key.stable && !key.suppressed {
                let held_ms = now_ms.wrapping_sub(key.pressed_at);
                if now_ms.wrapping_sub(key.last_repeat) >= cfg.repeat_ms {
                    key.last_repeat = now_ms;
                    let _ = events.push(ButtonEvent::Repeat { id, held_ms });
                }
                if !key.long_fired && held_ms >= cfg.long_press_ms {
                    key.long_fired = true;
                    let _ = events.push(ButtonEvent::LongPress(id));
                }
            }
        }
        events
    }

    /// Drop the remaining events of buttons currently held, up to and including their release.
    pub fn clear(&mut self) {
        for key in self.keys.iter_mut().filter(|k| k.stable) {
            key.suppressed = true;
        }
    }
}

/// Three active-low push buttons with pull-ups.
pub struct PinButtons<U, D, S> {
    up: U,
    down: D,
    select: S,
}

impl<U: InputPin, D: InputPin, S: InputPin> PinButtons<U, D, S> {
    pub fn new(up: U, down: D, select: S) -> Self {
        Self { up, down, select }
    }
}

fn pressed<P: InputPin>(pin: &P) -> bool {
    pin.is_low().unwrap_or(false)
}

impl<U: InputPin, D: InputPin, S: InputPin> ButtonPanel for PinButtons<U, D, S> {
    fn levels(&mut self) -> ButtonLevels {
        ButtonLevels {
            up: pressed(&self.up),
            down: pressed(&self.down),
            select: pressed(&self.select),
        }
    }
}
