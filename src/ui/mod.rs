// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # User Interface
//!
//! - [`menu`] - Menu catalog and highlighted item.
//! - [`input`] - Button debounce, auto-repeat and long-press timing.
//! - [`feedback`] - Display rows and status codes.

pub mod feedback;
pub mod input;
pub mod menu;

pub use feedback::{Feedback, Line, LINE_WIDTH};
pub use input::{ButtonEvent, ButtonId, Buttons, PinButtons};
pub use menu::{MenuAction, MenuId, MenuState};
