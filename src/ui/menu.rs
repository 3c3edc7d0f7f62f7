// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Menu catalog and the highlighted item.
//!
//! Menu entries carry a [`MenuAction`] tag; the machine dispatches on the tag.

use crate::io::Display;
use crate::ui::feedback::Line;
use core::fmt::Write;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MenuAction {
    Deposit,
    Redeem,
    DepositMore,
    SaveToCard,
    GetCoins,
}

pub struct MenuItem {
    pub name: &'static str,
    pub action: MenuAction,
}

pub struct Menu {
    pub title: &'static str,
    pub items: &'static [MenuItem],
}

pub static MAIN_MENU: Menu = Menu {
    title: "Main Menu",
    items: &[
        MenuItem {
            name: "Deposit",
            action: MenuAction::Deposit,
        },
        MenuItem {
            name: "Redeem",
            action: MenuAction::Redeem,
        },
    ],
};

pub static POST_DEPOSIT_MENU: Menu = Menu {
    title: "Next?",
    items: &[
        MenuItem {
            name: "Deposit more",
            action: MenuAction::DepositMore,
        },
        MenuItem {
            name: "Save to card",
            action: MenuAction::SaveToCard,
        },
        MenuItem {
            name: "Get coins",
            action: MenuAction::GetCoins,
        },
    ],
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MenuId {
    Main,
    PostDeposit,
}

impl MenuId {
    pub fn menu(self) -> &'static Menu {
        match self {
            MenuId::Main => &MAIN_MENU,
            MenuId::PostDeposit => &POST_DEPOSIT_MENU,
        }
    }
}

/// Active menu plus highlighted index. The index is always valid for the active menu.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MenuState {
    active: MenuId,
    current_item: usize,
}

impl MenuState {
    pub fn new() -> Self {
        Self {
            active: MenuId::Main,
            current_item: 0,
        }
    }

    #[inline]
    pub fn active(&self) -> MenuId {
        self.active
    }

    #[inline]
    pub fn current_item(&self) -> usize {
        self.current_item
    }

    pub fn title(&self) -> &'static str {
        self.active.menu().title
    }

    pub fn item(&self) -> &'static MenuItem {
        &self.active.menu().items[self.current_item]
    }

    pub fn selected_action(&self) -> MenuAction {
        self.item().action
    }

    /// Move the highlight by `direction` items, wrapping at both ends.
    pub fn navigate(&mut self, direction: i32) {
        let count = self.active.menu().items.len() as i32;
        let next = (self.current_item as i32 + direction).rem_euclid(count);
        self.current_item = next as usize;
    }

    /// Make `menu` active with its first item highlighted.
    pub fn switch_to(&mut self, menu: MenuId) {
        self.active = menu;
        self.current_item = 0;
    }

    pub fn render(&self, display: &mut dyn Display) {
        let mut line2 = Line::new();
        let _ = write!(line2, "> {}", self.item().name);
        display.show_lines(self.title(), line2.as_str());
    }
}

impl Default for MenuState {
    fn default() -> Self {
        Self::new()
    }
}
