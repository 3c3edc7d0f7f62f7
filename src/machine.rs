// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Top-level machine: menus, deposit, redemption and maintenance.
//!
//! [`Machine::tick`] is the body of the firmware's main loop. Each call samples the buttons, runs
//! the bin check when nothing else is in progress, and advances whichever flow is active by one
//! step. All mutable process state lives in [`SystemState`].

use crate::actuators::LidActuator;
use crate::config::MachineConfig;
use crate::control::dispense::pay_to_card;
use crate::control::{
    AmountEntry, BinMonitor, CoinDispenser, DepositCycle, DepositOutcome, DepositPorts, DispenseReport,
    EntryStatus, FillEvent,
};
use crate::error::{CardError, DepositError, LedgerError};
use crate::io::{ButtonPanel, CardStore, CoinHopper, Display, Status, StatusIndicator};
use crate::ledger::PointsLedger;
use crate::sensing::{ObjectPresenceState, ObjectSensing};
use crate::ui::{ButtonEvent, ButtonId, Buttons, Feedback, Line, MenuAction, MenuId, MenuState};

const MAINTENANCE_LINES: (&str, &str) = ("Bin full!", "Maintenance...");

/// Everything the flows share.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemState {
    pub ledger: PointsLedger,
    pub presence: ObjectPresenceState,
    /// Set while the bin is full. Only the fill check runs in this mode.
    pub maintenance: bool,
    pub menu: MenuState,
}

/// Card operation a waiting card is needed for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CardTask {
    /// Bank the session points onto the card.
    Save,
    /// Bank the session points, then redeem from the card balance.
    Redeem,
    /// Take the chosen amount off the card, then pay it in coins.
    Debit,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Activity {
    Menu,
    /// Show a message, then the menu `then`.
    Notice { since: u32, then: MenuId },
    Deposit,
    AwaitCard { since: u32, task: CardTask },
    /// `from_card` is set when the ledger holds a loaded card balance.
    AmountEntry { from_card: bool },
    Dispensing,
    Maintenance,
}

/// The peripherals the machine drives, already wrapped in their capability traits.
pub struct Parts<S, L, D, I, K, C, H, M> {
    pub sensors: S,
    pub lids: L,
    pub display: D,
    pub status: I,
    pub panel: K,
    pub card: C,
    pub hopper: H,
    pub monitor: M,
}

pub struct Machine<S, L, D, I, K, C, H, M> {
    cfg: MachineConfig,
    state: SystemState,
    activity: Activity,
    deposit: DepositCycle,
    entry: AmountEntry,
    buttons: Buttons,
    dispenser: CoinDispenser<H>,
    monitor: M,
    sensors: S,
    lids: L,
    display: D,
    status: I,
    panel: K,
    card: C,
}

impl<S, L, D, I, K, C, H, M> Machine<S, L, D, I, K, C, H, M>
where
    S: ObjectSensing,
    L: LidActuator,
    D: Display,
    I: StatusIndicator,
    K: ButtonPanel,
    C: CardStore,
    H: CoinHopper,
    M: BinMonitor,
{
    /// Build the machine and show the main menu.
    pub fn new(cfg: MachineConfig, parts: Parts<S, L, D, I, K, C, H, M>) -> Self {
        let mut machine = Self {
            cfg,
            state: SystemState::default(),
            activity: Activity::Menu,
            deposit: DepositCycle::new(cfg.deposit, &cfg.lids),
            entry: AmountEntry::new(&cfg.input),
            buttons: Buttons::new(cfg.input),
            dispenser: CoinDispenser::new(parts.hopper, cfg.dispense),
            monitor: parts.monitor,
            sensors: parts.sensors,
            lids: parts.lids,
            display: parts.display,
            status: parts.status,
            panel: parts.panel,
            card: parts.card,
        };
        machine.show_menu(MenuId::Main);
        machine
    }

    #[inline]
    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    #[inline]
    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn deposit(&self) -> &DepositCycle {
        &self.deposit
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn lids(&self) -> &L {
        &self.lids
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn status(&self) -> &I {
        &self.status
    }

    pub fn panel_mut(&mut self) -> &mut K {
        &mut self.panel
    }

    pub fn card_mut(&mut self) -> &mut C {
        &mut self.card
    }

    pub fn hopper_mut(&mut self) -> &mut H {
        self.dispenser.hopper_mut()
    }

    pub fn monitor_mut(&mut self) -> &mut M {
        &mut self.monitor
    }

    /// Run one loop iteration.
    pub fn tick(&mut self, now_ms: u32) {
        self.status.refresh(now_ms);
        let events = self.buttons.update(self.panel.levels(), now_ms);

        let quiescent = matches!(
            self.activity,
            Activity::Menu | Activity::Notice { .. } | Activity::Maintenance
        );
        if quiescent {
            match self.monitor.poll(now_ms, &mut self.state) {
                Some(FillEvent::BinFull) => {
                    self.enter(Activity::Maintenance);
                    let (l1, l2) = MAINTENANCE_LINES;
                    self.feedback().show(l1, l2, Status::Error);
                    return;
                }
                Some(FillEvent::BinCleared) => {
                    self.notice(now_ms, "Bin emptied", "Ready", Status::Ok, MenuId::Main);
                    return;
                }
                None => {}
            }
        }

        match self.activity {
            Activity::Menu => {
                for event in events {
                    self.on_menu_event(event, now_ms);
                    if self.activity != Activity::Menu {
                        break;
                    }
                }
            }

            Activity::Maintenance => {
                if events.iter().any(|e| matches!(e, ButtonEvent::Pressed(_))) {
                    log::info!("input refused: maintenance");
                    let (l1, l2) = MAINTENANCE_LINES;
                    self.feedback().show(l1, l2, Status::Error);
                }
            }

            Activity::Notice { since, then } => {
                if now_ms.wrapping_sub(since) >= self.cfg.deposit.notice_ms {
                    self.show_menu(then);
                }
            }

            Activity::Deposit => self.step_deposit(now_ms),

            Activity::AwaitCard { since, task } => self.step_card(now_ms, since, task),

            Activity::AmountEntry { from_card } => {
                for event in events {
                    match self.entry.handle(event, &mut self.state.ledger) {
                        EntryStatus::Unchanged => {}
                        EntryStatus::Changed(_) => self.entry.render(&self.state.ledger, &mut self.display),
                        EntryStatus::Confirmed(_) => {
                            self.commit(now_ms, from_card);
                            break;
                        }
                        EntryStatus::Cancelled => {
                            // Nothing was written to the card yet.
                            if from_card {
                                self.state.ledger.release_card();
                            }
                            let menu = self.home_menu();
                            self.notice(now_ms, "Cancelled", "", Status::Ok, menu);
                            break;
                        }
                    }
                }
            }

            Activity::Dispensing => {
                if let Some(report) = self.dispenser.poll(now_ms) {
                    self.dispensed(now_ms, report);
                }
            }
        }
    }

    fn feedback(&mut self) -> Feedback<'_> {
        Feedback::new(&mut self.display, &mut self.status)
    }

    fn enter(&mut self, activity: Activity) {
        self.buttons.clear();
        self.activity = activity;
    }

    fn show_menu(&mut self, menu: MenuId) {
        self.state.menu.switch_to(menu);
        self.state.menu.render(&mut self.display);
        self.status.set_status(Status::Ok);
        self.enter(Activity::Menu);
    }

    fn notice(&mut self, now_ms: u32, line1: &str, line2: &str, status: Status, then: MenuId) {
        self.feedback().show(line1, line2, status);
        self.enter(Activity::Notice { since: now_ms, then });
    }

    /// Menu to return to when a flow ends: keep offering the post-deposit options while there
    /// are unsaved session points.
    fn home_menu(&self) -> MenuId {
        if self.state.ledger.total() > 0 {
            MenuId::PostDeposit
        } else {
            MenuId::Main
        }
    }

    fn on_menu_event(&mut self, event: ButtonEvent, now_ms: u32) {
        match event {
            ButtonEvent::Pressed(ButtonId::Up) => {
                self.state.menu.navigate(-1);
                self.state.menu.render(&mut self.display);
            }
            ButtonEvent::Pressed(ButtonId::Down) => {
                self.state.menu.navigate(1);
                self.state.menu.render(&mut self.display);
            }
            ButtonEvent::Released {
                id: ButtonId::Select,
                long: false,
                ..
            } => self.dispatch(self.state.menu.selected_action(), now_ms),
            _ => {}
        }
    }

    fn dispatch(&mut self, action: MenuAction, now_ms: u32) {
        log::debug!("menu action {:?}", action);
        match action {
            MenuAction::Deposit | MenuAction::DepositMore => match self.deposit.begin(&mut self.state) {
                Ok(()) => self.enter(Activity::Deposit),
                Err(DepositError::Maintenance) => {
                    let (l1, l2) = MAINTENANCE_LINES;
                    self.feedback().show(l1, l2, Status::Error);
                    self.enter(Activity::Maintenance);
                }
                Err(e @ DepositError::Busy) => log::warn!("{}", e),
            },
            MenuAction::Redeem => self.await_card(now_ms, CardTask::Redeem),
            MenuAction::SaveToCard => self.await_card(now_ms, CardTask::Save),
            MenuAction::GetCoins => {
                let max = self.entry.start(&mut self.state.ledger, self.cfg.redeem.redeem_cap);
                if max == 0 {
                    let menu = self.home_menu();
                    self.notice(now_ms, "No points", "to redeem", Status::Error, menu);
                } else {
                    self.entry.render(&self.state.ledger, &mut self.display);
                    self.status.set_status(Status::Ok);
                    self.enter(Activity::AmountEntry { from_card: false });
                }
            }
        }
    }

    fn step_deposit(&mut self, now_ms: u32) {
        let mut ports = DepositPorts {
            sensors: &mut self.sensors,
            lids: &mut self.lids,
            feedback: Feedback::new(&mut self.display, &mut self.status),
        };
        let outcome = match self.deposit.step(now_ms, &mut self.state, &mut ports) {
            Some(outcome) => outcome,
            None => return,
        };

        let then = match outcome {
            DepositOutcome::Accepted { .. } => MenuId::PostDeposit,
            _ => self.state.menu.active(),
        };
        match outcome {
            // The credit message is already on screen.
            DepositOutcome::Accepted { .. } => self.enter(Activity::Notice { since: now_ms, then }),
            DepositOutcome::NoObject => self.notice(now_ms, "No object", "detected!", Status::Error, then),
            DepositOutcome::Rejected(reason) => {
                self.notice(now_ms, "Invalid bottle", reason.label(), Status::Error, then)
            }
            DepositOutcome::VerifyTimedOut => {
                self.notice(now_ms, "Cannot verify", "Try again", Status::Error, then)
            }
        }
    }

    fn await_card(&mut self, now_ms: u32, task: CardTask) {
        let line2 = match task {
            CardTask::Save => "to save points",
            CardTask::Redeem => "to redeem",
            CardTask::Debit => "to pay out",
        };
        self.feedback().show("Tap your card", line2, Status::Processing);
        self.enter(Activity::AwaitCard { since: now_ms, task });
    }

    fn step_card(&mut self, now_ms: u32, since: u32, task: CardTask) {
        let block = self.cfg.redeem.points_block;
        let result = match task {
            CardTask::Save => pay_to_card(&mut self.state.ledger, &mut self.card, block)
                .map(|balance| self.saved(now_ms, balance)),
            CardTask::Redeem => {
                let banked = if self.state.ledger.total() > 0 {
                    self.state.ledger.bank_to_card(&mut self.card, block).map(|_| ())
                } else {
                    Ok(())
                };
                banked
                    .and_then(|()| self.state.ledger.load_from_card(&mut self.card, block))
                    .map(|_| self.offer_card_points(now_ms))
            }
            CardTask::Debit => self
                .dispenser
                .start_from_card(&mut self.state.ledger, &mut self.card, block, now_ms)
                .map(|(amount, report)| self.pay_out(now_ms, amount, report)),
        };

        match result {
            Ok(()) => {}
            Err(LedgerError::Overflow { .. }) => {
                let menu = self.home_menu();
                self.notice(now_ms, "Card is full", "Use coins", Status::Error, menu);
            }
            Err(e @ (LedgerError::InsufficientPoints { .. } | LedgerError::NoCardLoaded)) => {
                log::error!("{}", e);
                self.state.ledger.release_card();
                let menu = self.home_menu();
                self.notice(now_ms, "Redeem failed", "", Status::Error, menu);
            }
            Err(LedgerError::Card(e)) => {
                match e {
                    CardError::NoCard => {}
                    CardError::WrongCard => {
                        self.feedback().show("Wrong card", "Use first card", Status::Error)
                    }
                    _ => self.feedback().show("Card error", "Tap again", Status::Error),
                }
                if now_ms.wrapping_sub(since) >= self.cfg.redeem.card_wait_ms {
                    self.card_gave_up(now_ms, task);
                }
            }
        }
    }

    fn saved(&mut self, now_ms: u32, balance: u16) {
        let line2 = Line::format(format_args!("Balance: {}", balance));
        self.notice(now_ms, "Saved to card", line2.as_str(), Status::Ok, MenuId::Main);
    }

    /// Card balance loaded: choose how much of it to redeem.
    fn offer_card_points(&mut self, now_ms: u32) {
        let max = self.entry.start(&mut self.state.ledger, self.cfg.redeem.redeem_cap);
        if max == 0 {
            self.state.ledger.release_card();
            self.notice(now_ms, "No points", "on card", Status::Error, MenuId::Main);
        } else {
            self.entry.render(&self.state.ledger, &mut self.display);
            self.status.set_status(Status::Ok);
            self.enter(Activity::AmountEntry { from_card: true });
        }
    }

    fn card_gave_up(&mut self, now_ms: u32, task: CardTask) {
        log::warn!("no card within {} ms ({:?})", self.cfg.redeem.card_wait_ms, task);
        match task {
            CardTask::Debit => {
                // The card still holds its full balance.
                self.state.ledger.release_card();
                self.notice(now_ms, "Card not read", "No coins paid", Status::Error, MenuId::Main);
            }
            CardTask::Save | CardTask::Redeem => {
                let menu = self.home_menu();
                self.notice(now_ms, "No card", "detected", Status::Error, menu);
            }
        }
    }

    /// Confirmed amount. Session points are paid at once; a card balance is debited first.
    fn commit(&mut self, now_ms: u32, from_card: bool) {
        if from_card {
            self.await_card(now_ms, CardTask::Debit);
            return;
        }
        match self.state.ledger.commit_redemption() {
            Ok((amount, remaining)) => {
                log::info!("redeeming {} points, {} left", amount, remaining);
                let report = self.dispenser.start(amount, now_ms);
                self.pay_out(now_ms, amount, report);
            }
            Err(e) => {
                log::error!("{}", e);
                let menu = self.home_menu();
                self.notice(now_ms, "Redeem failed", "", Status::Error, menu);
            }
        }
    }

    fn pay_out(&mut self, now_ms: u32, amount: u32, report: Option<DispenseReport>) {
        match report {
            Some(report) => self.dispensed(now_ms, report),
            None => {
                self.feedback()
                    .show_fmt("Dispensing...", format_args!("{} coins", amount), Status::Processing);
                self.enter(Activity::Dispensing);
            }
        }
    }

    fn dispensed(&mut self, now_ms: u32, report: DispenseReport) {
        let summary = report.summary();
        let menu = self.home_menu();
        if report.is_complete() {
            self.notice(now_ms, "Dispensed", summary.as_str(), Status::Ok, menu);
        } else {
            self.notice(now_ms, "Incomplete", summary.as_str(), Status::Error, menu);
        }
    }
}
