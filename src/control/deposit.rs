// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Deposit and verification cycle.
//!
//! One cycle takes a single bottle from the open intake, seals it in the chamber, runs the
//! conjunctive sensor check and either drops it into storage (one point) or hands it back.
//! Every failure path re-opens the intake and waits for the chamber to be empty before closing
//! it again, so the intake is never left open over an unverified object.
//!
//! The cycle never sleeps. [`DepositCycle::step`] is called once per loop iteration with the
//! current time and moves at most one transition:
//!
//! ```ignore
//! cycle.begin(&mut state)?;
//!
//! loop {
//!     if let Some(outcome) = cycle.step(clock.now_ms(), &mut state, &mut ports) {
//!         break outcome;
//!     }
//! }
//! ```

use crate::actuators::{LidActuator, LidId};
use crate::config::{DepositConfig, LidConfig};
use crate::error::DepositError;
use crate::io::Status;
use crate::machine::SystemState;
use crate::sensing::ObjectSensing;
use crate::ui::Feedback;

/// The first check that failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RejectReason {
    NoPresence,
    Metal,
    Weight,
    Clarity,
}

impl RejectReason {
    /// Second display row for a rejection.
    pub fn label(self) -> &'static str {
        match self {
            RejectReason::NoPresence => "Object missing",
            RejectReason::Metal => "Metal detected",
            RejectReason::Weight => "Wrong weight",
            RejectReason::Clarity => "Not clear",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

/// Poll every check once. All four must pass; the first failure decides the reason.
pub fn evaluate(sensors: &mut dyn ObjectSensing, now_ms: u32) -> Verdict {
    if !sensors.read_presence(now_ms).present {
        Verdict::Reject(RejectReason::NoPresence)
    } else if sensors.read_metal() {
        Verdict::Reject(RejectReason::Metal)
    } else if !sensors.read_weight() {
        Verdict::Reject(RejectReason::Weight)
    } else if !sensors.read_clarity() {
        Verdict::Reject(RejectReason::Clarity)
    } else {
        Verdict::Accept
    }
}

/// How a finished cycle ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DepositOutcome {
    /// The bottle went into storage. `total` is the ledger total after the credit.
    Accepted { total: u32 },
    Rejected(RejectReason),
    /// No verdict was confirmed in time.
    VerifyTimedOut,
    /// Nothing was inserted.
    NoObject,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DropStage {
    /// Drop lid open, bottle falling.
    Open,
    /// Drop lid commanded closed, settling.
    Closing,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RemovalStage {
    /// Intake commanded open, settling.
    Opening { since: u32 },
    /// Waiting for consecutive empty reads.
    Polling { empty_reads: u8, last_sample: Option<u32> },
    /// "Remove hand" warning before the intake closes.
    HandClear { since: u32 },
    /// Intake commanded closed, settling.
    Closing { since: u32 },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DepositState {
    Idle,
    /// `commanded` is set once the open command went out.
    OpeningIntake { commanded: Option<u32> },
    /// `candidate` is the sample time of an unconfirmed positive read.
    AwaitingObject { since: u32, candidate: Option<u32> },
    ClosingForVerify { since: u32, lid_closed: bool },
    Verifying { since: u32, agreeing: u8, last: Option<Verdict> },
    Accepted { since: u32, stage: DropStage },
    Rejected(RejectReason),
    VerifyTimedOut,
    TimedOutNoObject,
    WaitRemoveObject { since: u32, stage: RemovalStage },
}

/// Collaborators a deposit step drives.
pub struct DepositPorts<'a> {
    pub sensors: &'a mut dyn ObjectSensing,
    pub lids: &'a mut dyn LidActuator,
    pub feedback: Feedback<'a>,
}

pub struct DepositCycle {
    cfg: DepositConfig,
    settle_ms: u32,
    state: DepositState,
    /// Failure carried through the removal phase.
    pending: Option<DepositOutcome>,
}

impl DepositCycle {
    pub fn new(cfg: DepositConfig, lids: &LidConfig) -> Self {
        Self {
            cfg,
            settle_ms: lids.settle_ms,
            state: DepositState::Idle,
            pending: None,
        }
    }

    #[inline]
    pub fn state(&self) -> DepositState {
        self.state
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == DepositState::Idle
    }

    /// Start a cycle. Refused in maintenance mode or while a cycle runs.
    pub fn begin(&mut self, sys: &mut SystemState) -> Result<(), DepositError> {
        if sys.maintenance {
            return Err(DepositError::Maintenance);
        }
        if !self.is_idle() {
            return Err(DepositError::Busy);
        }
        sys.presence.reset();
        self.pending = None;
        self.state = DepositState::OpeningIntake { commanded: None };
        log::info!("deposit cycle started");
        Ok(())
    }

    /// Advance the cycle. Returns the outcome once the cycle is back to idle.
    pub fn step(
        &mut self,
        now_ms: u32,
        sys: &mut SystemState,
        io: &mut DepositPorts<'_>,
    ) -> Option<DepositOutcome> {
        let cfg = self.cfg;
        let settle = self.settle_ms;

        match self.state {
            DepositState::Idle => None,

            DepositState::OpeningIntake { commanded: None } => {
                io.sensors.reset_presence();
                io.lids.set_lid(LidId::Intake, true);
                io.feedback.show("Opening bin....", "", Status::Processing);
                self.state = DepositState::OpeningIntake {
                    commanded: Some(now_ms),
                };
                None
            }

            DepositState::OpeningIntake { commanded: Some(at) } => {
                if now_ms.wrapping_sub(at) >= settle {
                    io.feedback.show("Insert bottle!", "", Status::Processing);
                    self.state = DepositState::AwaitingObject {
                        since: now_ms,
                        candidate: None,
                    };
                }
                None
            }

            DepositState::AwaitingObject { since, candidate } => {
                let reading = io.sensors.read_presence(now_ms);
                let mut candidate = candidate;
                if reading.present {
                    match candidate {
                        Some(first) if reading.fresh && reading.sampled_at_ms != first => {
                            sys.presence.is_object_inside = true;
                            sys.presence.record(&reading);
                            log::info!("object detected (value {})", reading.value);
                            io.feedback.show("Lid closing...", "Remove hand!", Status::Processing);
                            self.state = DepositState::ClosingForVerify {
                                since: now_ms,
                                lid_closed: false,
                            };
                            return None;
                        }
                        Some(_) => {}
                        None => {
                            sys.presence.record(&reading);
                            candidate = Some(reading.sampled_at_ms);
                        }
                    }
                } else {
                    candidate = None;
                }

                if now_ms.wrapping_sub(since) >= cfg.presence_timeout_ms {
                    log::info!("no object within {} ms", cfg.presence_timeout_ms);
                    io.feedback.show("No object", "detected!", Status::Error);
                    self.pending = Some(DepositOutcome::NoObject);
                    self.state = DepositState::TimedOutNoObject;
                } else {
                    self.state = DepositState::AwaitingObject { since, candidate };
                }
                None
            }

            DepositState::ClosingForVerify {
                since,
                lid_closed: false,
            } => {
                if now_ms.wrapping_sub(since) >= cfg.hand_clear_ms {
                    io.lids.set_lid(LidId::Intake, false);
                    self.state = DepositState::ClosingForVerify {
                        since: now_ms,
                        lid_closed: true,
                    };
                }
                None
            }

            DepositState::ClosingForVerify {
                since,
                lid_closed: true,
            } => {
                if now_ms.wrapping_sub(since) >= settle {
                    io.sensors.reset_presence();
                    io.feedback.show("Verifying....", "", Status::Processing);
                    self.state = DepositState::Verifying {
                        since: now_ms,
                        agreeing: 0,
                        last: None,
                    };
                }
                None
            }

            DepositState::Verifying {
                since,
                agreeing,
                last,
            } => {
                let elapsed = now_ms.wrapping_sub(since);
                if elapsed < cfg.verify_settle_ms {
                    return None;
                }
                // No verdict counts once the deadline has passed.
                if elapsed >= cfg.verify_timeout_ms {
                    log::warn!("verification timed out after {} ms", elapsed);
                    io.feedback.show("Cannot verify", "Try again", Status::Error);
                    self.pending = Some(DepositOutcome::VerifyTimedOut);
                    self.state = DepositState::VerifyTimedOut;
                    return None;
                }

                let verdict = evaluate(&mut *io.sensors, now_ms);
                let agreeing = if last == Some(verdict) {
                    agreeing.saturating_add(1)
                } else {
                    1
                };

                if agreeing >= cfg.verify_confirm_reads.max(1) {
                    self.decide(now_ms, verdict, io);
                } else {
                    self.state = DepositState::Verifying {
                        since,
                        agreeing,
                        last: Some(verdict),
                    };
                }
                None
            }

            DepositState::Accepted {
                since,
                stage: DropStage::Open,
            } => {
                if now_ms.wrapping_sub(since) >= settle.saturating_add(cfg.drop_hold_ms) {
                    io.lids.set_lid(LidId::Drop, false);
                    self.state = DepositState::Accepted {
                        since: now_ms,
                        stage: DropStage::Closing,
                    };
                }
                None
            }

            DepositState::Accepted {
                since,
                stage: DropStage::Closing,
            } => {
                if now_ms.wrapping_sub(since) < settle {
                    return None;
                }
                sys.presence.is_object_inside = false;
                let total = sys.ledger.credit(1);
                log::info!("bottle accepted, total {} points", total);
                io.feedback
                    .show_fmt("+1 point!", format_args!("Total: {}", total), Status::Ok);
                self.state = DepositState::Idle;
                Some(DepositOutcome::Accepted { total })
            }

            DepositState::Rejected(_) | DepositState::VerifyTimedOut | DepositState::TimedOutNoObject => {
                io.lids.set_lid(LidId::Intake, true);
                io.feedback.show("Remove object...", "", Status::Error);
                self.state = DepositState::WaitRemoveObject {
                    since: now_ms,
                    stage: RemovalStage::Opening { since: now_ms },
                };
                None
            }

            DepositState::WaitRemoveObject { since, stage } => {
                self.step_removal(now_ms, since, stage, sys, io)
            }
        }
    }

    fn decide(&mut self, now_ms: u32, verdict: Verdict, io: &mut DepositPorts<'_>) {
        match verdict {
            Verdict::Accept => {
                log::info!("bottle verified");
                io.lids.set_lid(LidId::Drop, true);
                io.feedback.show("Verified!", "Dropping...", Status::Processing);
                self.state = DepositState::Accepted {
                    since: now_ms,
                    stage: DropStage::Open,
                };
            }
            Verdict::Reject(reason) => {
                log::warn!("bottle rejected: {:?}", reason);
                io.feedback.show("Invalid bottle", reason.label(), Status::Error);
                self.pending = Some(DepositOutcome::Rejected(reason));
                self.state = DepositState::Rejected(reason);
            }
        }
    }

    fn step_removal(
        &mut self,
        now_ms: u32,
        since: u32,
        stage: RemovalStage,
        sys: &mut SystemState,
        io: &mut DepositPorts<'_>,
    ) -> Option<DepositOutcome> {
        let cfg = self.cfg;
        let settle = self.settle_ms;

        let next = match stage {
            RemovalStage::Opening { since: at } => {
                if now_ms.wrapping_sub(at) < settle {
                    return None;
                }
                io.sensors.reset_presence();
                RemovalStage::Polling {
                    empty_reads: 0,
                    last_sample: None,
                }
            }

            RemovalStage::Polling {
                empty_reads,
                last_sample,
            } => {
                let reading = io.sensors.read_presence(now_ms);
                let mut empty_reads = empty_reads;
                let mut last_sample = last_sample;
                if reading.present {
                    empty_reads = 0;
                } else if last_sample != Some(reading.sampled_at_ms) {
                    empty_reads = empty_reads.saturating_add(1);
                    last_sample = Some(reading.sampled_at_ms);
                }
                sys.presence.record(&reading);

                if empty_reads >= cfg.removal_confirm_reads.max(1) {
                    sys.presence.is_object_inside = false;
                    log::info!("chamber empty");
                    io.feedback.show("Lid closing...", "Remove hand!", Status::Processing);
                    RemovalStage::HandClear { since: now_ms }
                } else if now_ms.wrapping_sub(since) >= cfg.removal_timeout_ms {
                    log::warn!("object not removed within {} ms, closing intake", cfg.removal_timeout_ms);
                    io.feedback.show("Lid closing...", "Remove hand!", Status::Error);
                    RemovalStage::HandClear { since: now_ms }
                } else {
                    RemovalStage::Polling {
                        empty_reads,
                        last_sample,
                    }
                }
            }

            RemovalStage::HandClear { since: at } => {
                if now_ms.wrapping_sub(at) < cfg.hand_clear_ms {
                    return None;
                }
                io.lids.set_lid(LidId::Intake, false);
                RemovalStage::Closing { since: now_ms }
            }

            RemovalStage::Closing { since: at } => {
                if now_ms.wrapping_sub(at) < settle {
                    return None;
                }
                self.state = DepositState::Idle;
                let outcome = self.pending.take().unwrap_or(DepositOutcome::NoObject);
                log::info!("deposit cycle ended: {:?}", outcome);
                return Some(outcome);
            }
        };

        self.state = DepositState::WaitRemoveObject { since, stage: next };
        None
    }
}

impl DepositState {
    /// Failure states that are left on the next step.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DepositState::Rejected(_) | DepositState::VerifyTimedOut | DepositState::TimedOutNoObject
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDisplay, FakeLids, FakeSensing, FakeStatus};

    struct Rig {
        cycle: DepositCycle,
        sys: SystemState,
        sensors: FakeSensing,
        lids: FakeLids,
        display: FakeDisplay,
        status: FakeStatus,
    }

    impl Rig {
        fn new() -> Self {
            Self::with_config(DepositConfig::default())
        }

        fn with_config(cfg: DepositConfig) -> Self {
            Self {
                cycle: DepositCycle::new(cfg, &LidConfig::default()),
                sys: SystemState::default(),
                sensors: FakeSensing::bottle(),
                lids: FakeLids::default(),
                display: FakeDisplay::default(),
                status: FakeStatus::default(),
            }
        }

        fn step(&mut self, now: u32) -> Option<DepositOutcome> {
            let mut ports = DepositPorts {
                sensors: &mut self.sensors,
                lids: &mut self.lids,
                feedback: Feedback::new(&mut self.display, &mut self.status),
            };
            self.cycle.step(now, &mut self.sys, &mut ports)
        }

        /// Step every 10 ms from `from` until the cycle finishes or `until` passes.
        fn run(&mut self, from: u32, until: u32) -> Option<(u32, DepositOutcome)> {
            let mut t = from;
            while t <= until {
                if let Some(outcome) = self.step(t) {
                    return Some((t, outcome));
                }
                t += 10;
            }
            None
        }

        /// Step until `pred` holds for the state; returns the time it first held.
        fn run_until(&mut self, from: u32, until: u32, pred: impl Fn(&DepositState) -> bool) -> u32 {
            let mut t = from;
            while t <= until {
                self.step(t);
                if pred(&self.cycle.state()) {
                    return t;
                }
                t += 10;
            }
            panic!("state {:?} at {}", self.cycle.state(), until);
        }
    }

    #[test]
    fn begin_is_refused_in_maintenance_and_while_busy() {
        let mut rig = Rig::new();
        rig.sys.maintenance = true;
        assert_eq!(rig.cycle.begin(&mut rig.sys), Err(DepositError::Maintenance));
        rig.sys.maintenance = false;
        assert_eq!(rig.cycle.begin(&mut rig.sys), Ok(()));
        assert_eq!(rig.cycle.begin(&mut rig.sys), Err(DepositError::Busy));
    }

    #[test]
    fn begin_resets_presence_state() {
        let mut rig = Rig::new();
        rig.sys.presence.is_object_inside = true;
        rig.cycle.begin(&mut rig.sys).unwrap();
        assert!(!rig.sys.presence.is_object_inside);
    }

    #[test]
    fn valid_bottle_is_accepted_and_credited_once() {
        let mut rig = Rig::new();
        rig.sensors.present_from = Some(1000);
        rig.cycle.begin(&mut rig.sys).unwrap();

        let closed_at = rig.run_until(0, 5000, |s| {
            matches!(s, DepositState::ClosingForVerify { lid_closed: true, .. })
        });
        assert!(rig.sys.presence.is_object_inside);

        let verified_at = rig.run_until(closed_at, closed_at + 5000, |s| {
            matches!(s, DepositState::Accepted { .. })
        });
        assert!(verified_at - closed_at <= 2000);
        assert_eq!(rig.sys.ledger.total(), 0);

        let (_, outcome) = rig.run(verified_at, verified_at + 10_000).unwrap();
        assert_eq!(outcome, DepositOutcome::Accepted { total: 1 });
        assert_eq!(rig.sys.ledger.total(), 1);
        assert!(!rig.sys.presence.is_object_inside);
        assert!(rig.cycle.is_idle());

        let drops: Vec<bool> = rig
            .lids
            .log
            .iter()
            .filter(|(lid, _)| *lid == LidId::Drop)
            .map(|(_, open)| *open)
            .collect();
        assert_eq!(drops, [true, false]);
        assert!(!rig.lids.is_open(LidId::Intake));
    }

    #[test]
    fn intake_opens_before_object_is_awaited() {
        let mut rig = Rig::new();
        rig.cycle.begin(&mut rig.sys).unwrap();
        rig.step(0);
        assert!(rig.lids.is_open(LidId::Intake));
        assert_eq!(rig.display.last().0, "Opening bin....");
        rig.step(500);
        assert!(matches!(rig.cycle.state(), DepositState::AwaitingObject { since: 500, .. }));
        assert_eq!(rig.display.last().0, "Insert bottle!");
    }

    #[test]
    fn presence_timeout_boundary_is_inclusive() {
        let mut rig = Rig::new();
        rig.sensors.present_from = None;
        rig.cycle.begin(&mut rig.sys).unwrap();
        rig.step(0);
        rig.step(500);

        rig.step(500 + 2999);
        assert!(matches!(rig.cycle.state(), DepositState::AwaitingObject { .. }));
        rig.step(500 + 3000);
        assert_eq!(rig.cycle.state(), DepositState::TimedOutNoObject);
        assert_eq!(rig.display.last(), ("No object", "detected!"));
    }

    #[test]
    fn single_positive_read_is_not_a_detection() {
        let mut rig = Rig::new();
        rig.cycle.begin(&mut rig.sys).unwrap();
        rig.step(0);
        rig.step(500);

        rig.sensors.present_from = Some(0);
        rig.step(600);
        rig.sensors.present_from = None;
        rig.step(700);
        rig.sensors.present_from = Some(0);
        rig.step(800);
        assert!(matches!(rig.cycle.state(), DepositState::AwaitingObject { .. }));
        rig.step(900);
        assert!(matches!(rig.cycle.state(), DepositState::ClosingForVerify { .. }));
    }

    #[test]
    fn cached_read_does_not_confirm_presence() {
        let mut rig = Rig::new();
        rig.sensors.debounce_ms = 30;
        rig.cycle.begin(&mut rig.sys).unwrap();
        rig.step(0);
        rig.step(500);
        rig.step(510);
        rig.step(520);
        assert!(matches!(rig.cycle.state(), DepositState::AwaitingObject { .. }));
        rig.step(540);
        assert!(matches!(rig.cycle.state(), DepositState::ClosingForVerify { .. }));
    }

    fn rejected_with(setup: impl Fn(&mut FakeSensing)) -> (Rig, DepositOutcome) {
        let mut rig = Rig::new();
        rig.cycle.begin(&mut rig.sys).unwrap();
        let t = rig.run_until(0, 10_000, |s| matches!(s, DepositState::Verifying { .. }));
        setup(&mut rig.sensors);
        let failed_at = rig.run_until(t, t + 10_000, |s| s.is_failure());
        // Object is taken out once the intake reopens.
        rig.sensors.present_from = None;
        let (_, outcome) = rig.run(failed_at + 10, failed_at + 30_000).unwrap();
        (rig, outcome)
    }

    #[test]
    fn any_single_failing_check_rejects() {
        let cases: [(fn(&mut FakeSensing), RejectReason); 4] = [
            (|s| s.present_from = None, RejectReason::NoPresence),
            (|s| s.metal = true, RejectReason::Metal),
            (|s| s.weight_ok = false, RejectReason::Weight),
            (|s| s.clear = false, RejectReason::Clarity),
        ];
        for (setup, reason) in cases {
            let (rig, outcome) = rejected_with(setup);
            assert_eq!(outcome, DepositOutcome::Rejected(reason));
            assert_eq!(rig.sys.ledger.total(), 0);
            assert!(rig.lids.log.iter().all(|(lid, _)| *lid == LidId::Intake));
            assert!(!rig.lids.is_open(LidId::Intake));
            assert!(!rig.sys.presence.is_object_inside);
        }
    }

    #[test]
    fn rejection_shows_reason_then_asks_for_removal() {
        let mut rig = Rig::new();
        rig.cycle.begin(&mut rig.sys).unwrap();
        let t = rig.run_until(0, 10_000, |s| matches!(s, DepositState::Verifying { .. }));
        rig.sensors.metal = true;
        let t = rig.run_until(t, t + 10_000, |s| s.is_failure());
        assert_eq!(rig.display.last(), ("Invalid bottle", "Metal detected"));
        rig.step(t + 10);
        assert!(matches!(rig.cycle.state(), DepositState::WaitRemoveObject { .. }));
        assert_eq!(rig.display.last().0, "Remove object...");
        assert!(rig.lids.is_open(LidId::Intake));
    }

    #[test]
    fn flapping_verdict_times_out() {
        let mut rig = Rig::new();
        rig.cycle.begin(&mut rig.sys).unwrap();
        let t = rig.run_until(0, 10_000, |s| matches!(s, DepositState::Verifying { .. }));
        rig.sensors.flap_weight = true;
        let failed_at = rig.run_until(t, t + 10_000, |s| s.is_failure());
        assert_eq!(rig.cycle.state(), DepositState::VerifyTimedOut);
        assert!(failed_at - t >= DepositConfig::default().verify_timeout_ms);
        assert_eq!(rig.display.last(), ("Cannot verify", "Try again"));

        rig.sensors.present_from = None;
        let (_, outcome) = rig.run(failed_at + 10, failed_at + 30_000).unwrap();
        assert_eq!(outcome, DepositOutcome::VerifyTimedOut);
        assert_eq!(rig.sys.ledger.total(), 0);
    }

    #[test]
    fn verdict_confirmed_after_the_deadline_times_out() {
        let cfg = DepositConfig::default();
        let mut rig = Rig::new();
        rig.cycle.begin(&mut rig.sys).unwrap();
        let t = rig.run_until(0, 10_000, |s| matches!(s, DepositState::Verifying { .. }));

        rig.step(t + cfg.verify_settle_ms);
        assert!(matches!(rig.cycle.state(), DepositState::Verifying { agreeing: 1, .. }));
        // The confirming read would land exactly on the deadline.
        rig.step(t + cfg.verify_timeout_ms);
        assert_eq!(rig.cycle.state(), DepositState::VerifyTimedOut);
        assert!(!rig.lids.is_open(LidId::Drop));
        assert_eq!(rig.sys.ledger.total(), 0);
    }

    #[test]
    fn longest_drop_hold_keeps_the_drop_lid_open() {
        let mut rig = Rig::with_config(DepositConfig {
            drop_hold_ms: u32::MAX,
            ..DepositConfig::default()
        });
        rig.cycle.begin(&mut rig.sys).unwrap();
        let t = rig.run_until(0, 10_000, |s| matches!(s, DepositState::Accepted { .. }));
        assert_eq!(rig.run(t + 10, t + 60_000), None);
        assert!(rig.lids.is_open(LidId::Drop));
        assert_eq!(rig.sys.ledger.total(), 0);
    }

    #[test]
    fn object_left_inside_closes_after_removal_timeout() {
        let mut rig = Rig::new();
        rig.cycle.begin(&mut rig.sys).unwrap();
        let t = rig.run_until(0, 10_000, |s| matches!(s, DepositState::Verifying { .. }));
        rig.sensors.clear = false;
        let failed_at = rig.run_until(t, t + 10_000, |s| s.is_failure());

        let (done_at, outcome) = rig.run(failed_at + 10, failed_at + 60_000).unwrap();
        assert_eq!(outcome, DepositOutcome::Rejected(RejectReason::Clarity));
        assert!(done_at - failed_at >= DepositConfig::default().removal_timeout_ms);
        assert!(!rig.lids.is_open(LidId::Intake));
    }

    #[test]
    fn no_object_still_closes_the_intake() {
        let mut rig = Rig::new();
        rig.sensors.present_from = None;
        rig.cycle.begin(&mut rig.sys).unwrap();
        let (_, outcome) = rig.run(0, 30_000).unwrap();
        assert_eq!(outcome, DepositOutcome::NoObject);
        assert_eq!(
            rig.lids.log.last().copied(),
            Some((LidId::Intake, false))
        );
        assert!(rig.cycle.is_idle());
    }

    #[test]
    fn repeated_cycles_credit_one_point_each() {
        let mut rig = Rig::new();
        let mut t = 0;
        for expected in 1..=3 {
            rig.cycle.begin(&mut rig.sys).unwrap();
            let (end, outcome) = rig.run(t, t + 30_000).unwrap();
            assert_eq!(outcome, DepositOutcome::Accepted { total: expected });
            t = end + 10;
        }
        assert_eq!(rig.sys.ledger.total(), 3);
    }

    #[test]
    fn timers_survive_clock_wrap() {
        let mut rig = Rig::new();
        let start = u32::MAX - 2000;
        rig.cycle.begin(&mut rig.sys).unwrap();
        let mut t = start;
        let outcome = loop {
            if let Some(o) = rig.step(t) {
                break o;
            }
            t = t.wrapping_add(10);
            assert!(t.wrapping_sub(start) < 30_000);
        };
        assert_eq!(outcome, DepositOutcome::Accepted { total: 1 });
    }
}
