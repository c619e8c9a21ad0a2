//! Single-slot countdown scheduler.
//!
//! The scheduler holds at most one pending named event. It does not use
//! internal threads or OS timers - the caller passes wall-clock
//! timestamps explicitly and drives expiry by calling `tick()`
//! periodically. `time_left` is a live deadline-minus-now read, never a
//! decaying counter, so a stale virtual timer (system suspend, clock
//! jump) cannot make it lie.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// The closed set of scheduler references. Exactly one is pending at
/// any time while the scheduler is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    StartMicrobreakNotification,
    StartMicrobreak,
    FinishMicrobreak,
    StartBreakNotification,
    StartBreak,
    FinishBreak,
    ResumeBreaks,
}

impl EventKind {
    /// True while a break surface is open (the finish countdown runs).
    pub fn is_break_running(self) -> bool {
        matches!(self, EventKind::FinishMicrobreak | EventKind::FinishBreak)
    }
}

/// A plan frozen by `pause()`: the reference and how much of its
/// countdown was left, so it can be rearmed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausedPlan {
    pub reference: EventKind,
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Armed {
    reference: EventKind,
    duration_ms: u64,
    armed_at: DateTime<Utc>,
}

impl Armed {
    fn deadline(&self) -> DateTime<Utc> {
        self.armed_at + Duration::milliseconds(self.duration_ms as i64)
    }

    fn remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        (self.deadline() - now).num_milliseconds().max(0) as u64
    }
}

/// Single-slot logical clock.
///
/// Invariants: at most one pending event; `reference()` is `None`
/// exactly when nothing is armed; each successful `arm` yields at most
/// one expiry from `tick`, and never one for a cleared event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    slot: Option<Armed>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a single-shot countdown. Fails if an event is already
    /// pending - callers must `clear()` first.
    pub fn arm(
        &mut self,
        reference: EventKind,
        duration_ms: u64,
        now: DateTime<Utc>,
    ) -> Result<(), PlannerError> {
        if let Some(armed) = &self.slot {
            return Err(PlannerError::AlreadyArmed {
                pending: armed.reference,
            });
        }
        self.slot = Some(Armed {
            reference,
            duration_ms,
            armed_at: now,
        });
        Ok(())
    }

    /// Cancel any pending countdown. Idempotent.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Capture the remaining time and cancel the countdown, returning
    /// the frozen plan. No-op (`None`) if unarmed.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<PausedPlan> {
        let armed = self.slot.take()?;
        Some(PausedPlan {
            reference: armed.reference,
            remaining_ms: armed.remaining_ms(now),
        })
    }

    /// Fire the pending event if its deadline has passed. The slot is
    /// emptied before the reference is handed back, so an event can
    /// never fire twice.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<EventKind> {
        match &self.slot {
            Some(armed) if armed.remaining_ms(now) == 0 => {
                let armed = self.slot.take()?;
                Some(armed.reference)
            }
            _ => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    pub fn reference(&self) -> Option<EventKind> {
        self.slot.as_ref().map(|a| a.reference)
    }

    /// Live remaining time: current deadline minus `now`, floored at 0.
    pub fn time_left(&self, now: DateTime<Utc>) -> Option<u64> {
        self.slot.as_ref().map(|a| a.remaining_ms(now))
    }

    /// Wall-clock timestamp captured when the current event was armed.
    pub fn armed_at(&self) -> Option<DateTime<Utc>> {
        self.slot.as_ref().map(|a| a.armed_at)
    }

    /// Originally armed duration of the current event.
    pub fn duration_ms(&self) -> Option<u64> {
        self.slot.as_ref().map(|a| a.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc::now()
    }

    fn ms(n: u64) -> Duration {
        Duration::milliseconds(n as i64)
    }

    #[test]
    fn arm_rejects_second_event() {
        let now = t0();
        let mut scheduler = Scheduler::new();
        scheduler
            .arm(EventKind::StartMicrobreak, 1_000, now)
            .unwrap();
        let err = scheduler
            .arm(EventKind::StartBreak, 2_000, now)
            .unwrap_err();
        assert!(matches!(
            err,
            PlannerError::AlreadyArmed {
                pending: EventKind::StartMicrobreak
            }
        ));
    }

    #[test]
    fn clear_is_idempotent() {
        let now = t0();
        let mut scheduler = Scheduler::new();
        scheduler
            .arm(EventKind::StartMicrobreak, 1_000, now)
            .unwrap();
        scheduler.clear();
        let once = scheduler.clone();
        scheduler.clear();
        assert!(!scheduler.is_armed());
        assert_eq!(scheduler.reference(), once.reference());
    }

    #[test]
    fn tick_fires_exactly_once() {
        let now = t0();
        let mut scheduler = Scheduler::new();
        scheduler
            .arm(EventKind::StartMicrobreak, 1_000, now)
            .unwrap();
        assert_eq!(scheduler.tick(now + ms(500)), None);
        assert_eq!(
            scheduler.tick(now + ms(1_000)),
            Some(EventKind::StartMicrobreak)
        );
        assert_eq!(scheduler.tick(now + ms(2_000)), None);
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn cleared_event_never_fires() {
        let now = t0();
        let mut scheduler = Scheduler::new();
        scheduler
            .arm(EventKind::StartBreakNotification, 100, now)
            .unwrap();
        scheduler.clear();
        assert_eq!(scheduler.tick(now + ms(10_000)), None);
    }

    #[test]
    fn time_left_is_live() {
        let now = t0();
        let mut scheduler = Scheduler::new();
        scheduler
            .arm(EventKind::StartMicrobreak, 10_000, now)
            .unwrap();
        assert_eq!(scheduler.time_left(now), Some(10_000));
        assert_eq!(scheduler.time_left(now + ms(4_000)), Some(6_000));
        // Past the deadline the read floors at zero.
        assert_eq!(scheduler.time_left(now + ms(60_000)), Some(0));
    }

    #[test]
    fn pause_captures_remaining() {
        let now = t0();
        let mut scheduler = Scheduler::new();
        scheduler
            .arm(EventKind::StartMicrobreakNotification, 10_000, now)
            .unwrap();
        let plan = scheduler.pause(now + ms(3_000)).unwrap();
        assert_eq!(plan.reference, EventKind::StartMicrobreakNotification);
        assert_eq!(plan.remaining_ms, 7_000);
        assert!(!scheduler.is_armed());
        assert_eq!(scheduler.pause(now), None);
    }
}
