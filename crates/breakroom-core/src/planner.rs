//! Break planner state machine.
//!
//! The planner is the single owner of the [`Scheduler`], the break
//! cycle counters and the suppression set. It is a wall-clock-based
//! state machine with no internal threads: the embedding serializes
//! all external inputs (timer expiry, commands, suspend/resume,
//! DND/app/idle observations) into calls on one instance and drives
//! expiry by calling `tick()` periodically.
//!
//! ## Phase transitions
//!
//! ```text
//! Idle -> {Kind}Notification -> {Kind}Start -> {Kind}Finish -> Idle
//!                  (any phase) -> Suppressed -> Idle
//! ```
//!
//! Lifecycle transitions are published as [`Event`]s on an internal
//! queue the embedding drains; the planner never renders anything.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::scheduler::{EventKind, PausedPlan, Scheduler};
use crate::settings::{BreakKind, BreakSettings};
use crate::suppression::{
    AppExclusionsManager, DndManager, NaturalBreaksManager, Suppression,
};

fn notification_event(kind: BreakKind) -> EventKind {
    match kind {
        BreakKind::Mini => EventKind::StartMicrobreakNotification,
        BreakKind::Long => EventKind::StartBreakNotification,
    }
}

fn start_event(kind: BreakKind) -> EventKind {
    match kind {
        BreakKind::Mini => EventKind::StartMicrobreak,
        BreakKind::Long => EventKind::StartBreak,
    }
}

fn finish_event(kind: BreakKind) -> EventKind {
    match kind {
        BreakKind::Mini => EventKind::FinishMicrobreak,
        BreakKind::Long => EventKind::FinishBreak,
    }
}

/// Top-level scheduling state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakPlanner {
    settings: BreakSettings,
    scheduler: Scheduler,
    /// Completed breaks of either kind; never resets on its own.
    break_number: u64,
    /// Postponements of the break currently in flight.
    postpones_number: u32,
    /// Set by a suspend-triggered pause, distinct from a user pause.
    paused_for_suspend: bool,
    /// Plan frozen by a manual pause, restored on resume.
    saved_plan: Option<PausedPlan>,
    /// Deadline used for cadence selection between the two kinds.
    next_long_break_at: Option<DateTime<Utc>>,
    suppressions: BTreeSet<Suppression>,
    dnd_manager: DndManager,
    app_exclusions_manager: AppExclusionsManager,
    natural_breaks_manager: NaturalBreaksManager,
    #[serde(skip)]
    events: VecDeque<Event>,
}

impl BreakPlanner {
    pub fn new(settings: BreakSettings) -> Self {
        let dnd_manager = DndManager::new(&settings);
        let app_exclusions_manager = AppExclusionsManager::new(&settings);
        let natural_breaks_manager = NaturalBreaksManager::new(&settings);
        Self {
            settings,
            scheduler: Scheduler::new(),
            break_number: 0,
            postpones_number: 0,
            paused_for_suspend: false,
            saved_plan: None,
            next_long_break_at: None,
            suppressions: BTreeSet::new(),
            dnd_manager,
            app_exclusions_manager,
            natural_breaks_manager,
            events: VecDeque::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &BreakSettings {
        &self.settings
    }

    pub fn break_number(&self) -> u64 {
        self.break_number
    }

    pub fn postpones_number(&self) -> u32 {
        self.postpones_number
    }

    pub fn is_paused(&self) -> bool {
        self.suppressions.contains(&Suppression::ManualPause)
    }

    pub fn suppressions(&self) -> &BTreeSet<Suppression> {
        &self.suppressions
    }

    pub fn dnd_manager(&self) -> &DndManager {
        &self.dnd_manager
    }

    pub fn app_exclusions_manager(&self) -> &AppExclusionsManager {
        &self.app_exclusions_manager
    }

    pub fn natural_breaks_manager(&self) -> &NaturalBreaksManager {
        &self.natural_breaks_manager
    }

    /// Deadline the cadence selector aims the next long break at.
    pub fn next_long_break_at(&self) -> Option<DateTime<Utc>> {
        self.next_long_break_at
    }

    /// Milliseconds until the next break opens, if one is on the way.
    /// Includes the notification lead when the notify phase is pending.
    pub fn time_to_next_break(&self, now: DateTime<Utc>) -> Option<u64> {
        let left = self.scheduler.time_left(now)?;
        match self.scheduler.reference()? {
            EventKind::StartMicrobreak | EventKind::StartBreak => Some(left),
            EventKind::StartMicrobreakNotification => {
                Some(left + self.settings.microbreak.notification_ms)
            }
            EventKind::StartBreakNotification => {
                Some(left + self.settings.long_break.notification_ms)
            }
            _ => None,
        }
    }

    /// Drain the queued lifecycle events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    fn emit(&mut self, event: Event) {
        self.events.push_back(event);
    }

    // ── Scheduling ───────────────────────────────────────────────────

    /// Plan the next break of whichever kind is due first. No-op while
    /// any suppression is asserted or a plan is already pending.
    pub fn next_break(&mut self, now: DateTime<Utc>) {
        if !self.suppressions.is_empty() || self.scheduler.is_armed() {
            return;
        }
        let micro_enabled = self.settings.microbreak.enabled;
        let long_enabled = self.settings.long_break.enabled;
        if !micro_enabled && !long_enabled {
            return;
        }

        let micro_interval_ms = self.settings.microbreak.interval_ms();
        let long_due_ms = if long_enabled {
            let long_interval = self.settings.long_break.interval_ms();
            let due = *self
                .next_long_break_at
                .get_or_insert(now + Duration::milliseconds(long_interval as i64));
            Some((due - now).num_milliseconds().max(0) as u64)
        } else {
            self.next_long_break_at = None;
            None
        };

        // Whichever kind has the earlier effective deadline wins.
        match long_due_ms {
            Some(due) if !micro_enabled || due <= micro_interval_ms => {
                self.plan_break(BreakKind::Long, due, now);
            }
            _ => self.plan_break(BreakKind::Mini, micro_interval_ms, now),
        }
    }

    fn plan_break(&mut self, kind: BreakKind, until_start_ms: u64, now: DateTime<Utc>) {
        let lead_ms = self.settings.kind(kind).notification_ms;
        if lead_ms > 0 && until_start_ms > lead_ms {
            self.plan(notification_event(kind), until_start_ms - lead_ms, now);
        } else {
            self.plan(start_event(kind), until_start_ms, now);
        }
    }

    fn plan(&mut self, reference: EventKind, duration_ms: u64, now: DateTime<Utc>) {
        self.scheduler.clear();
        if let Err(err) = self.scheduler.arm(reference, duration_ms, now) {
            tracing::error!(%err, "failed to arm scheduler");
        }
        tracing::debug!(?reference, duration_ms, "scheduler armed");
    }

    /// Process scheduler expiry. Call periodically; chained zero-delay
    /// plans (a skip with no wait) resolve within one call.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        for _ in 0..8 {
            let Some(reference) = self.scheduler.tick(now) else {
                return;
            };
            self.handle_expiry(reference, now);
        }
    }

    fn handle_expiry(&mut self, reference: EventKind, now: DateTime<Utc>) {
        tracing::info!(?reference, "scheduler fired");
        match reference {
            EventKind::StartMicrobreakNotification => {
                let lead_ms = self.settings.microbreak.notification_ms;
                self.emit(Event::StartMicrobreakNotification {
                    starts_in_ms: lead_ms,
                    at: now,
                });
                self.plan(EventKind::StartMicrobreak, lead_ms, now);
            }
            EventKind::StartBreakNotification => {
                let lead_ms = self.settings.long_break.notification_ms;
                self.emit(Event::StartBreakNotification {
                    starts_in_ms: lead_ms,
                    at: now,
                });
                self.plan(EventKind::StartBreak, lead_ms, now);
            }
            EventKind::StartMicrobreak => self.begin_break(BreakKind::Mini, now),
            EventKind::StartBreak => self.begin_break(BreakKind::Long, now),
            EventKind::FinishMicrobreak => {
                let play = self.settings.break_sounds;
                self.complete_break(BreakKind::Mini, play, true, now);
            }
            EventKind::FinishBreak => {
                let play = self.settings.break_sounds;
                self.complete_break(BreakKind::Long, play, true, now);
            }
            EventKind::ResumeBreaks => self.resume(true, now),
        }
    }

    fn begin_break(&mut self, kind: BreakKind, now: DateTime<Utc>) {
        let s = self.settings.kind(kind);
        let duration_ms = s.duration_ms;
        let strict = s.strict;
        // Capability computed at start time; the break surface gets
        // exactly this and must not offer more.
        let postponable = s.postpone
            && !s.strict
            && s.postpones_limit > 0
            && self.postpones_number < s.postpones_limit;
        let event = match kind {
            BreakKind::Mini => Event::StartMicrobreak {
                duration_ms,
                postponable,
                strict,
                at: now,
            },
            BreakKind::Long => Event::StartBreak {
                duration_ms,
                postponable,
                strict,
                at: now,
            },
        };
        self.emit(event);
        self.plan(finish_event(kind), duration_ms, now);
    }

    fn complete_break(
        &mut self,
        kind: BreakKind,
        should_play_sound: bool,
        should_plan_next: bool,
        now: DateTime<Utc>,
    ) {
        self.break_number += 1;
        self.postpones_number = 0;
        if kind == BreakKind::Long {
            let interval = self.settings.long_break.interval_ms();
            self.next_long_break_at = Some(now + Duration::milliseconds(interval as i64));
        }
        let event = match kind {
            BreakKind::Mini => Event::FinishMicrobreak {
                should_play_sound,
                should_plan_next,
                at: now,
            },
            BreakKind::Long => Event::FinishBreak {
                should_play_sound,
                should_plan_next,
                at: now,
            },
        };
        self.emit(event);
        tracing::info!(?kind, break_number = self.break_number, "break finished");
        if should_plan_next {
            self.next_break(now);
        }
    }

    fn finish_kind(
        &mut self,
        kind: BreakKind,
        should_play_sound: bool,
        should_plan_next: bool,
        now: DateTime<Utc>,
    ) {
        if self.scheduler.reference() == Some(finish_event(kind)) {
            self.scheduler.clear();
            self.complete_break(kind, should_play_sound, should_plan_next, now);
        } else {
            tracing::warn!(?kind, "finish requested but no such break is running");
            if should_plan_next {
                self.next_break(now);
            } else {
                self.clear();
            }
        }
    }

    /// External finish signal from the microbreak surface.
    pub fn finish_microbreak(
        &mut self,
        should_play_sound: bool,
        should_plan_next: bool,
        now: DateTime<Utc>,
    ) {
        self.finish_kind(BreakKind::Mini, should_play_sound, should_plan_next, now);
    }

    /// External finish signal from the long-break surface.
    pub fn finish_break(
        &mut self,
        should_play_sound: bool,
        should_plan_next: bool,
        now: DateTime<Utc>,
    ) {
        self.finish_kind(BreakKind::Long, should_play_sound, should_plan_next, now);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Cancel the pending plan and any frozen one. The schedule stays
    /// idle until `next_break` is called again.
    pub fn clear(&mut self) {
        self.scheduler.clear();
        self.saved_plan = None;
    }

    /// Postpone the break currently in flight. Returns false (no state
    /// change) when no break runs, the kind is strict, postponement is
    /// disabled, the per-cycle limit is reached, or too much of the
    /// break has already elapsed.
    pub fn postpone_current_break(&mut self, now: DateTime<Utc>) -> bool {
        let kind = match self.scheduler.reference() {
            Some(EventKind::FinishMicrobreak) => BreakKind::Mini,
            Some(EventKind::FinishBreak) => BreakKind::Long,
            _ => return false,
        };
        let s = self.settings.kind(kind);
        if s.strict || !s.postpone || s.postpones_limit == 0 {
            return false;
        }
        if self.postpones_number >= s.postpones_limit {
            tracing::info!(?kind, "postponement limit reached");
            return false;
        }
        let duration_ms = s.duration_ms.max(1);
        let postpone_ms = s.postpone_ms;
        let postponable_percent = u64::from(s.postponable_percent);
        let left = self.scheduler.time_left(now).unwrap_or(0);
        let passed_percent = (duration_ms.saturating_sub(left)) * 100 / duration_ms;
        if passed_percent > postponable_percent {
            tracing::info!(?kind, passed_percent, "too late to postpone");
            return false;
        }
        self.plan(start_event(kind), postpone_ms, now);
        self.postpones_number += 1;
        tracing::info!(?kind, postpones = self.postpones_number, "break postponed");
        true
    }

    fn skip_to(&mut self, kind: BreakKind, delay_ms: Option<u64>, now: DateTime<Utc>) {
        // The command channel jumps the queue: whatever is pending,
        // including a notify phase or a manual pause, is dropped.
        self.saved_plan = None;
        self.suppressions.remove(&Suppression::ManualPause);
        self.paused_for_suspend = false;
        self.plan(start_event(kind), delay_ms.unwrap_or(0), now);
        self.emit(Event::UpdateStatus { at: now });
    }

    pub fn skip_to_microbreak(&mut self, delay_ms: Option<u64>, now: DateTime<Utc>) {
        tracing::info!(?delay_ms, "skipping to microbreak");
        self.skip_to(BreakKind::Mini, delay_ms, now);
    }

    pub fn skip_to_break(&mut self, delay_ms: Option<u64>, now: DateTime<Utc>) {
        tracing::info!(?delay_ms, "skipping to long break");
        self.skip_to(BreakKind::Long, delay_ms, now);
    }

    /// Pause the schedule. `milliseconds <= 1` pauses indefinitely;
    /// larger values arm a resume countdown. The interrupted plan is
    /// frozen and restored by `resume`. A running break is finished
    /// (silently, without replanning) first.
    pub fn pause(&mut self, milliseconds: u64, now: DateTime<Utc>) {
        if let Some(reference) = self.scheduler.reference() {
            if reference.is_break_running() {
                let kind = if reference == EventKind::FinishMicrobreak {
                    BreakKind::Mini
                } else {
                    BreakKind::Long
                };
                self.scheduler.clear();
                self.complete_break(kind, false, false, now);
            }
        }
        if self.is_paused() {
            // Re-pause with a new duration; keep the frozen plan.
            self.scheduler.clear();
        } else if let Some(plan) = self.scheduler.pause(now) {
            if plan.reference != EventKind::ResumeBreaks {
                self.saved_plan = Some(plan);
            }
        }
        self.suppressions.insert(Suppression::ManualPause);
        if milliseconds > 1 {
            self.plan(EventKind::ResumeBreaks, milliseconds, now);
            tracing::info!(milliseconds, "breaks paused");
        } else {
            tracing::info!("breaks paused indefinitely");
        }
        self.emit(Event::UpdateStatus { at: now });
    }

    /// Resume from a manual pause. Restores the frozen plan when one
    /// exists, otherwise recomputes a fresh cadence. Other asserted
    /// suppressions keep the schedule held.
    pub fn resume(&mut self, notify: bool, now: DateTime<Utc>) {
        if !self.is_paused() {
            return;
        }
        self.scheduler.clear();
        self.suppressions.remove(&Suppression::ManualPause);
        self.paused_for_suspend = false;
        // The frozen plan is consumed either way; if another
        // suppression still holds the schedule it is dropped, and the
        // eventual release recomputes a fresh cadence.
        let saved = self.saved_plan.take();
        if self.suppressions.is_empty() {
            if let Some(plan) = saved {
                self.plan(plan.reference, plan.remaining_ms, now);
            } else {
                self.next_break(now);
            }
        }
        tracing::info!("breaks resumed");
        if notify {
            self.emit(Event::ResumeBreaks { at: now });
        }
        self.emit(Event::UpdateStatus { at: now });
    }

    /// Rearm from scratch, as right after process start. Cumulative
    /// break count is kept.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        tracing::info!("resetting breaks");
        self.clear();
        self.suppressions.remove(&Suppression::ManualPause);
        self.paused_for_suspend = false;
        self.postpones_number = 0;
        self.next_long_break_at = None;
        self.next_break(now);
        self.emit(Event::UpdateStatus { at: now });
    }

    /// Apply changed settings: reinitialize the managers, drop the
    /// current plan and recompute from the new cadences.
    pub fn reinitialize(&mut self, settings: BreakSettings, now: DateTime<Utc>) {
        self.settings = settings;
        if self.dnd_manager.reinitialize(&self.settings) == Some(false) {
            self.release_suppression(Suppression::Dnd, now);
        }
        if self
            .app_exclusions_manager
            .reinitialize(&self.settings)
            == Some(false)
        {
            self.release_suppression(Suppression::AppExclusion, now);
        }
        if self
            .natural_breaks_manager
            .reinitialize(&self.settings)
            == Some(false)
        {
            self.release_suppression(Suppression::NaturalBreak, now);
        }
        self.clear();
        self.suppressions.remove(&Suppression::ManualPause);
        self.paused_for_suspend = false;
        self.next_long_break_at = None;
        self.next_break(now);
        self.emit(Event::UpdateStatus { at: now });
    }

    // ── Suppression plumbing ─────────────────────────────────────────

    fn assert_suppression(&mut self, suppression: Suppression, now: DateTime<Utc>) {
        if !self.suppressions.insert(suppression) {
            return;
        }
        // A pending resume countdown survives; everything else is
        // cleared and recomputed fresh once the set empties.
        if self.scheduler.reference() != Some(EventKind::ResumeBreaks) {
            self.scheduler.clear();
        }
        tracing::info!(?suppression, "schedule suppressed");
        self.emit(Event::UpdateStatus { at: now });
    }

    fn release_suppression(&mut self, suppression: Suppression, now: DateTime<Utc>) {
        if !self.suppressions.remove(&suppression) {
            return;
        }
        tracing::info!(?suppression, "suppression released");
        if self.suppressions.is_empty() {
            self.next_break(now);
        }
        self.emit(Event::UpdateStatus { at: now });
    }

    fn apply_manager_change(
        &mut self,
        suppression: Suppression,
        change: Option<bool>,
        now: DateTime<Utc>,
    ) {
        match change {
            Some(true) => self.assert_suppression(suppression, now),
            Some(false) => self.release_suppression(suppression, now),
            None => {}
        }
    }

    /// Feed the observed system DND state.
    pub fn observe_dnd(&mut self, dnd_active: bool, now: DateTime<Utc>) {
        let change = self.dnd_manager.observe(dnd_active);
        self.apply_manager_change(Suppression::Dnd, change, now);
    }

    /// Toggle DND monitoring (preferences).
    pub fn set_dnd_monitoring(&mut self, enabled: bool, now: DateTime<Utc>) {
        let change = self.dnd_manager.set_monitoring(enabled);
        self.apply_manager_change(Suppression::Dnd, change, now);
    }

    /// Feed the observed foreground application id.
    pub fn observe_foreground_app(&mut self, app_id: &str, now: DateTime<Utc>) {
        let change = self.app_exclusions_manager.observe_foreground_app(app_id);
        self.apply_manager_change(Suppression::AppExclusion, change, now);
    }

    /// Feed a system idle-time sample.
    pub fn observe_idle(&mut self, idle_ms: u64, now: DateTime<Utc>) {
        let change = self.natural_breaks_manager.observe_idle(idle_ms);
        self.apply_manager_change(Suppression::NaturalBreak, change, now);
    }

    /// Toggle natural breaks (preferences).
    pub fn set_natural_breaks(&mut self, enabled: bool, now: DateTime<Utc>) {
        let change = self.natural_breaks_manager.set_enabled(enabled);
        self.apply_manager_change(Suppression::NaturalBreak, change, now);
    }

    // ── Suspend / resume ─────────────────────────────────────────────

    /// System is about to suspend (or the screen locks).
    pub fn on_suspend(&mut self, now: DateTime<Utc>) {
        if !self.settings.pause_for_suspend {
            tracing::info!("not pausing for suspend, setting disabled");
            return;
        }
        if !self.suppressions.is_empty() {
            tracing::info!("not pausing for suspend, already held");
            return;
        }
        self.paused_for_suspend = true;
        self.pause(1, now);
    }

    /// System resumed (or the screen unlocked).
    pub fn on_resume_from_suspend(&mut self, now: DateTime<Utc>) {
        if self.paused_for_suspend {
            self.paused_for_suspend = false;
            self.resume(false, now);
        } else {
            self.correct_scheduler(now);
        }
    }

    /// Recompute remaining time from the wall-clock arm timestamp.
    /// An event whose deadline passed while virtual timers were not
    /// running fires immediately instead of being dropped.
    pub fn correct_scheduler(&mut self, now: DateTime<Utc>) {
        if self.is_paused() {
            return;
        }
        if let Some(left) = self.scheduler.time_left(now) {
            tracing::info!(
                remaining_ms = left,
                reference = ?self.scheduler.reference(),
                "corrected scheduler from wall clock"
            );
            if left == 0 {
                self.tick(now);
            }
        }
    }
}
