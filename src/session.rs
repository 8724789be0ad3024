use std::time::Instant;

use crate::scoring::Tally;
use crate::stimulus::StimulusSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    NameEntry,
    Instructions,
    /// Runs on the instructions screen once the player is ready
    Countdown,
    Playing,
    Results,
    Rankings,
    Settings,
    Exit,
}

/// Sub-state of `Phase::Playing`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStage {
    SlotVisible,
    Interval,
}

/// Points banner shown above the play area
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    Gain { points: i64, perfect: bool },
    Penalty { points: i64 },
}

/// Small text shown next to the last slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flash {
    Latency(f64),
    Miss,
}

/// A value that stays on screen until a deadline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timed<T> {
    pub value: T,
    pub until: Instant,
}

impl<T: Copy> Timed<T> {
    pub fn new(value: T, until: Instant) -> Self {
        Self { value, until }
    }

    pub fn visible_at(&self, now: Instant) -> Option<T> {
        (now < self.until).then_some(self.value)
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    pub player_name: String,
    pub tally: Tally,
    /// Slots materialized so far; the active slot is number `slot_index`
    pub slot_index: usize,
    pub active_slot: Option<StimulusSlot>,
    pub stage: PlayStage,
    pub slot_shown_at: Option<Instant>,
    /// End of the current timed window (countdown, slot, interval)
    pub phase_deadline: Option<Instant>,
    pub countdown_started_at: Option<Instant>,
    pub countdown_current: i64,
    pub combo: Option<Timed<u32>>,
    pub feedback: Option<Timed<Feedback>>,
    pub flash: Option<Timed<Flash>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::NameEntry,
            player_name: String::new(),
            tally: Tally::default(),
            slot_index: 0,
            active_slot: None,
            stage: PlayStage::Interval,
            slot_shown_at: None,
            phase_deadline: None,
            countdown_started_at: None,
            countdown_current: 0,
            combo: None,
            feedback: None,
            flash: None,
        }
    }
}

impl SessionState {
    /// Back to a blank session at name entry
    pub fn reset(&mut self) {
        self.phase = Phase::NameEntry;
        self.player_name.clear();
        self.tally = Tally::default();
        self.slot_index = 0;
        self.active_slot = None;
        self.stage = PlayStage::Interval;
        self.slot_shown_at = None;
        self.phase_deadline = None;
        self.countdown_started_at = None;
        self.countdown_current = 0;
        self.combo = None;
        self.feedback = None;
        self.flash = None;
    }

    pub fn score(&self) -> i64 {
        self.tally.score
    }

    pub fn streak(&self) -> u32 {
        self.tally.streak
    }

    pub fn max_combo(&self) -> u32 {
        self.tally.max_combo
    }

    pub fn latencies(&self) -> &[f64] {
        &self.tally.latencies
    }

    pub fn avg_latency(&self) -> Option<f64> {
        self.tally.avg_latency()
    }

    /// The slot the player can still respond to, if any
    pub fn live_slot(&self) -> Option<&StimulusSlot> {
        match self.stage {
            PlayStage::SlotVisible => self.active_slot.as_ref().filter(|s| !s.is_resolved()),
            PlayStage::Interval => None,
        }
    }
}
