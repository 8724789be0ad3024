use crate::input::{InputEvent, Key};
use crate::stimulus::StimulusSlot;

/// What a response (or the lack of one) amounted to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Right key, or a click on the block, for a valid slot
    CorrectValid { latency: f64 },
    /// Wrong key on a valid slot, or any response to a distractor
    WrongOrDistractorHit { latency: f64 },
    /// Nothing to respond to, already resolved, a click that missed the
    /// block, or a distractor that expired untouched
    Ignored,
    /// A valid slot expired without a response
    TimeoutMiss,
}

/// Resolve a response against the active slot. First responder wins: the
/// resolved flag is checked before anything else and set on every terminal
/// outcome.
pub fn resolve(event: &InputEvent, slot: Option<&mut StimulusSlot>, elapsed: f64) -> Outcome {
    let Some(slot) = slot else {
        return Outcome::Ignored;
    };
    if slot.is_resolved() {
        return Outcome::Ignored;
    }

    let on_target = match event {
        InputEvent::Key(Key::Char(c)) => c.eq_ignore_ascii_case(&slot.correct_response_key),
        InputEvent::Key(_) => false,
        InputEvent::Pointer { x, y } => {
            if !slot.bounds.contains(*x, *y) {
                return Outcome::Ignored;
            }
            true
        }
    };

    if !slot.mark_resolved() {
        return Outcome::Ignored;
    }

    let latency = elapsed.max(0.0);
    if on_target && !slot.is_distractor {
        Outcome::CorrectValid { latency }
    } else {
        Outcome::WrongOrDistractorHit { latency }
    }
}

/// Resolve a slot whose visible window ran out. Distractors expire neutrally.
pub fn expire(slot: &mut StimulusSlot) -> Outcome {
    if !slot.mark_resolved() {
        return Outcome::Ignored;
    }
    if slot.is_distractor {
        Outcome::Ignored
    } else {
        Outcome::TimeoutMiss
    }
}
