//! Stimulus sequencing: the shuffled valid/distractor pattern for a session
//! and the materialization of individual slots inside the play region.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Slot footprint in terminal cells
pub const SLOT_WIDTH: u16 = 10;
pub const SLOT_HEIGHT: u16 = 3;
/// Border drawn around the play region
pub const FRAME_BORDER: u16 = 1;
/// Extra gap between the border and any slot
pub const SPAWN_MARGIN: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum GameColor {
    #[strum(serialize = "RED")]
    Red,
    #[strum(serialize = "BLUE")]
    Blue,
    #[strum(serialize = "YELLOW")]
    Yellow,
    #[strum(serialize = "GREEN")]
    Green,
}

impl GameColor {
    pub const ALL: [GameColor; 4] = [
        GameColor::Red,
        GameColor::Blue,
        GameColor::Yellow,
        GameColor::Green,
    ];

    /// Response key for a block filled with this color
    pub fn key(self) -> char {
        match self {
            GameColor::Red => 'r',
            GameColor::Blue => 'b',
            GameColor::Yellow => 'y',
            GameColor::Green => 'g',
        }
    }
}

/// Axis-aligned rectangle in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Hit-test against the drawn cells; `right()` and `bottom()` are one past the block
    pub fn contains(&self, x: u16, y: u16) -> bool {
        self.x <= x && x < self.right() && self.y <= y && y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StimulusSlot {
    pub is_distractor: bool,
    /// Fill color of the block; decides the correct key
    pub target_color: GameColor,
    /// Color named by the label printed on the block
    pub displayed_label_color: GameColor,
    pub correct_response_key: char,
    pub bounds: Bounds,
    resolved: bool,
}

impl StimulusSlot {
    pub fn new(target_color: GameColor, displayed_label_color: GameColor, bounds: Bounds) -> Self {
        Self {
            is_distractor: target_color != displayed_label_color,
            target_color,
            displayed_label_color,
            correct_response_key: target_color.key(),
            bounds,
            resolved: false,
        }
    }

    pub fn label(&self) -> String {
        self.displayed_label_color.to_string()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Returns false if the slot was already resolved.
    pub(crate) fn mark_resolved(&mut self) -> bool {
        !std::mem::replace(&mut self.resolved, true)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("sequence exhausted: slot {index} requested from a sequence of {len}")]
pub struct SequenceExhausted {
    pub index: usize,
    pub len: usize,
}

/// Valid/distractor pattern for one session. Built once, never reshuffled.
#[derive(Debug, Clone)]
pub struct StimulusSequencer {
    pattern: Vec<bool>,
}

impl StimulusSequencer {
    pub fn build<R: Rng + ?Sized>(valid_count: usize, distractor_count: usize, rng: &mut R) -> Self {
        let mut pattern = Vec::with_capacity(valid_count + distractor_count);
        pattern.extend(std::iter::repeat(false).take(valid_count));
        pattern.extend(std::iter::repeat(true).take(distractor_count));
        pattern.shuffle(rng);
        Self { pattern }
    }

    /// true = distractor
    pub fn pattern(&self) -> &[bool] {
        &self.pattern
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    pub fn distractor_count(&self) -> usize {
        self.pattern.iter().filter(|d| **d).count()
    }

    pub fn valid_count(&self) -> usize {
        self.len() - self.distractor_count()
    }

    /// Materialize slot `index` (0-based) at a random spot inside `area`.
    pub fn next<R: Rng + ?Sized>(
        &self,
        index: usize,
        area: Bounds,
        rng: &mut R,
    ) -> Result<StimulusSlot, SequenceExhausted> {
        let is_distractor = *self.pattern.get(index).ok_or(SequenceExhausted {
            index,
            len: self.len(),
        })?;

        let target = GameColor::ALL[rng.gen_range(0..GameColor::ALL.len())];
        let label = if is_distractor {
            let others: Vec<GameColor> = GameColor::ALL
                .iter()
                .copied()
                .filter(|c| *c != target)
                .collect();
            others[rng.gen_range(0..others.len())]
        } else {
            target
        };

        Ok(StimulusSlot::new(target, label, place_slot(area, rng)))
    }
}

/// Pick a slot position inside `area`, keeping clear of the border. Falls back
/// to hugging the border when the margin does not fit, and to the area origin
/// when even that does not fit.
pub fn place_slot<R: Rng + ?Sized>(area: Bounds, rng: &mut R) -> Bounds {
    let span = |start: u16, len: u16, size: u16| -> (u16, u16) {
        let end = start.saturating_add(len);
        let min = start.saturating_add(FRAME_BORDER + SPAWN_MARGIN);
        let max = end.saturating_sub(size + FRAME_BORDER + SPAWN_MARGIN);
        if max >= min {
            return (min, max);
        }
        let min = start.saturating_add(FRAME_BORDER);
        let max = end.saturating_sub(size + FRAME_BORDER);
        if max >= min {
            (min, max)
        } else {
            (start, start)
        }
    };

    let (min_x, max_x) = span(area.x, area.width, SLOT_WIDTH);
    let (min_y, max_y) = span(area.y, area.height, SLOT_HEIGHT);
    Bounds::new(
        rng.gen_range(min_x..=max_x),
        rng.gen_range(min_y..=max_y),
        SLOT_WIDTH,
        SLOT_HEIGHT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const AREA: Bounds = Bounds::new(2, 3, 76, 18);

    #[test]
    fn counts_are_exact_for_any_seed() {
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let seq = StimulusSequencer::build(6, 4, &mut rng);
            assert_eq!(seq.len(), 10);
            assert_eq!(seq.valid_count(), 6);
            assert_eq!(seq.distractor_count(), 4);
        }
    }

    #[test]
    fn shuffle_moves_distractors_around() {
        // with 200 seeds every position should host a distractor at least once
        let mut seen = [false; 10];
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let seq = StimulusSequencer::build(6, 4, &mut rng);
            for (i, d) in seq.pattern().iter().enumerate() {
                seen[i] |= *d;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn slots_follow_the_pattern() {
        let mut rng = StdRng::seed_from_u64(7);
        let seq = StimulusSequencer::build(6, 4, &mut rng);
        for i in 0..seq.len() {
            let slot = seq.next(i, AREA, &mut rng).unwrap();
            assert_eq!(slot.is_distractor, seq.pattern()[i]);
            assert_eq!(slot.correct_response_key, slot.target_color.key());
            if slot.is_distractor {
                assert_ne!(slot.target_color, slot.displayed_label_color);
            } else {
                assert_eq!(slot.target_color, slot.displayed_label_color);
            }
            assert!(!slot.is_resolved());
        }
    }

    #[test]
    fn index_past_end_signals_exhaustion() {
        let mut rng = StdRng::seed_from_u64(1);
        let seq = StimulusSequencer::build(2, 1, &mut rng);
        let err = seq.next(3, AREA, &mut rng).unwrap_err();
        assert_eq!(err, SequenceExhausted { index: 3, len: 3 });
        assert!(seq.next(2, AREA, &mut rng).is_ok());
    }

    #[test]
    fn placement_stays_inside_margins() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            let b = place_slot(AREA, &mut rng);
            assert!(b.x >= AREA.x + FRAME_BORDER + SPAWN_MARGIN);
            assert!(b.right() <= AREA.right() - FRAME_BORDER - SPAWN_MARGIN);
            assert!(b.y >= AREA.y + FRAME_BORDER + SPAWN_MARGIN);
            assert!(b.bottom() <= AREA.bottom() - FRAME_BORDER - SPAWN_MARGIN);
        }
    }

    #[test]
    fn placement_in_tiny_area_does_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        let tiny = Bounds::new(0, 0, 4, 2);
        let b = place_slot(tiny, &mut rng);
        assert_eq!((b.x, b.y), (0, 0));

        // margin does not fit but the border does
        let snug = Bounds::new(0, 0, SLOT_WIDTH + 2, SLOT_HEIGHT + 2);
        let b = place_slot(snug, &mut rng);
        assert_eq!((b.x, b.y), (1, 1));
    }

    #[test]
    fn bounds_hit_test_covers_only_drawn_cells() {
        let b = Bounds::new(10, 5, 10, 3);
        assert!(b.contains(10, 5));
        assert!(b.contains(19, 7));
        assert!(!b.contains(9, 5));
        assert!(!b.contains(20, 6));
        assert!(!b.contains(12, 8));
        assert!(!b.contains(20, 8));
    }

    #[test]
    fn color_labels_and_keys() {
        assert_eq!(GameColor::Yellow.to_string(), "YELLOW");
        assert_eq!(GameColor::Blue.key(), 'b');
        let slot = StimulusSlot::new(GameColor::Red, GameColor::Green, Bounds::default());
        assert!(slot.is_distractor);
        assert_eq!(slot.label(), "GREEN");
        assert_eq!(slot.correct_response_key, 'r');
    }

    #[test]
    fn mark_resolved_is_one_shot() {
        let mut slot = StimulusSlot::new(GameColor::Red, GameColor::Red, Bounds::default());
        assert!(slot.mark_resolved());
        assert!(!slot.mark_resolved());
        assert!(slot.is_resolved());
    }
}
