use crate::resolver::Outcome;
use crate::stats::mean;

pub const PERFECT_BELOW_SECS: f64 = 0.28;
pub const GOOD_BELOW_SECS: f64 = 0.45;
pub const SLOW_BELOW_SECS: f64 = 0.60;
pub const PERFECT_BONUS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Grade {
    Perfect,
    Good,
    Slow,
}

impl Grade {
    pub fn from_latency(latency: f64) -> Self {
        if latency < PERFECT_BELOW_SECS {
            Grade::Perfect
        } else if latency < GOOD_BELOW_SECS {
            Grade::Good
        } else if latency < SLOW_BELOW_SECS {
            Grade::Slow
        } else {
            // no separate tier past the slow threshold
            Grade::Slow
        }
    }
}

/// Result of applying one outcome to the tally
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreDelta {
    /// Streak-based points (1 for the first hit of a run, 2 after)
    pub base_points: i64,
    pub perfect_bonus: i64,
    pub penalty: i64,
    pub grade: Option<Grade>,
    pub streak_reset: bool,
    /// Streak length when it is long enough to show as a combo
    pub combo: Option<u32>,
}

impl ScoreDelta {
    pub fn points(&self) -> i64 {
        self.base_points + self.perfect_bonus - self.penalty
    }

    pub fn is_perfect(&self) -> bool {
        self.grade == Some(Grade::Perfect)
    }
}

/// The slice of session state the scoring engine may touch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub score: i64,
    pub streak: u32,
    pub max_combo: u32,
    /// Reaction time of every press on a visible block, seconds
    pub latencies: Vec<f64>,
}

impl Tally {
    pub fn apply(&mut self, outcome: &Outcome) -> ScoreDelta {
        match *outcome {
            Outcome::CorrectValid { latency } => {
                self.latencies.push(latency);
                self.streak += 1;
                let base_points = if self.streak == 1 { 1 } else { 2 };
                let grade = Grade::from_latency(latency);
                let perfect_bonus = if grade == Grade::Perfect {
                    PERFECT_BONUS
                } else {
                    0
                };
                self.score += base_points + perfect_bonus;
                self.max_combo = self.max_combo.max(self.streak);
                ScoreDelta {
                    base_points,
                    perfect_bonus,
                    grade: Some(grade),
                    combo: (self.streak >= 2).then_some(self.streak),
                    ..ScoreDelta::default()
                }
            }
            Outcome::WrongOrDistractorHit { latency } => {
                self.latencies.push(latency);
                self.score -= 1;
                self.streak = 0;
                ScoreDelta {
                    penalty: 1,
                    streak_reset: true,
                    ..ScoreDelta::default()
                }
            }
            Outcome::TimeoutMiss => {
                self.streak = 0;
                ScoreDelta {
                    streak_reset: true,
                    ..ScoreDelta::default()
                }
            }
            Outcome::Ignored => ScoreDelta::default(),
        }
    }

    pub fn avg_latency(&self) -> Option<f64> {
        mean(&self.latencies)
    }
}
