use std::time::Duration;

/// Number of valid (label matches color) slots per session
pub const DEFAULT_VALID_SLOTS: usize = 6;
/// Number of distractor (label differs from color) slots per session
pub const DEFAULT_DISTRACTOR_SLOTS: usize = 4;
pub const DEFAULT_BLOCK_DURATION: Duration = Duration::from_millis(800);
pub const DEFAULT_BLOCK_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_FINAL_PAUSE: Duration = Duration::from_millis(1000);
pub const DEFAULT_GO_DELAY: Duration = Duration::from_millis(600);
pub const DEFAULT_COUNTDOWN_FROM: u32 = 3;

/// Timing and shape of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub valid_slots: usize,
    pub distractor_slots: usize,
    /// How long a slot stays visible waiting for a response
    pub block_duration: Duration,
    /// Pause between a resolved slot and the next one
    pub block_interval: Duration,
    /// Pause after the last slot before results
    pub final_pause: Duration,
    /// "GO!" display before the first slot
    pub go_delay: Duration,
    pub countdown_from: u32,
    pub combo_display: Duration,
    pub feedback_display: Duration,
    pub latency_display: Duration,
    /// Maximum display width of a player name
    pub max_name_width: usize,
    /// Fixed RNG seed for reproducible sessions
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            valid_slots: DEFAULT_VALID_SLOTS,
            distractor_slots: DEFAULT_DISTRACTOR_SLOTS,
            block_duration: DEFAULT_BLOCK_DURATION,
            block_interval: DEFAULT_BLOCK_INTERVAL,
            final_pause: DEFAULT_FINAL_PAUSE,
            go_delay: DEFAULT_GO_DELAY,
            countdown_from: DEFAULT_COUNTDOWN_FROM,
            combo_display: Duration::from_millis(1500),
            feedback_display: Duration::from_millis(1200),
            latency_display: Duration::from_millis(1500),
            max_name_width: 16,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn total_slots(&self) -> usize {
        self.valid_slots + self.distractor_slots
    }

    /// Interval that follows slot number `shown` (1-based count of slots shown so far)
    pub fn interval_after(&self, shown: usize) -> Duration {
        if shown >= self.total_slots() {
            self.final_pause
        } else {
            self.block_interval
        }
    }
}
