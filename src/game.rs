//! Session state machine: phase transitions, slot scheduling and the glue
//! between the resolver, the scoring tally, the ledger and the collaborators.
//!
//! The game never reads a clock itself. Every call takes the `now` read once
//! by the frame loop, so a tick sees one consistent instant.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info, warn};
use unicode_width::UnicodeWidthStr;

use crate::audio::{AudioSink, Cue};
use crate::brain_age::{classify, BrainAge};
use crate::clock::secs_between;
use crate::config::GameConfig;
use crate::input::{InputEvent, Key};
use crate::ledger::RankingLedger;
use crate::resolver::{self, Outcome};
use crate::scoring::{Grade, ScoreDelta};
use crate::session::{Feedback, Flash, Phase, PlayStage, SessionState, Timed};
use crate::stats::LatencySummary;
use crate::stimulus::{Bounds, StimulusSequencer, StimulusSlot};
use crate::store::{PersistedState, Settings, StateStore};

/// Play region used until the front end reports the real one
pub const DEFAULT_PLAY_AREA: Bounds = Bounds::new(2, 4, 76, 17);
pub const VOLUME_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SettingsItem {
    #[strum(serialize = "BGM")]
    Bgm,
    #[strum(serialize = "BGM VOLUME")]
    BgmVolume,
    #[strum(serialize = "SFX VOLUME")]
    SfxVolume,
    #[strum(serialize = "BACK")]
    Back,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 4] = [
        SettingsItem::Bgm,
        SettingsItem::BgmVolume,
        SettingsItem::SfxVolume,
        SettingsItem::Back,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|i| *i == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub struct Game {
    config: GameConfig,
    session: SessionState,
    persisted: PersistedState,
    sequencer: StimulusSequencer,
    rng: StdRng,
    store: Option<Box<dyn StateStore>>,
    audio: Option<Box<dyn AudioSink>>,
    play_area: Bounds,
    settings_cursor: SettingsItem,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("persisted", &self.persisted)
            .field("sequencer", &self.sequencer)
            .field("has_store", &self.store.is_some())
            .field("has_audio", &self.audio.is_some())
            .field("play_area", &self.play_area)
            .finish()
    }
}

impl Game {
    pub fn new(config: GameConfig, persisted: PersistedState) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sequencer =
            StimulusSequencer::build(config.valid_slots, config.distractor_slots, &mut rng);
        Self {
            config,
            session: SessionState::default(),
            persisted,
            sequencer,
            rng,
            store: None,
            audio: None,
            play_area: DEFAULT_PLAY_AREA,
            settings_cursor: SettingsItem::Bgm,
        }
    }

    /// Load rankings and settings from `store` and keep flushing to it
    pub fn load(config: GameConfig, store: Box<dyn StateStore>) -> Self {
        let persisted = store.load();
        info!(
            "loaded {} ranking entries, bgm {}",
            persisted.rankings.len(),
            if persisted.settings.bgm_enabled { "on" } else { "off" }
        );
        Self::new(config, persisted).with_store(store)
    }

    pub fn with_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_audio(mut self, mut audio: Box<dyn AudioSink>) -> Self {
        if let Err(err) = audio.apply_settings(&self.persisted.settings) {
            warn!("audio rejected settings: {err}");
        }
        self.audio = Some(audio);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn ledger(&self) -> &RankingLedger {
        &self.persisted.rankings
    }

    pub fn settings(&self) -> &Settings {
        &self.persisted.settings
    }

    pub fn sequencer(&self) -> &StimulusSequencer {
        &self.sequencer
    }

    pub fn settings_cursor(&self) -> SettingsItem {
        self.settings_cursor
    }

    pub fn play_area(&self) -> Bounds {
        self.play_area
    }

    /// Region new slots are placed in; slots already on screen keep their spot
    pub fn set_play_area(&mut self, area: Bounds) {
        self.play_area = area;
    }

    pub fn active_slot(&self) -> Option<&StimulusSlot> {
        self.session.live_slot()
    }

    pub fn brain_age(&self) -> BrainAge {
        classify(self.session.score(), self.session.avg_latency())
    }

    pub fn latency_summary(&self) -> Option<LatencySummary> {
        LatencySummary::from_samples(self.session.latencies())
    }

    pub fn has_exited(&self) -> bool {
        self.session.phase == Phase::Exit
    }

    /// One frame: timers first, then the (optional) input drained this frame.
    /// A press in the frame that ends the session belongs to the playing loop
    /// and is dropped, so results get at least one frame on screen.
    pub fn advance(&mut self, now: Instant, input: Option<InputEvent>) {
        let before = self.session.phase;
        self.update(now);
        if before != self.session.phase && self.session.phase == Phase::Results {
            return;
        }
        if let Some(event) = input {
            self.handle_input(event, now);
        }
    }

    /// Fire every deadline that has passed by `now`
    pub fn update(&mut self, now: Instant) {
        match self.session.phase {
            Phase::Countdown => self.update_countdown(now),
            Phase::Playing => self.update_playing(now),
            Phase::NameEntry
            | Phase::Instructions
            | Phase::Results
            | Phase::Rankings
            | Phase::Settings
            | Phase::Exit => {}
        }
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        match self.session.phase {
            Phase::NameEntry => self.on_name_entry(event),
            Phase::Instructions => self.start_countdown(now),
            Phase::Countdown => {}
            Phase::Playing => self.on_playing(event, now),
            Phase::Results => {
                self.cue(Cue::Nav);
                self.transition(Phase::Rankings);
            }
            Phase::Rankings => self.on_rankings(event),
            Phase::Settings => self.on_settings(event),
            Phase::Exit => {}
        }
    }

    fn transition(&mut self, to: Phase) {
        info!("phase {} -> {}", self.session.phase, to);
        self.session.phase = to;
    }

    fn cue(&mut self, cue: Cue) {
        if let Some(audio) = self.audio.as_mut() {
            if let Err(err) = audio.play(cue) {
                debug!("cue {cue} skipped: {err}");
            }
        }
    }

    fn persist(&self) {
        if let Some(store) = self.store.as_ref() {
            if let Err(err) = store.save(&self.persisted) {
                warn!("failed to save game data: {err}");
            }
        }
    }

    fn on_name_entry(&mut self, event: InputEvent) {
        let InputEvent::Key(key) = event else {
            return;
        };
        match key {
            Key::Enter => {
                let name = self.session.player_name.trim().to_string();
                if name.is_empty() {
                    return;
                }
                self.session.player_name = name;
                self.cue(Cue::KeyEnter);
                self.cue(Cue::Nav);
                self.transition(Phase::Instructions);
            }
            Key::Backspace => {
                if self.session.player_name.pop().is_some() {
                    self.cue(Cue::KeyBackspace);
                }
            }
            Key::Char(c) if !c.is_control() => {
                let mut candidate = self.session.player_name.clone();
                candidate.push(c);
                if candidate.width() <= self.config.max_name_width {
                    self.session.player_name = candidate;
                    self.cue(Cue::KeyTap);
                }
            }
            _ => {}
        }
    }

    fn start_countdown(&mut self, now: Instant) {
        self.session.countdown_started_at = Some(now);
        self.session.countdown_current = i64::from(self.config.countdown_from);
        self.cue(Cue::CountdownTick);
        self.transition(Phase::Countdown);
    }

    fn update_countdown(&mut self, now: Instant) {
        let Some(started) = self.session.countdown_started_at else {
            self.session.countdown_started_at = Some(now);
            return;
        };
        let elapsed = secs_between(started, now).floor() as i64;
        let current = i64::from(self.config.countdown_from) - elapsed;
        if current < 0 {
            self.start_playing(now);
        } else if current != self.session.countdown_current {
            self.session.countdown_current = current;
            if current > 0 {
                self.cue(Cue::CountdownTick);
            }
        }
    }

    fn start_playing(&mut self, now: Instant) {
        self.session.countdown_started_at = None;
        self.session.active_slot = None;
        self.session.stage = PlayStage::Interval;
        self.session.phase_deadline = Some(now + self.config.go_delay);
        self.cue(Cue::GameStart);
        info!(
            "session started for {} with {} slots",
            self.session.player_name,
            self.sequencer.len()
        );
        self.transition(Phase::Playing);
    }

    fn update_playing(&mut self, now: Instant) {
        let due = self.session.phase_deadline.map_or(true, |d| now >= d);
        if !due {
            return;
        }
        match self.session.stage {
            PlayStage::SlotVisible => {
                let outcome = match self.session.active_slot.as_mut() {
                    Some(slot) => resolver::expire(slot),
                    None => Outcome::Ignored,
                };
                self.apply_outcome(outcome, now);
                self.enter_interval(now);
            }
            PlayStage::Interval => self.show_next_slot(now),
        }
    }

    fn show_next_slot(&mut self, now: Instant) {
        match self
            .sequencer
            .next(self.session.slot_index, self.play_area, &mut self.rng)
        {
            Ok(slot) => {
                self.session.slot_index += 1;
                debug!(
                    "slot {}/{}: {} block labelled {}{}",
                    self.session.slot_index,
                    self.sequencer.len(),
                    slot.target_color,
                    slot.displayed_label_color,
                    if slot.is_distractor { " (distractor)" } else { "" }
                );
                self.session.active_slot = Some(slot);
                self.session.stage = PlayStage::SlotVisible;
                self.session.slot_shown_at = Some(now);
                self.session.phase_deadline = Some(now + self.config.block_duration);
            }
            Err(exhausted) => {
                debug!("{exhausted}");
                self.finish();
            }
        }
    }

    fn enter_interval(&mut self, now: Instant) {
        self.session.stage = PlayStage::Interval;
        self.session.phase_deadline = Some(now + self.config.interval_after(self.session.slot_index));
    }

    fn on_playing(&mut self, event: InputEvent, now: Instant) {
        let elapsed = self
            .session
            .slot_shown_at
            .map_or(0.0, |shown| secs_between(shown, now));
        let slot = match self.session.stage {
            PlayStage::SlotVisible => self.session.active_slot.as_mut(),
            PlayStage::Interval => None,
        };
        let outcome = resolver::resolve(&event, slot, elapsed);
        if outcome == Outcome::Ignored {
            return;
        }
        self.apply_outcome(outcome, now);
        self.enter_interval(now);
        self.persist();
    }

    fn apply_outcome(&mut self, outcome: Outcome, now: Instant) -> ScoreDelta {
        let delta = self.session.tally.apply(&outcome);
        let cfg = &self.config;
        match outcome {
            Outcome::CorrectValid { latency } => {
                self.session.feedback = Some(Timed::new(
                    Feedback::Gain {
                        points: delta.points(),
                        perfect: delta.is_perfect(),
                    },
                    now + cfg.feedback_display,
                ));
                self.session.flash = Some(Timed::new(
                    Flash::Latency(latency),
                    now + cfg.latency_display,
                ));
                if let Some(streak) = delta.combo {
                    self.session.combo = Some(Timed::new(streak, now + cfg.combo_display));
                }
                debug!(
                    "hit in {latency:.3}s ({}), +{}, streak {}",
                    delta.grade.map_or_else(String::new, |g| g.to_string()),
                    delta.points(),
                    self.session.streak()
                );
                match delta.grade {
                    Some(Grade::Perfect) => self.cue(Cue::Perfect),
                    Some(Grade::Good) => self.cue(Cue::Good),
                    Some(Grade::Slow) | None => self.cue(Cue::KeyTap),
                }
                if delta.combo.is_some() {
                    self.cue(Cue::Combo);
                }
            }
            Outcome::WrongOrDistractorHit { latency } => {
                self.session.feedback = Some(Timed::new(
                    Feedback::Penalty {
                        points: delta.points(),
                    },
                    now + cfg.feedback_display,
                ));
                self.session.flash = Some(Timed::new(
                    Flash::Latency(latency),
                    now + cfg.latency_display,
                ));
                debug!("wrong response in {latency:.3}s, score {}", self.session.score());
                self.cue(Cue::Wrong);
            }
            Outcome::TimeoutMiss => {
                self.session.flash = Some(Timed::new(Flash::Miss, now + cfg.latency_display));
                debug!("slot {} missed", self.session.slot_index);
                self.cue(Cue::Miss);
            }
            Outcome::Ignored => {}
        }
        delta
    }

    fn finish(&mut self) {
        self.session.active_slot = None;
        self.session.phase_deadline = None;
        let name = self.session.player_name.clone();
        let score = self.session.score();
        let avg = self.session.avg_latency();
        if self.persisted.rankings.record(&name, score, avg) {
            info!(
                "recorded {name}: score {score}, avg {}",
                avg.map_or_else(|| "n/a".to_string(), |a| format!("{a:.3}s"))
            );
        } else {
            info!("{name} already ranked, keeping the first result");
        }
        self.persist();
        self.cue(Cue::GameOver);
        self.transition(Phase::Results);
    }

    fn on_rankings(&mut self, event: InputEvent) {
        let InputEvent::Key(key) = event else {
            return;
        };
        self.cue(Cue::Nav);
        match key {
            Key::Escape => self.transition(Phase::Exit),
            Key::Char('s') | Key::Char('S') => {
                self.settings_cursor = SettingsItem::Bgm;
                self.transition(Phase::Settings);
            }
            _ => self.restart(),
        }
    }

    /// Fresh session for a new player: zeroed state, reshuffled sequence
    pub fn restart(&mut self) {
        self.session.reset();
        self.sequencer = StimulusSequencer::build(
            self.config.valid_slots,
            self.config.distractor_slots,
            &mut self.rng,
        );
        info!("session reset");
    }

    fn on_settings(&mut self, event: InputEvent) {
        let InputEvent::Key(key) = event else {
            return;
        };
        match key {
            Key::Escape => self.leave_settings(),
            Key::Up | Key::Char('w') => {
                self.settings_cursor = self.settings_cursor.prev();
                self.cue(Cue::Nav);
            }
            Key::Down | Key::Char('s') => {
                self.settings_cursor = self.settings_cursor.next();
                self.cue(Cue::Nav);
            }
            Key::Left | Key::Char('a') => self.adjust_volume(-VOLUME_STEP),
            Key::Right | Key::Char('d') => self.adjust_volume(VOLUME_STEP),
            Key::Enter | Key::Char(' ') => match self.settings_cursor {
                SettingsItem::Bgm => {
                    self.persisted.settings.bgm_enabled = !self.persisted.settings.bgm_enabled;
                    self.cue(Cue::KeyEnter);
                    self.settings_changed();
                }
                SettingsItem::Back => self.leave_settings(),
                SettingsItem::BgmVolume | SettingsItem::SfxVolume => {}
            },
            _ => {}
        }
    }

    fn adjust_volume(&mut self, delta: f64) {
        let settings = &mut self.persisted.settings;
        let slot = match self.settings_cursor {
            SettingsItem::BgmVolume => &mut settings.bgm_volume,
            SettingsItem::SfxVolume => &mut settings.sfx_volume,
            SettingsItem::Bgm | SettingsItem::Back => return,
        };
        *slot = step_volume(*slot, delta);
        self.cue(Cue::KeyTap);
        self.settings_changed();
    }

    fn settings_changed(&mut self) {
        let settings = self.persisted.settings;
        if let Some(audio) = self.audio.as_mut() {
            if let Err(err) = audio.apply_settings(&settings) {
                debug!("audio rejected settings: {err}");
            }
        }
        debug!("settings now {settings:?}");
        self.persist();
    }

    fn leave_settings(&mut self) {
        self.cue(Cue::Nav);
        self.persist();
        self.transition(Phase::Rankings);
    }
}

/// Add `delta`, round to hundredths, clamp to [0, 1]
pub fn step_volume(value: f64, delta: f64) -> f64 {
    (((value + delta) * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SharedCueLog;
    use crate::clock::{Clock, ManualClock};
    use crate::store::StoreError;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    fn game() -> (Game, SharedCueLog) {
        let cfg = GameConfig {
            seed: Some(11),
            ..GameConfig::default()
        };
        let log = SharedCueLog::default();
        let game = Game::new(cfg, PersistedState::default()).with_audio(Box::new(log.clone()));
        (game, log)
    }

    fn type_name(game: &mut Game, name: &str, now: Instant) {
        for c in name.chars() {
            game.handle_input(InputEvent::char(c), now);
        }
        game.handle_input(InputEvent::Key(Key::Enter), now);
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Name entered, countdown done, sitting in the GO delay
    fn playing_game(t0: Instant) -> (Game, SharedCueLog, Instant) {
        let (mut g, log) = game();
        type_name(&mut g, "ada", t0);
        g.handle_input(InputEvent::char('x'), t0);
        let go = t0 + ms(4000);
        g.update(go);
        assert_eq!(g.phase(), Phase::Playing);
        (g, log, go)
    }

    #[test]
    fn blank_name_does_not_advance() {
        let (mut g, _) = game();
        let now = Instant::now();
        g.handle_input(InputEvent::Key(Key::Enter), now);
        assert_eq!(g.phase(), Phase::NameEntry);
        type_name(&mut g, "   ", now);
        assert_eq!(g.phase(), Phase::NameEntry);
    }

    #[test]
    fn name_is_trimmed_and_editable() {
        let (mut g, log) = game();
        let now = Instant::now();
        for c in " bob".chars() {
            g.handle_input(InputEvent::char(c), now);
        }
        g.handle_input(InputEvent::Key(Key::Backspace), now);
        g.handle_input(InputEvent::char('x'), now);
        g.handle_input(InputEvent::Pointer { x: 1, y: 1 }, now);
        g.handle_input(InputEvent::Key(Key::Enter), now);
        assert_eq!(g.session().player_name, "box");
        assert_eq!(g.phase(), Phase::Instructions);
        let cues = log.played();
        assert!(cues.contains(&Cue::KeyBackspace));
        assert_eq!(&cues[cues.len() - 2..], &[Cue::KeyEnter, Cue::Nav]);
    }

    #[test]
    fn name_width_is_capped() {
        let (mut g, _) = game();
        let now = Instant::now();
        for _ in 0..40 {
            g.handle_input(InputEvent::char('w'), now);
        }
        assert_eq!(g.session().player_name.width(), g.config().max_name_width);
    }

    #[test]
    fn countdown_ticks_each_second_then_plays() {
        let (mut g, log) = game();
        let t0 = Instant::now();
        type_name(&mut g, "ada", t0);
        g.handle_input(InputEvent::Pointer { x: 0, y: 0 }, t0);
        assert_eq!(g.phase(), Phase::Countdown);
        assert_eq!(g.session().countdown_current, 3);

        g.update(t0 + ms(999));
        assert_eq!(g.session().countdown_current, 3);
        g.update(t0 + ms(1000));
        assert_eq!(g.session().countdown_current, 2);
        g.update(t0 + ms(2500));
        assert_eq!(g.session().countdown_current, 1);
        g.update(t0 + ms(3200));
        assert_eq!(g.session().countdown_current, 0);
        assert_eq!(g.phase(), Phase::Countdown);

        // input during the countdown is ignored
        g.handle_input(InputEvent::char('r'), t0 + ms(3300));
        assert_eq!(g.phase(), Phase::Countdown);

        g.update(t0 + ms(4000));
        assert_eq!(g.phase(), Phase::Playing);
        assert!(g.active_slot().is_none());

        let ticks = log.played().iter().filter(|c| **c == Cue::CountdownTick).count();
        assert_eq!(ticks, 3);
        assert_eq!(log.played().last(), Some(&Cue::GameStart));
    }

    #[test]
    fn go_delay_precedes_first_slot() {
        let (mut g, _, go) = playing_game(Instant::now());
        g.update(go + ms(599));
        assert!(g.active_slot().is_none());
        g.update(go + ms(600));
        assert!(g.active_slot().is_some());
        assert_eq!(g.session().slot_index, 1);
    }

    #[test]
    fn unanswered_slot_expires_after_block_duration() {
        let (mut g, log, go) = playing_game(Instant::now());
        let shown = go + ms(600);
        g.update(shown);
        let distractor = g.active_slot().unwrap().is_distractor;

        g.update(shown + ms(799));
        assert!(g.active_slot().is_some());
        g.update(shown + ms(800));
        assert!(g.active_slot().is_none());
        assert_eq!(g.session().stage, PlayStage::Interval);
        assert_eq!(g.session().phase_deadline, Some(shown + ms(800) + ms(3000)));
        assert_eq!(g.session().score(), 0);
        assert_eq!(log.played().contains(&Cue::Miss), !distractor);
    }

    #[test]
    fn response_ends_window_early_and_second_press_is_ignored() {
        let (mut g, _, go) = playing_game(Instant::now());
        let shown = go + ms(600);
        g.update(shown);
        let key = g.active_slot().unwrap().correct_response_key;
        let respond_at = shown + ms(300);
        g.handle_input(InputEvent::char(key), respond_at);
        let after_first = g.session().tally.clone();
        assert_eq!(after_first.latencies.len(), 1);
        assert!((after_first.latencies[0] - 0.3).abs() < 1e-9);
        assert_eq!(g.session().stage, PlayStage::Interval);
        assert_eq!(g.session().phase_deadline, Some(respond_at + ms(3000)));

        g.handle_input(InputEvent::char(key), respond_at + ms(10));
        assert_eq!(g.session().tally, after_first);
    }

    #[test]
    fn timers_run_before_input_in_a_frame() {
        let (mut g, _, go) = playing_game(Instant::now());
        let shown = go + ms(600);
        g.update(shown);
        let key = g.active_slot().unwrap().correct_response_key;
        // the press arrives in the same frame the window closes
        g.advance(shown + ms(800), Some(InputEvent::char(key)));
        assert!(g.session().latencies().is_empty());
        assert_eq!(g.session().score(), 0);
    }

    #[test]
    fn input_between_slots_is_ignored() {
        let (mut g, _, go) = playing_game(Instant::now());
        g.handle_input(InputEvent::char('r'), go + ms(100));
        assert_eq!(g.session().score(), 0);
        assert!(g.session().latencies().is_empty());
    }

    #[test]
    fn combo_banner_expires_after_fixed_time() {
        let cfg = GameConfig {
            valid_slots: 3,
            distractor_slots: 0,
            seed: Some(5),
            ..GameConfig::default()
        };
        let mut g = Game::new(cfg, PersistedState::default());
        let t0 = Instant::now();
        type_name(&mut g, "z", t0);
        g.handle_input(InputEvent::char(' '), t0);
        let mut now = t0 + ms(4000);
        g.update(now);
        for _ in 0..2 {
            while g.active_slot().is_none() {
                now += ms(100);
                g.update(now);
            }
            let key = g.active_slot().unwrap().correct_response_key;
            now += ms(350);
            g.handle_input(InputEvent::char(key), now);
        }
        let combo = g.session().combo.unwrap();
        assert_eq!(combo.value, 2);
        assert_eq!(combo.visible_at(now + ms(1499)), Some(2));
        assert_eq!(combo.visible_at(now + ms(1500)), None);
    }

    #[test]
    fn rankings_navigation() {
        let (mut g, _) = game();
        g.session.phase = Phase::Rankings;
        g.handle_input(InputEvent::Pointer { x: 3, y: 3 }, Instant::now());
        assert_eq!(g.phase(), Phase::Rankings);
        g.handle_input(InputEvent::char('s'), Instant::now());
        assert_eq!(g.phase(), Phase::Settings);
        g.handle_input(InputEvent::Key(Key::Escape), Instant::now());
        assert_eq!(g.phase(), Phase::Rankings);
        g.handle_input(InputEvent::Key(Key::Escape), Instant::now());
        assert!(g.has_exited());
    }

    #[test]
    fn settings_adjust_and_clamp() {
        let (mut g, log) = game();
        let now = Instant::now();
        g.session.phase = Phase::Settings;

        g.handle_input(InputEvent::Key(Key::Enter), now);
        assert!(!g.settings().bgm_enabled);

        g.handle_input(InputEvent::Key(Key::Down), now);
        assert_eq!(g.settings_cursor(), SettingsItem::BgmVolume);
        for _ in 0..20 {
            g.handle_input(InputEvent::Key(Key::Right), now);
        }
        assert_eq!(g.settings().bgm_volume, 1.0);

        g.handle_input(InputEvent::char('s'), now);
        for _ in 0..3 {
            g.handle_input(InputEvent::char('a'), now);
        }
        assert!((g.settings().sfx_volume - 0.7).abs() < 1e-9);
        assert_eq!(log.settings().map(|s| s.sfx_volume), Some(g.settings().sfx_volume));

        // Enter on a volume row does nothing
        g.handle_input(InputEvent::Key(Key::Enter), now);
        assert_eq!(g.phase(), Phase::Settings);

        g.handle_input(InputEvent::Key(Key::Up), now);
        g.handle_input(InputEvent::Key(Key::Up), now);
        g.handle_input(InputEvent::Key(Key::Up), now);
        assert_eq!(g.settings_cursor(), SettingsItem::Back);
        g.handle_input(InputEvent::char(' '), now);
        assert_eq!(g.phase(), Phase::Rankings);
    }

    #[test]
    fn settings_cursor_wraps() {
        assert_eq!(SettingsItem::Back.next(), SettingsItem::Bgm);
        assert_eq!(SettingsItem::Bgm.prev(), SettingsItem::Back);
        assert_eq!(SettingsItem::BgmVolume.to_string(), "BGM VOLUME");
    }

    #[test]
    fn volume_steps_round_and_clamp() {
        assert_eq!(step_volume(0.22, 0.1), 0.32);
        assert_eq!(step_volume(0.05, -0.1), 0.0);
        assert_eq!(step_volume(0.95, 0.1), 1.0);
    }

    #[test]
    fn press_in_the_frame_that_ends_the_session_keeps_results_up() {
        let cfg = GameConfig {
            valid_slots: 1,
            distractor_slots: 0,
            seed: Some(3),
            ..GameConfig::default()
        };
        let mut g = Game::new(cfg, PersistedState::default());
        let t0 = Instant::now();
        type_name(&mut g, "solo", t0);
        g.handle_input(InputEvent::char(' '), t0);
        let go = t0 + ms(4000);
        g.update(go);
        let shown = go + ms(600);
        g.update(shown);
        g.update(shown + ms(800));
        assert_eq!(g.phase(), Phase::Playing);

        g.advance(shown + ms(1800), Some(InputEvent::char('r')));
        assert_eq!(g.phase(), Phase::Results);

        g.advance(shown + ms(1820), Some(InputEvent::char('r')));
        assert_eq!(g.phase(), Phase::Rankings);
    }

    /// Counts saves, loads nothing
    struct CountingStore(Rc<Cell<usize>>);

    impl StateStore for CountingStore {
        fn load(&self) -> PersistedState {
            PersistedState::default()
        }

        fn save(&self, _: &PersistedState) -> Result<(), StoreError> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn scored_responses_are_saved_and_ignored_input_is_not() {
        let cfg = GameConfig {
            valid_slots: 1,
            distractor_slots: 1,
            seed: Some(12),
            ..GameConfig::default()
        };
        let saves = Rc::new(Cell::new(0));
        let mut g = Game::load(cfg, Box::new(CountingStore(saves.clone())));
        let clock = ManualClock::new();
        type_name(&mut g, "tally", clock.now());
        g.handle_input(InputEvent::char(' '), clock.now());
        clock.advance(ms(4000));
        g.update(clock.now());
        assert_eq!(g.phase(), Phase::Playing);
        assert_eq!(saves.get(), 0);

        // nothing on screen yet
        g.handle_input(InputEvent::char('r'), clock.now());
        assert_eq!(saves.get(), 0);

        let mut hit_valid = false;
        let mut hit_distractor = false;
        for answered in 1..=2 {
            while g.active_slot().is_none() {
                clock.advance(ms(100));
                g.update(clock.now());
            }
            // a click far from the block and outside the field
            g.handle_input(InputEvent::Pointer { x: 0, y: 0 }, clock.now());
            assert_eq!(saves.get(), answered - 1);

            let slot = g.active_slot().unwrap().clone();
            // slow enough to skip the perfect bonus
            clock.advance(ms(300));
            g.handle_input(InputEvent::char(slot.correct_response_key), clock.now());
            assert_eq!(saves.get(), answered);
            if slot.is_distractor {
                hit_distractor = true;
            } else {
                hit_valid = true;
            }

            // the slot is resolved; a second press changes nothing
            g.handle_input(InputEvent::char(slot.correct_response_key), clock.now());
            assert_eq!(saves.get(), answered);
        }
        assert!(hit_valid && hit_distractor);
        assert_eq!(g.session().score(), 0);
        assert_eq!(g.session().latencies().len(), 2);
    }
}
