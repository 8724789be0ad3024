use brainage::{
    app_dirs::AppDirs,
    audio::TerminalBell,
    clock::{Clock, MonotonicClock},
    config::{GameConfig, DEFAULT_DISTRACTOR_SLOTS, DEFAULT_VALID_SLOTS},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    store::{JsonFileStore, StateStore},
    ui::{play_area, GameView},
    Game,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// color-word reaction game that guesses your brain age
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A color-word reaction game. Blocks flash up with a color name written on them: press the block's color key when word and color agree, hold still when they don't. Your score and reaction time earn you a brain age and a spot on the local leaderboard."
)]
pub struct Cli {
    /// number of slots whose word matches the block color
    #[clap(long, default_value_t = DEFAULT_VALID_SLOTS)]
    valid: usize,

    /// number of slots whose word names a different color
    #[clap(long, default_value_t = DEFAULT_DISTRACTOR_SLOTS)]
    distractors: usize,

    /// milliseconds each block stays on screen
    #[clap(long, default_value_t = 800)]
    block_ms: u64,

    /// milliseconds between blocks
    #[clap(long, default_value_t = 3000)]
    interval_ms: u64,

    /// fixed seed for a reproducible block sequence
    #[clap(long)]
    seed: Option<u64>,

    /// rankings and settings file (default: ~/.local/state/brainage/data.json)
    #[clap(long, value_name = "PATH")]
    data_file: Option<PathBuf>,

    /// play without writing rankings or settings back to disk
    #[clap(long)]
    no_save: bool,

    /// ring the terminal bell on hits, misses and the countdown
    #[clap(long)]
    bell: bool,

    /// write the leaderboard as CSV to PATH ("-" for stdout) and exit
    #[clap(long, value_name = "PATH")]
    export_rankings: Option<PathBuf>,
}

impl Cli {
    fn to_game_config(&self) -> GameConfig {
        GameConfig {
            valid_slots: self.valid,
            distractor_slots: self.distractors,
            block_duration: Duration::from_millis(self.block_ms),
            block_interval: Duration::from_millis(self.interval_ms),
            seed: self.seed,
            ..GameConfig::default()
        }
    }

    fn store(&self) -> JsonFileStore {
        match &self.data_file {
            Some(path) => JsonFileStore::with_path(path),
            None => JsonFileStore::new(),
        }
    }

    fn log_path(&self) -> Option<PathBuf> {
        match &self.data_file {
            Some(path) => Some(
                path.parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join("brainage.log"),
            ),
            None => AppDirs::log_path(),
        }
    }
}

pub struct App {
    pub game: Game,
}

impl App {
    pub fn new(cli: &Cli) -> Self {
        let config = cli.to_game_config();
        let store = cli.store();
        let mut game = if cli.no_save {
            Game::new(config, store.load())
        } else {
            Game::load(config, Box::new(store))
        };

        if cli.bell {
            match TerminalBell::probe() {
                Ok(bell) => game = game.with_audio(Box::new(bell)),
                Err(err) => tracing::warn!("bell disabled: {err}"),
            }
        }

        Self { game }
    }
}

fn init_tracing(log_path: Option<PathBuf>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = log_path.and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
            .map(|file| (path, file))
    });

    match file {
        Some((path, file)) => {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .try_init();
            tracing::info!(path = %path.display(), "logging initialized");
        }
        // stdout belongs to the TUI; no log file means no logs
        None => {
            let _ = tracing_subscriber::registry().with(env_filter).try_init();
        }
    }
}

fn export_rankings(cli: &Cli, target: &Path) -> Result<(), Box<dyn Error>> {
    let state = cli.store().load();
    if target == Path::new("-") {
        state.rankings.write_csv(io::stdout().lock())?;
    } else {
        state.rankings.write_csv(File::create(target)?)?;
    }
    tracing::info!("exported {} ranking entries", state.rankings.len());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_path());

    if let Some(target) = &cli.export_rankings {
        return export_rankings(&cli, target);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(&cli);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    io::stdout().flush()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let clock = MonotonicClock;

    loop {
        let event = runner.step();
        let now = clock.now();

        match event {
            GameEvent::Interrupt => {
                tracing::info!("interrupted");
                break;
            }
            GameEvent::Input(input) => app.game.advance(now, Some(input)),
            GameEvent::Tick | GameEvent::Resize => app.game.advance(now, None),
        }

        if app.game.has_exited() {
            break;
        }

        if let Err(err) = terminal.draw(|f| ui(app, f, now)) {
            tracing::warn!("frame dropped: {err}");
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame, now: Instant) {
    let area = f.area();
    app.game.set_play_area(play_area(area));
    f.render_widget(&GameView::new(&app.game, now), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_game_defaults() {
        let cli = Cli::parse_from(["brainage"]);
        assert_eq!(cli.to_game_config(), GameConfig::default());
        assert!(!cli.no_save);
        assert!(!cli.bell);
    }

    #[test]
    fn cli_overrides_shape_the_session() {
        let cli = Cli::parse_from([
            "brainage",
            "--valid",
            "3",
            "--distractors",
            "1",
            "--block-ms",
            "500",
            "--interval-ms",
            "1000",
            "--seed",
            "9",
        ]);
        let cfg = cli.to_game_config();
        assert_eq!(cfg.total_slots(), 4);
        assert_eq!(cfg.block_duration, Duration::from_millis(500));
        assert_eq!(cfg.block_interval, Duration::from_millis(1000));
        assert_eq!(cfg.seed, Some(9));
    }

    #[test]
    fn log_file_sits_beside_custom_data_file() {
        let cli = Cli::parse_from(["brainage", "--data-file", "/tmp/x/data.json"]);
        assert_eq!(cli.log_path(), Some(PathBuf::from("/tmp/x/brainage.log")));
    }

    #[test]
    fn no_save_game_has_no_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let cli = Cli::parse_from([
            "brainage",
            "--no-save",
            "--data-file",
            path.to_str().unwrap(),
        ]);
        let app = App::new(&cli);
        assert!(app.game.ledger().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
