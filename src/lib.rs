// Library surface: the headless game core plus the screens that draw it.
// The binary in main.rs only adds the CLI, terminal setup and frame loop.
pub mod app_dirs;
pub mod audio;
pub mod brain_age;
pub mod clock;
pub mod config;
pub mod game;
pub mod input;
pub mod ledger;
pub mod resolver;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stats;
pub mod stimulus;
pub mod store;
pub mod ui;

pub use game::Game;
pub use session::Phase;
