//! Water Sort - pour colored liquid between tubes until every tube holds one color.
//!
//! Core modules (no rendering dependencies):
//! - `generator`: solvable level generation and per-level time budgets
//! - `puzzle`: tube store, pour legality and win detection
//! - `gameplay`: per-attempt state machine and the level-spanning session
//! - `timer`: attempt countdown
//! - `solver`: breadth-first solvability search
//! - `settings`: TOML-backed tunables

pub mod error;
pub mod gameplay;
pub mod generator;
pub mod model;
pub mod puzzle;
pub mod settings;
pub mod shuffle;
pub mod solver;
pub mod timer;

pub use error::{ConfigError, ReprError};
pub use gameplay::{Attempt, Command, GameEvent, GameStatus, Session};
pub use generator::{LevelGenerator, LevelParams};
pub use model::{FluidColor, MoveRecord, Tube, TubeId};
pub use puzzle::Puzzle;
pub use settings::GameSettings;
pub use solver::{PourStep, SolveOutcome, Solver};
pub use timer::{Countdown, TimeBand};
