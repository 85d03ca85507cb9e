use std::time::Duration;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::generator::LevelGenerator;
use crate::model::*;
use crate::puzzle::Puzzle;
use crate::settings::GameSettings;
use crate::timer::{Countdown, CountdownTick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Won,
    Failed,
}

/// Commands the UI dispatches into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SelectOrPour(TubeId),
    Undo,
    AddExtraTube,
    NewAttempt(u32),
    Restart,
}

/// Notifications the core raises for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Won,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    None,
    Tube(TubeId),
}

/// One try at one level: the tubes, the pour history, the clock and the outcome.
#[derive(Debug, Clone)]
pub struct Attempt {
    level: u32,
    puzzle: Puzzle,
    history: Vec<MoveRecord>,
    status: GameStatus,
    countdown: Countdown,
    selected: Selection,
    extra_tube_used: bool,
    tube_capacity: usize,
}

impl Attempt {
    /// Starts playing immediately; the countdown begins running.
    pub fn new(level: u32, puzzle: Puzzle, time_limit_secs: u32, tube_capacity: usize) -> Self {
        Self {
            level,
            puzzle,
            history: Vec::new(),
            status: GameStatus::Playing,
            countdown: Countdown::start(time_limit_secs),
            selected: Selection::None,
            extra_tube_used: false,
            tube_capacity,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn selected(&self) -> Option<TubeId> {
        match self.selected {
            Selection::Tube(id) => Some(id),
            Selection::None => None,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.status == GameStatus::Playing && !self.history.is_empty()
    }

    pub fn can_add_extra_tube(&self) -> bool {
        self.status == GameStatus::Playing && !self.extra_tube_used
    }

    /// Applies an in-attempt command. `NewAttempt` and `Restart` belong to the
    /// [`Session`] and are ignored here.
    pub fn handle_command(&mut self, command: Command) -> Option<GameEvent> {
        match command {
            Command::SelectOrPour(id) => self.select_or_pour(id),
            Command::Undo => {
                self.undo();
                None
            }
            Command::AddExtraTube => {
                self.add_extra_tube();
                None
            }
            Command::NewAttempt(_) | Command::Restart => None,
        }
    }

    /// First click selects a tube with liquid, a second click on it deselects, a click
    /// on another tube pours or re-targets.
    pub fn select_or_pour(&mut self, id: TubeId) -> Option<GameEvent> {
        if self.status != GameStatus::Playing {
            return None;
        }
        let clicked = self.puzzle.tube(id)?;

        match self.selected {
            Selection::None => {
                if !clicked.is_empty() {
                    self.selected = Selection::Tube(id);
                }
                None
            }
            Selection::Tube(from) if from == id => {
                self.selected = Selection::None;
                None
            }
            Selection::Tube(from) => {
                let top = self.puzzle.tube(from).and_then(Tube::get_top_fluid);
                if !clicked.is_empty() && clicked.get_top_fluid() != top {
                    self.selected = Selection::Tube(id);
                    return None;
                }
                self.selected = Selection::None;
                let record = self.puzzle.pour(from, id)?;
                debug!(
                    "Poured {} x{} from tube {} to tube {}",
                    record.color, record.count, record.from, record.to
                );
                self.history.push(record);
                self.check_win()
            }
        }
    }

    /// Reverses the most recent pour. There is no redo.
    pub fn undo(&mut self) -> bool {
        if self.status != GameStatus::Playing {
            return false;
        }
        let Some(record) = self.history.pop() else {
            return false;
        };
        self.selected = Selection::None;
        if !self.puzzle.revert(&record) {
            self.history.push(record);
            return false;
        }
        true
    }

    /// Adds one empty tube, once per attempt.
    pub fn add_extra_tube(&mut self) -> Option<TubeId> {
        if !self.can_add_extra_tube() {
            return None;
        }
        let id = self.puzzle.add_tube(self.tube_capacity);
        self.extra_tube_used = true;
        info!("Extra tube {id} added on level {}", self.level);
        Some(id)
    }

    /// Feeds elapsed time into the countdown. Reaching zero fails the attempt.
    pub fn tick(&mut self, elapsed: Duration) -> Option<GameEvent> {
        if self.status != GameStatus::Playing {
            self.countdown.cancel();
            return None;
        }
        match self.countdown.advance(elapsed) {
            CountdownTick::Expired => {
                self.status = GameStatus::Failed;
                self.selected = Selection::None;
                info!("Level {} timed out", self.level);
                Some(GameEvent::TimedOut)
            }
            CountdownTick::Ticked(_) | CountdownTick::Idle => None,
        }
    }

    /// Stops the clock; used when the attempt is torn down.
    pub fn cancel(&mut self) {
        self.countdown.cancel();
    }

    fn check_win(&mut self) -> Option<GameEvent> {
        if self.status != GameStatus::Playing || !self.puzzle.is_solved() {
            return None;
        }
        self.status = GameStatus::Won;
        self.selected = Selection::None;
        self.countdown.cancel();
        info!(
            "Level {} won with {}s left after {} pours",
            self.level,
            self.countdown.remaining(),
            self.history.len()
        );
        Some(GameEvent::Won)
    }
}

/// Drives attempts across levels. Owns the level generator and the current attempt.
pub struct Session<R: Rng = Pcg32> {
    generator: LevelGenerator<R>,
    attempt: Attempt,
}

impl Session<Pcg32> {
    /// Seeds from the settings, or from the OS when no seed is configured.
    pub fn new(settings: GameSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_os_rng(),
        };
        Self::with_rng(settings, rng)
    }
}

impl<R: Rng> Session<R> {
    pub fn with_rng(settings: GameSettings, rng: R) -> Self {
        let level = settings.starting_level.max(1);
        let mut generator = LevelGenerator::new(settings, rng);
        let attempt = Self::build_attempt(&mut generator, level);
        Self { generator, attempt }
    }

    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    pub fn level(&self) -> u32 {
        self.attempt.level()
    }

    pub fn status(&self) -> GameStatus {
        self.attempt.status()
    }

    pub fn settings(&self) -> &GameSettings {
        self.generator.settings()
    }

    pub fn handle_command(&mut self, command: Command) -> Option<GameEvent> {
        match command {
            Command::NewAttempt(level) => {
                self.begin_attempt(level);
                None
            }
            Command::Restart => {
                self.begin_attempt(self.attempt.level());
                None
            }
            other => self.attempt.handle_command(other),
        }
    }

    /// By-value form of [`Session::handle_command`].
    pub fn step(mut self, command: Command) -> (Self, Option<GameEvent>) {
        let event = self.handle_command(command);
        (self, event)
    }

    pub fn tick(&mut self, elapsed: Duration) -> Option<GameEvent> {
        self.attempt.tick(elapsed)
    }

    /// Tears the current attempt down (its clock stops first) and generates a fresh one.
    fn begin_attempt(&mut self, level: u32) {
        self.attempt.cancel();
        self.attempt = Self::build_attempt(&mut self.generator, level.max(1));
    }

    fn build_attempt(generator: &mut LevelGenerator<R>, level: u32) -> Attempt {
        let tubes = generator.generate_level(level);
        let time_limit = generator.get_time_for_level(level);
        let capacity = generator.settings().tube_capacity;
        info!(
            "Starting level {level}: {} tubes, {time_limit}s on the clock",
            tubes.len()
        );
        Attempt::new(level, Puzzle::new(tubes), time_limit, capacity)
    }
}
