use std::time::Duration;

use clipboard_rs::{Clipboard, ClipboardContext};
use log::{info, warn};
use macroquad::prelude::Color;
use water_sort::solver::solve;
use water_sort::{Command, GameEvent, GameSettings, GameStatus, Session, SolveOutcome};

use crate::controls::{Button, ControlAction, HitItem};
use crate::renderer::{FLUID_COLORS, Frame, Renderer};

/// Glue between macroquad input, the game session and the renderer.
pub struct GameApp {
    session: Session,
    renderer: Renderer,
    advance_in: Option<f32>,
}

impl GameApp {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            session: Session::new(settings),
            renderer: Renderer::new(),
            advance_in: None,
        }
    }

    /// Advances the clock and any pending level change by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let elapsed = Duration::from_secs_f32(dt.max(0.0));
        let event = self.session.tick(elapsed);
        self.on_event(event);

        if let Some(remaining) = self.advance_in.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                let next = self.session.level() + 1;
                self.dispatch(Command::NewAttempt(next));
            }
        }
    }

    pub fn render(&mut self) {
        self.renderer.autoset_viewport();
        let attempt = self.session.attempt();
        let buttons = vec![
            (
                Button::new("Undo", ControlAction::Undo, Color::new(0.3, 0.3, 0.35, 1.0)),
                attempt.can_undo(),
            ),
            (
                Button::new("Tube", ControlAction::AddTube, FLUID_COLORS[1]),
                attempt.can_add_extra_tube(),
            ),
            (Button::new("Restart", ControlAction::Restart, FLUID_COLORS[0]), true),
            (Button::new("Copy", ControlAction::CopyState, FLUID_COLORS[5]), true),
        ];
        let frame = Frame {
            level: attempt.level(),
            status: attempt.status(),
            tubes: attempt.puzzle().tubes().collect(),
            selected: attempt.selected(),
            countdown: attempt.countdown(),
            buttons: &buttons,
        };
        self.renderer.render_game(&frame);
    }

    pub fn handle_click(&mut self, x: f32, y: f32) {
        let item = self
            .renderer
            .get_hit_test_registry()
            .hit_test(x, y)
            .map(|hit| hit.item);
        if let Some(item) = item {
            self.handle_hit_item(item);
        }
    }

    fn handle_hit_item(&mut self, item: HitItem) {
        match item {
            HitItem::Button { function } => self.handle_action(function),
            HitItem::Tube { id } => self.dispatch(Command::SelectOrPour(id)),
        }
    }

    pub fn handle_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::Undo => self.dispatch(Command::Undo),
            ControlAction::AddTube => self.dispatch(Command::AddExtraTube),
            ControlAction::Restart => self.dispatch(Command::Restart),
            ControlAction::CopyState => {
                let repr = self.session.attempt().puzzle().get_text_representation();
                self.set_clipboard(&repr);
            }
            ControlAction::CheckSolvable => self.check_solvable(),
        }
    }

    fn dispatch(&mut self, command: Command) {
        if matches!(command, Command::NewAttempt(_) | Command::Restart) {
            self.advance_in = None;
        }
        let event = self.session.handle_command(command);
        self.on_event(event);
    }

    fn on_event(&mut self, event: Option<GameEvent>) {
        match event {
            Some(GameEvent::Won) => {
                self.advance_in = Some(self.session.settings().advance_delay_secs);
            }
            Some(GameEvent::TimedOut) => {
                info!("Out of time on level {}", self.session.level());
            }
            None => {}
        }
    }

    fn check_solvable(&self) {
        let attempt = self.session.attempt();
        if attempt.status() != GameStatus::Playing {
            return;
        }
        let limit = self.session.settings().solver_state_limit.max(1) * 10;
        match solve(attempt.puzzle(), limit) {
            SolveOutcome::Solved(steps) => {
                info!("The current state is solvable in {} pours.", steps.len())
            }
            SolveOutcome::Unsolvable => info!("The current state is not solvable."),
            SolveOutcome::Inconclusive => info!("Gave up before deciding solvability."),
        }
    }

    fn set_clipboard(&self, content: &str) {
        match ClipboardContext::new() {
            Ok(ctx) => match ctx.set_text(content.to_string()) {
                Ok(()) => info!("Copied puzzle to clipboard"),
                Err(err) => warn!("Failed to write clipboard: {err}"),
            },
            Err(err) => warn!("Clipboard unavailable: {err}"),
        }
    }
}
