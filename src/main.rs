mod app;
mod controls;
mod renderer;

use std::path::PathBuf;

use log::error;
use macroquad::prelude::*;
use water_sort::GameSettings;

use crate::app::GameApp;
use crate::controls::ControlAction;

const DEFAULT_SETTINGS_FILE: &str = "water_sort.toml";

/// Settings from the path given as first argument, else `water_sort.toml` if present.
fn load_settings() -> GameSettings {
    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let path = match explicit {
        Some(path) => path,
        None => {
            let path = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !path.exists() {
                return GameSettings::default();
            }
            path
        }
    };
    match GameSettings::load(&path) {
        Ok(settings) => settings,
        Err(err) => {
            error!("{err}; using default settings");
            GameSettings::default()
        }
    }
}

#[macroquad::main("Water Sort")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let mut app = GameApp::new(load_settings());
    loop {
        app.update(get_frame_time());
        app.render();
        if is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            app.handle_click(x, y);
        }
        let shortcuts = [
            (KeyCode::U, ControlAction::Undo),
            (KeyCode::T, ControlAction::AddTube),
            (KeyCode::R, ControlAction::Restart),
            (KeyCode::C, ControlAction::CopyState),
            (KeyCode::S, ControlAction::CheckSolvable),
        ];
        for (key, action) in shortcuts {
            if is_key_pressed(key) {
                app.handle_action(action);
            }
        }
        next_frame().await;
    }
}
