//! Game settings.
//!
//! Loaded from an optional TOML file; every field falls back to the standard game.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::MAX_PALETTE_SIZE;

/// Tunables for level generation, timing and progression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameSettings {
    /// Units per tube (default: 4).
    #[serde(default = "default_tube_capacity")]
    pub tube_capacity: usize,
    /// Number of distinct colors available (default: 12, at most 32).
    #[serde(default = "default_palette_size")]
    pub palette_size: usize,
    /// Colors used on level 1 (default: 3).
    #[serde(default = "default_base_colors")]
    pub base_colors: usize,
    /// Levels between each additional color (default: 3).
    #[serde(default = "default_levels_per_color")]
    pub levels_per_color: u32,
    /// Time granted regardless of level (default: 30s).
    #[serde(default = "default_base_time_secs")]
    pub base_time_secs: u32,
    /// Extra time per color in play (default: 15s).
    #[serde(default = "default_time_per_color_secs")]
    pub time_per_color_secs: u32,
    /// Scramble transfers on level 0 (default: 40).
    #[serde(default = "default_scramble_base")]
    pub scramble_base: usize,
    /// Additional scramble transfers per level (default: 7).
    #[serde(default = "default_scramble_per_level")]
    pub scramble_per_level: usize,
    /// Upper bound on scramble transfers (default: 250).
    #[serde(default = "default_scramble_cap")]
    pub scramble_cap: usize,
    /// Random tube pairs tried per scramble step before skipping it (default: 50).
    #[serde(default = "default_pair_attempts")]
    pub pair_attempts: usize,
    /// Fresh generations tried when a candidate comes out solved or unsolvable (default: 500).
    #[serde(default = "default_regenerate_attempts")]
    pub regenerate_attempts: usize,
    /// Run the solver on generated candidates and reject proven dead ends (default: true).
    #[serde(default = "default_verify_solvable")]
    pub verify_solvable: bool,
    /// States the solver may visit before giving up (default: 20000).
    #[serde(default = "default_solver_state_limit")]
    pub solver_state_limit: usize,
    /// Pause after a win before the next level starts (default: 2s).
    #[serde(default = "default_advance_delay_secs")]
    pub advance_delay_secs: f32,
    /// Level the first attempt starts on (default: 1).
    #[serde(default = "default_starting_level")]
    pub starting_level: u32,
    /// Fixed RNG seed; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default value functions
fn default_tube_capacity() -> usize {
    4
}

fn default_palette_size() -> usize {
    12
}

fn default_base_colors() -> usize {
    3
}

fn default_levels_per_color() -> u32 {
    3
}

fn default_base_time_secs() -> u32 {
    30
}

fn default_time_per_color_secs() -> u32 {
    15
}

fn default_scramble_base() -> usize {
    40
}

fn default_scramble_per_level() -> usize {
    7
}

fn default_scramble_cap() -> usize {
    250
}

fn default_pair_attempts() -> usize {
    50
}

fn default_regenerate_attempts() -> usize {
    500
}

fn default_verify_solvable() -> bool {
    true
}

fn default_solver_state_limit() -> usize {
    20_000
}

fn default_advance_delay_secs() -> f32 {
    2.0
}

fn default_starting_level() -> u32 {
    1
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            tube_capacity: default_tube_capacity(),
            palette_size: default_palette_size(),
            base_colors: default_base_colors(),
            levels_per_color: default_levels_per_color(),
            base_time_secs: default_base_time_secs(),
            time_per_color_secs: default_time_per_color_secs(),
            scramble_base: default_scramble_base(),
            scramble_per_level: default_scramble_per_level(),
            scramble_cap: default_scramble_cap(),
            pair_attempts: default_pair_attempts(),
            regenerate_attempts: default_regenerate_attempts(),
            verify_solvable: default_verify_solvable(),
            solver_state_limit: default_solver_state_limit(),
            advance_delay_secs: default_advance_delay_secs(),
            starting_level: default_starting_level(),
            seed: None,
        }
    }
}

impl GameSettings {
    /// Parse settings from TOML text and validate them.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: GameSettings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tube_capacity == 0 {
            return Err(ConfigError::Invalid("tube_capacity must be at least 1".into()));
        }
        if self.palette_size == 0 || self.palette_size > MAX_PALETTE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "palette_size must be between 1 and {MAX_PALETTE_SIZE}, got {}",
                self.palette_size
            )));
        }
        if self.base_colors == 0 {
            return Err(ConfigError::Invalid("base_colors must be at least 1".into()));
        }
        if self.levels_per_color == 0 {
            return Err(ConfigError::Invalid("levels_per_color must be at least 1".into()));
        }
        if self.advance_delay_secs.is_nan() || self.advance_delay_secs < 0.0 {
            return Err(ConfigError::Invalid("advance_delay_secs must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = GameSettings::from_toml_str("").unwrap();
        assert_eq!(settings, GameSettings::default());
        assert_eq!(settings.tube_capacity, 4);
        assert_eq!(settings.scramble_cap, 250);
        assert_eq!(settings.regenerate_attempts, 500);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let settings = GameSettings::from_toml_str("tube_capacity = 5\nseed = 99\n").unwrap();
        assert_eq!(settings.tube_capacity, 5);
        assert_eq!(settings.seed, Some(99));
        assert_eq!(settings.palette_size, 12);
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(matches!(
            GameSettings::from_toml_str("tube_capacity = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GameSettings::from_toml_str("palette_size = 33"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GameSettings::from_toml_str("levels_per_color = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reports_parse_errors() {
        assert!(matches!(
            GameSettings::from_toml_str("tube_capacity = \"four\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameSettings::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
