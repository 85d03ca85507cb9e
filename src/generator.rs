//! Level generation.
//!
//! A level starts life solved (one full tube per color plus a spare) and is then
//! "unsolved" with random single-unit transfers. Tubes that the scramble left sorted
//! get one unit knocked off, and the layout is shuffled before ids are reassigned.

use log::{debug, warn};
use rand::Rng;

use crate::model::*;
use crate::settings::GameSettings;
use crate::shuffle::shuffled;
use crate::solver::{SolveOutcome, Solver};

/// Everything about a level that follows from its number alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelParams {
    pub level: u32,
    pub num_colors: usize,
    pub num_tubes: usize,
    pub time_limit_secs: u32,
    pub shuffle_moves: usize,
}

impl LevelParams {
    /// Levels below 1 are treated as level 1.
    pub fn for_level(level: u32, settings: &GameSettings) -> Self {
        let level = level.max(1);
        let extra_colors = ((level - 1) / settings.levels_per_color) as usize;
        let num_colors = (settings.base_colors + extra_colors).min(settings.palette_size);
        let time_limit_secs =
            settings.base_time_secs + num_colors as u32 * settings.time_per_color_secs;
        let shuffle_moves = (settings.scramble_base
            + level as usize * settings.scramble_per_level)
            .min(settings.scramble_cap);
        Self {
            level,
            num_colors,
            num_tubes: num_colors + 1,
            time_limit_secs,
            shuffle_moves,
        }
    }
}

pub struct LevelGenerator<R: Rng> {
    settings: GameSettings,
    rng: R,
}

impl<R: Rng> LevelGenerator<R> {
    pub fn new(settings: GameSettings, rng: R) -> Self {
        Self { settings, rng }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn get_time_for_level(&self, level: u32) -> u32 {
        LevelParams::for_level(level, &self.settings).time_limit_secs
    }

    /// Produces the tubes for `level`, in layout order with ids `0..num_tubes`.
    ///
    /// Candidates that come out already solved, or that the solver proves unwinnable,
    /// are regenerated until one passes or `regenerate_attempts` is spent.
    pub fn generate_level(&mut self, level: u32) -> Vec<Tube> {
        let params = LevelParams::for_level(level, &self.settings);
        let tries = self.settings.regenerate_attempts.max(1);
        let mut attempt = 1;
        loop {
            let candidate = self.generate_candidate(&params);
            let Some(reason) = self.rejection_reason(&candidate) else {
                if attempt > 1 {
                    debug!("Level {} accepted on try {attempt}", params.level);
                }
                return candidate;
            };
            if attempt >= tries {
                warn!(
                    "Level {} still {reason} after {tries} tries, using it anyway",
                    params.level
                );
                return candidate;
            }
            debug!("Level {} candidate {attempt} rejected: {reason}", params.level);
            attempt += 1;
        }
    }

    fn rejection_reason(&self, tubes: &[Tube]) -> Option<&'static str> {
        if tubes.iter().all(Tube::is_sorted) {
            return Some("already solved");
        }
        if self.settings.verify_solvable {
            let outcome = Solver::from_tubes(tubes)
                .with_max_states(self.settings.solver_state_limit)
                .solve();
            if outcome == SolveOutcome::Unsolvable {
                return Some("unsolvable");
            }
        }
        None
    }

    fn generate_candidate(&mut self, params: &LevelParams) -> Vec<Tube> {
        let mut tubes = self.build_solved(params);
        self.scramble(&mut tubes, params.shuffle_moves);
        Self::repair_sorted_tubes(&mut tubes);
        self.shuffle_layout(tubes)
    }

    /// One full tube per randomly chosen color, then the empty spares.
    fn build_solved(&mut self, params: &LevelParams) -> Vec<Tube> {
        let capacity = self.settings.tube_capacity;
        let palette: Vec<FluidColor> = (0..self.settings.palette_size)
            .map(FluidColor::new)
            .collect();
        let level_colors = shuffled(&palette, &mut self.rng);

        let mut tubes: Vec<Tube> = level_colors
            .into_iter()
            .take(params.num_colors)
            .enumerate()
            .map(|(id, color)| Tube::filled(id, color, capacity))
            .collect();
        for id in params.num_colors..params.num_tubes {
            tubes.push(Tube::new(id, capacity));
        }
        tubes
    }

    /// Random single-unit transfers; a step with no valid pair found is skipped.
    fn scramble(&mut self, tubes: &mut [Tube], moves: usize) {
        let num_tubes = tubes.len();
        let mut skipped = 0;
        for _ in 0..moves {
            let pair = (0..self.settings.pair_attempts).find_map(|_| {
                let from = self.rng.random_range(0..num_tubes);
                let to = self.rng.random_range(0..num_tubes);
                let valid = from != to && !tubes[from].is_empty() && !tubes[to].is_full();
                valid.then_some((from, to))
            });
            let Some((from, to)) = pair else {
                skipped += 1;
                continue;
            };
            if let Some(packet) = tubes[from].pop_fluid() {
                tubes[to].add_fluid(packet);
            }
        }
        if skipped > 0 {
            warn!("Skipped {skipped} of {moves} scramble steps");
        }
    }

    /// Knocks one unit off every full single-colored tube into the first other tube
    /// with room. A tube with nowhere to pour stays as it is.
    fn repair_sorted_tubes(tubes: &mut [Tube]) {
        for index in 0..tubes.len() {
            if !(tubes[index].is_full() && tubes[index].is_monochrome()) {
                continue;
            }
            let destination = tubes
                .iter()
                .enumerate()
                .position(|(other, t)| other != index && !t.is_full());
            match destination {
                Some(dest) => {
                    if let Some(packet) = tubes[index].pop_fluid() {
                        tubes[dest].add_fluid(packet);
                    }
                }
                None => debug!("No room to unsort tube at position {index}"),
            }
        }
    }

    fn shuffle_layout(&mut self, tubes: Vec<Tube>) -> Vec<Tube> {
        let mut tubes = shuffled(&tubes, &mut self.rng);
        for (id, tube) in tubes.iter_mut().enumerate() {
            tube.set_id(id);
        }
        tubes
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::puzzle::Puzzle;

    fn generator(seed: u64) -> LevelGenerator<Pcg32> {
        LevelGenerator::new(GameSettings::default(), Pcg32::seed_from_u64(seed))
    }

    fn quick_generator(seed: u64) -> LevelGenerator<Pcg32> {
        let settings = GameSettings {
            verify_solvable: false,
            ..GameSettings::default()
        };
        LevelGenerator::new(settings, Pcg32::seed_from_u64(seed))
    }

    #[test]
    fn difficulty_scales_every_three_levels() {
        let settings = GameSettings::default();
        let colors: Vec<usize> = [1, 3, 4, 6, 7, 10]
            .iter()
            .map(|l| LevelParams::for_level(*l, &settings).num_colors)
            .collect();
        assert_eq!(colors, vec![3, 3, 4, 4, 5, 6]);

        let first = LevelParams::for_level(1, &settings);
        assert_eq!(first.num_tubes, 4);
        assert_eq!(first.time_limit_secs, 75);
        assert_eq!(first.shuffle_moves, 47);
    }

    #[test]
    fn colors_and_scramble_are_capped() {
        let settings = GameSettings::default();
        let late = LevelParams::for_level(500, &settings);
        assert_eq!(late.num_colors, settings.palette_size);
        assert_eq!(late.num_tubes, settings.palette_size + 1);
        assert_eq!(late.shuffle_moves, 250);
        assert_eq!(late.time_limit_secs, 30 + 12 * 15);
    }

    #[test]
    fn level_zero_behaves_like_level_one() {
        let settings = GameSettings::default();
        assert_eq!(
            LevelParams::for_level(0, &settings),
            LevelParams::for_level(1, &settings)
        );
    }

    #[test]
    fn time_for_level_matches_params() {
        let generator = generator(0);
        assert_eq!(generator.get_time_for_level(1), 75);
        assert_eq!(generator.get_time_for_level(4), 90);
    }

    #[test]
    fn solved_precursor_is_full_per_color() {
        let mut generator = generator(3);
        let params = LevelParams::for_level(7, generator.settings());
        let tubes = generator.build_solved(&params);
        assert_eq!(tubes.len(), params.num_tubes);
        for tube in &tubes[..params.num_colors] {
            assert!(tube.is_full() && tube.is_monochrome());
            assert_eq!(tube.get_filled_amount(), 4);
        }
        assert!(tubes[params.num_colors..].iter().all(Tube::is_empty));
    }

    #[test]
    fn repair_unsorts_full_single_color_tubes() {
        let a = FluidColor::new(0);
        let b = FluidColor::new(1);
        let mut tubes = vec![
            Tube::filled(0, a, 4),
            Tube::with_colors(1, vec![b, b], 4),
            Tube::with_colors(2, vec![b, b], 4),
        ];
        LevelGenerator::<Pcg32>::repair_sorted_tubes(&mut tubes);
        assert_eq!(tubes[0].get_filled_amount(), 3);
        assert_eq!(tubes[1].get_top_fluid(), Some(a));
    }

    #[test]
    fn repair_leaves_tube_when_nothing_has_room() {
        let a = FluidColor::new(0);
        let b = FluidColor::new(1);
        let mut tubes = vec![Tube::filled(0, a, 2), Tube::with_colors(1, vec![a, b], 2)];
        LevelGenerator::<Pcg32>::repair_sorted_tubes(&mut tubes);
        assert!(tubes[0].is_full() && tubes[0].is_monochrome());
    }

    #[test]
    fn single_tube_palette_never_panics() {
        let settings = GameSettings {
            palette_size: 1,
            base_colors: 1,
            verify_solvable: false,
            ..GameSettings::default()
        };
        let mut generator = LevelGenerator::new(settings, Pcg32::seed_from_u64(5));
        let tubes = generator.generate_level(1);
        assert_eq!(tubes.len(), 2);
    }

    #[test]
    fn same_seed_same_level() {
        assert_eq!(quick_generator(11).generate_level(5), quick_generator(11).generate_level(5));
    }

    #[test]
    fn generated_levels_start_unsolved_and_winnable() {
        for level in [1, 7, 13, 19, 28] {
            for seed in 0..4 {
                let mut generator = generator(seed);
                let limit = generator.settings().solver_state_limit;
                let tubes = generator.generate_level(level);
                assert!(!tubes.iter().all(Tube::is_sorted));
                let outcome = Solver::from_tubes(&tubes).with_max_states(limit).solve();
                assert!(
                    !outcome.is_unsolvable(),
                    "level {level} seed {seed} produced a dead level"
                );
            }
        }
    }

    #[test]
    fn small_budget_still_returns_a_level() {
        let settings = GameSettings {
            regenerate_attempts: 1,
            ..GameSettings::default()
        };
        let mut generator = LevelGenerator::new(settings, Pcg32::seed_from_u64(9));
        let params = LevelParams::for_level(28, generator.settings());
        assert_eq!(generator.generate_level(28).len(), params.num_tubes);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn generated_levels_conserve_units(level in 1u32..60, seed in any::<u64>()) {
            let mut generator = quick_generator(seed);
            let params = LevelParams::for_level(level, generator.settings());
            let tubes = generator.generate_level(level);

            prop_assert!(params.num_colors <= generator.settings().palette_size);
            prop_assert_eq!(tubes.len(), params.num_tubes);

            for (position, tube) in tubes.iter().enumerate() {
                prop_assert_eq!(tube.get_id(), position);
                prop_assert_eq!(tube.get_capacity(), 4);
                prop_assert!(tube.get_filled_amount() <= tube.get_capacity());
            }
            let counts = Puzzle::new(tubes).color_counts();
            prop_assert_eq!(counts.len(), params.num_colors);
            prop_assert!(counts.values().all(|count| *count == 4));
            prop_assert!(counts.keys().all(|c| c.get_color_id() < generator.settings().palette_size));
        }
    }
}
