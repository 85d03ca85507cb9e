use std::collections::HashSet;

use log::debug;
use rayon::prelude::*;

use crate::model::*;
use crate::puzzle::Puzzle;

/// States visited before [`solve`] gives up, unless told otherwise.
pub const DEFAULT_STATE_LIMIT: usize = 200_000;

/// A single pour in a solution, by tube id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PourStep {
    pub from: TubeId,
    pub to: TubeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A shortest sequence of pours that sorts every tube.
    Solved(Vec<PourStep>),
    /// Every reachable position was explored without finding a win.
    Unsolvable,
    /// Ran out of state budget.
    Inconclusive,
}

impl SolveOutcome {
    pub fn is_unsolvable(&self) -> bool {
        matches!(self, SolveOutcome::Unsolvable)
    }
}

/// Tube contents with layout and ids erased, so permuted positions collapse.
type StateKey = Vec<(usize, Vec<FluidColor>)>;

#[derive(Clone)]
struct StateWithHistory {
    tubes: Vec<Tube>,
    history: Vec<PourStep>,
}

impl StateWithHistory {
    fn key(&self) -> StateKey {
        let mut key: StateKey = self
            .tubes
            .iter()
            .map(|t| (t.get_capacity(), t.get_colors().to_vec()))
            .collect();
        key.sort();
        key
    }

    fn is_solved(&self) -> bool {
        !self.tubes.is_empty() && self.tubes.iter().all(Tube::is_sorted)
    }

    fn successors(&self) -> Vec<StateWithHistory> {
        let mut next = Vec::new();
        for (i, source) in self.tubes.iter().enumerate() {
            for (j, dest) in self.tubes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let amount = source.get_pourable_amount(dest);
                if amount == 0 {
                    continue;
                }
                // Moving a single-colored tube wholesale into an empty one gains nothing.
                if dest.is_empty() && source.get_top_fluid_depth() == source.get_filled_amount() {
                    continue;
                }
                let mut tubes = self.tubes.clone();
                let poured = tubes[i].take_top(amount);
                tubes[j].push_all(poured);
                let mut history = self.history.clone();
                history.push(PourStep {
                    from: source.get_id(),
                    to: dest.get_id(),
                });
                next.push(StateWithHistory { tubes, history });
            }
        }
        next
    }
}

/// Breadth-first search over forward pours.
pub struct Solver {
    starting_state: Vec<Tube>,
    max_states: usize,
}

impl Solver {
    pub fn new(puzzle: &Puzzle) -> Solver {
        Self::from_tubes(&puzzle.tubes().cloned().collect::<Vec<_>>())
    }

    pub fn from_tubes(tubes: &[Tube]) -> Solver {
        Solver {
            starting_state: tubes.to_vec(),
            max_states: DEFAULT_STATE_LIMIT,
        }
    }

    pub fn with_max_states(mut self, max_states: usize) -> Solver {
        self.max_states = max_states;
        self
    }

    pub fn solve(&self) -> SolveOutcome {
        let start = StateWithHistory {
            tubes: self.starting_state.clone(),
            history: vec![],
        };
        if start.is_solved() {
            return SolveOutcome::Solved(vec![]);
        }

        let mut visited_states: HashSet<StateKey> = HashSet::new();
        visited_states.insert(start.key());
        let mut considering_states = vec![start];
        let mut depth = 0;

        while !considering_states.is_empty() {
            depth += 1;
            let candidates: Vec<StateWithHistory> = considering_states
                .par_iter()
                .flat_map_iter(|state| state.successors())
                .collect();

            let mut next_states = Vec::new();
            for candidate in candidates {
                if !visited_states.insert(candidate.key()) {
                    continue;
                }
                if candidate.is_solved() {
                    debug!(
                        "Solved in {} pours after visiting {} states",
                        candidate.history.len(),
                        visited_states.len()
                    );
                    return SolveOutcome::Solved(candidate.history);
                }
                next_states.push(candidate);
            }

            if visited_states.len() > self.max_states {
                debug!(
                    "Giving up at depth {} with {} states visited",
                    depth,
                    visited_states.len()
                );
                return SolveOutcome::Inconclusive;
            }
            considering_states = next_states;
        }
        debug!("Exhausted {} states without a win", visited_states.len());
        SolveOutcome::Unsolvable
    }
}

/// Convenience wrapper around [`Solver`].
pub fn solve(puzzle: &Puzzle, max_states: usize) -> SolveOutcome {
    Solver::new(puzzle).with_max_states(max_states).solve()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzle(repr: &str) -> Puzzle {
        Puzzle::new_from_repr(repr).unwrap()
    }

    #[test]
    fn already_solved_needs_no_moves() {
        assert_eq!(
            solve(&puzzle("AA\nBB\n.."), DEFAULT_STATE_LIMIT),
            SolveOutcome::Solved(vec![])
        );
    }

    #[test]
    fn finds_a_shortest_solution_that_replays() {
        let start = puzzle("AB\nBA\n..");
        let SolveOutcome::Solved(steps) = solve(&start, DEFAULT_STATE_LIMIT) else {
            panic!("expected a solution");
        };
        assert_eq!(steps.len(), 3);

        let mut replay = start.clone();
        for step in &steps {
            assert!(replay.pour(step.from, step.to).is_some());
        }
        assert!(replay.is_solved());
    }

    #[test]
    fn no_free_space_means_unsolvable() {
        assert_eq!(solve(&puzzle("AB\nBA"), DEFAULT_STATE_LIMIT), SolveOutcome::Unsolvable);
    }

    #[test]
    fn tiny_budget_is_inconclusive() {
        let outcome = solve(&puzzle("ABAB\nBABA\nCCCC\n....\n...."), 1);
        assert_eq!(outcome, SolveOutcome::Inconclusive);
    }
}
