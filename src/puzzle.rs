use std::collections::HashMap;

use log::warn;

use crate::error::ReprError;
use crate::model::*;

/// The tubes of one attempt.
///
/// Tubes are stored by id; `layout` keeps their on-screen order. A pour touches only
/// the two tubes involved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Puzzle {
    tubes: HashMap<TubeId, Tube>,
    layout: Vec<TubeId>,
}

impl Puzzle {
    /// Builds a puzzle whose layout follows the order of `tubes`.
    /// A tube whose id is already taken replaces the earlier one.
    pub fn new(tubes: Vec<Tube>) -> Self {
        let mut store = HashMap::with_capacity(tubes.len());
        let mut layout = Vec::with_capacity(tubes.len());
        for tube in tubes {
            let id = tube.get_id();
            if store.insert(id, tube).is_some() {
                warn!("Duplicate tube id {id} while building puzzle");
            } else {
                layout.push(id);
            }
        }
        Self {
            tubes: store,
            layout,
        }
    }

    /// Parses one tube per non-blank line; ids follow line order.
    pub fn new_from_repr(repr: &str) -> Result<Self, ReprError> {
        let tubes = repr
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(id, line)| Tube::new_from_repr(id, line))
            .collect::<Result<Vec<_>, _>>()?;
        if tubes.is_empty() {
            return Err(ReprError::NoTubes);
        }
        Ok(Self::new(tubes))
    }

    pub fn get_text_representation(&self) -> String {
        self.tubes()
            .map(|t| t.get_text_representation())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn tube(&self, id: TubeId) -> Option<&Tube> {
        self.tubes.get(&id)
    }

    pub fn tube_at(&self, position: usize) -> Option<&Tube> {
        self.layout.get(position).and_then(|id| self.tubes.get(id))
    }

    pub fn position_of(&self, id: TubeId) -> Option<usize> {
        self.layout.iter().position(|t| *t == id)
    }

    /// Tubes in layout order.
    pub fn tubes(&self) -> impl Iterator<Item = &Tube> + '_ {
        self.layout.iter().filter_map(|id| self.tubes.get(id))
    }

    pub fn ids(&self) -> &[TubeId] {
        &self.layout
    }

    pub fn max_id(&self) -> Option<TubeId> {
        self.layout.iter().copied().max()
    }

    /// Units a pour from `from` into `to` would move; zero when the pour is illegal.
    pub fn pourable_amount(&self, from: TubeId, to: TubeId) -> usize {
        if from == to {
            return 0;
        }
        match (self.tubes.get(&from), self.tubes.get(&to)) {
            (Some(source), Some(dest)) => source.get_pourable_amount(dest),
            _ => 0,
        }
    }

    /// Pours the top run of `from` into `to`, as much as fits.
    /// Returns the record of what moved, or `None` if the pour is illegal.
    pub fn pour(&mut self, from: TubeId, to: TubeId) -> Option<MoveRecord> {
        let count = self.pourable_amount(from, to);
        if count == 0 {
            return None;
        }
        let source = self.tubes.get_mut(&from)?;
        let color = source.get_top_fluid()?;
        let poured = source.take_top(count);
        self.tubes.get_mut(&to)?.push_all(poured);
        Some(MoveRecord {
            from,
            to,
            color,
            count,
        })
    }

    /// Moves `record.count` units from `record.to` back onto `record.from`.
    /// Returns `false` and leaves the puzzle untouched if the record does not match.
    pub fn revert(&mut self, record: &MoveRecord) -> bool {
        let matches = match (self.tubes.get(&record.to), self.tubes.get(&record.from)) {
            (Some(dest), Some(source)) => {
                dest.get_filled_amount() >= record.count
                    && dest.get_colors()[dest.get_filled_amount() - record.count..]
                        .iter()
                        .all(|c| *c == record.color)
                    && source.get_empty_space() >= record.count
            }
            _ => false,
        };
        if !matches {
            warn!("Cannot revert {record:?}: tubes no longer match");
            return false;
        }
        if let Some(dest) = self.tubes.get_mut(&record.to) {
            let units = dest.take_top(record.count);
            if let Some(source) = self.tubes.get_mut(&record.from) {
                source.push_all(units);
            }
        }
        true
    }

    /// Appends an empty tube with an id above every existing one.
    pub fn add_tube(&mut self, capacity: usize) -> TubeId {
        let id = self.max_id().map_or(0, |max| max + 1);
        self.tubes.insert(id, Tube::new(id, capacity));
        self.layout.push(id);
        id
    }

    /// Every tube is empty or full of one color.
    pub fn is_solved(&self) -> bool {
        !self.is_empty() && self.tubes().all(Tube::is_sorted)
    }

    /// Total units per color across all tubes.
    pub fn color_counts(&self) -> HashMap<FluidColor, usize> {
        let mut counts = HashMap::new();
        for color in self.tubes().flat_map(|t| t.get_colors().iter()) {
            *counts.entry(*color).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzle(repr: &str) -> Puzzle {
        Puzzle::new_from_repr(repr).unwrap()
    }

    #[test]
    fn pour_moves_only_the_top_unit_of_a_short_run() {
        let mut p = puzzle("AAB.\n....");
        let record = p.pour(0, 1).unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.color, FluidColor::new(1));
        assert_eq!(p.get_text_representation(), "AA..\nB...");
    }

    #[test]
    fn pour_moves_the_whole_run_when_it_fits() {
        let mut p = puzzle("BBB.\n....");
        let record = p.pour(0, 1).unwrap();
        assert_eq!(record.count, 3);
        assert!(p.tube(0).unwrap().is_empty());
        assert_eq!(p.tube(1).unwrap().get_text_representation(), "BBB.");
    }

    #[test]
    fn pour_is_limited_by_destination_space() {
        let mut p = puzzle("ABBB\nBB..");
        let record = p.pour(0, 1).unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(p.get_text_representation(), "AB..\nBBBB");
    }

    #[test]
    fn illegal_pours_change_nothing() {
        let mut p = puzzle("AB..\nA...\nCCCC\n....");
        let before = p.clone();
        assert!(p.pour(0, 1).is_none());
        assert!(p.pour(3, 0).is_none());
        assert!(p.pour(1, 2).is_none());
        assert!(p.pour(0, 0).is_none());
        assert!(p.pour(0, 9).is_none());
        assert_eq!(p, before);
    }

    #[test]
    fn revert_restores_both_tubes() {
        let mut p = puzzle("ABB.\nB...\n....");
        let before = p.clone();
        let record = p.pour(0, 1).unwrap();
        assert!(p.revert(&record));
        assert_eq!(p, before);
    }

    #[test]
    fn revert_refuses_a_stale_record() {
        let mut p = puzzle("AA..\n....");
        let record = MoveRecord {
            from: 1,
            to: 0,
            color: FluidColor::new(1),
            count: 1,
        };
        let before = p.clone();
        assert!(!p.revert(&record));
        assert_eq!(p, before);
    }

    #[test]
    fn add_tube_uses_next_id_and_appends_to_layout() {
        let mut p = Puzzle::new(vec![Tube::new(5, 4), Tube::new(2, 4)]);
        let id = p.add_tube(4);
        assert_eq!(id, 6);
        assert_eq!(p.ids(), &[5, 2, 6]);
        assert_eq!(p.position_of(6), Some(2));
        assert_eq!(p.tube_at(2).unwrap().get_capacity(), 4);
    }

    #[test]
    fn solved_detection() {
        assert!(puzzle("AAAA\nBBBB\n....").is_solved());
        assert!(!puzzle("AAAB\nBBBA\n....").is_solved());
        assert!(!puzzle("AAA.\nBBBB\nA...").is_solved());
    }

    #[test]
    fn parses_and_prints_whole_puzzles() {
        let repr = "AB..\nBA..\n....";
        let p = puzzle(repr);
        assert_eq!(p.len(), 3);
        assert_eq!(p.get_text_representation(), repr);
        assert_eq!(Puzzle::new_from_repr("\n\n"), Err(ReprError::NoTubes));
        assert_eq!(
            Puzzle::new_from_repr("AA..\nA.A."),
            Err(ReprError::Gap { tube: 1, position: 2 })
        );
    }
}
