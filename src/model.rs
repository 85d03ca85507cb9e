use std::fmt;

use crate::error::ReprError;

/// Stable identifier of a tube within one attempt.
pub type TubeId = usize;

/// Largest palette the game knows how to tell apart.
pub const MAX_PALETTE_SIZE: usize = 32;

/// One unit of colored liquid, identified by its palette index.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct FluidColor {
    color_id: usize,
}
impl FluidColor {
    pub fn new(color_id: usize) -> Self {
        FluidColor { color_id }
    }

    /// Parses a single slot token. `None` means the token names an empty slot,
    /// `Err(())` means it is not a valid label.
    fn new_from_repr(repr: &str) -> Result<Option<Self>, ()> {
        let s = repr.trim();
        if s.is_empty() || s == "." {
            return Ok(None);
        }
        match Self::letters_to_color_id(s) {
            Some(id) => Ok(Some(FluidColor::new(id))),
            None => Err(()),
        }
    }

    /// Convert a single letter (A-Z) into a 0-based id.
    pub fn letter_to_color_id(ch: char) -> Option<usize> {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let up = ch.to_ascii_uppercase();
        Some((up as u8 - b'A') as usize)
    }

    /// Convert a letter sequence like "A", "Z", "AA" into a 0-based id.
    /// Uses Excel-style base-26 numbering: A=0, B=1, ..., Z=25, AA=26, AB=27, ...
    fn letters_to_color_id(s: &str) -> Option<usize> {
        let mut acc: usize = 0;
        let mut saw_any = false;

        for ch in s.chars() {
            let digit = Self::letter_to_color_id(ch)?;
            acc = acc.checked_mul(26)?.checked_add(digit + 1)?;
            saw_any = true;
        }

        if !saw_any {
            return None;
        }
        acc.checked_sub(1)
    }

    pub fn get_color_id(&self) -> usize {
        self.color_id
    }

    pub fn get_letter_representation(&self) -> String {
        let mut chars = Vec::new();
        let mut id = self.color_id + 1;
        while id > 0 {
            let rem = (id - 1) % 26;
            chars.push((b'A' + rem as u8) as char);
            id = (id - 1) / 26;
        }
        chars.iter().rev().collect()
    }
}

impl fmt::Display for FluidColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_letter_representation())
    }
}

/// A tube of liquid. Colors are stored bottom to top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tube {
    id: TubeId,
    colors: Vec<FluidColor>,
    capacity: usize,
}
impl Tube {
    pub fn new(id: TubeId, capacity: usize) -> Self {
        Self {
            id,
            colors: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// A tube completely filled with one color.
    pub fn filled(id: TubeId, color: FluidColor, capacity: usize) -> Self {
        Self {
            id,
            colors: vec![color; capacity],
            capacity,
        }
    }

    /// Builds a tube from explicit contents, truncating anything beyond `capacity`.
    pub fn with_colors(id: TubeId, mut colors: Vec<FluidColor>, capacity: usize) -> Self {
        colors.truncate(capacity);
        Self {
            id,
            colors,
            capacity,
        }
    }

    /// Parses one tube line such as `AAB.` or `A,AB,.,.`.
    ///
    /// The capacity is the number of tokens; `.` marks a free slot and free slots
    /// may only appear above the liquid.
    pub fn new_from_repr(id: TubeId, repr: &str) -> Result<Self, ReprError> {
        let tokens: Vec<String> = if repr.contains(',') {
            repr.split(',').map(|t| t.to_string()).collect()
        } else {
            repr.trim().chars().map(|ch| ch.to_string()).collect()
        };
        if tokens.is_empty() {
            return Err(ReprError::ZeroCapacity { tube: id });
        }

        let mut colors = Vec::new();
        let mut saw_space = false;
        for (position, token) in tokens.iter().enumerate() {
            match FluidColor::new_from_repr(token) {
                Ok(Some(color)) => {
                    if saw_space {
                        return Err(ReprError::Gap { tube: id, position });
                    }
                    colors.push(color);
                }
                Ok(None) => saw_space = true,
                Err(()) => {
                    return Err(ReprError::InvalidToken {
                        tube: id,
                        token: token.trim().to_string(),
                    });
                }
            }
        }
        Ok(Self {
            id,
            colors,
            capacity: tokens.len(),
        })
    }

    pub fn get_id(&self) -> TubeId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: TubeId) {
        self.id = id;
    }

    pub fn get_colors(&self) -> &[FluidColor] {
        &self.colors
    }

    pub fn get_capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_filled_amount(&self) -> usize {
        self.colors.len()
    }

    pub fn get_empty_space(&self) -> usize {
        self.capacity - self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.colors.len() >= self.capacity
    }

    /// Non-empty and every unit the same color.
    pub fn is_monochrome(&self) -> bool {
        match self.colors.first() {
            Some(first) => self.colors.iter().all(|c| c == first),
            None => false,
        }
    }

    /// Empty, or full of a single color.
    pub fn is_sorted(&self) -> bool {
        self.is_empty() || (self.is_full() && self.is_monochrome())
    }

    pub fn get_top_fluid(&self) -> Option<FluidColor> {
        self.colors.last().copied()
    }

    /// Number of contiguous units of the top color, counted from the top.
    pub fn get_top_fluid_depth(&self) -> usize {
        let Some(top) = self.get_top_fluid() else {
            return 0;
        };
        self.colors.iter().rev().take_while(|c| **c == top).count()
    }

    /// How many units a pour from `self` into `other` would move. Zero means illegal.
    pub fn get_pourable_amount(&self, other: &Tube) -> usize {
        if self.is_empty() {
            return 0;
        }
        if !other.is_empty() && self.get_top_fluid() != other.get_top_fluid() {
            return 0;
        }
        let depth = self.get_top_fluid_depth();
        let space = other.get_empty_space();
        depth.min(space)
    }

    /// Removes the top `amount` units, keeping their bottom-to-top order.
    pub(crate) fn take_top(&mut self, amount: usize) -> Vec<FluidColor> {
        let split_at = self.colors.len().saturating_sub(amount);
        self.colors.split_off(split_at)
    }

    /// Stacks `packets` on top, first element lowest. Panics in debug builds on overflow.
    pub(crate) fn push_all(&mut self, packets: Vec<FluidColor>) {
        debug_assert!(self.colors.len() + packets.len() <= self.capacity);
        self.colors.extend(packets);
    }

    pub(crate) fn add_fluid(&mut self, packet: FluidColor) -> bool {
        if self.is_full() {
            return false;
        }
        self.colors.push(packet);
        true
    }

    pub(crate) fn pop_fluid(&mut self) -> Option<FluidColor> {
        self.colors.pop()
    }

    pub fn get_text_representation(&self) -> String {
        let mut repr: Vec<String> = self
            .colors
            .iter()
            .map(|c| c.get_letter_representation())
            .collect();
        repr.extend(std::iter::repeat_n(".".to_string(), self.get_empty_space()));
        let has_multi_char = repr.iter().any(|s| s.len() > 1);
        let separator = if has_multi_char { "," } else { "" };
        repr.join(separator)
    }
}

/// One applied pour, with enough information to reverse it exactly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: TubeId,
    pub to: TubeId,
    pub color: FluidColor,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tube(repr: &str) -> Tube {
        Tube::new_from_repr(0, repr).unwrap()
    }

    #[test]
    fn letters_round_trip_through_excel_numbering() {
        assert_eq!(FluidColor::new(0).get_letter_representation(), "A");
        assert_eq!(FluidColor::new(25).get_letter_representation(), "Z");
        assert_eq!(FluidColor::new(26).get_letter_representation(), "AA");
        assert_eq!(FluidColor::new(27).get_letter_representation(), "AB");
        assert_eq!(FluidColor::letters_to_color_id("AB"), Some(27));
        assert_eq!(FluidColor::letters_to_color_id("a"), Some(0));
    }

    #[test]
    fn parse_counts_capacity_from_tokens() {
        let t = tube("AAB.");
        assert_eq!(t.get_capacity(), 4);
        assert_eq!(t.get_filled_amount(), 3);
        assert_eq!(t.get_top_fluid(), Some(FluidColor::new(1)));
        assert_eq!(t.get_text_representation(), "AAB.");
    }

    #[test]
    fn parse_multi_letter_labels_with_commas() {
        let t = tube("A,AB,.,.");
        assert_eq!(t.get_colors(), &[FluidColor::new(0), FluidColor::new(27)]);
        assert_eq!(t.get_text_representation(), "A,AB,.,.");
    }

    #[test]
    fn parse_rejects_gaps_and_junk() {
        assert_eq!(
            Tube::new_from_repr(3, "A.B."),
            Err(ReprError::Gap { tube: 3, position: 2 })
        );
        assert_eq!(
            Tube::new_from_repr(1, "A1.."),
            Err(ReprError::InvalidToken {
                tube: 1,
                token: "1".to_string()
            })
        );
        assert_eq!(Tube::new_from_repr(2, ""), Err(ReprError::ZeroCapacity { tube: 2 }));
    }

    #[test]
    fn top_depth_counts_only_the_top_run() {
        assert_eq!(tube("AABB").get_top_fluid_depth(), 2);
        assert_eq!(tube("BAAA").get_top_fluid_depth(), 3);
        assert_eq!(tube("....").get_top_fluid_depth(), 0);
    }

    #[test]
    fn pourable_amount_is_run_limited_by_space() {
        assert_eq!(tube("AAB.").get_pourable_amount(&tube("....")), 1);
        assert_eq!(tube("BBB.").get_pourable_amount(&tube("....")), 3);
        assert_eq!(tube("ABBB").get_pourable_amount(&tube("BB..")), 2);
        assert_eq!(tube("ABBB").get_pourable_amount(&tube("AA..")), 0);
        assert_eq!(tube("....").get_pourable_amount(&tube("....")), 0);
        assert_eq!(tube("AAAA").get_pourable_amount(&tube("AAAA")), 0);
    }

    #[test]
    fn sorted_means_empty_or_full_monochrome() {
        assert!(tube("....").is_sorted());
        assert!(tube("CCCC").is_sorted());
        assert!(!tube("CCC.").is_sorted());
        assert!(!tube("CCCA").is_sorted());
    }

    #[test]
    fn take_top_preserves_order() {
        let mut t = tube("ABC.");
        assert_eq!(t.take_top(2), vec![FluidColor::new(1), FluidColor::new(2)]);
        assert_eq!(t.get_text_representation(), "A...");
    }
}
