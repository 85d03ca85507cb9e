use macroquad::prelude::*;
use water_sort::TubeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlAction {
    Undo,
    AddTube,
    Restart,
    CopyState,
    CheckSolvable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    label: String,
    action: ControlAction,
    color: Color,
}
impl Button {
    pub fn new(label: &str, action: ControlAction, color: Color) -> Self {
        Self {
            label: label.to_string(),
            action,
            color,
        }
    }
    pub fn get_action(&self) -> ControlAction {
        self.action
    }
    pub fn get_label(&self) -> &str {
        &self.label
    }
    pub fn get_color(&self) -> Color {
        self.color
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HitItem {
    Button { function: ControlAction },
    Tube { id: TubeId },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitRecord {
    pub rect: Rect,
    pub item: HitItem,
}

#[derive(Default)]
pub struct HitTestRegistry {
    items: Vec<HitRecord>,
}

impl HitTestRegistry {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, rect: Rect, item: HitItem) {
        self.items.push(HitRecord { rect, item });
    }

    /// Returns the topmost item under the point (last drawn wins).
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&HitRecord> {
        self.items
            .iter()
            .rev()
            .find(|r| r.rect.contains(vec2(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_pushed_item_wins_overlaps() {
        let mut registry = HitTestRegistry::new();
        registry.push(Rect::new(0.0, 0.0, 100.0, 100.0), HitItem::Tube { id: 3 });
        registry.push(
            Rect::new(40.0, 40.0, 20.0, 20.0),
            HitItem::Button {
                function: ControlAction::Restart,
            },
        );
        assert_eq!(
            registry.hit_test(50.0, 50.0).map(|hit| hit.item),
            Some(HitItem::Button {
                function: ControlAction::Restart
            })
        );
        assert_eq!(
            registry.hit_test(10.0, 10.0).map(|hit| hit.item),
            Some(HitItem::Tube { id: 3 })
        );
        assert!(registry.hit_test(150.0, 10.0).is_none());

        registry.clear();
        assert!(registry.hit_test(10.0, 10.0).is_none());
    }
}
