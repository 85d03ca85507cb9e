use std::{collections::HashMap, sync::Mutex};

use macroquad::prelude::*;
use water_sort::{Countdown, FluidColor, GameStatus, TimeBand, Tube, TubeId};

use crate::controls::{Button, ControlAction, HitItem, HitTestRegistry};

pub const FLUID_COLORS: [Color; 32] = [
    Color::new(1.0  , 0.0  , 0.0  , 1.0  ), //RED
    Color::new(0.0  , 0.0  , 1.0  , 1.0  ), //BLUE
    Color::new(1.0  , 1.0  , 0.0  , 1.0  ), //YELLOW
    Color::new(0.0  , 0.5  , 0.0  , 1.0  ), //GREEN
    Color::new(0.627, 0.125, 0.941, 1.0  ), //PURPLE
    Color::new(1.0  , 0.647, 0.0  , 1.0  ), //ORANGE
    Color::new(0.0  , 1.0  , 1.0  , 1.0  ), //CYAN
    Color::new(1.0  , 0.0  , 1.0  , 1.0  ), //MAGENTA
    Color::new(0.0  , 1.0  , 0.0  , 1.0  ), //LIME
    Color::new(1.0  , 0.752, 0.796, 1.0  ), //PINK
    Color::new(0.647, 0.164, 0.164, 1.0  ), //BROWN
    Color::new(0.0  , 0.0  , 0.5  , 1.0  ), //NAVY
    Color::new(0.250, 0.878, 0.815, 1.0  ), //TURQUOISE
    Color::new(0.5  , 0.5  , 0.0  , 1.0  ), //OLIVE
    Color::new(0.5  , 0.0  , 0.0  , 1.0  ), //MAROON
    Color::new(0.529, 0.808, 0.922, 1.0  ), //SKYBLUE
    Color::new(0.0  , 0.5  , 0.5  , 1.0  ), //TEAL
    Color::new(1.0  , 0.843, 0.0  , 1.0  ), //GOLD
    Color::new(0.75 , 0.75 , 0.75 , 1.0  ), //SILVER
    Color::new(1.0  , 0.498, 0.313, 1.0  ), //CORAL
    Color::new(0.933, 0.509, 0.933, 1.0  ), //VIOLET
    Color::new(0.596, 1.0  , 0.596, 1.0  ), //MINT
    Color::new(0.960, 0.960, 0.862, 1.0  ), //BEIGE
    Color::new(0.980, 0.501, 0.447, 1.0  ), //SALMON
    Color::new(0.956, 0.643, 0.376, 1.0  ), //SANDYBROWN
    Color::new(0.294, 0.0  , 0.509, 1.0  ), //INDIGO
    Color::new(0.862, 0.078, 0.235, 1.0  ), //CRIMSON
    Color::new(0.941, 0.901, 0.549, 1.0  ), //KHAKI
    Color::new(0.866, 0.627, 0.866, 1.0  ), //PLUM
    Color::new(0.823, 0.411, 0.117, 1.0  ), //CHOCOLATE
    Color::new(0.0  , 0.392, 0.0  , 1.0  ), //DARKGREEN
    Color::new(1.0  , 0.549, 0.0  , 1.0  ), //DARKORANGE
];

fn fluid_color(fluid: FluidColor) -> Color {
    FLUID_COLORS[fluid.get_color_id() % FLUID_COLORS.len()]
}

/// `mm:ss`, the way the clock is shown above the tubes.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Hash, PartialEq, Eq, Clone, Debug)]
struct TextCacheKey {
    text: String,
    w_px: u16,
    h_px: u16,
}
/// Font size, x offset and baseline offset that fit a text into a rect.
type TextMaxSize = (f32, f32, f32);
pub struct CachedTextSizer {
    final_size_cache: Mutex<HashMap<TextCacheKey, TextMaxSize>>,
    unscaled_size_cache: Mutex<HashMap<String, (f32, f32)>>,
}

impl CachedTextSizer {
    pub fn new() -> Self {
        Self {
            final_size_cache: Mutex::new(HashMap::new()),
            unscaled_size_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_text_max_size(&self, text: &str, rect_width: f32, rect_height: f32) -> TextMaxSize {
        let w_px = rect_width.round().clamp(0.0, u16::MAX as f32) as u16;
        let h_px = rect_height.round().clamp(0.0, u16::MAX as f32) as u16;

        let key = TextCacheKey {
            text: text.to_string(),
            w_px,
            h_px,
        };

        if let Ok(cache) = self.final_size_cache.lock()
            && let Some(cached_size) = cache.get(&key)
        {
            return *cached_size;
        }

        let text_size = self.measure(text, rect_width, rect_height);
        if let Ok(mut cache) = self.final_size_cache.lock() {
            cache.insert(key, text_size);
        }
        text_size
    }

    fn measure(&self, text: &str, rect_width: f32, rect_height: f32) -> TextMaxSize {
        let reference_size = 100u16;

        let (size_x, size_y) = if let Ok(cache) = self.unscaled_size_cache.lock()
            && let Some(dimensions) = cache.get(text)
        {
            (dimensions.0, dimensions.1)
        } else {
            let dimensions = measure_text(text, None, reference_size, 1.0);
            let size_x = dimensions.width.max(1.0);
            let size_y = dimensions.height.max(1.0);

            if let Ok(mut cache) = self.unscaled_size_cache.lock() {
                cache.insert(text.to_string(), (size_x, size_y));
            }
            (size_x, size_y)
        };
        let scale_x = rect_width / size_x;
        let scale_y = rect_height / size_y;
        let optimal_size = reference_size as f32 * scale_x.min(scale_y);
        let final_width = size_x * (optimal_size / reference_size as f32);
        let final_height = size_y * (optimal_size / reference_size as f32);
        let offset_x = (rect_width - final_width) / 2.0;
        let baseline_y = (rect_height - final_height) / 2.0 + final_height;
        (optimal_size, offset_x, baseline_y)
    }
}

/// What one frame needs to know about the game.
pub struct Frame<'a> {
    pub level: u32,
    pub status: GameStatus,
    pub tubes: Vec<&'a Tube>,
    pub selected: Option<TubeId>,
    pub countdown: &'a Countdown,
    pub buttons: &'a [(Button, bool)],
}

pub struct Renderer {
    cached_text_sizer: CachedTextSizer,
    hit_test: HitTestRegistry,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}
impl Renderer {
    pub fn new() -> Self {
        Self {
            cached_text_sizer: CachedTextSizer::new(),
            hit_test: HitTestRegistry::new(),
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }

    pub fn get_hit_test_registry(&self) -> &HitTestRegistry {
        &self.hit_test
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        if self.x == x && self.y == y && self.width == width && self.height == height {
            return false;
        }
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        true
    }

    pub fn autoset_viewport(&mut self) -> bool {
        let (screen_w, screen_h) = (screen_width(), screen_height());
        self.set_viewport(0.0, 0.0, screen_w, screen_h)
    }

    pub fn render_game(&mut self, frame: &Frame) {
        // New frame: reset hit-test registry.
        self.hit_test.clear();

        clear_background(Color::new(0.07, 0.09, 0.15, 1.0));
        let area_padding = 10.0;
        let header_height = self.height * 0.08;
        let timer_height = self.height * 0.08;
        let button_area_height = self.height * 0.1;
        let tube_area_height = self.height
            - header_height
            - timer_height
            - button_area_height
            - 3.0 * area_padding;

        let mut y = self.y;
        self.render_text(
            &format!("Level {}", frame.level),
            Rect::new(self.x, y, self.width, header_height),
            Color::new(0.4, 0.9, 0.95, 1.0),
        );
        y += header_height + area_padding;
        self.render_timer(
            frame.countdown,
            Rect::new(self.x + self.width * 0.25, y, self.width * 0.5, timer_height),
        );
        y += timer_height + area_padding;
        let tube_rect = Rect::new(self.x, y, self.width, tube_area_height);
        self.render_tube_grid(&frame.tubes, frame.selected, 6, tube_rect);
        y += tube_area_height + area_padding;
        self.render_button_lineup(
            frame.buttons,
            Rect::new(self.x + self.width * 0.1, y, self.width * 0.8, button_area_height),
        );

        match frame.status {
            GameStatus::Playing => {}
            GameStatus::Won => {
                self.render_overlay(tube_rect, "Complete!", "Loading next level...", None)
            }
            GameStatus::Failed => self.render_overlay(
                tube_rect,
                "Time's Up!",
                "You ran out of time.",
                Some(Button::new("Try Again", ControlAction::Restart, FLUID_COLORS[6])),
            ),
        }
    }

    pub fn render_text(&self, text: &str, rect: Rect, color: Color) {
        let (optimal_size, x, y) = self
            .cached_text_sizer
            .get_text_max_size(text, rect.w, rect.h);
        draw_text(text, rect.x + x, rect.y + y, optimal_size, color);
    }

    pub fn render_timer(&mut self, countdown: &Countdown, rect: Rect) {
        let label_height = rect.h * 0.6;
        let half = rect.w / 2.0;
        self.render_text("Time", Rect::new(rect.x, rect.y, half * 0.5, label_height), LIGHTGRAY);
        self.render_text(
            &format_clock(countdown.remaining()),
            Rect::new(rect.x + half * 1.5, rect.y, half * 0.5, label_height),
            WHITE,
        );

        let bar = Rect::new(rect.x, rect.y + label_height + 4.0, rect.w, rect.h - label_height - 4.0);
        draw_rectangle(bar.x, bar.y, bar.w, bar.h, DARKGRAY);
        let fill = match countdown.band() {
            TimeBand::Calm => GREEN,
            TimeBand::Hurry => YELLOW,
            TimeBand::Critical => RED,
        };
        draw_rectangle(bar.x, bar.y, bar.w * countdown.fraction_remaining(), bar.h, fill);
    }

    pub fn render_tube(&mut self, tube: &Tube, selected: bool, rect: Rect) {
        self.hit_test.push(rect, HitItem::Tube { id: tube.get_id() });

        let capacity = tube.get_capacity().max(1);
        let packet_height = rect.h / capacity as f32;
        for (i, packet) in tube.get_colors().iter().enumerate() {
            let packet_y = rect.y + rect.h - (i as f32 + 1.0) * packet_height;
            draw_rectangle(rect.x, packet_y, rect.w, packet_height, fluid_color(*packet));
        }
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 3.0, GRAY);
        if selected {
            draw_rectangle_lines(rect.x - 3.0, rect.y - 3.0, rect.w + 6.0, rect.h + 6.0, 4.0, WHITE);
        }
    }

    pub fn render_tube_lineup(&mut self, tubes: &[&Tube], selected: Option<TubeId>, rect: Rect) {
        let tube_count = tubes.len() as f32;
        let spacing = 24.0;
        let total_spacing = spacing * (tube_count - 1.0);
        let tube_width = ((rect.w - total_spacing) / tube_count).min(rect.h * 0.35);
        let used = tube_width * tube_count + total_spacing;
        let start_x = rect.x + (rect.w - used) / 2.0;
        for (i, tube) in tubes.iter().enumerate() {
            let tube_x = start_x + i as f32 * (tube_width + spacing);
            self.render_tube(
                tube,
                Some(tube.get_id()) == selected,
                Rect::new(tube_x, rect.y, tube_width, rect.h),
            );
        }
    }

    pub fn render_tube_grid(
        &mut self,
        tubes: &[&Tube],
        selected: Option<TubeId>,
        max_columns: usize,
        rect: Rect,
    ) {
        let tube_count = tubes.len();
        if tube_count == 0 {
            return;
        }
        let rows = tube_count.div_ceil(max_columns);
        let spacing = 20.0;
        let total_spacing_y = spacing * (rows as f32 - 1.0);
        let tube_height = (rect.h - total_spacing_y) / rows as f32;

        for (row, row_tubes) in tubes.chunks(max_columns).enumerate() {
            let tube_y = rect.y + row as f32 * (tube_height + spacing);
            self.render_tube_lineup(
                row_tubes,
                selected,
                Rect::new(rect.x, tube_y, rect.w, tube_height),
            );
        }
    }

    pub fn render_button(&mut self, button: &Button, enabled: bool, rect: Rect) {
        let (fill, text) = if enabled {
            self.hit_test.push(
                rect,
                HitItem::Button {
                    function: button.get_action(),
                },
            );
            (button.get_color(), WHITE)
        } else {
            (Color::new(0.15, 0.15, 0.18, 1.0), GRAY)
        };
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, fill);
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, BLACK);
        let inset = Rect::new(rect.x + rect.w * 0.1, rect.y + rect.h * 0.2, rect.w * 0.8, rect.h * 0.6);
        self.render_text(button.get_label(), inset, text);
    }

    pub fn render_button_lineup(&mut self, buttons: &[(Button, bool)], rect: Rect) {
        let button_count = buttons.len() as f32;
        let spacing = 10.0;
        let total_spacing = spacing * (button_count - 1.0);
        let button_width = (rect.w - total_spacing) / button_count;
        for (i, (button, enabled)) in buttons.iter().enumerate() {
            let button_x = rect.x + i as f32 * (button_width + spacing);
            self.render_button(
                button,
                *enabled,
                Rect::new(button_x, rect.y, button_width, rect.h),
            );
        }
    }

    fn render_overlay(&mut self, rect: Rect, title: &str, message: &str, action: Option<Button>) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, Color::new(0.0, 0.0, 0.0, 0.7));
        self.render_text(
            title,
            Rect::new(rect.x + rect.w * 0.2, rect.y + rect.h * 0.2, rect.w * 0.6, rect.h * 0.2),
            YELLOW,
        );
        self.render_text(
            message,
            Rect::new(rect.x + rect.w * 0.3, rect.y + rect.h * 0.45, rect.w * 0.4, rect.h * 0.08),
            WHITE,
        );
        if let Some(button) = action {
            self.render_button(
                &button,
                true,
                Rect::new(rect.x + rect.w * 0.4, rect.y + rect.h * 0.6, rect.w * 0.2, rect.h * 0.1),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_zero_padded() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(600), "10:00");
    }
}
