use crate::app::{HudSnapshot, LoopMetricsSnapshot};

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const TEXT_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;
const PANEL_MARGIN: i32 = 12;
const PANEL_INSET: i32 = 8;
const DIALOGUE_MAX_LINES: usize = 4;

const TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
const TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const SPEAKER_COLOR: [u8; 4] = [255, 214, 120, 255];
const PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 255];
const PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];

/// Host-side state drawn alongside the scene HUD.
#[derive(Debug, Clone, Default)]
pub(crate) struct HostOverlay {
    pub perf: Option<LoopMetricsSnapshot>,
    pub render_fps_cap: Option<u32>,
    pub entity_count: usize,
    pub chat_draft: Option<String>,
}

pub(crate) fn draw_hud(
    frame: &mut [u8],
    width: u32,
    height: u32,
    hud: Option<&HudSnapshot>,
    host: &HostOverlay,
) {
    if width == 0 || height == 0 {
        return;
    }
    let mut canvas = Canvas {
        frame,
        width,
        height,
    };

    if let Some(metrics) = host.perf.as_ref() {
        let lines = perf_lines(metrics, host.render_fps_cap, host.entity_count);
        canvas.panel(PANEL_MARGIN, PANEL_MARGIN, &lines, TEXT_COLOR);
    }

    let max_chars =
        ((width as i32 - 2 * (PANEL_MARGIN + PANEL_INSET)) / GLYPH_ADVANCE).max(8) as usize;
    let mut bottom = height as i32 - PANEL_MARGIN;

    if let Some(draft) = host.chat_draft.as_deref() {
        let line = format!("> {draft}_");
        let lines = wrap_text(&line, max_chars);
        bottom -= panel_height(lines.len());
        canvas.panel(PANEL_MARGIN, bottom, &lines, TEXT_COLOR);
        bottom -= PANEL_MARGIN / 2;
    }

    let Some(hud) = hud else {
        return;
    };

    if let Some(dialogue) = hud.dialogue.as_ref() {
        let mut lines = vec![dialogue.speaker.clone()];
        lines.extend(
            wrap_text(&dialogue.text, max_chars)
                .into_iter()
                .take(DIALOGUE_MAX_LINES),
        );
        bottom -= panel_height(lines.len());
        canvas.panel_with_title(PANEL_MARGIN, bottom, &lines, SPEAKER_COLOR);
    }

    if !hud.objective_lines.is_empty() {
        let longest = longest_line_px(&hud.objective_lines);
        let left = width as i32 - PANEL_MARGIN - longest - 2 * PANEL_INSET;
        canvas.panel(left, PANEL_MARGIN, &hud.objective_lines, TEXT_DIM_COLOR);
    }

    if let Some(message) = hud.message.as_ref() {
        let line = format!("{}: {}", message.label, message.text);
        let lines = wrap_text(&line, max_chars);
        let left = (width as i32 - longest_line_px(&lines)) / 2 - PANEL_INSET;
        canvas.panel(left, height as i32 / 4, &lines, TEXT_COLOR);
    }

    if let Some(menu_lines) = hud.menu_lines.as_ref() {
        let left = (width as i32 - longest_line_px(menu_lines)) / 2 - PANEL_INSET;
        let top = (height as i32 - panel_height(menu_lines.len())) / 2;
        canvas.panel_with_title(left, top, menu_lines, SPEAKER_COLOR);
    }
}

fn perf_lines(metrics: &LoopMetricsSnapshot, cap: Option<u32>, entity_count: usize) -> Vec<String> {
    let cap_text = cap.map_or_else(|| "off".to_string(), |value| value.to_string());
    vec![
        "PERF".to_string(),
        format!("FPS: {:.0} (CAP {cap_text})", metrics.fps),
        format!("TPS: {:.1}", metrics.tps),
        format!("FRAME: {:.2} MS", metrics.frame_time_ms),
        format!("DROPPED: {}", metrics.dropped_ticks),
        format!("ENTITIES: {entity_count}"),
        format!(
            "VIS/HID: {}/{}",
            metrics.visible_entities, metrics.hidden_entities
        ),
    ]
}

/// Greedy word wrap by character count. Words longer than a line are split.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(index, _)| index);
            let rest = word.split_off(split_at);
            lines.push(word);
            word = rest;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn panel_height(line_count: usize) -> i32 {
    line_count as i32 * LINE_ADVANCE + 2 * PANEL_INSET
}

fn longest_line_px(lines: &[String]) -> i32 {
    lines
        .iter()
        .map(|line| line.chars().count() as i32 * GLYPH_ADVANCE)
        .max()
        .unwrap_or(0)
}

struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl Canvas<'_> {
    fn panel(&mut self, left: i32, top: i32, lines: &[String], color: [u8; 4]) {
        self.panel_inner(left, top, lines, color, color);
    }

    fn panel_with_title(&mut self, left: i32, top: i32, lines: &[String], title_color: [u8; 4]) {
        self.panel_inner(left, top, lines, title_color, TEXT_COLOR);
    }

    fn panel_inner(
        &mut self,
        left: i32,
        top: i32,
        lines: &[String],
        first_color: [u8; 4],
        rest_color: [u8; 4],
    ) {
        if lines.is_empty() {
            return;
        }
        let panel_width = longest_line_px(lines) + 2 * PANEL_INSET;
        let height_px = panel_height(lines.len());
        self.fill_rect(left, top, panel_width, height_px, PANEL_BG_COLOR);
        self.rect_outline(left, top, panel_width, height_px, PANEL_BORDER_COLOR);

        let mut y = top + PANEL_INSET;
        for (index, line) in lines.iter().enumerate() {
            let color = if index == 0 { first_color } else { rest_color };
            self.text(left + PANEL_INSET, y, line, color);
            y += LINE_ADVANCE;
        }
    }

    fn text(&mut self, mut x: i32, y: i32, text: &str, color: [u8; 4]) {
        for ch in text.chars() {
            self.glyph(x, y, glyph_bits(ch), color);
            x += GLYPH_ADVANCE;
        }
    }

    fn glyph(&mut self, x: i32, y: i32, bits: u16, color: [u8; 4]) {
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
                if bits & (1 << shift) == 0 {
                    continue;
                }
                self.fill_rect(
                    x + col * TEXT_SCALE,
                    y + row * TEXT_SCALE,
                    TEXT_SCALE,
                    TEXT_SCALE,
                    color,
                );
            }
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: [u8; 4]) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = (x + rect_width).min(self.width as i32);
        let end_y = (y + rect_height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                let offset = (py as usize * self.width as usize + px as usize) * 4;
                if let Some(pixel) = self.frame.get_mut(offset..offset + 4) {
                    pixel.copy_from_slice(&color);
                }
            }
        }
    }

    fn rect_outline(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: [u8; 4]) {
        self.fill_rect(x, y, rect_width, 1, color);
        self.fill_rect(x, y + rect_height - 1, rect_width, 1, color);
        self.fill_rect(x, y, 1, rect_height, color);
        self.fill_rect(x + rect_width - 1, y, 1, rect_height, color);
    }
}

/// 3x5 glyphs packed row-major, top row in the high bits. Lowercase
/// renders with the uppercase shapes; unknown characters draw as `?`.
fn glyph_bits(ch: char) -> u16 {
    match ch.to_ascii_uppercase() {
        ' ' => 0,
        'A' => 0b010_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b011_100_100_100_011,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_110_100_111,
        'F' => 0b111_100_110_100_100,
        'G' => 0b011_100_101_101_011,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_010,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_101_101_101,
        'N' => 0b110_101_101_101_101,
        'O' => 0b010_101_101_101_010,
        'P' => 0b110_101_110_100_100,
        'Q' => 0b010_101_101_011_001,
        'R' => 0b110_101_110_101_101,
        'S' => 0b011_100_010_001_110,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_101_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_010,
        '2' => 0b110_001_010_100_111,
        '3' => 0b110_001_010_001_110,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_110_001_110,
        '6' => 0b011_100_111_101_111,
        '7' => 0b111_001_010_010_010,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_110,
        '!' => 0b010_010_010_000_010,
        '"' => 0b101_101_000_000_000,
        '\'' => 0b010_010_000_000_000,
        '(' => 0b001_010_010_010_001,
        ')' => 0b100_010_010_010_100,
        '+' => 0b000_010_111_010_000,
        ',' => 0b000_000_000_010_100,
        '-' => 0b000_000_111_000_000,
        '.' => 0b000_000_000_000_010,
        '/' => 0b001_001_010_100_100,
        ':' => 0b000_010_000_010_000,
        ';' => 0b000_010_000_010_100,
        '<' => 0b001_010_100_010_001,
        '=' => 0b000_111_000_111_000,
        '>' => 0b100_010_001_010_100,
        '_' => 0b000_000_000_000_111,
        '%' => 0b101_001_010_100_101,
        '#' => 0b101_111_101_111_101,
        '&' => 0b010_101_010_101_011,
        '[' => 0b110_100_100_100_110,
        ']' => 0b011_001_001_001_011,
        _ => 0b111_001_011_000_010,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{HudDialogue, HudMessage};

    #[test]
    fn wrap_text_breaks_on_word_boundaries() {
        let lines = wrap_text("have you seen my little teddy bear", 12);
        assert_eq!(lines, vec!["have you", "seen my", "little teddy", "bear"]);
    }

    #[test]
    fn wrap_text_splits_words_longer_than_a_line() {
        let lines = wrap_text("abcdefghij xy", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn wrap_text_of_blank_input_is_empty() {
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn lowercase_uses_uppercase_glyphs_and_unknown_falls_back() {
        assert_eq!(glyph_bits('a'), glyph_bits('A'));
        assert_eq!(glyph_bits('\u{263a}'), glyph_bits('?'));
        assert_eq!(glyph_bits(' '), 0);
    }

    #[test]
    fn letters_and_digits_have_distinct_shapes() {
        let glyphs = ('A'..='Z')
            .chain('0'..='9')
            .filter(|ch| *ch != 'O' && *ch != '0')
            .map(glyph_bits)
            .collect::<Vec<_>>();
        for (index, bits) in glyphs.iter().enumerate() {
            assert_ne!(*bits, 0);
            assert!(!glyphs[index + 1..].contains(bits), "duplicate glyph at {index}");
        }
    }

    #[test]
    fn draw_hud_writes_pixels_and_stays_in_bounds() {
        let (width, height) = (320u32, 200u32);
        let mut frame = vec![0u8; (width * height * 4) as usize];
        let hud = HudSnapshot {
            dialogue: Some(HudDialogue {
                speaker: "Mrs. Wicket".to_string(),
                text: "Oh dear, I've lost my grandson's teddy somewhere by the benches."
                    .to_string(),
            }),
            message: Some(HudMessage {
                label: "Bakery".to_string(),
                text: "The door swings open.".to_string(),
            }),
            objective_lines: vec!["FIND TEDDY".to_string(), "> talk to mrs. wicket".to_string()],
            menu_lines: Some(vec!["MENU".to_string(), "1. Find Teddy".to_string()]),
            visible_count: 3,
            hidden_count: 1,
        };
        let host = HostOverlay {
            perf: Some(LoopMetricsSnapshot::default()),
            render_fps_cap: None,
            entity_count: 4,
            chat_draft: Some("where".to_string()),
        };

        draw_hud(&mut frame, width, height, Some(&hud), &host);
        assert!(frame.iter().any(|byte| *byte != 0));
        assert_eq!(frame.len(), (width * height * 4) as usize);
    }
}
