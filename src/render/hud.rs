//! HUD overlay
//!
//! Fixed-position panels drawn in screen space after post-processing.
//! Layout is pure arithmetic on text widths so it can be asserted in tests.

use crate::surface::{Color, Surface};

const TEXT_COLOR: Color = Color::rgb(0xf4, 0xf5, 0xff);
const BORDER_COLOR: Color = Color::rgba(255, 255, 255, 0.18);

const PANEL_MARGIN: f32 = 12.0;

// Primary panel
const LINE_HEIGHT: f32 = 14.0;
const PADDING_X: f32 = 10.0;
const PADDING_Y: f32 = 8.0;
const PANEL_OPACITY: f32 = 0.75;
const PRIMARY_SCALE: f32 = 1.5;

// Debug panel
const DEBUG_LINE_HEIGHT: f32 = 12.0;
const DEBUG_PADDING_X: f32 = 8.0;
const DEBUG_PADDING_Y: f32 = 6.0;
const DEBUG_OPACITY: f32 = 0.65;
const DEBUG_SCALE: f32 = 1.0;

/// Extra readouts for the debug panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugReadout {
    pub fps: Option<f32>,
    pub camera: Option<(f32, f32)>,
    pub time_of_day: Option<f32>,
    pub shake: Option<(f32, f32)>,
}

/// Everything the HUD shows for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudData {
    pub fps: f32,
    pub health: Option<(i32, i32)>,
    pub position: Option<(i32, i32)>,
    /// Ordered `label: value` lines under the status readouts
    pub resources: Vec<(String, String)>,
    /// Centred label at the top of the screen
    pub title: Option<String>,
    /// Shown only when set
    pub debug: Option<DebugReadout>,
}

/// Logical rectangle occupied by a panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Where each panel landed this frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudLayout {
    pub status: Option<PanelRect>,
    pub title: Option<PanelRect>,
    pub debug: Option<PanelRect>,
}

/// `FPS: 07`, or `FPS: --` when the rate is unknown
pub fn format_fps(fps: f32) -> String {
    if !fps.is_finite() {
        return "FPS: --".to_string();
    }
    format!("FPS: {:02}", fps.round().max(0.0) as u32)
}

/// Panel width: widest line plus horizontal padding, rounded up
pub fn panel_width(surface: &Surface, lines: &[String], scale: f32, padding_x: f32) -> f32 {
    let widest = lines.iter().map(|l| surface.measure_text(l, scale)).fold(0.0, f32::max);
    (widest + padding_x * 2.0).ceil()
}

pub fn status_lines(data: &HudData) -> Vec<String> {
    let mut lines = vec![format_fps(data.fps)];
    if let Some((hp, max)) = data.health {
        lines.push(format!("HP: {}/{}", hp, max));
    }
    if let Some((x, y)) = data.position {
        lines.push(format!("Pos: {}, {}", x, y));
    }
    lines.extend(data.resources.iter().map(|(k, v)| format!("{}: {}", k, v)));
    lines
}

pub fn debug_lines(data: &HudData, debug: &DebugReadout) -> Vec<String> {
    let mut lines = vec![format_fps(debug.fps.unwrap_or(data.fps))];
    if let Some((x, y)) = debug.camera {
        lines.push(format!("Cam: {}, {}", x.round(), y.round()));
    }
    if let Some(t) = debug.time_of_day.filter(|t| t.is_finite()) {
        lines.push(format!("ToD: {:.2}", t));
    }
    if let Some((ox, oy)) = debug.shake {
        lines.push(format!("Shake: {:.2}, {:.2}", ox, oy));
    }
    lines
}

#[derive(Debug, Default)]
pub struct Hud;

impl Hud {
    pub fn new() -> Self {
        Self
    }

    /// Draw all panels in screen space; the caller's translation is ignored
    pub fn draw(&self, surface: &mut Surface, data: &HudData) -> HudLayout {
        surface.save();
        let state = surface.state();
        surface.translate(-state.translate.0, -state.translate.1);
        surface.set_blend(Default::default());
        surface.set_alpha(1.0);

        let mut layout = HudLayout::default();

        let lines = status_lines(data);
        let width = panel_width(surface, &lines, PRIMARY_SCALE, PADDING_X);
        let height = lines.len() as f32 * LINE_HEIGHT + PADDING_Y * 2.0;
        let status = PanelRect { x: PANEL_MARGIN, y: PANEL_MARGIN, width, height };
        draw_panel(surface, status, PANEL_OPACITY);
        for (i, text) in lines.iter().enumerate() {
            let tx = (status.x + PADDING_X).round();
            let ty = (status.y + PADDING_Y + i as f32 * LINE_HEIGHT).round();
            surface.fill_text(text, tx, ty, PRIMARY_SCALE, TEXT_COLOR);
        }
        layout.status = Some(status);

        if let Some(title) = data.title.as_deref().filter(|t| !t.is_empty()) {
            let text_width = surface.measure_text(title, PRIMARY_SCALE);
            let center_x = (surface.width() as f32 / 2.0 - text_width / 2.0).round();
            let rect = PanelRect {
                x: center_x - PADDING_X,
                y: PANEL_MARGIN,
                width: text_width + PADDING_X * 2.0,
                height: LINE_HEIGHT + PADDING_Y,
            };
            draw_panel(surface, rect, PANEL_OPACITY);
            surface.fill_text(title, center_x, rect.y + PADDING_Y / 2.0, PRIMARY_SCALE, TEXT_COLOR);
            layout.title = Some(rect);
        }

        if let Some(debug) = &data.debug {
            let lines = debug_lines(data, debug);
            let width = panel_width(surface, &lines, DEBUG_SCALE, DEBUG_PADDING_X);
            let height = lines.len() as f32 * DEBUG_LINE_HEIGHT + DEBUG_PADDING_Y * 2.0;
            let x = surface.width() as f32 - width - PANEL_MARGIN;
            let rect = PanelRect { x: x.round(), y: PANEL_MARGIN, width, height };
            draw_panel(surface, rect, DEBUG_OPACITY);
            for (i, text) in lines.iter().enumerate() {
                let tx = (x + DEBUG_PADDING_X).round();
                let ty = (rect.y + DEBUG_PADDING_Y + i as f32 * DEBUG_LINE_HEIGHT).round();
                surface.fill_text(text, tx, ty, DEBUG_SCALE, TEXT_COLOR);
            }
            layout.debug = Some(rect);
        }

        surface.restore();
        layout
    }
}

fn draw_panel(surface: &mut Surface, rect: PanelRect, opacity: f32) {
    surface.fill_rect(rect.x, rect.y, rect.width, rect.height, Color::rgba(10, 12, 28, opacity));
    surface.stroke_rect(rect.x, rect.y, rect.width, rect.height, 1.0, BORDER_COLOR);
}
