//! Immediate-mode drawing surface for the pointer trail.
//!
//! [`RenderSurface`] is the small set of primitives the trail needs.
//! [`CellCanvas`] implements it over the terminal grid: every cell keeps an
//! RGB light value that is blended, faded and finally painted as the cell
//! background.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::Widget,
};

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 2.0;

/// Cells dimmer than this are left untouched when painting
const VISIBLE_THRESHOLD: f32 = 0.04;

/// Linear color with channels in `0.0..=1.0`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// `hue` in degrees, `saturation` and `lightness` in `0.0..=1.0`
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let h = hue.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c / 2.0;
        Self::new(r + m, g + m, b + m)
    }

    pub fn luminance(&self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.r * k, self.g * k, self.b * k)
    }

    fn lerp(self, other: Rgb, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    fn saturating_add(self, other: Rgb) -> Self {
        Self::new(
            (self.r + other.r).min(1.0),
            (self.g + other.g).min(1.0),
            (self.b + other.b).min(1.0),
        )
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::Rgb(to_u8(c.r), to_u8(c.g), to_u8(c.b))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeMode {
    /// Source-over: paint replaces what is underneath in proportion to alpha
    #[default]
    Normal,
    /// Lighter: paint adds to what is underneath
    Additive,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Style of one stroked segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub alpha: f64,
    pub width: f64,
    /// Glow radius beyond the stroke edge
    pub blur: f64,
    pub color: Rgb,
    pub glow: Rgb,
}

/// 2D drawing primitives used by the trail renderer
pub trait RenderSurface {
    fn size(&self) -> (u16, u16);
    fn resize(&mut self, width: u16, height: u16);
    fn set_composite(&mut self, mode: CompositeMode);
    fn fill_rect(&mut self, area: Rect, color: Rgb, alpha: f64);
    fn stroke_segment(&mut self, from: Point, to: Point, stroke: &Stroke);
}

/// Light buffer with one sample per terminal cell
#[derive(Clone, Debug, Default)]
pub struct CellCanvas {
    width: u16,
    height: u16,
    mode: CompositeMode,
    cells: Vec<Rgb>,
}

impl CellCanvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            mode: CompositeMode::Normal,
            cells: vec![Rgb::BLACK; width as usize * height as usize],
        }
    }

    pub fn composite(&self) -> CompositeMode {
        self.mode
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Rgb> {
        self.index(x as i64, y as i64).map(|idx| self.cells[idx])
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        let cell = &mut self.cells[idx];
        *cell = match self.mode {
            CompositeMode::Normal => cell.lerp(color, alpha),
            CompositeMode::Additive => cell.saturating_add(color.scale(alpha)),
        };
    }
}

impl RenderSurface for CellCanvas {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Resizing clears the canvas, like a resized browser canvas
    fn resize(&mut self, width: u16, height: u16) {
        *self = Self {
            mode: self.mode,
            ..Self::new(width, height)
        };
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.mode = mode;
    }

    fn fill_rect(&mut self, area: Rect, color: Rgb, alpha: f64) {
        let area = area.intersection(Rect::new(0, 0, self.width, self.height));
        let alpha = alpha.clamp(0.0, 1.0) as f32;
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                self.blend(x as i64, y as i64, color, alpha);
            }
        }
    }

    fn stroke_segment(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let alpha = stroke.alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let core = (stroke.width / 2.0).max(0.5);
        let reach = core + stroke.blur.max(0.0);

        let min_x = (from.x.min(to.x) - reach).floor() as i64;
        let max_x = (from.x.max(to.x) + reach).ceil() as i64;
        let min_y = (from.y.min(to.y) - reach / CELL_ASPECT).floor() as i64;
        let max_y = (from.y.max(to.y) + reach / CELL_ASPECT).ceil() as i64;

        // Clip the scan to the canvas so far off-screen segments cost nothing
        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        let max_x = max_x.min(self.width as i64 - 1);
        let max_y = max_y.min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let d = distance_to_segment(center, from, to);
                if d <= core {
                    self.blend(x, y, stroke.color, alpha as f32);
                } else if d <= reach && stroke.blur > 0.0 {
                    let falloff = 1.0 - (d - core) / stroke.blur;
                    let glow = alpha * falloff * falloff * 0.6;
                    self.blend(x, y, stroke.glow, glow as f32);
                }
            }
        }
    }
}

/// Distance from `p` to segment `a`-`b`, with rows stretched to match cell shape
fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (px, py) = (p.x, p.y * CELL_ASPECT);
    let (ax, ay) = (a.x, a.y * CELL_ASPECT);
    let (bx, by) = (b.x, b.y * CELL_ASPECT);

    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

impl Widget for &CellCanvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for y in 0..self.height.min(area.height) {
            for x in 0..self.width.min(area.width) {
                let Some(light) = self.get(x, y) else {
                    continue;
                };
                if light.luminance() < VISIBLE_THRESHOLD {
                    continue;
                }
                if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                    cell.set_bg(light.into());
                }
            }
        }
    }
}
