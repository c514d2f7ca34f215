use std::time::{Duration, Instant};

use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
};

use crate::canvas::Rgb;

/// How long a floating glyph stays on screen
pub const GLYPH_LIFETIME: Duration = Duration::from_millis(1400);

/// Rows above the bottom edge where glyphs appear
const SPAWN_ROWS_FROM_BOTTOM: u16 = 3;

/// Rows a glyph climbs over its lifetime
const RISE_ROWS: f64 = 4.0;

/// A letter floating up from the bottom of the screen
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub symbol: char,
    pub column: u16,
    pub base_row: u16,
    pub color: Rgb,
    pub spawned_at: Instant,
}

impl Glyph {
    /// Fraction of the lifetime used up, in `0.0..=1.0`
    pub fn progress(&self, now: Instant) -> f64 {
        let age = now.saturating_duration_since(self.spawned_at);
        (age.as_secs_f64() / GLYPH_LIFETIME.as_secs_f64()).min(1.0)
    }

    pub fn is_alive(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.spawned_at) < GLYPH_LIFETIME
    }

    /// Current row: drifts upward as the glyph ages
    pub fn row(&self, now: Instant) -> u16 {
        let rise = (self.progress(now) * RISE_ROWS).round() as u16;
        self.base_row.saturating_sub(rise)
    }
}

#[derive(Debug, Default)]
pub struct GlyphLayer {
    glyphs: Vec<Glyph>,
}

impl GlyphLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Spawn a glyph at a random column near the bottom of `viewport`.
    /// Spaces are skipped. Returns whether a glyph was added.
    pub fn spawn(&mut self, symbol: char, viewport: Rect, now: Instant) -> bool {
        if symbol == ' ' || symbol.is_control() {
            return false;
        }
        let mut rng = rand::thread_rng();

        let column = viewport.x + rng.gen_range(0..viewport.width.max(1));
        let base_row = viewport.bottom().saturating_sub(SPAWN_ROWS_FROM_BOTTOM);
        let hue = rng.gen_range(0.0..360.0);

        self.glyphs.push(Glyph {
            symbol,
            column,
            base_row,
            color: Rgb::from_hsl(hue, 1.0, 0.6),
            spawned_at: now,
        });
        true
    }

    /// Drop glyphs whose lifetime has passed
    pub fn expire(&mut self, now: Instant) {
        self.glyphs.retain(|g| g.is_alive(now));
    }

    /// Draw live glyphs on top of whatever is already in `buf`
    pub fn render(&self, now: Instant, area: Rect, buf: &mut Buffer) {
        for glyph in self.glyphs.iter().filter(|g| g.is_alive(now)) {
            let (x, y) = (glyph.column, glyph.row(now));
            if x < area.left() || x >= area.right() || y < area.top() || y >= area.bottom() {
                continue;
            }

            // fade out over the last part of the lifetime
            let remaining = 1.0 - glyph.progress(now);
            let style = if remaining > 0.6 {
                Style::default()
                    .fg(glyph.color.into())
                    .add_modifier(Modifier::BOLD)
            } else if remaining > 0.25 {
                Style::default().fg(glyph.color.into())
            } else {
                Style::default()
                    .fg(glyph.color.into())
                    .add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_symbol(&glyph.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0, 0, 80, 24)
    }

    #[test]
    fn spawn_skips_spaces() {
        let mut layer = GlyphLayer::new();
        assert!(!layer.spawn(' ', viewport(), Instant::now()));
        assert!(layer.is_empty());
    }

    #[test]
    fn spawn_places_glyph_near_bottom() {
        let mut layer = GlyphLayer::new();
        let now = Instant::now();

        for c in "typing".chars() {
            assert!(layer.spawn(c, viewport(), now));
        }

        assert_eq!(layer.len(), 6);
        for glyph in layer.glyphs() {
            assert!(glyph.column < 80);
            assert_eq!(glyph.base_row, 21);
            assert_eq!(glyph.spawned_at, now);
        }
    }

    #[test]
    fn glyphs_expire_after_lifetime() {
        let mut layer = GlyphLayer::new();
        let now = Instant::now();
        layer.spawn('a', viewport(), now);
        layer.spawn('b', viewport(), now + Duration::from_millis(500));

        layer.expire(now + Duration::from_millis(1399));
        assert_eq!(layer.len(), 2);

        layer.expire(now + GLYPH_LIFETIME);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.glyphs()[0].symbol, 'b');

        layer.expire(now + Duration::from_millis(1900));
        assert!(layer.is_empty());
    }

    #[test]
    fn glyph_rises_as_it_ages() {
        let now = Instant::now();
        let glyph = Glyph {
            symbol: 'x',
            column: 4,
            base_row: 20,
            color: Rgb::from_hsl(120.0, 1.0, 0.6),
            spawned_at: now,
        };

        assert_eq!(glyph.row(now), 20);
        assert_eq!(glyph.row(now + Duration::from_millis(700)), 18);
        assert_eq!(glyph.row(now + GLYPH_LIFETIME), 16);
        assert!(!glyph.is_alive(now + GLYPH_LIFETIME));
    }

    #[test]
    fn tiny_viewport_does_not_panic() {
        let mut layer = GlyphLayer::new();
        let now = Instant::now();
        assert!(layer.spawn('q', Rect::new(0, 0, 0, 0), now));

        let mut buf = Buffer::empty(Rect::new(0, 0, 1, 1));
        layer.render(now, Rect::new(0, 0, 1, 1), &mut buf);
    }

    #[test]
    fn render_draws_symbol() {
        let mut layer = GlyphLayer::new();
        let now = Instant::now();
        layer.spawn('z', Rect::new(0, 0, 1, 10), now);

        let area = Rect::new(0, 0, 1, 10);
        let mut buf = Buffer::empty(area);
        layer.render(now, area, &mut buf);

        assert_eq!(buf[(0, 7)].symbol(), "z");
    }
}
