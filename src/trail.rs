use std::collections::VecDeque;

use ratatui::layout::Rect;

use crate::canvas::{CompositeMode, Point, RenderSurface, Rgb, Stroke};

/// Most recent pointer positions kept
pub const TRAIL_CAPACITY: usize = 120;

/// Life lost per frame by the leading point of each drawn segment
pub const LIFE_DECAY: f64 = 0.018;

/// Black wash applied every frame to fade earlier frames
pub const FADE_ALPHA: f64 = 0.25;

const STROKE_WIDTH: f64 = 1.0;
const GLOW_BLUR: f64 = 2.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub position: Point,
    pub life: f64,
}

/// Decaying polyline of recent pointer positions
#[derive(Debug)]
pub struct TrailState {
    points: VecDeque<TrailPoint>,
}

impl TrailState {
    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(TRAIL_CAPACITY + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.points.push_back(TrailPoint {
            position: Point::new(x, y),
            life: 1.0,
        });
        if self.points.len() > TRAIL_CAPACITY {
            self.points.pop_front();
        }
    }

    /// Paint one frame: fade the surface, stroke every segment additively,
    /// age the points and drop the dead ones from the front.
    pub fn on_frame_tick<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        let (width, height) = surface.size();

        surface.set_composite(CompositeMode::Normal);
        surface.fill_rect(Rect::new(0, 0, width, height), Rgb::BLACK, FADE_ALPHA);

        surface.set_composite(CompositeMode::Additive);
        let color = Rgb::from_u8(0, 191, 255);
        let glow = Rgb::from_u8(0, 180, 255).scale(0.9);

        for idx in 1..self.points.len() {
            let from = self.points[idx - 1];
            let to = self.points[idx];
            surface.stroke_segment(
                from.position,
                to.position,
                &Stroke {
                    alpha: from.life,
                    width: STROKE_WIDTH,
                    blur: GLOW_BLUR,
                    color,
                    glow,
                },
            );
            self.points[idx - 1].life -= LIFE_DECAY;
        }

        while self.points.front().is_some_and(|p| p.life <= 0.0) {
            self.points.pop_front();
        }
    }

    /// Points keep their coordinates; only the surface changes size
    pub fn on_viewport_resize<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        width: u16,
        height: u16,
    ) {
        surface.resize(width, height);
    }
}

impl Default for TrailState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Composite(CompositeMode),
        Fill(Rect, f64),
        Stroke(Point, Point, f64),
        Resize(u16, u16),
    }

    /// Records drawing calls instead of painting
    #[derive(Default)]
    struct RecordingSurface {
        size: (u16, u16),
        calls: Vec<Call>,
    }

    impl RenderSurface for RecordingSurface {
        fn size(&self) -> (u16, u16) {
            self.size
        }

        fn resize(&mut self, width: u16, height: u16) {
            self.size = (width, height);
            self.calls.push(Call::Resize(width, height));
        }

        fn set_composite(&mut self, mode: CompositeMode) {
            self.calls.push(Call::Composite(mode));
        }

        fn fill_rect(&mut self, area: Rect, _color: Rgb, alpha: f64) {
            self.calls.push(Call::Fill(area, alpha));
        }

        fn stroke_segment(&mut self, from: Point, to: Point, stroke: &Stroke) {
            self.calls.push(Call::Stroke(from, to, stroke.alpha));
        }
    }

    fn surface() -> RecordingSurface {
        RecordingSurface {
            size: (80, 24),
            ..Default::default()
        }
    }

    #[test]
    fn pointer_moves_append_with_full_life() {
        let mut trail = TrailState::new();
        trail.on_pointer_move(1.0, 2.0);
        trail.on_pointer_move(3.0, 4.0);

        let points: Vec<_> = trail.points().copied().collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].position, Point::new(3.0, 4.0));
        assert!(points.iter().all(|p| p.life == 1.0));
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut trail = TrailState::new();
        for i in 0..(TRAIL_CAPACITY + 30) {
            trail.on_pointer_move(i as f64, 0.0);
            assert!(trail.len() <= TRAIL_CAPACITY);
        }

        assert_eq!(trail.len(), TRAIL_CAPACITY);
        let first = trail.points().next().unwrap();
        assert_eq!(first.position.x, 30.0);
        let last = trail.points().last().unwrap();
        assert_eq!(last.position.x, (TRAIL_CAPACITY + 29) as f64);
    }

    #[test]
    fn frame_fades_then_strokes_additively() {
        let mut trail = TrailState::new();
        trail.on_pointer_move(0.0, 0.0);
        trail.on_pointer_move(5.0, 0.0);
        trail.on_pointer_move(5.0, 5.0);
        let mut s = surface();

        trail.on_frame_tick(&mut s);

        assert_eq!(
            s.calls,
            vec![
                Call::Composite(CompositeMode::Normal),
                Call::Fill(Rect::new(0, 0, 80, 24), FADE_ALPHA),
                Call::Composite(CompositeMode::Additive),
                Call::Stroke(Point::new(0.0, 0.0), Point::new(5.0, 0.0), 1.0),
                Call::Stroke(Point::new(5.0, 0.0), Point::new(5.0, 5.0), 1.0),
            ]
        );
    }

    #[test]
    fn leading_points_decay_and_last_point_does_not() {
        let mut trail = TrailState::new();
        trail.on_pointer_move(0.0, 0.0);
        trail.on_pointer_move(1.0, 0.0);
        let mut s = surface();

        trail.on_frame_tick(&mut s);
        trail.on_frame_tick(&mut s);

        let lives: Vec<f64> = trail.points().map(|p| p.life).collect();
        assert!((lives[0] - (1.0 - 2.0 * LIFE_DECAY)).abs() < 1e-9);
        assert_eq!(lives[1], 1.0);

        // second frame draws with the decayed alpha
        let alphas: Vec<f64> = s
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Stroke(_, _, a) => Some(*a),
                _ => None,
            })
            .collect();
        assert_eq!(alphas.len(), 2);
        assert!((alphas[1] - (1.0 - LIFE_DECAY)).abs() < 1e-9);
    }

    #[test]
    fn dead_points_are_evicted_from_front() {
        let mut trail = TrailState::new();
        trail.on_pointer_move(0.0, 0.0);
        trail.on_pointer_move(1.0, 1.0);
        let mut s = surface();

        let frames = (1.0 / LIFE_DECAY).ceil() as usize;
        for _ in 0..frames {
            trail.on_frame_tick(&mut s);
        }

        assert_eq!(trail.len(), 1);
        assert_eq!(trail.points().next().unwrap().position, Point::new(1.0, 1.0));
    }

    #[test]
    fn single_point_draws_nothing_but_still_fades() {
        let mut trail = TrailState::new();
        trail.on_pointer_move(2.0, 2.0);
        let mut s = surface();

        trail.on_frame_tick(&mut s);

        assert!(!s.calls.iter().any(|c| matches!(c, Call::Stroke(..))));
        assert!(s.calls.iter().any(|c| matches!(c, Call::Fill(..))));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn resize_keeps_points() {
        let mut trail = TrailState::new();
        trail.on_pointer_move(70.0, 20.0);
        let mut s = surface();

        trail.on_viewport_resize(&mut s, 40, 10);

        assert_eq!(s.size, (40, 10));
        assert_eq!(
            trail.points().next().unwrap().position,
            Point::new(70.0, 20.0)
        );
    }

    #[test]
    fn off_surface_points_are_harmless() {
        let mut trail = TrailState::new();
        trail.on_pointer_move(-1e6, 1e6);
        trail.on_pointer_move(f64::MAX, -3.0);
        let mut canvas = crate::canvas::CellCanvas::new(10, 5);

        trail.on_frame_tick(&mut canvas);
        assert_eq!(trail.len(), 2);
    }
}
