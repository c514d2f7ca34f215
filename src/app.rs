use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use tracing::{debug, warn};

use crate::canvas::{CellCanvas, RenderSurface};
use crate::config::{Config, ConfigStore, FileConfigStore};
use crate::glyphs::GlyphLayer;
use crate::input::InputField;
use crate::runtime::AppEvent;
use crate::session::{Phase, Session};
use crate::text_bank::{Difficulty, TextBank};
use crate::trail::TrailState;

/// What the event loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Redraw,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effects {
    pub trail: bool,
    pub glyphs: bool,
}

impl From<&Config> for Effects {
    fn from(cfg: &Config) -> Self {
        Self {
            trail: cfg.trail,
            glyphs: cfg.glyphs,
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub input: InputField,
    pub trail: TrailState,
    pub canvas: CellCanvas,
    pub glyphs: GlyphLayer,
    pub effects: Effects,
    pub overlay_visible: bool,
    /// Time of the last handled event, used when rendering
    pub now: Instant,
    config: Config,
    store: Option<FileConfigStore>,
}

impl App {
    pub fn new(bank: TextBank, config: Config, width: u16, height: u16) -> Self {
        Self {
            session: Session::new(bank, config.difficulty),
            input: InputField::new(),
            trail: TrailState::new(),
            canvas: CellCanvas::new(width, height),
            glyphs: GlyphLayer::new(),
            effects: Effects::from(&config),
            overlay_visible: false,
            now: Instant::now(),
            config,
            store: None,
        }
    }

    /// Persist the chosen difficulty through `store`
    pub fn with_store(mut self, store: FileConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewport(&self) -> Rect {
        let (width, height) = self.canvas.size();
        Rect::new(0, 0, width, height)
    }

    pub fn handle_event(&mut self, event: AppEvent, now: Instant) -> Control {
        self.now = now;
        match event {
            AppEvent::Tick => {
                self.on_frame(now);
                Control::Redraw
            }
            AppEvent::Pointer(column, row) => {
                if self.effects.trail {
                    self.trail
                        .on_pointer_move(column as f64 + 0.5, row as f64 + 0.5);
                }
                Control::Continue
            }
            AppEvent::Resize(width, height) => {
                debug!(width, height, "viewport resized");
                self.trail
                    .on_viewport_resize(&mut self.canvas, width, height);
                Control::Redraw
            }
            AppEvent::Key(key) => self.on_key(key, now),
        }
    }

    fn on_frame(&mut self, now: Instant) {
        if self.effects.trail {
            self.trail.on_frame_tick(&mut self.canvas);
        }
        self.session.refresh(now);
        self.glyphs.expire(now);
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        if key.kind == KeyEventKind::Release {
            return Control::Continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return Control::Quit,
            KeyCode::Char('c') if ctrl => return Control::Quit,
            KeyCode::Left => self.restart(),
            KeyCode::Right => self.new_text(),
            KeyCode::Tab => self.select_difficulty(self.session.difficulty().next()),
            KeyCode::F(n @ 1..=3) => self.select_difficulty(Difficulty::ALL[n as usize - 1]),
            KeyCode::Enter => self.overlay_visible = false,
            KeyCode::Backspace => {
                if self.session.phase() != Phase::Complete && self.input.backspace() {
                    self.feed_input(now);
                }
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                if self.session.phase() == Phase::Complete {
                    match c {
                        'r' => self.restart(),
                        'n' => self.new_text(),
                        _ => {}
                    }
                } else if self.input.push(c) {
                    self.feed_input(now);
                }
            }
            _ => return Control::Continue,
        }
        Control::Redraw
    }

    fn feed_input(&mut self, now: Instant) {
        let effects = self.session.on_input(self.input.value(), now);

        if let Some(c) = effects.glyph.filter(|_| self.effects.glyphs) {
            self.glyphs.spawn(c, self.viewport(), now);
        }
        if effects.completed.is_some() {
            self.overlay_visible = true;
        }
    }

    pub fn restart(&mut self) {
        self.session.restart();
        self.fresh_input();
    }

    pub fn new_text(&mut self) {
        self.session.request_new_text();
        self.fresh_input();
    }

    pub fn select_difficulty(&mut self, difficulty: Difficulty) {
        self.session.select_difficulty(difficulty);
        self.fresh_input();

        if self.config.difficulty != difficulty {
            self.config.difficulty = difficulty;
            if let Some(store) = &self.store {
                if let Err(err) = store.save(&self.config) {
                    warn!(path = %store.path().display(), %err, "failed to save config");
                }
            }
        }
    }

    fn fresh_input(&mut self) {
        self.input.clear();
        self.overlay_visible = false;
    }
}
