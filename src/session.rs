use std::time::{Duration, Instant};

use itertools::{EitherOrBoth, Itertools};
use tracing::{debug, info};

use crate::runtime::PeriodicTask;
use crate::text_bank::{Difficulty, TextBank};

/// How often the live readout is refreshed while a session runs
pub const METRICS_REFRESH_MS: u64 = 100;

/// Standard "word" length used for words-per-minute
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Complete,
}

/// Classification of one passage character against the input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Untyped,
    Current,
    Correct,
    Wrong,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Metrics {
    pub elapsed: Duration,
    pub wpm: u32,
    /// Percentage of typed characters that were correct
    pub accuracy: u32,
}

impl Metrics {
    pub fn compute(correct: usize, typed: usize, elapsed: Duration) -> Self {
        let minutes = elapsed.as_secs_f64() / 60.0;
        let wpm = if minutes > 0.0 {
            ((correct as f64 / CHARS_PER_WORD) / minutes).round() as u32
        } else {
            0
        };
        let accuracy = if typed > 0 {
            (correct as f64 / typed as f64 * 100.0).round() as u32
        } else {
            0
        };

        Self {
            elapsed,
            wpm,
            accuracy,
        }
    }

    /// Elapsed seconds with two decimals, e.g. "12.34"
    pub fn elapsed_display(&self) -> String {
        format!("{:.2}", self.elapsed.as_secs_f64())
    }
}

/// Final result of a finished session
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletionSummary {
    pub difficulty: Difficulty,
    pub metrics: Metrics,
}

/// Side effects of one input update for the caller to act on
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputEffects {
    /// Newly appended character, if the input grew
    pub glyph: Option<char>,
    /// Set on the update that finished the session
    pub completed: Option<CompletionSummary>,
}

enum PassageChoice {
    Keep,
    Random,
}

/// One typing attempt against a passage
#[derive(Debug)]
pub struct Session {
    bank: TextBank,
    difficulty: Difficulty,
    passage: String,
    passage_chars: Vec<char>,
    input: Vec<char>,
    started_at: Option<Instant>,
    correct: usize,
    typed: usize,
    phase: Phase,
    refresh_task: Option<PeriodicTask>,
    readout: Metrics,
    summary: Option<CompletionSummary>,
}

impl Session {
    /// Fresh session on the first passage of `difficulty`
    pub fn new(bank: TextBank, difficulty: Difficulty) -> Self {
        let passage = bank.first(difficulty).to_string();
        let passage_chars = passage.chars().collect();

        Self {
            bank,
            difficulty,
            passage,
            passage_chars,
            input: Vec::new(),
            started_at: None,
            correct: 0,
            typed: 0,
            phase: Phase::Idle,
            refresh_task: None,
            readout: Metrics::default(),
            summary: None,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn passage(&self) -> &str {
        &self.passage
    }

    /// Passage length in characters
    pub fn passage_len(&self) -> usize {
        self.passage_chars.len()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    pub fn typed_count(&self) -> usize {
        self.typed
    }

    pub fn input(&self) -> String {
        self.input.iter().collect()
    }

    pub fn summary(&self) -> Option<CompletionSummary> {
        self.summary
    }

    /// Metrics as last shown; updated on input and on each refresh tick
    pub fn readout(&self) -> Metrics {
        self.readout
    }

    pub fn is_refresh_active(&self) -> bool {
        self.refresh_task.is_some()
    }

    /// Apply the full current input value.
    ///
    /// Input after completion is ignored; characters past the passage end are
    /// counted as typed but never classified.
    pub fn on_input(&mut self, value: &str, now: Instant) -> InputEffects {
        if self.phase == Phase::Complete {
            return InputEffects::default();
        }

        let value: Vec<char> = value.chars().collect();
        let glyph = if value.len() > self.input.len() {
            value.last().copied()
        } else {
            None
        };

        if self.phase == Phase::Idle {
            self.start(now);
        }

        self.input = value;
        self.typed = self.input.len();
        self.correct = self
            .passage_chars
            .iter()
            .zip(&self.input)
            .filter(|(expected, typed)| expected == typed)
            .count();

        let completed = if self.typed >= self.passage_chars.len() {
            Some(self.complete(now))
        } else {
            self.readout = self.metrics_snapshot(now);
            None
        };

        InputEffects { glyph, completed }
    }

    /// Current metrics: zero before the first keystroke, frozen after completion
    pub fn metrics_snapshot(&self, now: Instant) -> Metrics {
        match (self.phase, self.summary, self.started_at) {
            (Phase::Complete, Some(summary), _) => summary.metrics,
            (_, _, Some(started_at)) => Metrics::compute(
                self.correct,
                self.typed,
                now.saturating_duration_since(started_at),
            ),
            _ => Metrics::default(),
        }
    }

    /// Drive the periodic readout refresh. Returns true if the readout changed.
    /// Inert unless the session is running.
    pub fn refresh(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Running {
            self.refresh_task = None;
            return false;
        }
        let due = self
            .refresh_task
            .as_mut()
            .is_some_and(|task| task.poll(now));
        if due {
            self.readout = self.metrics_snapshot(now);
        }
        due
    }

    /// Per-character classification of the whole passage
    pub fn statuses(&self) -> Vec<CharStatus> {
        let cursor = self.input.len();
        self.passage_chars
            .iter()
            .zip_longest(self.input.iter())
            .enumerate()
            .filter_map(|(idx, pair)| match pair {
                EitherOrBoth::Both(expected, typed) if expected == typed => {
                    Some(CharStatus::Correct)
                }
                EitherOrBoth::Both(_, _) => Some(CharStatus::Wrong),
                EitherOrBoth::Left(_) if idx == cursor => Some(CharStatus::Current),
                EitherOrBoth::Left(_) => Some(CharStatus::Untyped),
                EitherOrBoth::Right(_) => None,
            })
            .collect()
    }

    /// Switch level and start over on a random passage from it
    pub fn select_difficulty(&mut self, difficulty: Difficulty) {
        info!(from = %self.difficulty, to = %difficulty, "difficulty selected");
        self.difficulty = difficulty;
        self.reset(PassageChoice::Random);
    }

    /// Start over on a random passage of the current level
    pub fn request_new_text(&mut self) {
        self.reset(PassageChoice::Random);
    }

    /// Start over on the same passage
    pub fn restart(&mut self) {
        self.reset(PassageChoice::Keep);
    }

    fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.phase = Phase::Running;
        self.refresh_task = Some(PeriodicTask::start(
            Duration::from_millis(METRICS_REFRESH_MS),
            now,
        ));
        info!(difficulty = %self.difficulty, chars = self.passage_len(), "session started");
    }

    fn complete(&mut self, now: Instant) -> CompletionSummary {
        self.refresh_task = None;
        let summary = CompletionSummary {
            difficulty: self.difficulty,
            metrics: self.metrics_snapshot(now),
        };
        self.phase = Phase::Complete;
        self.summary = Some(summary);
        self.readout = summary.metrics;
        info!(
            difficulty = %summary.difficulty,
            wpm = summary.metrics.wpm,
            accuracy = summary.metrics.accuracy,
            elapsed = %summary.metrics.elapsed_display(),
            "session complete"
        );
        summary
    }

    fn reset(&mut self, choice: PassageChoice) {
        self.refresh_task = None;
        if let PassageChoice::Random = choice {
            self.passage = self
                .bank
                .choose(self.difficulty, &mut rand::thread_rng())
                .to_string();
            self.passage_chars = self.passage.chars().collect();
        }
        self.input.clear();
        self.started_at = None;
        self.correct = 0;
        self.typed = 0;
        self.phase = Phase::Idle;
        self.readout = Metrics::default();
        self.summary = None;
        debug!(difficulty = %self.difficulty, passage = %self.passage, "session reset");
    }
}
