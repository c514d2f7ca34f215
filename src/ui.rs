use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    session::{CharStatus, CompletionSummary, Phase},
    text_bank::Difficulty,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const OVERLAY_WIDTH: u16 = 38;
const OVERLAY_HEIGHT: u16 = 8;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.effects.trail {
            (&self.canvas).render(area, buf);
        }

        let session = &self.session;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let passage_width = session.passage().width();
        let prompt_occupied_lines = if passage_width <= max_chars_per_line as usize {
            1
        } else {
            ((passage_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
        };
        let padding = area
            .height
            .saturating_sub(prompt_occupied_lines + VERTICAL_MARGIN * 2 + 5)
            / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),                     // difficulty bar
                Constraint::Length(padding),               // padding
                Constraint::Length(prompt_occupied_lines), // passage
                Constraint::Length(1),                     // padding
                Constraint::Length(1),                     // readouts
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(difficulty_bar(session.difficulty()))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        Paragraph::new(passage_line(session.passage(), &session.statuses()))
            .alignment(if prompt_occupied_lines == 1 {
                // when the passage fits on one line centering it looks calmer
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        let readout = session.readout();
        Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {}s",
                readout.wpm,
                readout.accuracy,
                readout.elapsed_display()
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        let legend = if session.phase() == Phase::Complete {
            "(r)estart / (n)ew text / (enter) close / (tab) difficulty / (esc)ape"
        } else {
            "(←) restart / (→) new text / (tab) or (f1-f3) difficulty / (esc)ape"
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[6], buf);

        if self.effects.glyphs {
            self.glyphs.render(self.now, area, buf);
        }

        if self.overlay_visible {
            if let Some(summary) = session.summary() {
                render_summary_overlay(&summary, area, buf);
            }
        }
    }
}

fn difficulty_bar(selected: Difficulty) -> Line<'static> {
    let spans = Difficulty::ALL
        .iter()
        .enumerate()
        .flat_map(|(idx, &level)| {
            let style = if level == selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            [
                Span::styled(format!(" F{} {} ", idx + 1, level), style),
                Span::raw("  "),
            ]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn passage_line(passage: &str, statuses: &[CharStatus]) -> Line<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = dim_bold_style.add_modifier(Modifier::UNDERLINED);

    let spans = passage
        .chars()
        .zip(statuses)
        .map(|(expected, status)| match status {
            CharStatus::Correct => Span::styled(expected.to_string(), green_bold_style),
            CharStatus::Wrong => Span::styled(
                match expected {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            CharStatus::Current => Span::styled(expected.to_string(), underlined_dim_bold_style),
            CharStatus::Untyped => Span::styled(expected.to_string(), dim_bold_style),
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn render_summary_overlay(summary: &CompletionSummary, area: Rect, buf: &mut Buffer) {
    let rect = centered_rect(OVERLAY_WIDTH, OVERLAY_HEIGHT, area);
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let metrics = summary.metrics;

    let lines = vec![
        Line::from(Span::styled(format!("{} wpm", metrics.wpm), bold_style)),
        Line::from(Span::styled(
            format!("{}% accuracy", metrics.accuracy),
            bold_style,
        )),
        Line::from(Span::styled(
            format!("{}s", metrics.elapsed_display()),
            bold_style,
        )),
        Line::default(),
        Line::from(Span::styled(
            "(r)estart  (n)ew  (enter) close",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];

    Clear.render(rect, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta))
                .title(format!(" {} complete ", summary.difficulty)),
        )
        .render(rect, buf);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
