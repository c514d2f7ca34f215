use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use neontype::{
    app::{App, Control},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    runtime::{AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker, MIN_FPS},
    text_bank::{Difficulty, TextBank},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Instant,
};
use tracing::info;

/// neon typing trainer with a glowing pointer trail
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing-speed trainer that measures words per minute and accuracy over short passages, with a fading neon trail following the pointer and letters that float away as you type."
)]
pub struct Cli {
    /// difficulty level to start with (defaults to the saved choice)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// custom passage to type
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// JSON file of passages to use instead of the built-in bank
    #[clap(long, value_name = "FILE", conflicts_with = "prompt")]
    passages: Option<PathBuf>,

    /// frames per second for animations (at least 10)
    #[clap(long, value_parser = clap::value_parser!(u32).range(MIN_FPS as i64..))]
    fps: Option<u32>,

    /// disable the pointer trail
    #[clap(long)]
    no_trail: bool,

    /// disable the floating letters
    #[clap(long)]
    no_glyphs: bool,
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if self.no_trail {
            config.trail = false;
        }
        if self.no_glyphs {
            config.glyphs = false;
        }
        config
    }

    fn text_bank(&self) -> Result<TextBank, Box<dyn Error>> {
        let bank = match (&self.prompt, &self.passages) {
            (Some(prompt), _) => TextBank::single(prompt.clone())?,
            (None, Some(path)) => TextBank::from_file(path)?,
            (None, None) => TextBank::builtin()?,
        };
        Ok(bank)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = AppDirs::log_dir().and_then(|dir| logging::init(&dir));

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    let bank = match cli.text_bank() {
        Ok(bank) => bank,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err).exit();
        }
    };
    info!(difficulty = %config.difficulty, fps = config.fps, "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::from_fps(config.fps),
    );
    let mut app = App::new(bank, config, size.width, size.height).with_store(store);
    let res = start_tui(&mut terminal, &mut app, runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut runner: Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match app.handle_event(runner.step(), Instant::now()) {
            Control::Quit => break,
            Control::Redraw => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            Control::Continue => {}
        }
    }

    info!("quitting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neontype::runtime::{AppEvent, TestEventSource};
    use ratatui::backend::TestBackend;
    use std::{sync::mpsc, time::Duration};

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["neontype"]);

        assert_eq!(cli.difficulty, None);
        assert_eq!(cli.prompt, None);
        assert_eq!(cli.passages, None);
        assert_eq!(cli.fps, None);
        assert!(!cli.no_trail);
        assert!(!cli.no_glyphs);
    }

    #[test]
    fn test_cli_difficulty() {
        let cli = Cli::parse_from(["neontype", "-d", "hard"]);
        assert_eq!(cli.difficulty, Some(Difficulty::Hard));

        let cli = Cli::parse_from(["neontype", "--difficulty", "medium"]);
        assert_eq!(cli.difficulty, Some(Difficulty::Medium));

        assert!(Cli::try_parse_from(["neontype", "-d", "brutal"]).is_err());
    }

    #[test]
    fn test_cli_custom_prompt() {
        let cli = Cli::parse_from(["neontype", "-p", "hello world"]);
        assert_eq!(cli.prompt, Some("hello world".to_string()));

        let bank = cli.text_bank().unwrap();
        assert_eq!(bank.first(Difficulty::Hard), "hello world");
    }

    #[test]
    fn test_cli_prompt_conflicts_with_passages() {
        let res = Cli::try_parse_from(["neontype", "-p", "hi", "--passages", "bank.json"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_cli_prompt_with_control_characters_is_rejected() {
        let cli = Cli::parse_from(["neontype", "-p", "a\tb"]);
        assert!(cli.text_bank().is_err());
    }

    #[test]
    fn test_cli_fps_below_refresh_rate_is_rejected() {
        assert!(Cli::try_parse_from(["neontype", "--fps", "5"]).is_err());

        let cli = Cli::parse_from(["neontype", "--fps", "10"]);
        assert_eq!(cli.fps, Some(MIN_FPS));
    }

    #[test]
    fn test_cli_missing_passages_file_is_an_error() {
        let cli = Cli::parse_from(["neontype", "--passages", "/definitely/not/here.json"]);
        assert!(cli.text_bank().is_err());
    }

    #[test]
    fn test_cli_overrides_stored_config() {
        let cli = Cli::parse_from([
            "neontype",
            "-d",
            "hard",
            "--fps",
            "30",
            "--no-trail",
            "--no-glyphs",
        ]);
        let config = cli.apply(Config::default());

        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.fps, 30);
        assert!(!config.trail);
        assert!(!config.glyphs);
    }

    #[test]
    fn test_cli_keeps_stored_values_without_flags() {
        let stored = Config {
            difficulty: Difficulty::Medium,
            fps: 24,
            trail: false,
            glyphs: true,
        };
        let cli = Cli::parse_from(["neontype"]);
        assert_eq!(cli.apply(stored.clone()), stored);
    }

    #[test]
    fn test_start_tui_quits_on_escape() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = App::new(TextBank::single("hi").unwrap(), Config::default(), 80, 24);

        let (tx, rx) = mpsc::channel();
        for c in ['h', 'i'] {
            tx.send(AppEvent::Key(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            )))
            .unwrap();
        }
        tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
            .unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_secs(60)),
        );

        start_tui(&mut terminal, &mut app, runner).unwrap();

        assert!(app.overlay_visible);
        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(rendered.contains("100% accuracy"));
    }
}
