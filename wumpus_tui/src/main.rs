mod app;
mod ui;

use anyhow::{Context, Result};
use app::{App, FRAMES_PER_SECOND, Setup};
use clap::Parser;
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;
use wumpus_core::{Action, Direction, World, WorldConfig};

const DEFAULT_LOG_FILTER: &str = "wumpus_core=debug,wumpus_tui=info";

#[derive(Parser, Debug)]
#[command(version, about = "Hunt the Wumpus in your terminal", long_about = None)]
struct Args {
    /// Grid dimension N; the world is N x N
    #[arg(short, long)]
    size: Option<usize>,

    /// Number of pits (capped to what fits on the grid)
    #[arg(short, long)]
    pits: Option<usize>,

    /// Seed for reproducible layouts
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file with `size` and `num_pits`
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Fixed layout file to play instead of a random world
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, value_name = "LOG_FILE")]
    log: Option<PathBuf>,
}

impl Args {
    /// Config file values, overridden by any flags given on the command line.
    fn world_config(&self) -> Result<WorldConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => WorldConfig::default(),
        };
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(pits) = self.pits {
            config.num_pits = pits;
        }
        config.validate()?;
        Ok(config)
    }

    fn setup(&self) -> Result<Setup> {
        match &self.map {
            Some(path) => {
                let layout = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read map file {}", path.display()))?;
                let world: World = layout
                    .parse()
                    .with_context(|| format!("Failed to load map {}", path.display()))?;
                Ok(Setup::Fixed(world))
            }
            None => Ok(Setup::random(self.world_config()?, self.seed)),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;

    let mut app = App::new(args.setup()?)?;
    tracing::info!(size = app.agent.world().size(), "starting game");

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result
}

/// Sends logs to `path`. Without a path nothing is installed, so the
/// terminal UI stays clean.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Maps a key to a logical game action.
fn action_for(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Up | KeyCode::Char('w') => Some(Action::Move(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') => Some(Action::Move(Direction::Down)),
        KeyCode::Left | KeyCode::Char('a') => Some(Action::Move(Direction::Left)),
        KeyCode::Right | KeyCode::Char('d') => Some(Action::Move(Direction::Right)),
        KeyCode::Char(' ') | KeyCode::Enter => Some(Action::Shoot),
        _ => None,
    }
}

/// Runs the main loop of the TUI application.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(1000 / u64::from(FRAMES_PER_SECOND));
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.quit(),
                        KeyCode::Esc => app.escape(),
                        KeyCode::Char('h') => app.toggle_help(),
                        KeyCode::Char('r') => app.restart()?,
                        KeyCode::Char('+' | '=') => {
                            app.resize(1)?;
                        }
                        KeyCode::Char('-' | '_') => {
                            app.resize(-1)?;
                        }
                        code => {
                            if let Some(action) = action_for(code) {
                                app.apply(action);
                            }
                        }
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
