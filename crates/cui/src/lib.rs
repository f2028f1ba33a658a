mod actions;
mod app;
mod input;
mod view;

use anyhow::{Context, Result};
use app::App;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use picker_core::HistoryStyle;
use picker_data::{load_config, load_config_file, PickerConfig};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, stdout, IsTerminal};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub history: Option<HistoryStyle>,
}

pub fn run(options: LaunchOptions) -> Result<()> {
    init_logging();
    let mut config = match options.config.as_ref() {
        Some(path) => load_config_file(path)
            .with_context(|| format!("load config from {}", path.display()))?,
        None => load_config().context("load config")?,
    };
    apply_options(&mut config, &options);
    let mut app = App::bootstrap(config);

    ensure_interactive_terminal()?;

    enable_raw_mode().map_err(|err| {
        anyhow::anyhow!(
            "failed to enable raw mode; ensure the process owns an interactive terminal: {err}"
        )
    })?;
    let mut stdout = stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let run_result = run_loop(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    run_result
}

pub fn run_with_args(args: &[String]) -> Result<()> {
    let options = parse_options(args);
    run(options)
}

fn apply_options(config: &mut PickerConfig, options: &LaunchOptions) {
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    if let Some(history) = options.history {
        config.history = history;
    }
}

fn parse_options(args: &[String]) -> LaunchOptions {
    let mut config = None;
    let mut seed = None;
    let mut history = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--config" | "-c" => {
                if let Some(value) = args.get(idx + 1) {
                    config = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            "--seed" => {
                if let Some(value) = args.get(idx + 1) {
                    seed = value.parse::<u64>().ok();
                    idx += 1;
                }
            }
            "--history" => {
                if let Some(value) = args.get(idx + 1) {
                    history = parse_history(value);
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    LaunchOptions {
        config,
        seed,
        history,
    }
}

pub fn parse_history(value: &str) -> Option<HistoryStyle> {
    match value {
        "full" => Some(HistoryStyle::Full),
        "last3" | "last-three" | "last_three" => Some(HistoryStyle::LastThree),
        _ => None,
    }
}

/// Logs go to the file named by `PICKER_LOG`; nothing is written to the
/// terminal while the alternate screen is up.
fn init_logging() {
    let Some(path) = std::env::var_os("PICKER_LOG") else {
        return;
    };
    let Ok(file) = File::create(&path) else {
        return;
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(120);
    while !app.should_quit {
        terminal.draw(|frame| view::draw(frame, app))?;
        let timeout = app
            .next_wake()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(tick_rate)
            .min(tick_rate);
        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_upload_prompt_key(key) {
                    let action = input::map_key(key);
                    actions::dispatch(app, action);
                }
            }
        }
        app.on_tick();
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn ensure_interactive_terminal() -> Result<()> {
    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        return Ok(());
    }
    anyhow::bail!(
        "picker-cui requires an interactive TTY (run directly in a terminal, not a piped/headless shell)"
    );
}
