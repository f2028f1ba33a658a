use anyhow::{Context, Result};
use chrono::Utc;
use picker_core::{DrawRequest, HistoryStyle, Picker, PickerEvent, EMPTY_HISTORY_LABEL};
use picker_data::{load_config, load_config_file, open_picker, read_upload, FileStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
struct CliOptions {
    cui: bool,
    seed: Option<u64>,
    config: Option<PathBuf>,
    history: Option<HistoryStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Empty,
    Draw,
    Reset,
    Upload(Option<PathBuf>),
    Status,
    History,
    Help,
    Quit,
    Unknown(String),
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args);
    if options.cui {
        return picker_cui::run_with_args(&args);
    }
    init_logging();

    let mut config = match options.config.as_ref() {
        Some(path) => load_config_file(path)
            .with_context(|| format!("load config from {}", path.display()))?,
        None => load_config().context("load config")?,
    };
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    if let Some(history) = options.history {
        config.history = history;
    }

    let mut picker = open_picker(&config, Utc::now());
    print_events(&mut picker);
    print_status(&picker);
    println!("type `help` for commands");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("picker> ");
        io::stdout().flush().context("flush prompt")?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("read command")?;
        picker.advance(Utc::now());
        match parse_command(&line) {
            Command::Empty => {}
            Command::Draw => run_draw(&mut picker)?,
            Command::Reset => {
                if picker.reset(Utc::now()).is_ok() {
                    println!("all drawn items returned to the pool");
                }
            }
            Command::Upload(None) => println!("usage: upload <path>"),
            Command::Upload(Some(path)) => {
                let read = read_upload(&path).map_err(|err| format!("{err:#}"));
                if let Ok(count) = picker.upload(read, Utc::now()) {
                    println!("loaded {count} items from {}", path.display());
                }
            }
            Command::Status => print_status(&picker),
            Command::History => print_history(&picker),
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Unknown(word) => println!("unknown command `{word}`; try `help`"),
        }
        print_notice(&mut picker);
        print_events(&mut picker);
    }
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn parse_args(args: &[String]) -> CliOptions {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--cui" => options.cui = true,
            "--seed" => {
                if let Some(value) = args.get(idx + 1) {
                    options.seed = value.parse::<u64>().ok();
                    idx += 1;
                }
            }
            "--config" | "-c" => {
                if let Some(value) = args.get(idx + 1) {
                    options.config = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            "--history" => {
                if let Some(value) = args.get(idx + 1) {
                    options.history = picker_cui::parse_history(value);
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    options
}

fn parse_command(line: &str) -> Command {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let Some(word) = parts.next().filter(|word| !word.is_empty()) else {
        return Command::Empty;
    };
    let rest = parts.next().map(str::trim).filter(|rest| !rest.is_empty());
    match word {
        "d" | "draw" | "pick" => Command::Draw,
        "r" | "reset" => Command::Reset,
        "u" | "upload" | "load" => Command::Upload(rest.map(PathBuf::from)),
        "s" | "status" => Command::Status,
        "h" | "history" => Command::History,
        "?" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

fn run_draw(picker: &mut Picker<FileStore>) -> Result<()> {
    if picker.request_draw(Utc::now()) != DrawRequest::Started {
        return Ok(());
    }
    let mut out = io::stdout();
    while picker.is_spinning() {
        let Some(delay) = picker.advance(Utc::now()) else {
            break;
        };
        let labels = picker
            .renderer()
            .slots
            .labels(picker.animator().config().slots);
        write!(out, "\r\x1b[2K{}", format_reel(&labels)).context("write reel")?;
        out.flush().context("flush reel")?;
        if picker.is_spinning() {
            thread::sleep(Duration::from_millis(delay));
        }
    }
    writeln!(out).context("write reel")?;
    Ok(())
}

fn format_reel(labels: &[String]) -> String {
    let centre = labels.len() / 2;
    labels
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            if idx == centre {
                format!("[ {label} ]")
            } else {
                label.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn print_status(picker: &Picker<FileStore>) {
    let counts = picker.renderer().counts;
    println!("remaining {}  drawn {}", counts.remaining, counts.drawn);
}

fn print_history(picker: &Picker<FileStore>) {
    let history = &picker.renderer().history;
    if history.is_empty() {
        println!("{EMPTY_HISTORY_LABEL}");
        return;
    }
    for entry in history {
        match picker.history_style() {
            HistoryStyle::Full => println!("#{:<3} {}", entry.ordinal, entry.value),
            HistoryStyle::LastThree => println!("{}", entry.value),
        }
    }
}

fn print_notice(picker: &mut Picker<FileStore>) {
    if let Some(notice) = picker.renderer_mut().take_notice() {
        println!("{notice}");
    }
}

fn print_events(picker: &mut Picker<FileStore>) {
    let events: Vec<_> = picker.events().drain().collect();
    for event in events {
        match event {
            PickerEvent::Restored { remaining, drawn } => {
                println!("restored saved state ({remaining} remaining, {drawn} drawn)")
            }
            PickerEvent::Loaded { count, source } => {
                println!("loaded {count} items ({source:?})")
            }
            PickerEvent::Settled { item, remaining } => {
                println!("drew {} ({remaining} left)", item.value)
            }
            PickerEvent::PersistenceFailed { reason } => println!("warning: {reason}"),
            _ => {}
        }
    }
}

fn print_help() {
    println!("draw | d            spin and draw one item");
    println!("reset | r           return drawn items to the pool");
    println!("upload <path> | u   replace the pool with a list file");
    println!("status | s          show counts");
    println!("history | h         show drawn items");
    println!("quit | q            leave");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("  draw "), Command::Draw);
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(
            parse_command("upload  lists/a b.csv "),
            Command::Upload(Some(PathBuf::from("lists/a b.csv")))
        );
        assert_eq!(parse_command("upload"), Command::Upload(None));
        assert_eq!(parse_command("spin"), Command::Unknown("spin".to_string()));
    }

    #[test]
    fn parses_flags() {
        let options = parse_args(&args(&["--seed", "3", "--history", "full", "--cui"]));
        assert!(options.cui);
        assert_eq!(options.seed, Some(3));
        assert_eq!(options.history, Some(HistoryStyle::Full));
    }

    #[test]
    fn reel_marks_centre() {
        let labels = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(format_reel(&labels), "A  [ B ]  C");
    }
}
