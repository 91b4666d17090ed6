mod app;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use crate::state::loader::{LoaderWorker, LoadingState};
use crate::state::messages::{LoaderRequest, LoaderResponse, UiEvent};
use crate::state::refresher::PeriodicRefresher;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::error;
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = AppSettings::load();
    match parse_cli_args(std::env::args().skip(1)) {
        Cli::Run { pool_dir } => {
            if let Some(dir) = pool_dir {
                settings.pool_dir = dir;
            }
        }
        Cli::Help => {
            println!("{}", usage_text());
            return Ok(());
        }
        Cli::Version => {
            println!("bracketpool {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Cli::Unknown(arg) => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(log::LevelFilter::Error)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let pool_dir = settings.pool_dir.clone();
    let odds = settings.odds_settings();
    let app = Arc::new(Mutex::new(App::new(settings)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (loader_req_tx, loader_req_rx) = mpsc::channel::<LoaderRequest>(100);
    let (loader_resp_tx, loader_resp_rx) = mpsc::channel::<LoaderResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Pool file I/O thread
    let loader_worker = LoaderWorker::new(pool_dir, odds, loader_req_rx, loader_resp_tx);
    let loader_task = tokio::spawn(loader_worker.run());

    // Periodic reload thread (every 30s)
    let periodic_updater = PeriodicRefresher::new(loader_req_tx.clone());
    let periodic_task = tokio::spawn(periodic_updater.run());

    // Trigger pool load on startup
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, loader_req_tx, loader_resp_rx).await;

    input_handler.abort();
    loader_task.abort();
    periodic_task.abort();

    Ok(())
}

#[derive(Debug, PartialEq)]
enum Cli {
    Run { pool_dir: Option<PathBuf> },
    Help,
    Version,
    Unknown(String),
}

fn parse_cli_args(mut args: impl Iterator<Item = String>) -> Cli {
    let Some(arg) = args.next() else {
        return Cli::Run { pool_dir: None };
    };

    let cli = match arg.as_str() {
        "-h" | "--help" => Cli::Help,
        "-V" | "--version" => Cli::Version,
        flag if flag.starts_with('-') => Cli::Unknown(flag.to_string()),
        dir => Cli::Run { pool_dir: Some(PathBuf::from(dir)) },
    };

    match args.next() {
        Some(extra) => Cli::Unknown(extra),
        None => cli,
    }
}

fn usage_text() -> &'static str {
    "bracketpool - March Madness bracket pool standings in the terminal

Usage:
  bracketpool [POOL_DIR]
  bracketpool --help
  bracketpool --version

Pool directory:
  teams.json      team feed: [{\"name\", \"seed\", \"region\"}, ...]
  results.json    results bracket (optional; empty bracket from teams.json)
  picks/*.json    one bracket per participant, named after the file
  scoring.json    points_per_round / seed_factor override (optional)
  bonus.json      {\"name\": points} added to scores for win odds (optional)

Environment:
  BRACKETPOOL_DIR         Pool directory when POOL_DIR is not given (default .)
  BRACKETPOOL_SEED_BONUS  Set to 0/false/no/off to score without upset bonus
  BRACKETPOOL_LOG         Log level (error, warn, info, debug, trace)
  BRACKETPOOL_USER        Name for picks saved from the Picks tab (default $USER)
  BRACKETPOOL_SIMULATIONS Outcomes to sample for win odds when there are
                          too many to enumerate (default 100000)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    loader_requests: mpsc::Sender<LoaderRequest>,
    mut loader_responses: mpsc::Receiver<LoaderResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &loader_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = loader_responses.recv() => {
                let should_redraw = handle_loader_response(response, &app, &loader_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            else => break,
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    loader_requests: &mpsc::Sender<LoaderRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let _ = loader_requests.send(LoaderRequest::LoadPool).await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, loader_requests).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_loader_response(
    response: LoaderResponse,
    app: &Arc<Mutex<App>>,
    loader_requests: &mpsc::Sender<LoaderRequest>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        LoaderResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        LoaderResponse::PoolLoaded { pool } => {
            let follow_up = app.lock().await.on_pool_loaded(*pool);
            if let Some(request) = follow_up {
                let _ = loader_requests.send(request).await;
            }
        }
        LoaderResponse::PicksSaved { path } => {
            let mut guard = app.lock().await;
            guard.on_picks_saved(path);
        }
        LoaderResponse::SavedPicksLoaded { path, picks } => {
            let mut guard = app.lock().await;
            guard.on_saved_picks_loaded(path, picks.map(|b| *b));
        }
        LoaderResponse::Error { message } => {
            error!("Loader error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

/// Best effort: also runs from the panic hook, so failures are ignored.
pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        parse_cli_args(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn no_args_runs_with_configured_dir() {
        assert_eq!(parse(&[]), Cli::Run { pool_dir: None });
    }

    #[test]
    fn positional_arg_is_pool_dir() {
        assert_eq!(parse(&["pools/office"]), Cli::Run { pool_dir: Some(PathBuf::from("pools/office")) });
    }

    #[test]
    fn flags() {
        assert_eq!(parse(&["--help"]), Cli::Help);
        assert_eq!(parse(&["-V"]), Cli::Version);
        assert_eq!(parse(&["--verbose"]), Cli::Unknown("--verbose".to_string()));
        assert_eq!(parse(&["a", "b"]), Cli::Unknown("b".to_string()));
    }
}
