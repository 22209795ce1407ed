mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;

use app::App;
use heroapps::client::HttpCatalog;
use heroapps::config::Config;
use heroapps::store::JsonFileStore;
use heroapps::types::*;
use heroapps::worker::FetchWorker;
use ui::ui;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Browse, install and uninstall apps from a REST catalog
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Catalog server root (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the installed list and logs
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn init_logging(config: &Config) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let logs_dir = config.logs_dir();
    let log_path = logs_dir.join("heroapps.log");
    let opened = std::fs::create_dir_all(&logs_dir).and_then(|()| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
    });

    match opened {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .init();
            drop(LOG_GUARD.set(guard));
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            // A TUI owns stdout, so stderr is the only fallback
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_writer(io::stderr)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = Some(data_dir);
    }

    init_logging(&config);
    tracing::info!(base_url = %config.base_url, "heroapps starting");

    let store = JsonFileStore::new(&config.resolved_data_dir());
    let worker = FetchWorker::spawn(HttpCatalog::new(&config)?)?;
    let mut app = App::new(
        Box::new(HttpCatalog::new(&config)?),
        Box::new(store),
        worker,
        config.search_debounce(),
    );

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    tracing::info!("heroapps exited");
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick(Instant::now());
        terminal.draw(|f| ui(f, app))?;

        if app.pending_load.is_some() {
            app.run_pending_load();
            continue;
        }

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                match app.state {
                    AppState::Searching => match key.code {
                        KeyCode::Esc => app.cancel_search(),
                        KeyCode::Enter => app.confirm_search(),
                        KeyCode::Backspace => app.search_pop(),
                        KeyCode::Char(c) => app.search_push(c),
                        _ => {}
                    },
                    AppState::ConfirmUninstall => match key.code {
                        KeyCode::Char('y') | KeyCode::Enter => app.confirm_uninstall(),
                        KeyCode::Char('n') | KeyCode::Esc => app.cancel_uninstall(),
                        _ => {}
                    },
                    AppState::Browsing => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Tab | KeyCode::BackTab => app.switch_screen(),
                        KeyCode::Char('1') => app.show_catalog(),
                        KeyCode::Char('2') => app.show_installed(),
                        KeyCode::Char('r') => app.reload(),
                        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
                        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
                        KeyCode::PageUp => app.move_selection(-10),
                        KeyCode::PageDown => app.move_selection(10),
                        _ => match app.screen {
                            Screen::Catalog => match key.code {
                                KeyCode::Char('/') => app.start_search(),
                                KeyCode::Char('s') => app.cycle_sort(true),
                                KeyCode::Char('S') => app.cycle_sort(false),
                                KeyCode::Right | KeyCode::Char('n') => app.next_page(),
                                KeyCode::Left | KeyCode::Char('p') => app.prev_page(),
                                KeyCode::Home | KeyCode::Char('g') => app.first_page(),
                                KeyCode::End | KeyCode::Char('G') => app.last_page(),
                                KeyCode::Enter => app.open_selected_detail(),
                                _ => {}
                            },
                            Screen::Detail => match key.code {
                                KeyCode::Char('i') => app.install_current(),
                                KeyCode::Esc | KeyCode::Backspace => app.close_detail(),
                                _ => {}
                            },
                            Screen::Installed => match key.code {
                                KeyCode::Char('a') => app.sort_installed(SortOrder::Asc),
                                KeyCode::Char('d') => app.sort_installed(SortOrder::Desc),
                                KeyCode::Char('x') | KeyCode::Delete => app.request_uninstall(),
                                KeyCode::Enter => app.open_selected_detail(),
                                KeyCode::Esc => app.show_catalog(),
                                _ => {}
                            },
                        },
                    },
                }
            }
    }
}
