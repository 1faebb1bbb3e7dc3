use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use lvt_map::app::{Action, App, Focus};
use lvt_map::config::AppConfig;
use lvt_map::data::{self, Dataset, Source};
use lvt_map::error::LoadError;
use lvt_map::ui;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Land value tax map for the terminal")]
struct Cli {
    /// Parcel GeoJSON: a path or http(s) URL. Overrides `data.source`.
    data: Option<String>,

    /// Config file (default: ./lvt-map.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file. Nothing is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter used with --log-file, e.g. "debug" or "lvt_map=trace"
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal is the UI, so logs only ever go to an explicit file
    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {:?}", path))?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(&cli.log_level))
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    if let Some(source) = cli.data {
        config.data.source = source;
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, &config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Fetch and parse off the UI thread; the map keeps drawing meanwhile.
fn spawn_load(location: String) -> Receiver<Result<Dataset, LoadError>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = Source::parse(&location).and_then(|source| data::load(&source));
        // The receiver is gone only if the UI already quit
        let _ = tx.send(result);
    });
    rx
}

/// Handle mouse events for hover, selection, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => {
            app.hover(mouse.column, mouse.row);
        }
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click selects, click and drag pans
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => {
            app.mouse_up(mouse.column, mouse.row);
        }
        _ => {}
    }
}

fn handle_map_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.dispatch(Action::Quit);
        }
        KeyCode::Esc => app.map.close_popup(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        KeyCode::Char('f') | KeyCode::Char('0') => app.fit_view(),
        KeyCode::Char('/') => {
            app.dispatch(Action::OpenSearch);
        }
        KeyCode::Char('i') => {
            app.dispatch(Action::ToggleInfo);
        }
        KeyCode::Tab => {
            app.dispatch(Action::FocusNext);
        }
        KeyCode::BackTab => {
            app.dispatch(Action::FocusPrev);
        }
        _ => {}
    }
}

fn handle_form_key(app: &mut App, key: KeyEvent) {
    let action = match key.code {
        KeyCode::Esc => Action::FocusMap,
        KeyCode::Tab => Action::FocusNext,
        KeyCode::BackTab => Action::FocusPrev,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Activate,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Char(c) => Action::Input(c),
        _ => return,
    };
    app.dispatch(action);
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    let action = match key.code {
        KeyCode::Esc => Action::FocusMap,
        KeyCode::Enter => Action::SubmitSearch,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Char(c) => Action::Input(c),
        _ => return,
    };
    app.dispatch(action);
}

fn run(terminal: &mut DefaultTerminal, config: &AppConfig) -> Result<()> {
    let mut app = App::new(config);
    app.set_basemap(data::load_basemap(&config.map.basemap));

    let mut pending = Some(spawn_load(config.data.source.clone()));

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        if let Some(rx) = &pending {
            match rx.try_recv() {
                Ok(result) => {
                    app.finish_load(result, Instant::now());
                    pending = None;
                }
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    warn!("Loader thread ended without a result");
                    pending = None;
                }
            }
        }
        app.tick(Instant::now());

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        app.dispatch(Action::Quit);
                    } else {
                        match app.focus {
                            Focus::Map => handle_map_key(&mut app, key),
                            Focus::Search => handle_search_key(&mut app, key),
                            Focus::Field(_) => handle_form_key(&mut app, key),
                        }
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                // The next draw picks up the new size
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        if app.should_quit {
            info!("Quit");
            break;
        }
    }

    Ok(())
}
