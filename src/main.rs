mod config;
mod error;
mod fetch;
mod models;
mod sprites;
mod state;
mod types;
mod ui;
mod utils;
mod view;

use clap::Parser;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::fetch::{load_generation, PokeApi};
use crate::models::Pokemon;
use crate::state::Ticket;
use crate::types::TypeFilter;
use crate::ui::{draw_ui, App};
use crate::view::filter_by_type;

type BatchResult = (Ticket, Vec<Pokemon>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::parse();
    init_tracing(&settings)?;

    let api = PokeApi::new(
        settings.api_base.as_str(),
        usize::from(settings.concurrency),
        settings.timeout(),
    )?;
    tracing::info!(
        api = %settings.api_base,
        concurrency = settings.concurrency,
        generation = settings.generation.get(),
        type_filter = %settings.type_filter,
        "starting"
    );

    if settings.json {
        return print_json(&api, &settings).await;
    }
    run_tui(&api, &settings).await
}

/// Logs go to stderr in headless mode and to a file while the TUI owns the
/// terminal.
fn init_tracing(settings: &Settings) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.json {
        builder.with_writer(io::stderr).init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    }
    Ok(())
}

async fn print_json(api: &PokeApi, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let records = load_generation(api, settings.generation, None).await;
    let shown = filter_by_type(&records, settings.type_filter);
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

async fn run_tui(api: &PokeApi, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let (tx, rx) = mpsc::unbounded_channel::<BatchResult>();
    let mut app = App::new(settings.generation, settings.type_filter);
    let mut in_flight = None;

    enable_raw_mode()?;
    start_batch(api, &mut app, &tx, &mut in_flight);

    let res = open_terminal().and_then(|mut terminal| {
        event_loop(&mut terminal, api, &mut app, &tx, rx, &mut in_flight)
    });

    // restore the terminal even when setup failed half way
    cancel_batch(&mut in_flight);
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    res
}

fn open_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, Box<dyn Error>> {
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn cancel_batch(in_flight: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = in_flight.take() {
        handle.abort();
    }
}

/// Starts a new batch for `app.generation`, cancelling the one in flight.
fn start_batch(
    api: &PokeApi,
    app: &mut App,
    tx: &UnboundedSender<BatchResult>,
    in_flight: &mut Option<JoinHandle<()>>,
) {
    cancel_batch(in_flight);
    let ticket = app.begin_load();
    tracing::info!(generation = ticket.generation.get(), "loading generation");

    let api = api.clone();
    let tx = tx.clone();
    let progress = app.progress.clone();
    *in_flight = Some(tokio::spawn(async move {
        let records = load_generation(&api, ticket.generation, Some(&progress)).await;
        // receiver is gone once the UI has quit
        let _ = tx.send((ticket, records));
    }));
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    api: &PokeApi,
    app: &mut App,
    tx: &UnboundedSender<BatchResult>,
    mut rx: UnboundedReceiver<BatchResult>,
    in_flight: &mut Option<JoinHandle<()>>,
) -> Result<(), Box<dyn Error>> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        while let Ok((ticket, records)) = rx.try_recv() {
            if app.finish_load(ticket, records) {
                *in_flight = None;
            }
        }
        app.request_selected_sprite(api.client());

        draw_ui(terminal, app)?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::F(1) | KeyCode::Char('h') => {
                        app.show_help = !app.show_help;
                    }
                    KeyCode::Down => app.next(),
                    KeyCode::Up => app.previous(),
                    KeyCode::Right => {
                        app.generation = app.generation.next();
                        start_batch(api, app, tx, in_flight);
                    }
                    KeyCode::Left => {
                        app.generation = app.generation.previous();
                        start_batch(api, app, tx, in_flight);
                    }
                    KeyCode::Char('r') => start_batch(api, app, tx, in_flight),
                    KeyCode::Char('t') => app.set_type_filter(app.type_filter.next()),
                    KeyCode::Char('T') => app.set_type_filter(app.type_filter.previous()),
                    KeyCode::Char('a') => app.set_type_filter(TypeFilter::All),
                    KeyCode::Char('s') => {
                        app.show_sprites = !app.show_sprites;
                    }
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}
