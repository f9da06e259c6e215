//! Terminal UI for posy that lets users search an address and see which florists deliver there.

mod app;
mod input;
mod ui;

use std::{fs::OpenOptions, io, sync::Arc, sync::Mutex, time::Duration as StdDuration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use posy_core::{
    AddressQuery, AppConfig, SearchRequest, catalog::load_catalog, config::load_app_config,
    service::DeliveryService,
};
use posy_provider_google::{self as google, GoogleMapsSettings};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{App, Screen};
use crate::input::Action;

const SUGGESTION_LIMIT: usize = 8;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_app_config().context("failed to load configuration")?;
    init_tracing(&config)?;

    let catalog = load_catalog(&config.catalog_path)
        .with_context(|| format!("failed to load {}", config.catalog_path.display()))?;

    // Provider + service setup
    let gateway = google::gateway(GoogleMapsSettings::from(&config));
    let service = Arc::new(DeliveryService::new(
        gateway,
        config.estimator(),
        catalog.calendar(),
    ));
    info!(florists = catalog.florists.len(), "posy starting");

    // App state
    let app = App::new(service, catalog.florists);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_tracing(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("failed to open {}", config.log_file.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::SearchAddresses => {
                    let query = AddressQuery::new(app.address_input.as_str(), SUGGESTION_LIMIT);
                    if query.is_empty() {
                        app.error_message =
                            Some("Type a delivery address, then press Enter".into());
                        continue;
                    }

                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let res = app.service.search_address(&query).await;

                    app.is_loading = false;
                    match res {
                        Ok(candidates) => {
                            if candidates.is_empty() {
                                app.error_message = Some("No matching addresses".into());
                            }
                            app.candidates = candidates;
                            app.candidate_index = 0;
                        }
                        Err(err) => {
                            warn!(error = %err, "address search failed");
                            app.error_message = Some(format!("Search failed: {err}"));
                        }
                    }
                }
                Action::OpenCandidate => {
                    let Some(candidate) = app.current_candidate() else {
                        app.error_message =
                            Some("No address selected (search and pick one first)".into());
                        continue;
                    };

                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let res = app.service.resolve_candidate(&candidate.id).await;

                    app.is_loading = false;
                    match res {
                        Ok(address) => {
                            app.resolved_address = Some(address);
                            app.delivery_date = App::today();
                            app.screen = Screen::FloristView;
                            refresh_florists(terminal, &mut app).await?;
                        }
                        Err(err) => {
                            warn!(error = %err, "address resolution failed");
                            app.error_message = Some(format!("Could not resolve address: {err}"));
                        }
                    }
                }
                Action::RefreshFlorists => refresh_florists(terminal, &mut app).await?,
            }
        }
    }

    Ok(())
}

async fn refresh_florists(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let Some(address) = &app.resolved_address else {
        app.error_message = Some("Pick an address first".into());
        return Ok(());
    };
    let request = SearchRequest::new(address.coordinate, Some(app.delivery_date));

    app.is_loading = true;
    app.error_message = None;
    terminal.draw(|frame| ui::draw(frame, app))?;

    let now = Local::now().naive_local();
    let outcome = app
        .service
        .search_florists(&request, &app.florists, now)
        .await;

    app.is_loading = false;
    app.outcome = Some(outcome);
    Ok(())
}
