//! Library entry point for the garden map TUI.
//!
//! Provides a reusable [`run`] function that launches the Ratatui terminal UI
//! against a pre-configured [`Garden`].

mod app;
mod event;
mod ui;

pub use app::{App, FormAction, FormField, PlantForm, Viewport};

use anyhow::anyhow;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use event::AppEvent;
use garden_rs_core::Garden;
use log::{debug, info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Launch the garden map against a pre-configured garden.
///
/// The caller is responsible for initializing logging before calling `run`;
/// log output written to the terminal will garble the alternate screen.
///
/// # Errors
/// Returns an error if the config is invalid, or if terminal setup or the
/// event loop fails.
pub async fn run(garden: Arc<Garden>) -> anyhow::Result<()> {
    let config = garden.context().config();
    config.validate()?;
    let mut app = App::new(config, garden.context().presenter());
    let tick = Duration::from_millis(config.ui.tick_ms.max(1));

    let mut terminal = setup_terminal()?;
    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone(), tick);
    spawn_garden_forwarder(&garden, tx.clone());
    spawn_load(&garden);
    app.push_status("Loading memories...");

    let result = async {
        loop {
            terminal.draw(|frame| ui::draw(frame, &mut app))?;
            let event = rx
                .recv()
                .await
                .ok_or_else(|| anyhow!("event channel closed unexpectedly"))?;
            if handle_app_event(event, &garden, &mut app, tx.clone()) {
                break;
            }
        }
        anyhow::Ok(())
    }
    .await;

    restore_terminal(&mut terminal)?;
    result
}

/// Dispatch a UI event and return true when the app should exit.
fn handle_app_event(
    event: AppEvent,
    garden: &Arc<Garden>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> bool {
    match event {
        AppEvent::Input(key) => return handle_input(key, garden, app),
        AppEvent::Click { column, row } => handle_click(column, row, app),
        AppEvent::Scroll(delta) => {
            if app.form.is_none() {
                if delta < 0 {
                    app.viewport.zoom_in();
                } else if delta > 0 {
                    app.viewport.zoom_out();
                }
            }
        }
        AppEvent::Garden(event) => {
            if let Some(token) = app.apply_garden_event(&event) {
                schedule_form_close(token, app.close_form_after, sender);
            }
            app.set_markers(garden.markers());
        }
        AppEvent::CloseForm(token) => app.close_form(token),
        AppEvent::Tick => app.set_markers(garden.markers()),
    }
    false
}

/// Handle keyboard input and dispatch actions.
fn handle_input(key: KeyEvent, garden: &Arc<Garden>, app: &mut App) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }
    if app.form.is_some() {
        handle_form_input(key, garden, app);
        return false;
    }

    match key.code {
        KeyCode::Esc if app.popup_open => app.popup_open = false,
        KeyCode::Esc | KeyCode::Char('q') => return true,
        KeyCode::Left | KeyCode::Char('h') => app.viewport.pan(-1.0, 0.0),
        KeyCode::Right | KeyCode::Char('l') => app.viewport.pan(1.0, 0.0),
        KeyCode::Up | KeyCode::Char('k') => app.viewport.pan(0.0, 1.0),
        KeyCode::Down | KeyCode::Char('j') => app.viewport.pan(0.0, -1.0),
        KeyCode::Char('+') | KeyCode::Char('=') => app.viewport.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.viewport.zoom_out(),
        KeyCode::Tab => app.select_next(),
        KeyCode::BackTab => app.select_prev(),
        KeyCode::Enter => app.open_form_at(app.viewport.center),
        KeyCode::Char('w') => match app.selected_marker().map(|marker| marker.id.clone()) {
            Some(id) => {
                app.push_status("Watering...");
                spawn_water(garden, id);
            }
            None => app.push_status("Select a memory to water (Tab)."),
        },
        KeyCode::Char('r') => {
            app.push_status("Loading memories...");
            spawn_load(garden);
        }
        _ => {}
    }
    false
}

/// Keys go to the plant form while it is open.
fn handle_form_input(key: KeyEvent, garden: &Arc<Garden>, app: &mut App) {
    let Some(form) = app.form.as_mut() else {
        return;
    };
    match form.handle_key(key) {
        FormAction::None => {}
        FormAction::Cancel => app.form = None,
        FormAction::Submit => match form.draft.validate() {
            Ok(_) => {
                form.saving = true;
                form.status = Some("Saving...".to_string());
                let draft = form.draft.clone();
                let garden = Arc::clone(garden);
                tokio::spawn(async move {
                    // failures reach the form through the Failed event
                    let _ = garden.plant(&draft).await;
                });
            }
            Err(err) => form.status = Some(err.to_string()),
        },
    }
}

/// A click on a marker selects it; a click elsewhere on the map opens the form.
fn handle_click(column: u16, row: u16, app: &mut App) {
    if app.form.is_some() {
        return;
    }
    if let Some(id) = app.marker_at_cell(column, row) {
        app.select(id);
        return;
    }
    if let Some(position) = app.viewport.position_at(app.map_area, column, row) {
        debug!("map clicked (position={position})");
        app.open_form_at(position);
    }
}

fn spawn_load(garden: &Arc<Garden>) {
    let garden = Arc::clone(garden);
    tokio::spawn(async move {
        if let Err(err) = garden.load().await {
            warn!("failed to load memories (error={err})");
        }
    });
}

fn spawn_water(garden: &Arc<Garden>, id: garden_rs_protocol::RecordId) {
    let garden = Arc::clone(garden);
    tokio::spawn(async move {
        if let Err(err) = garden.water(&id).await {
            warn!("failed to water memory (id={id}, error={err})");
        }
    });
}

fn schedule_form_close(token: u64, delay: Duration, sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = sender.send(AppEvent::CloseForm(token)).await;
    });
}

/// Forward garden events into the UI channel until either side closes.
fn spawn_garden_forwarder(garden: &Garden, sender: mpsc::Sender<AppEvent>) {
    let mut subscription = garden.subscribe();
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            if sender.send(AppEvent::Garden(event)).await.is_err() {
                break;
            }
        }
        info!("garden event forwarder stopped");
    });
}

/// Spawn a blocking input reader that forwards crossterm events.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        const SCROLL_STEP: i16 = 1;
        loop {
            if matches!(crossterm::event::poll(Duration::from_millis(30)), Ok(true)) {
                while matches!(crossterm::event::poll(Duration::from_millis(0)), Ok(true)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    match event {
                        CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                            let _ = sender.send(AppEvent::Input(key)).await;
                        }
                        CrosstermEvent::Mouse(mouse) => match mouse.kind {
                            MouseEventKind::Down(MouseButton::Left) => {
                                let _ = sender
                                    .send(AppEvent::Click {
                                        column: mouse.column,
                                        row: mouse.row,
                                    })
                                    .await;
                            }
                            MouseEventKind::ScrollUp => {
                                let _ = sender.send(AppEvent::Scroll(-SCROLL_STEP)).await;
                            }
                            MouseEventKind::ScrollDown => {
                                let _ = sender.send(AppEvent::Scroll(SCROLL_STEP)).await;
                            }
                            _ => {}
                        },
                        _ => {}
                    }
                }
            }
        }
    });
}

/// Spawn a periodic tick event generator; ticks re-evaluate marker fading.
fn spawn_tick(sender: mpsc::Sender<AppEvent>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if sender.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
