mod app;
mod log_buffer;
mod render;
#[cfg(test)]
mod test_support;

use std::io::{self, Stdout};
use std::time::Duration;

use courtside_core::executor::QueryBackend;
use courtside_core::session::BrowserSession;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use thiserror::Error;
use tracing::info;

use crate::app::{DirectionKey, Msg, TuiApp};
pub use crate::log_buffer::{LogBuffer, LogBufferWriter};

/// Redraw interval while idle, so the log panel keeps up with new lines.
const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Runs the browser until the user quits. Every interaction reruns the
/// session's full render cycle on a current-thread runtime.
pub fn run<B: QueryBackend>(
    session: BrowserSession<'_, B>,
    logs: &LogBuffer,
) -> Result<(), TuiError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, TuiApp::new(session, runtime), logs);
    let restore_result = restore_terminal(&mut terminal);

    if let Err(error) = run_result {
        restore_result?;
        return Err(error);
    }

    restore_result?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop<B: QueryBackend>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: TuiApp<'_, B>,
    logs: &LogBuffer,
) -> Result<(), TuiError> {
    loop {
        terminal.draw(|frame| render::render(frame, &app, logs))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(message) = map_key_event(key, app.search_editing) {
                        app.handle(message);
                    }
                }
            }
        }

        if app.should_quit {
            info!("browser closed");
            break;
        }
    }

    Ok(())
}

fn map_key_event(key: KeyEvent, search_editing: bool) -> Option<Msg> {
    if search_editing {
        return map_search_key(key);
    }

    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => Some(Msg::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('l')) => Some(Msg::ToggleLogs),
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => Some(Msg::ClearSearch),
        (_, KeyCode::Char('?')) => Some(Msg::ToggleHelp),
        (_, KeyCode::Tab) => Some(Msg::NextPane),
        (_, KeyCode::Enter) => Some(Msg::Activate),
        (_, KeyCode::Esc) => Some(Msg::Escape),
        (_, KeyCode::Char('/')) => Some(Msg::FocusSearch),
        (_, KeyCode::Char('r')) => Some(Msg::Rerun),
        (_, KeyCode::Char('x')) => Some(Msg::ResetFilters),
        (_, KeyCode::Up | KeyCode::Char('k')) => Some(Msg::Navigate(DirectionKey::Up)),
        (_, KeyCode::Down | KeyCode::Char('j')) => Some(Msg::Navigate(DirectionKey::Down)),
        (_, KeyCode::Left | KeyCode::Char('h')) => Some(Msg::Navigate(DirectionKey::Left)),
        (_, KeyCode::Right | KeyCode::Char('l')) => Some(Msg::Navigate(DirectionKey::Right)),
        _ => None,
    }
}

fn map_search_key(key: KeyEvent) -> Option<Msg> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Msg::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('l')) => Some(Msg::ToggleLogs),
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => Some(Msg::ClearSearch),
        (KeyModifiers::CONTROL, _) => None,
        (_, KeyCode::Esc | KeyCode::Enter) => Some(Msg::Escape),
        (_, KeyCode::Tab) => Some(Msg::NextPane),
        (_, KeyCode::Backspace) => Some(Msg::SearchBackspace),
        (_, KeyCode::Char(ch)) => Some(Msg::SearchInput(ch)),
        _ => None,
    }
}
