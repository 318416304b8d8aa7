//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm. What a key
//! means depends on the session phase, so translation lives here rather than
//! in the core: `q` quits from the menu but is typed input while the setup
//! script runs.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Busy** (spawn issued or process running): polls every ~100ms so child
//!   output and exit events surface promptly.
//! - **Idle** (menu or finished): sleeps up to 400ms, only redraws on events
//!   or terminal resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making a blinking cursor appear erratic while child output
//! forces continuous redraws.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info};
use std::io::stdout;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;

use crate::core::action::{Action, update};
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::perform;
use crate::core::state::{ActionKind, Phase, Session};
use crate::tui::component::EventHandler;
use crate::tui::components::{LogViewState, StackSelectorEvent, StackSelectorState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    // Persistent component states
    pub log_view: LogViewState,
    // Stack selector overlay (None = hidden)
    pub stack_selector: Option<StackSelectorState>,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            log_view: LogViewState::new(),
            stack_selector: None,
        }
    }
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            Show, // Show cursor for input editing
            SetCursorStyle::SteadyBlock
        )?;
        info!("Terminal modes enabled (mouse capture, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            DisableMouseCapture,
            SetCursorStyle::DefaultUserShape
        );
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut terminal = ratatui::init();
    let result = TerminalModeGuard::new().and_then(|_guard| event_loop(&mut terminal, config));
    restore_terminal_after(result)
}

/// Restores the terminal no matter how the loop ended, so a propagated error
/// prints onto a normal screen instead of the raw-mode alternate screen.
fn restore_terminal_after(result: std::io::Result<()>) -> std::io::Result<()> {
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    config: ResolvedConfig,
) -> std::io::Result<()> {
    let mut session = Session::new(config);
    let mut tui = TuiState::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel::<Action>();

    let mut needs_redraw = true; // Force first frame

    loop {
        // Only draw when something changed
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &session, &mut tui))?;
            needs_redraw = false;
        }

        // Dynamic poll timeout: short while child output may arrive, long when idle
        let timeout = if session.busy() {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(400)
        };

        // Collect first event + drain ALL pending events before the next draw
        let mut events = Vec::new();
        if let Some(first) = poll_event_timeout(timeout)? {
            events.push(first);
            while let Some(event) = poll_event_immediate()? {
                events.push(event);
            }
        }

        let mut should_quit = false;
        if !events.is_empty() {
            needs_redraw = true;
        }

        for event in events {
            // Resize just needs a redraw (already flagged above)
            if matches!(event, TuiEvent::Resize) {
                continue;
            }

            // When the stack selector is open, route all events to it
            if let Some(ref mut selector) = tui.stack_selector {
                if let Some(selector_event) = selector.handle_event(&event) {
                    match selector_event {
                        StackSelectorEvent::Select(stack) => {
                            should_quit |=
                                perform(update(&mut session, Action::SelectStack(stack)), &tx);
                            tui.stack_selector = None;
                        }
                        StackSelectorEvent::Dismiss => {
                            tui.stack_selector = None;
                        }
                    }
                }
                continue;
            }

            // Scroll events always go to the log view
            if matches!(
                event,
                TuiEvent::ScrollUp
                    | TuiEvent::ScrollDown
                    | TuiEvent::ScrollPageUp
                    | TuiEvent::ScrollPageDown
                    | TuiEvent::ScrollToBottom
            ) {
                tui.log_view.handle_event(&event);
                continue;
            }

            // Opening the selector is presentation-only, no core action
            if matches!(event, TuiEvent::Char('S')) && !session.busy() {
                tui.stack_selector = Some(StackSelectorState::new(session.config.stack));
                continue;
            }

            if let Some(action) = translate(&event, &session) {
                should_quit |= perform(update(&mut session, action), &tx);
            }
        }

        if should_quit {
            break;
        }

        // Handle background task actions (spawn results, output chunks, exits)
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            should_quit |= perform(update(&mut session, action), &tx);
        }

        if should_quit {
            break;
        }
    }

    Ok(())
}

/// Phase-dependent key map. The core gates every action again, so a stray
/// mapping can never corrupt the session; this decides intent only.
fn translate(event: &TuiEvent, session: &Session) -> Option<Action> {
    match session.phase {
        Phase::Running => translate_running(event, session),
        // Spawn issued, result not back yet: input and menu both unavailable
        Phase::Idle if session.spawn_pending => translate_running(event, session),
        Phase::Idle => translate_menu(event, false),
        Phase::Finished => translate_menu(event, true),
    }
}

fn translate_menu(event: &TuiEvent, finished: bool) -> Option<Action> {
    match event {
        TuiEvent::Enter | TuiEvent::Char('s') if !finished => {
            Some(Action::Launch(ActionKind::Setup))
        }
        TuiEvent::Char('r') if finished => Some(Action::Restart),
        TuiEvent::Char('u') => Some(Action::Launch(ActionKind::ComposeUp)),
        TuiEvent::Char('d') => Some(Action::Launch(ActionKind::ComposeDown)),
        TuiEvent::Char('p') => Some(Action::Launch(ActionKind::Services)),
        TuiEvent::Char('i') => Some(Action::Launch(ActionKind::DockerInfo)),
        TuiEvent::Char('l') => Some(Action::Launch(ActionKind::ServiceLogs)),
        TuiEvent::Char('q') | TuiEvent::Esc | TuiEvent::CtrlC => Some(Action::Quit),
        _ => None,
    }
}

fn translate_running(event: &TuiEvent, session: &Session) -> Option<Action> {
    let interactive = session.phase == Phase::Running && session.kind.interactive();
    match event {
        // Cancel, never quit, while a process is attached
        TuiEvent::CtrlC => Some(Action::Cancel),
        TuiEvent::Enter if interactive => Some(Action::InputSubmit),
        TuiEvent::Backspace if interactive => Some(Action::InputBackspace),
        TuiEvent::Char(c) if interactive => Some(Action::InputChar(*c)),
        _ => None,
    }
}
