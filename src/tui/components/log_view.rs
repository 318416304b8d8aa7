//! # LogView Component
//!
//! Scrolling viewport over the session's append-only output log.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `LogViewState` lives in `TuiState` (scroll position survives frames)
//! - `LogView` is created each frame, borrowing the state and the log text
//!
//! While `stick_to_bottom` is set the view follows new output as it arrives;
//! scrolling up detaches, and scrolling back past the end (or End/Ctrl+L)
//! re-pins.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Paragraph, Wrap};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Scroll state for the log viewport.
/// Must be persisted in the parent TuiState.
pub struct LogViewState {
    /// First visible wrapped line.
    pub scroll: u16,
    /// When true, auto-scroll to the newest output.
    pub stick_to_bottom: bool,
    /// Measured during render; the scroll math needs them between frames.
    pub viewport_height: u16,
    pub content_height: u16,
}

impl Default for LogViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl LogViewState {
    pub fn new() -> Self {
        Self {
            scroll: 0,
            stick_to_bottom: true, // Start attached to bottom
            viewport_height: 0,
            content_height: 0,
        }
    }

    fn max_scroll(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn page(&self) -> u16 {
        self.viewport_height.max(1)
    }

    /// Re-engage auto-scroll once the user has scrolled back to the bottom,
    /// clamping the offset to the content bounds.
    fn repin_if_at_bottom(&mut self) {
        let max = self.max_scroll();
        if self.scroll >= max {
            self.scroll = max;
            self.stick_to_bottom = true;
        }
    }
}

/// EventHandler lives on `LogViewState` because event handling needs the
/// persistent scroll position; the `LogView` wrapper is recreated each frame.
impl EventHandler for LogViewState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
                self.stick_to_bottom = false;
                None
            }
            TuiEvent::ScrollDown => {
                self.scroll = self.scroll.saturating_add(1);
                self.repin_if_at_bottom();
                None
            }
            TuiEvent::ScrollPageUp => {
                self.scroll = self.scroll.saturating_sub(self.page());
                self.stick_to_bottom = false;
                None
            }
            TuiEvent::ScrollPageDown => {
                self.scroll = self.scroll.saturating_add(self.page());
                self.repin_if_at_bottom();
                None
            }
            TuiEvent::ScrollToBottom => {
                self.scroll = self.max_scroll();
                self.stick_to_bottom = true;
                None
            }
            _ => None,
        }
    }
}

/// Transient render wrapper over the log text.
pub struct LogView<'a> {
    state: &'a mut LogViewState,
    log: &'a str,
}

impl<'a> LogView<'a> {
    pub fn new(state: &'a mut LogViewState, log: &'a str) -> Self {
        Self { state, log }
    }
}

impl Component for LogView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(self.log).wrap(Wrap { trim: false });
        // Saturate: a log taller than u16::MAX wrapped lines must not wrap
        // around and corrupt the scroll offset.
        let content_height = u16::try_from(paragraph.line_count(area.width)).unwrap_or(u16::MAX);

        self.state.viewport_height = area.height;
        self.state.content_height = content_height;

        let max_scroll = content_height.saturating_sub(area.height);
        if self.state.stick_to_bottom || self.state.scroll > max_scroll {
            self.state.scroll = max_scroll;
        }

        frame.render_widget(paragraph.scroll((self.state.scroll, 0)), area);
    }
}
