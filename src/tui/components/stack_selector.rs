//! # Stack Selector Component
//!
//! Centered overlay for switching the compose stack profile. Opened with `S`
//! from the menu; the chosen profile feeds the next `up`/`down`/`ps` run.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `StackSelectorState` lives in `TuiState` while the overlay is open
//! - `StackSelector` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding};

use crate::command::stack::Stack;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Persistent state for the stack selector overlay.
pub struct StackSelectorState {
    pub selected: usize,
    pub list_state: ListState,
}

impl StackSelectorState {
    /// Opens the selector with the cursor on the active profile.
    pub fn new(current: Stack) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(current.index()));
        Self {
            selected: current.index(),
            list_state,
        }
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.list_state.select(Some(index));
    }
}

impl EventHandler for StackSelectorState {
    type Event = StackSelectorEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        let count = Stack::OPTIONS.len();
        match event {
            TuiEvent::Esc | TuiEvent::Char('q') | TuiEvent::CtrlC => {
                Some(StackSelectorEvent::Dismiss)
            }
            // Cursor wraps at both ends
            TuiEvent::ScrollUp | TuiEvent::Char('k') => {
                self.select(self.selected.checked_sub(1).unwrap_or(count - 1));
                None
            }
            TuiEvent::ScrollDown | TuiEvent::Char('j') => {
                self.select((self.selected + 1) % count);
                None
            }
            // Number keys jump the cursor but do not confirm
            TuiEvent::Char(c @ '1'..='9') => {
                if let Some(index) = c.to_digit(10).map(|d| d as usize - 1) {
                    if index < count {
                        self.select(index);
                    }
                }
                None
            }
            TuiEvent::Enter => Stack::OPTIONS
                .get(self.selected)
                .copied()
                .map(StackSelectorEvent::Select),
            _ => None,
        }
    }
}

/// Events emitted by the stack selector.
pub enum StackSelectorEvent {
    Select(Stack),
    Dismiss,
}

/// Transient render wrapper for the stack selector overlay.
pub struct StackSelector<'a> {
    state: &'a mut StackSelectorState,
    current: Stack,
}

impl<'a> StackSelector<'a> {
    pub fn new(state: &'a mut StackSelectorState, current: Stack) -> Self {
        Self { state, current }
    }
}

impl Component for StackSelector<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(40, 40, area);

        // Clear underlying content
        frame.render_widget(Clear, overlay);

        let help_text = " 1-3 Jump  Enter Select  Esc Back ";

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Stack ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(help_text).centered())
            .padding(Padding::horizontal(1));

        let inner_width = overlay.width.saturating_sub(4) as usize; // borders + padding

        let items: Vec<ListItem> = Stack::OPTIONS
            .iter()
            .enumerate()
            .map(|(i, stack)| {
                let is_active = *stack == self.current;
                let active_marker = if is_active { " *" } else { "" };

                let label = format!("{}) {}", i + 1, stack.label());
                let name_width = inner_width.saturating_sub(active_marker.len());
                let padded_label = format!("{label:<name_width$}");

                let style = if i == self.state.selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if is_active {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };

                let mut spans = vec![Span::styled(padded_label, style)];
                if !active_marker.is_empty() {
                    spans.push(Span::styled(active_marker, style));
                }

                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items).block(block);

        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}

/// Compute a centered rect using percentage of the outer rect.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
