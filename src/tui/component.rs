use ratatui::Frame;
use ratatui::layout::Rect;

use super::event::TuiEvent;

/// A reusable piece of UI.
///
/// Components hold their own presentation state (scroll offsets, selection)
/// and render into whatever `Rect` the view hands them. `render` takes
/// `&mut self` so a component can refresh cached layout while drawing,
/// matching ratatui's `StatefulWidget` shape.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that consumes terminal events.
pub trait EventHandler {
    /// High-level event the component reports back to the view.
    type Event;

    /// Handle one `TuiEvent`; `None` means the event was absorbed (or
    /// ignored) with nothing for the caller to act on.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
