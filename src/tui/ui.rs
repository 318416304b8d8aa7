//! Frame rendering. One draw per loop tick; the session phase picks the view.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::core::state::{Phase, Session};
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{LogView, StackSelector};

pub fn draw_ui(frame: &mut Frame, session: &Session, tui: &mut TuiState) {
    let area = frame.area();
    match session.phase {
        Phase::Idle if !session.spawn_pending => draw_intro(frame, area, session),
        Phase::Finished => draw_finished(frame, area, session, tui),
        // Running, or spawn issued and the result not yet back
        _ => draw_running(frame, area, session, tui),
    }

    // Overlay renders last so it sits on top of the active view
    if let Some(state) = tui.stack_selector.as_mut() {
        StackSelector::new(state, session.config.stack).render(frame, area);
    }
}

fn draw_intro(frame: &mut Frame, area: Rect, session: &Session) {
    let lines = vec![
        Line::from(Span::styled(
            "Dockhand",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(format!(
            "Wraps {} and docker compose with a terminal UI.",
            session.config.setup_script
        )),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Stack: "),
            Span::styled(
                session.config.stack.label(),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::raw(""),
        menu_line("Enter/s", "run setup script"),
        menu_line("u", "compose up -d"),
        menu_line("d", "compose down"),
        menu_line("p", "service status"),
        menu_line("i", "docker info"),
        menu_line("l", "service logs"),
        menu_line("S", "switch stack"),
        menu_line("q", "quit"),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_running(frame: &mut Frame, area: Rect, session: &Session, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    // While the spawn is still pending, typing goes nowhere; the input line
    // appears only once the process is attached.
    let interactive = session.phase == Phase::Running && session.kind.interactive();
    let input_height = if interactive { 1 } else { 0 };
    let layout = Layout::vertical([Length(1), Min(0), Length(input_height), Length(1)]);
    let [title_area, log_area, input_area, help_area] = layout.areas(area);

    frame.render_widget(
        Span::styled(
            format!("Running {}", session.kind.title()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        title_area,
    );

    LogView::new(&mut tui.log_view, &session.log).render(frame, log_area);

    if interactive {
        frame.render_widget(
            Span::raw(format!("> {}", session.pending_input)),
            input_area,
        );
        let cursor_x = input_area.x + 2 + session.pending_input.width() as u16;
        frame.set_cursor_position((
            cursor_x.min(input_area.right().saturating_sub(1)),
            input_area.y,
        ));
    }

    let help = if interactive {
        "Enter: send input  •  Ctrl+C: cancel  •  ↑/↓: scroll"
    } else {
        "Ctrl+C: cancel  •  ↑/↓: scroll"
    };
    frame.render_widget(Span::styled(help, help_style()), help_area);
}

fn draw_finished(frame: &mut Frame, area: Rect, session: &Session, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Length(1), Min(0), Length(2)]);
    let [title_area, status_area, log_area, help_area] = layout.areas(area);

    frame.render_widget(
        Span::styled(
            format!("{} finished", session.kind.title()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        title_area,
    );

    let status = match &session.last_exit_error {
        None => Span::styled("Success!", Style::default().fg(Color::Green)),
        Some(error) => Span::styled(
            format!("Exited with error: {error}"),
            Style::default().fg(Color::Red),
        ),
    };
    frame.render_widget(status, status_area);

    LogView::new(&mut tui.log_view, &session.log).render(frame, log_area);

    let help = Paragraph::new(vec![
        Line::styled(
            "r: rerun setup  •  u: compose up  •  d: compose down  •  S: switch stack",
            help_style(),
        ),
        Line::styled(
            "p: status  •  i: info  •  l: logs  •  q: quit  •  ↑/↓: scroll",
            help_style(),
        ),
    ]);
    frame.render_widget(help, help_area);
}

fn menu_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {key:<8} "), Style::default().fg(Color::Cyan)),
        Span::raw(desc.to_string()),
    ])
}

fn help_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::core::state::ActionKind;
    use crate::process::{RunError, SpawnError};
    use crate::test_support::{running_session, test_session};
    use crate::tui::components::StackSelectorState;

    fn render(session: &Session, tui: &mut TuiState) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw_ui(f, session, tui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_intro_lists_menu_and_stack() {
        let session = test_session();
        let mut tui = TuiState::new();
        let text = render(&session, &mut tui);
        assert!(text.contains("Dockhand"));
        assert!(text.contains("Stack: default"));
        assert!(text.contains("run setup script"));
        assert!(text.contains("switch stack"));
    }

    #[test]
    fn test_running_view_shows_log_and_input_line() {
        let (mut session, _id, _rx) = running_session(ActionKind::Setup);
        session.append_log("Continue? [y/N]\n");
        session.pending_input.push('y');
        let mut tui = TuiState::new();
        let text = render(&session, &mut tui);
        assert!(text.contains("Running setup script"));
        assert!(text.contains("Continue? [y/N]"));
        assert!(text.contains("> y"));
        assert!(text.contains("Enter: send input"));
    }

    #[test]
    fn test_pending_spawn_hides_input_until_running() {
        let mut session = test_session();
        session.spawn_pending = true;
        let mut tui = TuiState::new();
        let text = render(&session, &mut tui);
        assert!(text.contains("Running setup script"));
        assert!(!text.contains("> "));
        assert!(!text.contains("Enter: send input"));
    }

    #[test]
    fn test_running_view_hides_input_for_noninteractive() {
        let (mut session, _id, _rx) = running_session(ActionKind::ComposeUp);
        session.append_log("Pulling images\n");
        let mut tui = TuiState::new();
        let text = render(&session, &mut tui);
        assert!(text.contains("Running compose up"));
        assert!(text.contains("Pulling images"));
        assert!(!text.contains("Enter: send input"));
    }

    #[test]
    fn test_finished_view_reports_success() {
        let mut session = test_session();
        session.kind = ActionKind::ComposeUp;
        session.finish(Ok(()));
        let mut tui = TuiState::new();
        let text = render(&session, &mut tui);
        assert!(text.contains("compose up finished"));
        assert!(text.contains("Success!"));
        assert!(text.contains("r: rerun setup"));
    }

    #[test]
    fn test_finished_view_reports_exit_error() {
        let mut session = test_session();
        session.finish(Err(RunError::Spawn(SpawnError::NotFound {
            program: "bash".to_string(),
        })));
        let mut tui = TuiState::new();
        let text = render(&session, &mut tui);
        assert!(text.contains("Exited with error: executable not found: bash"));
    }

    #[test]
    fn test_stack_selector_overlay_renders_on_top() {
        let session = test_session();
        let mut tui = TuiState::new();
        tui.stack_selector = Some(StackSelectorState::new(session.config.stack));
        let text = render(&session, &mut tui);
        assert!(text.contains("1) default"));
        assert!(text.contains("3) alpine"));
    }
}
