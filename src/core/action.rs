//! # Actions
//!
//! Everything that can happen in dockhand becomes an `Action`.
//! User presses Enter on the menu? That's `Action::Launch(kind)`.
//! The child printed something? That's `Action::Chunk { .. }`.
//!
//! The `update()` function takes the current session and an action,
//! mutates the session, and returns the `Effect` the event loop must run
//! next. No side effects here. Spawning, reading, and signalling live in
//! `dispatch.rs`; every asynchronous completion funnels back through the
//! event loop's single channel as another action.
//!
//! ```text
//! Session + Action  →  update()  →  mutated Session + Effect
//! ```
//!
//! This makes the whole process lifecycle testable: feed a scripted action
//! sequence to `update()` and assert on the session. And debuggable: log
//! every action, replay the exact run.

use std::io;

use log::{debug, info, warn};
use tokio::process::Child;

use crate::command::stack::Stack;
use crate::command::{self, CommandSpec};
use crate::core::state::{ActionKind, Phase, RunHandles, RunId, Session};
use crate::process::stream::{OutputReader, StreamSource};
use crate::process::{RunError, SpawnError, SpawnedProcess};

/// Every input the event loop can feed into [`update`].
///
/// The first group comes from the user via the TUI's key translation. The
/// second group are completions of asynchronous work; each carries the
/// [`RunId`] of the spawn attempt that issued it, so results from an
/// abandoned run can be told apart from the current one.
#[derive(Debug)]
pub enum Action {
    /// User picked a command from the menu.
    Launch(ActionKind),
    /// User asked to re-run the finished setup script.
    Restart,
    /// User pressed Ctrl+C while a process runs.
    Cancel,
    /// Keystroke for the child's stdin line buffer.
    InputChar(char),
    InputBackspace,
    /// Submit the buffered line (plus newline) to the child.
    InputSubmit,
    /// User picked a stack profile in the selector.
    SelectStack(Stack),
    Quit,

    /// The spawn attempt resolved, successfully or not.
    Spawned {
        run: RunId,
        outcome: Result<SpawnedProcess, SpawnError>,
    },
    /// One bounded read produced output. The reader travels back so the
    /// loop can issue the next read on the same channel.
    Chunk {
        run: RunId,
        text: String,
        reader: OutputReader,
    },
    /// An output channel is done: clean end-of-stream, or a read error.
    StreamEnd {
        run: RunId,
        source: StreamSource,
        error: Option<io::Error>,
    },
    /// The exit-wait observed the child terminate.
    Exited {
        run: RunId,
        outcome: Result<(), RunError>,
    },
}

/// Follow-up work the event loop must perform after a transition. At most
/// one effect per action keeps the loop trivial to reason about.
#[derive(Debug)]
pub enum Effect {
    None,
    Quit,
    /// Start the command; resolves to [`Action::Spawned`].
    Spawn { run: RunId, command: CommandSpec },
    /// Start the exit-wait and the first read on each output channel.
    Supervise {
        run: RunId,
        child: Child,
        stdout: OutputReader,
        stderr: OutputReader,
    },
    /// Issue the next bounded read on one channel.
    Read { run: RunId, reader: OutputReader },
    /// Deliver an interrupt signal to the child.
    Interrupt { pid: u32 },
}

/// The transition function: the only place session state changes.
pub fn update(session: &mut Session, action: Action) -> Effect {
    match action {
        Action::Launch(kind) => {
            if session.busy() {
                debug!("Ignoring {} launch while a run is active", kind.title());
                return Effect::None;
            }
            if session.phase == Phase::Finished {
                session.rearm();
            }
            begin_run(session, kind)
        }

        Action::Restart => {
            if session.busy() {
                debug!("Ignoring restart while a run is active");
                return Effect::None;
            }
            if session.phase != Phase::Finished || session.kind != ActionKind::Setup {
                debug!("Ignoring restart: only a finished setup run can be restarted");
                return Effect::None;
            }
            session.rearm();
            begin_run(session, ActionKind::Setup)
        }

        Action::Cancel => {
            if session.phase != Phase::Running {
                debug!("Ignoring cancel outside a running session");
                return Effect::None;
            }
            info!("Cancel requested for run {}", session.run_id);
            session.append_log("\nUser requested cancel.\n");
            match session.run.as_ref().and_then(|r| r.pid) {
                Some(pid) => Effect::Interrupt { pid },
                None => Effect::None,
            }
        }

        Action::InputChar(c) => {
            if session.phase == Phase::Running && session.kind.interactive() {
                session.pending_input.push(c);
            }
            Effect::None
        }

        Action::InputBackspace => {
            if session.phase == Phase::Running && session.kind.interactive() {
                session.pending_input.pop();
            }
            Effect::None
        }

        Action::InputSubmit => {
            if session.phase == Phase::Running && session.kind.interactive() {
                let mut line = std::mem::take(&mut session.pending_input);
                line.push('\n');
                session.send_input_line(line);
            }
            Effect::None
        }

        Action::SelectStack(stack) => {
            if session.busy() {
                debug!("Ignoring stack change while a run is active");
                return Effect::None;
            }
            if session.config.stack != stack {
                info!("Stack profile set to {stack}");
                session.config.stack = stack;
            }
            Effect::None
        }

        Action::Quit => {
            if session.busy() {
                debug!("Ignoring quit while a run is active");
                return Effect::None;
            }
            Effect::Quit
        }

        Action::Spawned { run, outcome } => {
            if stale(session, run, "spawn result") {
                return Effect::None;
            }
            session.spawn_pending = false;
            match outcome {
                Ok(process) => {
                    info!("Run {} started (pid {:?})", run, process.pid);
                    session.run = Some(RunHandles::new(process.pid, process.input));
                    session.phase = Phase::Running;
                    Effect::Supervise {
                        run,
                        child: process.child,
                        stdout: process.stdout,
                        stderr: process.stderr,
                    }
                }
                Err(e) => {
                    warn!("Run {run} failed to start: {e}");
                    session.finish(Err(RunError::Spawn(e)));
                    Effect::None
                }
            }
        }

        Action::Chunk { run, text, reader } => {
            if stale(session, run, "chunk") {
                return Effect::None;
            }
            session.append_log(&text);
            Effect::Read { run, reader }
        }

        Action::StreamEnd { run, source, error } => {
            if stale(session, run, "stream end") {
                return Effect::None;
            }
            if let Some(e) = error {
                warn!("Read error on {source} for run {run}: {e}");
                session.append_log(&format!("\n[error reading {source}: {e}]\n"));
            } else {
                debug!("{source} closed for run {run}");
            }
            let mut deferred_exit = None;
            if let Some(handles) = session.run.as_mut() {
                match source {
                    StreamSource::Stdout => handles.stdout_open = false,
                    StreamSource::Stderr => handles.stderr_open = false,
                }
                if !handles.streams_open() {
                    deferred_exit = handles.pending_exit.take();
                }
            }
            if let Some(outcome) = deferred_exit {
                session.finish(outcome);
            }
            Effect::None
        }

        Action::Exited { run, outcome } => {
            if stale(session, run, "exit result") {
                return Effect::None;
            }
            match &outcome {
                Ok(()) => info!("Run {run} exited successfully"),
                Err(e) => info!("Run {run} exited: {e}"),
            }
            // Hold the outcome until both output channels hit end-of-stream,
            // so the tail of the output lands in the log before the final
            // annotation.
            let draining = session.run.as_ref().is_some_and(RunHandles::streams_open);
            if draining {
                debug!("Run {run} exited while output channels still open; draining");
                if let Some(handles) = session.run.as_mut() {
                    handles.pending_exit = Some(outcome);
                }
            } else {
                session.finish(outcome);
            }
            Effect::None
        }
    }
}

/// Stamps a new run identity, banners the command into the log, and asks the
/// loop to spawn it. The session counts as busy until the spawn resolves.
fn begin_run(session: &mut Session, kind: ActionKind) -> Effect {
    session.kind = kind;
    session.run_id = RunId::new();
    session.spawn_pending = true;
    let command = command::build(kind, &session.config);
    info!(
        "Starting {} as run {}: {}",
        kind.title(),
        session.run_id,
        command.display
    );
    session.append_log(&format!(
        "\nRunning {} …\n{}\n\n",
        kind.title(),
        command.display
    ));
    Effect::Spawn {
        run: session.run_id,
        command,
    }
}

fn stale(session: &Session, run: RunId, what: &str) -> bool {
    if run != session.run_id {
        debug!("Discarding stale {what} from run {run}");
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process;
    use crate::test_support::{running_session, test_session};

    fn stdout_reader() -> OutputReader {
        OutputReader::new(StreamSource::Stdout, tokio::io::empty())
    }

    fn sh_spec(script: &str) -> CommandSpec {
        CommandSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: Vec::new(),
            cwd: std::env::temp_dir(),
            attach_stdin: false,
            display: format!("sh -c '{script}'"),
        }
    }

    #[test]
    fn test_launch_banners_command_and_requests_spawn() {
        let mut session = test_session();
        let effect = update(&mut session, Action::Launch(ActionKind::ComposeUp));
        let Effect::Spawn { run, command } = effect else {
            panic!("expected a spawn effect");
        };
        assert_eq!(run, session.run_id);
        assert_eq!(command.program, "docker");
        assert!(session.spawn_pending);
        assert!(session.busy());
        assert_eq!(session.phase, Phase::Idle);
        assert!(session.log.contains("Running compose up …"));
        assert!(session.log.contains("docker compose up -d (stack: default)"));
    }

    #[test]
    fn test_launch_rejected_while_busy() {
        let mut session = test_session();
        update(&mut session, Action::Launch(ActionKind::Setup));
        let first_run = session.run_id;
        assert!(matches!(
            update(&mut session, Action::Launch(ActionKind::ComposeUp)),
            Effect::None
        ));
        assert_eq!(session.kind, ActionKind::Setup);
        assert_eq!(session.run_id, first_run);

        let (mut session, _, _rx) = running_session(ActionKind::Setup);
        assert!(matches!(
            update(&mut session, Action::Launch(ActionKind::DockerInfo)),
            Effect::None
        ));
        assert_eq!(session.kind, ActionKind::Setup);
    }

    #[test]
    fn test_spawn_failure_finishes_with_error() {
        let mut session = test_session();
        let Effect::Spawn { run, .. } = update(&mut session, Action::Launch(ActionKind::Setup))
        else {
            panic!("expected a spawn effect");
        };
        let effect = update(
            &mut session,
            Action::Spawned {
                run,
                outcome: Err(SpawnError::NotFound {
                    program: "bash".to_string(),
                }),
            },
        );
        assert!(matches!(effect, Effect::None));
        assert_eq!(session.phase, Phase::Finished);
        assert!(!session.busy());
        assert!(session.run.is_none());
        assert!(session.last_exit_error.is_some());
        assert!(
            session
                .log
                .contains("✖ Failed to start setup script: executable not found: bash")
        );
    }

    #[tokio::test]
    async fn test_spawn_result_moves_session_to_running() {
        let mut session = test_session();
        let Effect::Spawn { run, .. } = update(&mut session, Action::Launch(ActionKind::Services))
        else {
            panic!("expected a spawn effect");
        };
        let spawned = process::launch(&sh_spec("exit 0")).unwrap();
        let effect = update(
            &mut session,
            Action::Spawned {
                run,
                outcome: Ok(spawned),
            },
        );
        assert!(matches!(effect, Effect::Supervise { .. }));
        assert_eq!(session.phase, Phase::Running);
        assert!(!session.spawn_pending);
        assert!(session.run.is_some());
    }

    #[test]
    fn test_setup_output_then_clean_exit() {
        let (mut session, run, _rx) = running_session(ActionKind::Setup);
        let effect = update(
            &mut session,
            Action::Chunk {
                run,
                text: "step1\n".to_string(),
                reader: stdout_reader(),
            },
        );
        assert!(matches!(effect, Effect::Read { .. }));
        update(
            &mut session,
            Action::Chunk {
                run,
                text: "step2\n".to_string(),
                reader: stdout_reader(),
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stdout,
                error: None,
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stderr,
                error: None,
            },
        );
        assert_eq!(session.phase, Phase::Running);
        update(&mut session, Action::Exited { run, outcome: Ok(()) });
        assert_eq!(session.phase, Phase::Finished);
        assert!(session.log.contains("step1\nstep2\n"));
        assert!(session.log.contains("✔ Setup script completed successfully."));
        assert!(session.last_exit_error.is_none());
        assert!(session.run.is_none());
    }

    #[test]
    fn test_exit_held_until_streams_drain() {
        let (mut session, run, _rx) = running_session(ActionKind::ComposeUp);
        update(&mut session, Action::Exited { run, outcome: Ok(()) });
        assert_eq!(
            session.phase,
            Phase::Running,
            "exit must wait for the streams"
        );

        update(
            &mut session,
            Action::Chunk {
                run,
                text: "late output\n".to_string(),
                reader: stdout_reader(),
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stdout,
                error: None,
            },
        );
        assert_eq!(session.phase, Phase::Running);
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stderr,
                error: None,
            },
        );
        assert_eq!(session.phase, Phase::Finished);
        let output_at = session.log.find("late output").unwrap();
        let note_at = session.log.find("✔ Stack services are up.").unwrap();
        assert!(output_at < note_at, "output must land before the annotation");
    }

    #[tokio::test]
    async fn test_bring_up_failure_records_exit_error() {
        let (mut session, run, _rx) = running_session(ActionKind::ComposeUp);
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stdout,
                error: None,
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stderr,
                error: None,
            },
        );
        let spawned = process::launch(&sh_spec("exit 3")).unwrap();
        let outcome = process::wait_for_exit(spawned.child).await;
        update(&mut session, Action::Exited { run, outcome });
        assert_eq!(session.phase, Phase::Finished);
        assert!(session.last_exit_error.is_some());
        assert!(session.log.contains("✖ compose up failed:"));
    }

    #[test]
    fn test_cancel_interrupts_once_without_phase_change() {
        let (mut session, _, _rx) = running_session(ActionKind::Setup);
        let effect = update(&mut session, Action::Cancel);
        assert!(matches!(effect, Effect::Interrupt { pid: 4242 }));
        assert_eq!(session.phase, Phase::Running);
        assert!(session.log.contains("User requested cancel."));

        // Each request maps to exactly one signal.
        assert!(matches!(
            update(&mut session, Action::Cancel),
            Effect::Interrupt { pid: 4242 }
        ));

        let mut idle = test_session();
        assert!(matches!(update(&mut idle, Action::Cancel), Effect::None));
    }

    #[test]
    fn test_restart_clears_and_discards_stale_events() {
        let (mut session, old_run, _rx) = running_session(ActionKind::Setup);
        update(
            &mut session,
            Action::Chunk {
                run: old_run,
                text: "old output\n".to_string(),
                reader: stdout_reader(),
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run: old_run,
                source: StreamSource::Stdout,
                error: None,
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run: old_run,
                source: StreamSource::Stderr,
                error: None,
            },
        );
        update(
            &mut session,
            Action::Exited {
                run: old_run,
                outcome: Err(RunError::Wait(io::Error::other("boom"))),
            },
        );
        assert_eq!(session.phase, Phase::Finished);

        let Effect::Spawn { run: new_run, .. } = update(&mut session, Action::Restart) else {
            panic!("expected a spawn effect");
        };
        assert_ne!(new_run, old_run);
        assert!(session.last_exit_error.is_none());
        assert!(!session.log.contains("old output"));
        assert!(session.log.contains("Running setup script …"));

        // A chunk from the abandoned run must not leak into the new log.
        let effect = update(
            &mut session,
            Action::Chunk {
                run: old_run,
                text: "ghost\n".to_string(),
                reader: stdout_reader(),
            },
        );
        assert!(matches!(effect, Effect::None));
        assert!(!session.log.contains("ghost"));
    }

    #[test]
    fn test_restart_only_from_finished_setup() {
        let (mut session, run, _rx) = running_session(ActionKind::ComposeDown);
        assert!(matches!(update(&mut session, Action::Restart), Effect::None));

        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stdout,
                error: None,
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stderr,
                error: None,
            },
        );
        update(&mut session, Action::Exited { run, outcome: Ok(()) });
        assert_eq!(session.phase, Phase::Finished);
        assert!(matches!(update(&mut session, Action::Restart), Effect::None));

        let mut idle = test_session();
        assert!(matches!(update(&mut idle, Action::Restart), Effect::None));
    }

    #[test]
    fn test_typed_input_line_reaches_stdin() {
        let (mut session, _, mut rx) = running_session(ActionKind::Setup);
        update(&mut session, Action::InputChar('y'));
        update(&mut session, Action::InputBackspace);
        update(&mut session, Action::InputChar('n'));
        update(&mut session, Action::InputSubmit);
        assert_eq!(rx.try_recv().unwrap(), "n\n");
        assert!(rx.try_recv().is_err(), "exactly one line per submit");
        assert!(session.pending_input.is_empty());
    }

    #[test]
    fn test_input_ignored_outside_interactive_runs() {
        let (mut session, _, _rx) = running_session(ActionKind::ComposeUp);
        update(&mut session, Action::InputChar('x'));
        assert!(session.pending_input.is_empty());

        let mut idle = test_session();
        update(&mut idle, Action::InputChar('x'));
        assert!(idle.pending_input.is_empty());
    }

    #[test]
    fn test_submit_without_stdin_clears_buffer() {
        let (mut session, _, _rx) = running_session(ActionKind::Setup);
        if let Some(handles) = session.run.as_mut() {
            handles.input = None;
        }
        update(&mut session, Action::InputChar('x'));
        update(&mut session, Action::InputSubmit);
        assert!(session.pending_input.is_empty());
    }

    #[test]
    fn test_quit_refused_while_running() {
        let (mut session, _, _rx) = running_session(ActionKind::Setup);
        assert!(matches!(update(&mut session, Action::Quit), Effect::None));

        let mut idle = test_session();
        assert!(matches!(update(&mut idle, Action::Quit), Effect::Quit));
    }

    #[test]
    fn test_select_stack_updates_config_when_idle() {
        let mut session = test_session();
        update(&mut session, Action::SelectStack(Stack::Alpine));
        assert_eq!(session.config.stack, Stack::Alpine);

        let (mut running, _, _rx) = running_session(ActionKind::Setup);
        let before = running.config.stack;
        update(&mut running, Action::SelectStack(Stack::Arch));
        assert_eq!(running.config.stack, before);
    }

    #[test]
    fn test_stream_error_annotated_without_finishing() {
        let (mut session, run, _rx) = running_session(ActionKind::Setup);
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stdout,
                error: Some(io::Error::new(io::ErrorKind::BrokenPipe, "pipe burst")),
            },
        );
        assert_eq!(session.phase, Phase::Running);
        assert!(session.log.contains("[error reading stdout: pipe burst]"));

        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stderr,
                error: None,
            },
        );
        update(&mut session, Action::Exited { run, outcome: Ok(()) });
        assert_eq!(session.phase, Phase::Finished);
    }

    #[test]
    fn test_launch_from_finished_starts_clean() {
        let (mut session, run, _rx) = running_session(ActionKind::Setup);
        update(
            &mut session,
            Action::Chunk {
                run,
                text: "setup noise\n".to_string(),
                reader: stdout_reader(),
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stdout,
                error: None,
            },
        );
        update(
            &mut session,
            Action::StreamEnd {
                run,
                source: StreamSource::Stderr,
                error: None,
            },
        );
        update(&mut session, Action::Exited { run, outcome: Ok(()) });

        let Effect::Spawn { .. } = update(&mut session, Action::Launch(ActionKind::ServiceLogs))
        else {
            panic!("expected a spawn effect");
        };
        assert_eq!(session.kind, ActionKind::ServiceLogs);
        assert!(!session.log.contains("setup noise"));
        assert!(session.log.contains("Running service logs …"));
    }
}
