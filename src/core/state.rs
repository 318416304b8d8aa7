//! # Session State
//!
//! The supervised-process session: domain state only, no TUI types.
//! Presentation state (scroll position, overlays) lives in the `tui` module.
//!
//! ```text
//! Session
//! ├── phase: Phase                   // Idle → Running → Finished
//! ├── kind: ActionKind               // which command this session runs
//! ├── config: ResolvedConfig         // command-building inputs
//! ├── run: Option<RunHandles>        // live-process handles while Running
//! ├── spawn_pending: bool            // spawn issued, result not yet seen
//! ├── run_id: RunId                  // identity of the current spawn attempt
//! ├── log: String                    // append-only output log
//! ├── pending_input: String          // typed but not yet submitted
//! └── last_exit_error: Option<RunError>  // set when Finished; None = success
//! ```
//!
//! State changes only happen through `update(session, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use std::fmt;

use uuid::Uuid;

use crate::core::config::ResolvedConfig;
use crate::process::{InputHandle, RunError};

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Finished,
}

/// The logical command a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Setup,
    ComposeUp,
    ComposeDown,
    Services,
    ServiceLogs,
    DockerInfo,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Setup,
        ActionKind::ComposeUp,
        ActionKind::ComposeDown,
        ActionKind::Services,
        ActionKind::ServiceLogs,
        ActionKind::DockerInfo,
    ];

    /// Only the setup script takes keyboard input.
    pub fn interactive(self) -> bool {
        matches!(self, ActionKind::Setup)
    }

    pub fn title(self) -> &'static str {
        match self {
            ActionKind::Setup => "setup script",
            ActionKind::ComposeUp => "compose up",
            ActionKind::ComposeDown => "compose down",
            ActionKind::Services => "compose ps",
            ActionKind::ServiceLogs => "service logs",
            ActionKind::DockerInfo => "docker info",
        }
    }

    pub fn success_note(self) -> String {
        match self {
            ActionKind::Setup => "✔ Setup script completed successfully.".to_string(),
            ActionKind::ComposeUp => "✔ Stack services are up.".to_string(),
            ActionKind::ComposeDown => "✔ Stack services are down.".to_string(),
            other => format!("✔ {} finished.", other.title()),
        }
    }

    pub fn failure_note(self, error: &RunError) -> String {
        match error {
            RunError::Spawn(e) => format!("✖ Failed to start {}: {e}", self.title()),
            _ => match self {
                ActionKind::Setup => format!("✖ Setup script exited with error: {error}"),
                other => format!("✖ {} failed: {error}", other.title()),
            },
        }
    }
}

/// Identity of one spawn attempt. Every event carries the id of the attempt
/// that issued it; a mismatch with the session's current id marks the event
/// stale and it is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handles for the live process while `phase == Running`.
#[derive(Debug)]
pub struct RunHandles {
    pub pid: Option<u32>,
    /// Present only for interactive actions.
    pub input: Option<InputHandle>,
    pub stdout_open: bool,
    pub stderr_open: bool,
    /// Exit outcome observed while output channels were still draining.
    pub pending_exit: Option<Result<(), RunError>>,
}

impl RunHandles {
    pub fn new(pid: Option<u32>, input: Option<InputHandle>) -> Self {
        Self {
            pid,
            input,
            stdout_open: true,
            stderr_open: true,
            pending_exit: None,
        }
    }

    pub fn streams_open(&self) -> bool {
        self.stdout_open || self.stderr_open
    }
}

pub struct Session {
    pub phase: Phase,
    pub kind: ActionKind,
    pub config: ResolvedConfig,
    pub run: Option<RunHandles>,
    /// True between issuing a spawn and receiving its result event.
    pub spawn_pending: bool,
    pub run_id: RunId,
    pub log: String,
    pub pending_input: String,
    pub last_exit_error: Option<RunError>,
}

impl Session {
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            phase: Phase::Idle,
            kind: ActionKind::Setup,
            config,
            run: None,
            spawn_pending: false,
            run_id: RunId::new(),
            log: String::new(),
            pending_input: String::new(),
            last_exit_error: None,
        }
    }

    /// True while a new start request would be rejected.
    pub fn busy(&self) -> bool {
        self.phase == Phase::Running || self.spawn_pending
    }

    /// Resets per-run state so the next action starts from a clean log.
    pub fn rearm(&mut self) {
        self.log.clear();
        self.pending_input.clear();
        self.last_exit_error = None;
        self.run = None;
        self.phase = Phase::Idle;
    }

    pub fn append_log(&mut self, text: &str) {
        self.log.push_str(text);
    }

    /// Marks the session finished: drops every process handle (closing the
    /// stdin queue) and records the outcome plus its log annotation.
    /// Dropping handles that are already gone is a no-op.
    pub fn finish(&mut self, outcome: Result<(), RunError>) {
        self.run = None;
        self.spawn_pending = false;
        self.phase = Phase::Finished;
        let note = match &outcome {
            Ok(()) => self.kind.success_note(),
            Err(e) => self.kind.failure_note(e),
        };
        self.append_log(&format!("\n{note}\n"));
        self.last_exit_error = outcome.err();
    }

    /// Queues a line for the child's stdin. No-op when stdin is closed or
    /// was never attached.
    pub fn send_input_line(&self, line: String) {
        if let Some(input) = self.run.as_ref().and_then(|r| r.input.as_ref()) {
            input.send_line(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_session;

    #[test]
    fn test_session_new_defaults() {
        let session = test_session();
        assert_eq!(session.phase, Phase::Idle);
        assert_eq!(session.kind, ActionKind::Setup);
        assert!(session.log.is_empty());
        assert!(!session.busy());
    }

    #[test]
    fn test_rearm_clears_per_run_state() {
        let mut session = test_session();
        session.append_log("old output");
        session.pending_input.push('y');
        session.finish(Err(RunError::Wait(std::io::Error::other("boom"))));
        session.rearm();
        assert_eq!(session.phase, Phase::Idle);
        assert!(session.log.is_empty());
        assert!(session.pending_input.is_empty());
        assert!(session.last_exit_error.is_none());
    }

    #[test]
    fn test_finish_annotates_and_records_outcome() {
        let mut session = test_session();
        session.finish(Ok(()));
        assert_eq!(session.phase, Phase::Finished);
        assert!(session.log.contains("✔ Setup script completed successfully."));
        assert!(session.last_exit_error.is_none());
    }

    #[test]
    fn test_only_setup_is_interactive() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.interactive(), kind == ActionKind::Setup);
        }
    }

    #[test]
    fn test_run_ids_are_unique_per_attempt() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
