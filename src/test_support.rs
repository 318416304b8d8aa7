//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::command::ComposeInvocation;
use crate::command::stack::Stack;
use crate::core::config::ResolvedConfig;
use crate::core::state::{ActionKind, Phase, RunHandles, RunId, Session};
use crate::process::InputHandle;

/// A resolved config with stock values, for tests that never touch disk.
pub fn test_config() -> ResolvedConfig {
    ResolvedConfig {
        repo_root: PathBuf::from("/repo"),
        setup_script: "script/dev_setup.sh".to_string(),
        stack: Stack::Default,
        logs_service: "web".to_string(),
        logs_tail: 100,
        docker_binary: "docker".to_string(),
        compose: ComposeInvocation::for_engine("docker"),
    }
}

/// Creates an idle session over [`test_config`].
pub fn test_session() -> Session {
    Session::new(test_config())
}

/// Forces a session into `Running` with a test stdin queue, bypassing the
/// spawn pipeline. Returns the session, its run id, and the queue receiver
/// so tests can observe exactly what would reach the child.
pub fn running_session(kind: ActionKind) -> (Session, RunId, UnboundedReceiver<String>) {
    let mut session = test_session();
    session.kind = kind;
    let (input, rx) = InputHandle::channel();
    let input = kind.interactive().then_some(input);
    session.run = Some(RunHandles::new(Some(4242), input));
    session.phase = Phase::Running;
    let id = session.run_id;
    (session, id, rx)
}
