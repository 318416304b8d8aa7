//! Action-to-command translation.
//!
//! Maps a selected [`ActionKind`] onto the concrete program, argument vector,
//! and environment overrides to spawn, using the resolved configuration. The
//! supervision core never inspects these values; it only execs them.

pub mod stack;

use std::path::PathBuf;

use crate::core::config::ResolvedConfig;
use crate::core::state::ActionKind;

/// Environment variable telling the setup script it runs under the TUI.
pub const SETUP_TUI_MARKER: &str = "DOCKHAND_TUI";

/// A fully resolved command: what to exec, with what, and whether the child
/// gets an interactive stdin pipe.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Overrides layered on top of the ambient environment (later wins).
    pub env: Vec<(String, String)>,
    /// Working directory; always the repo root so script and compose-file
    /// paths stay repo-relative.
    pub cwd: PathBuf,
    pub attach_stdin: bool,
    /// One-line rendering for the session log.
    pub display: String,
}

/// Compose front-end: the binary plus any prefix arguments that must precede
/// the compose subcommand (`docker` + `compose`, or a `$COMPOSE` override).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeInvocation {
    pub program: String,
    pub prefix: Vec<String>,
}

impl ComposeInvocation {
    /// Standard `<engine> compose` front-end.
    pub fn for_engine(docker_binary: &str) -> Self {
        Self {
            program: docker_binary.to_string(),
            prefix: vec!["compose".to_string()],
        }
    }

    /// Parses a full-invocation override such as `"podman compose"` or
    /// `"docker-compose"`. The first whitespace-separated token is the
    /// binary; any remaining tokens become prefix arguments. Blank input
    /// falls back to [`ComposeInvocation::for_engine`].
    pub fn from_override(raw: &str, docker_binary: &str) -> Self {
        let mut tokens = raw.split_whitespace().map(str::to_string);
        match tokens.next() {
            Some(program) => Self {
                program,
                prefix: tokens.collect(),
            },
            None => Self::for_engine(docker_binary),
        }
    }
}

/// Builds the command for an action. Only the setup script gets an
/// interactive stdin; everything else runs detached from the keyboard.
pub fn build(kind: ActionKind, cfg: &ResolvedConfig) -> CommandSpec {
    match kind {
        ActionKind::Setup => CommandSpec {
            program: "bash".to_string(),
            args: vec![cfg.setup_script.clone()],
            env: vec![(SETUP_TUI_MARKER.to_string(), "1".to_string())],
            cwd: cfg.repo_root.clone(),
            attach_stdin: true,
            display: format!("bash {}", cfg.setup_script),
        },
        ActionKind::ComposeUp => compose(cfg, &["up", "-d"]),
        ActionKind::ComposeDown => compose(cfg, &["down"]),
        ActionKind::Services => compose(cfg, &["ps"]),
        ActionKind::ServiceLogs => {
            let tail = cfg.logs_tail.to_string();
            compose(cfg, &["logs", "--tail", &tail, &cfg.logs_service])
        }
        ActionKind::DockerInfo => CommandSpec {
            program: cfg.docker_binary.clone(),
            args: vec!["info".to_string()],
            env: Vec::new(),
            cwd: cfg.repo_root.clone(),
            attach_stdin: false,
            display: format!("{} info", cfg.docker_binary),
        },
    }
}

/// Assembles a compose command: prefix arguments, then the stack's override
/// files, then the subcommand itself.
fn compose(cfg: &ResolvedConfig, subcommand: &[&str]) -> CommandSpec {
    let mut args = cfg.compose.prefix.clone();
    args.extend(cfg.stack.compose_args());
    args.extend(subcommand.iter().map(|s| s.to_string()));
    let display = format!(
        "{} {} (stack: {})",
        cfg.compose.program,
        args.join(" "),
        cfg.stack
    );
    CommandSpec {
        program: cfg.compose.program.clone(),
        args,
        env: Vec::new(),
        cwd: cfg.repo_root.clone(),
        attach_stdin: false,
        display,
    }
}
