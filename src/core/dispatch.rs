//! # Effect Execution
//!
//! `update()` decides; this module does. Each effect becomes one tokio task
//! that performs the I/O and funnels its completion back into the event
//! loop's channel as a new [`Action`].
//!
//! Every task sends exactly one action. That keeps the loop's bookkeeping
//! honest: at most one outstanding read per output channel, exactly one
//! exit-wait per run.

use std::sync::mpsc::Sender;

use log::{info, warn};
use tokio::process::Child;

use crate::command::CommandSpec;
use crate::core::action::{Action, Effect};
use crate::core::state::RunId;
use crate::process::stream::{OutputReader, StreamRead};
use crate::process::{self};

/// Executes one effect. Returns `true` when the event loop should exit.
pub fn perform(effect: Effect, tx: &Sender<Action>) -> bool {
    match effect {
        Effect::None => false,
        Effect::Quit => true,
        Effect::Spawn { run, command } => {
            spawn_process(run, command, tx.clone());
            false
        }
        Effect::Supervise {
            run,
            child,
            stdout,
            stderr,
        } => {
            watch_exit(run, child, tx.clone());
            read_stream(run, stdout, tx.clone());
            read_stream(run, stderr, tx.clone());
            false
        }
        Effect::Read { run, reader } => {
            read_stream(run, reader, tx.clone());
            false
        }
        Effect::Interrupt { pid } => {
            process::interrupt(pid);
            false
        }
    }
}

fn spawn_process(run: RunId, command: CommandSpec, tx: Sender<Action>) {
    info!("Spawning: {}", command.display);
    tokio::spawn(async move {
        let outcome = process::launch(&command);
        if tx.send(Action::Spawned { run, outcome }).is_err() {
            warn!("Failed to deliver spawn result: receiver dropped");
        }
    });
}

fn watch_exit(run: RunId, child: Child, tx: Sender<Action>) {
    tokio::spawn(async move {
        let outcome = process::wait_for_exit(child).await;
        if tx.send(Action::Exited { run, outcome }).is_err() {
            warn!("Failed to deliver exit result: receiver dropped");
        }
    });
}

fn read_stream(run: RunId, reader: OutputReader, tx: Sender<Action>) {
    tokio::spawn(async move {
        let action = match reader.read_chunk().await {
            StreamRead::Chunk { text, reader } => Action::Chunk { run, text, reader },
            StreamRead::End { source, error } => Action::StreamEnd { run, source, error },
        };
        if tx.send(action).is_err() {
            warn!("Failed to deliver stream event: receiver dropped");
        }
    });
}
