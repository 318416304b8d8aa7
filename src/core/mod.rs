//! # Core Application Logic
//!
//! This module contains dockhand's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Session (state)      │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • dispatch (effects)   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │  process   │      │  command   │
//!     │  Adapter   │      │ supervisor │      │  builder   │
//!     │ (ratatui)  │      │  (tokio)   │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `Session` struct — the supervised-process state in one place
//! - [`action`]: The `Action` enum — everything that can happen, and `update()`
//! - [`dispatch`]: Executes the `Effect` an update returns
//! - [`config`]: Configuration discovery and resolution

pub mod action;
pub mod config;
pub mod dispatch;
pub mod state;
