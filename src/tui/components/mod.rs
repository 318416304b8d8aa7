//! # TUI Components
//!
//! This module contains all UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! Components follow the persistent state + transient wrapper pattern:
//! a `XxxState` struct lives in `TuiState` across frames, and a lightweight
//! `Xxx<'a>` wrapper is created each frame, borrowing the state plus
//! whatever external data it renders ("props").
//!
//! - `LogView`: scrollable viewport over the session log, with
//!   stick-to-bottom follow mode
//! - `StackSelector`: centered overlay for picking the compose stack
//!
//! ## Co-location of Concerns
//!
//! Each component file contains everything related to that component:
//! state types, event types, rendering logic, event handling, and tests.
//! You can read one file to understand how a component works, rather than
//! jumping between multiple files.
//!
//! Components receive external data as props (function parameters), not by
//! reaching into session state directly. This keeps dependencies explicit
//! and components testable against a `TestBackend`.

pub mod log_view;
pub mod stack_selector;

pub use log_view::{LogView, LogViewState};
pub use stack_selector::{StackSelector, StackSelectorEvent, StackSelectorState};
