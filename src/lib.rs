//! Dockhand library exports for testing

pub mod command;
pub mod core;
pub mod process;
pub mod tui;

#[cfg(test)]
pub mod test_support;
