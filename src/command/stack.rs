//! Compose stack profiles.
//!
//! A stack profile picks which override file is layered on top of the base
//! `docker-compose.yml`. The selection can come from CLI/env, from the
//! repository preference files, or interactively from the stack selector.

use std::fmt;
use std::fs;
use std::path::Path;

/// Preference files consulted by [`Stack::detect`], in priority order.
const PREFERENCE_FILES: [&str; 2] = [".dockhand-stack", ".dockhand-stack.last"];

/// A supported compose stack profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stack {
    #[default]
    Default,
    Arch,
    Alpine,
}

impl Stack {
    /// All supported profiles, in menu order.
    pub const OPTIONS: [Stack; 3] = [Stack::Default, Stack::Arch, Stack::Alpine];

    /// Parses a user-supplied profile name, trimming and lowercasing.
    /// Unknown or empty input maps to [`Stack::Default`].
    pub fn normalize(value: &str) -> Stack {
        match value.trim().to_lowercase().as_str() {
            "arch" => Stack::Arch,
            "alpine" => Stack::Alpine,
            _ => Stack::Default,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stack::Default => "default",
            Stack::Arch => "arch",
            Stack::Alpine => "alpine",
        }
    }

    /// Position within [`Stack::OPTIONS`], for cursor menus.
    pub fn index(self) -> usize {
        Self::OPTIONS.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// Extra compose arguments selecting this profile's override file.
    pub fn compose_args(self) -> Vec<String> {
        match self {
            Stack::Default => Vec::new(),
            Stack::Arch => vec!["-f".to_string(), "docker-compose.arch.yml".to_string()],
            Stack::Alpine => vec!["-f".to_string(), "docker-compose.alpine.yml".to_string()],
        }
    }

    /// Resolves the stack preference recorded in the repository, if any.
    ///
    /// Reads `.dockhand-stack` then `.dockhand-stack.last`; the first file
    /// with non-empty content wins. Returns `None` when neither yields a
    /// value so callers can fall through to other configuration sources.
    pub fn detect(repo_root: &Path) -> Option<Stack> {
        for name in PREFERENCE_FILES {
            let Ok(contents) = fs::read_to_string(repo_root.join(name)) else {
                continue;
            };
            if contents.trim().is_empty() {
                continue;
            }
            return Some(Stack::normalize(&contents));
        }
        None
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
