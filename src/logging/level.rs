//! Severities and the level filter
//!
//! Filtering is by set membership: a message is emitted only when logging is
//! enabled and its severity is in the active set. There is no threshold.

use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Dev,
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Every defined severity
    pub const ALL: [Severity; 4] = [
        Severity::Dev,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    /// Get the display name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Dev => "DEV",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Severity::Dev => 1,
            Severity::Info => 1 << 1,
            Severity::Warn => 1 << 2,
            Severity::Error => 1 << 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for tracing::Level {
    fn from(level: Severity) -> Self {
        match level {
            Severity::Dev => tracing::Level::DEBUG,
            Severity::Info => tracing::Level::INFO,
            Severity::Warn => tracing::Level::WARN,
            Severity::Error => tracing::Level::ERROR,
        }
    }
}

/// A level name that does not match any severity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("undefined log level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

/// Set of severities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelSet(u8);

impl LevelSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    pub fn insert(&mut self, level: Severity) {
        self.0 |= level.bit();
    }

    pub fn contains(&self, level: Severity) -> bool {
        self.0 & level.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Severities in the set, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = Severity> + '_ {
        Severity::ALL.into_iter().filter(|level| self.contains(*level))
    }
}

impl FromIterator<Severity> for LevelSet {
    fn from_iter<I: IntoIterator<Item = Severity>>(iter: I) -> Self {
        let mut set = LevelSet::empty();
        for level in iter {
            set.insert(level);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FilterState {
    enabled: bool,
    levels: LevelSet,
}

/// Enabled flag plus the active severity set
///
/// Starts disabled. All methods take `&self` so a single filter can be shared
/// between every thread that logs.
#[derive(Debug, Default)]
pub struct LevelFilter {
    state: RwLock<FilterState>,
}

impl LevelFilter {
    /// Create a disabled filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable logging
    ///
    /// Enabling selects every severity; disabling clears the set. Any earlier
    /// narrower selection is lost.
    pub fn set_enabled(&self, enabled: bool) {
        if let Ok(mut state) = self.state.write() {
            state.enabled = enabled;
            state.levels = if enabled {
                LevelSet::all()
            } else {
                LevelSet::empty()
            };
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().map(|s| s.enabled).unwrap_or(false)
    }

    /// Replace the active set. Ignored while disabled or when `levels` is empty.
    pub fn set_levels(&self, levels: &[Severity]) {
        if levels.is_empty() {
            return;
        }
        if let Ok(mut state) = self.state.write() {
            if state.enabled {
                state.levels = levels.iter().copied().collect();
            }
        }
    }

    /// Replace the active set from level names
    ///
    /// Same gating as [`set_levels`](Self::set_levels). Each name is parsed on
    /// its own; `on_reject` is called for every name that fails to parse and
    /// that name is left out. The lock is not held while `on_reject` runs, so
    /// the callback may log through this filter.
    pub fn set_levels_by_name<I, S, F>(&self, names: I, mut on_reject: F)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&ParseSeverityError),
    {
        let names: Vec<S> = names.into_iter().collect();
        if names.is_empty() || !self.is_enabled() {
            return;
        }

        let mut levels = LevelSet::empty();
        for name in &names {
            match name.as_ref().parse::<Severity>() {
                Ok(level) => levels.insert(level),
                Err(e) => on_reject(&e),
            }
        }

        if let Ok(mut state) = self.state.write() {
            if state.enabled {
                state.levels = levels;
            }
        }
    }

    /// Currently active severities
    pub fn levels(&self) -> LevelSet {
        self.state.read().map(|s| s.levels).unwrap_or_default()
    }

    /// Whether a message at `level` should be emitted
    pub fn is_allowed(&self, level: Severity) -> bool {
        self.state
            .read()
            .map(|s| s.enabled && !s.levels.is_empty() && s.levels.contains(level))
            .unwrap_or(false)
    }
}
