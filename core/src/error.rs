//! file: core/src/error.rs
//! description: error reporting for the lowering pass.
//!
//! Only one condition is recoverable: running out of memory while growing
//! the target IR. Everything else is an internal invariant violation and
//! goes through [`ice!`], which logs and aborts.

use std::fmt;

use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_str = match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        write!(f, "{}", level_str)
    }
}

pub trait GlintErrorExt {
    fn level(&self) -> Level;
    fn message(&self) -> String;
    fn issuer(&self) -> String;
    fn location(&self) -> Option<Location>;
}

impl fmt::Debug for dyn GlintErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc_str = match self.location() {
            Some(loc) => loc.to_string(),
            None => "unknown".to_string(),
        };
        write!(
            f,
            "GLINT | {} | {} | {} | {}",
            self.level(),
            loc_str,
            self.issuer(),
            self.message()
        )
    }
}

impl fmt::Display for dyn GlintErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowerErrorKind {
    /// Growing one of the target IR arenas failed.
    OutOfMemory { what: &'static str },
}

#[derive(Debug, Clone)]
pub struct LowerError {
    kind: LowerErrorKind,
    level: Level,
    issuer: String,
    location: Option<Location>,
}

impl LowerError {
    pub fn out_of_memory(what: &'static str) -> Self {
        LowerError {
            kind: LowerErrorKind::OutOfMemory { what },
            level: Level::Critical,
            issuer: "glint::lower".to_string(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn kind(&self) -> &LowerErrorKind {
        &self.kind
    }

    pub fn is_out_of_memory(&self) -> bool {
        matches!(self.kind, LowerErrorKind::OutOfMemory { .. })
    }
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} (at {})", self.message(), loc),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for LowerError {}

impl GlintErrorExt for LowerError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        match &self.kind {
            LowerErrorKind::OutOfMemory { what } => {
                format!("out of memory while growing {}", what)
            }
        }
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}

/// Push onto an IR arena, reporting allocation failure instead of aborting.
pub(crate) fn try_push<T>(
    items: &mut Vec<T>,
    item: T,
    what: &'static str,
) -> Result<usize, LowerError> {
    items
        .try_reserve(1)
        .map_err(|_| LowerError::out_of_memory(what))?;
    let idx = items.len();
    items.push(item);
    Ok(idx)
}

/// Abort the pass on a violated internal invariant.
///
/// Input reaching the lowering pass has already been validated, so any of
/// these firing means a bug upstream or in the pass itself.
#[macro_export]
macro_rules! ice {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        log::error!("internal compiler error: {}", msg);
        panic!("internal compiler error: {}", msg)
    }};
}
