use std::fmt;

/// Lifecycle of one stream slot. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamPhase {
    Empty,
    Configured,
    Opened,
    Writing,
    Finished,
    Freed,
}

impl StreamPhase {
    /// Whether the slot no longer blocks `finish_output`.
    pub fn is_finalized(self) -> bool {
        matches!(self, StreamPhase::Empty | StreamPhase::Finished | StreamPhase::Freed)
    }
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamPhase::Empty => "empty",
            StreamPhase::Configured => "configured",
            StreamPhase::Opened => "opened",
            StreamPhase::Writing => "writing",
            StreamPhase::Finished => "finished",
            StreamPhase::Freed => "freed",
        };
        f.write_str(name)
    }
}
