use std::fmt;

use crate::shared::constants::MAX_STREAMS;
use crate::shared::error::{Result, WriterError};

/// A validated stream slot index in `0..MAX_STREAMS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(usize);

impl Slot {
    pub fn new(index: usize) -> Result<Self> {
        if index >= MAX_STREAMS {
            return Err(WriterError::SlotOutOfRange {
                slot: index,
                max: MAX_STREAMS,
            });
        }
        Ok(Self(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..MAX_STREAMS).map(Slot)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
