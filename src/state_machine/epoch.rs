use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of "the current reason for acting".
///
/// Starts at zero and only ever moves forward, one step per state
/// transition. Anything that suspends captures the epoch it started under
/// and compares it against the live value when it resumes; a mismatch means
/// the premise is stale.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
    pub const ZERO: Epoch = Epoch(0);

    pub fn value(self) -> u64 {
        self.0
    }

    /// The epoch that follows this one.
    pub(crate) fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }
}

impl From<u64> for Epoch {
    fn from(value: u64) -> Self {
        Epoch(value)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}
