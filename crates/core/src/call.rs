//! Call identity and lifecycle states

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque call identifier.
///
/// Minted monotonically by the call manager and never reused within the
/// lifetime of a manager instance. Rendered as `call-{n}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CallId(u64);

impl CallId {
    /// Create a call ID from its numeric sequence value
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Numeric sequence value
    pub fn seq(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call-{}", self.0)
    }
}

/// Error parsing a call ID from its string form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid call id: {0:?}")]
pub struct ParseCallIdError(pub String);

impl FromStr for CallId {
    type Err = ParseCallIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seq = s
            .strip_prefix("call-")
            .and_then(|n| n.parse::<u64>().ok())
            .ok_or_else(|| ParseCallIdError(s.to_string()))?;
        Ok(Self(seq))
    }
}

impl From<CallId> for String {
    fn from(id: CallId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for CallId {
    type Error = ParseCallIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Lifecycle state of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Created and dialed, waiting for the media stream to bind
    PendingStream,
    /// Stream bound, no turn in progress
    Active,
    /// Agent utterance being streamed to the caller
    Speaking,
    /// Accumulating caller audio until end of utterance
    Listening,
    /// Terminal state
    Ended,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::PendingStream => "pending_stream",
            CallState::Active => "active",
            CallState::Speaking => "speaking",
            CallState::Listening => "listening",
            CallState::Ended => "ended",
        };
        f.write_str(name)
    }
}
