//! Error taxonomy for motion analysis.
//!
//! Three failure kinds are distinguishable from a successful zero-motion run:
//! - `InputUnreadable`: the source could not be opened. Fatal, no partial result.
//! - `DecodeInterrupted`: the source opened but failed partway. Carries the statistics
//!   accumulated before the failure so a caller may opt into degraded output.
//! - `ConfigInvalid`: rejected when the detector is constructed, never at run time.

use thiserror::Error;

use crate::detect::AnalysisResult;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open video input '{path}': {reason}")]
    InputUnreadable { path: String, reason: String },

    #[error("decode failed at frame {frame_index}: {reason}")]
    DecodeInterrupted {
        frame_index: u64,
        reason: String,
        partial: Box<AnalysisResult>,
    },

    #[error("invalid detector configuration: {0}")]
    ConfigInvalid(String),
}

impl Error {
    pub(crate) fn unreadable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::InputUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Statistics gathered before a mid-stream decode failure.
    ///
    /// Returns `None` for every other error kind. Callers that accept degraded
    /// output use this; the detector itself never substitutes it for a result.
    pub fn partial_result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::DecodeInterrupted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
