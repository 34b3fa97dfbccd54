use std::fmt;
use std::ops::Range;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure to recover a single stream object.
///
/// None of these abort a scan. The collector records them against the
/// offset of the stream marker that triggered them and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No balanced `<<`/`>>` pair could be resolved before the stream marker.
    #[error("malformed dictionary before offset {marker}: {problem} (searched {}..{})", .searched.start, .searched.end)]
    MalformedDictionary {
        marker: usize,
        problem: DictionaryProblem,
        searched: Range<usize>,
        /// Raw bytes of the searched window.
        window: Vec<u8>,
    },
    /// The dictionary was found but carries no usable `/Length` entry.
    #[error("dictionary has no usable /Length entry: {problem}")]
    MissingLength { problem: LengthProblem, dictionary: Vec<u8> },
    /// The bytes between the markers disagree with the declared length.
    #[error("declared length {declared} but found {actual} bytes before endstream")]
    LengthMismatch { declared: usize, actual: usize },
    /// No `endstream` keyword inside the forward window.
    #[error("no endstream between offsets {} and {}", .searched.start, .searched.end)]
    MissingStreamMarker { searched: Range<usize> },
}

impl Error {
    /// Short name of the error kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedDictionary { .. } => "MalformedDictionary",
            Error::MissingLength { .. } => "MissingLength",
            Error::LengthMismatch { .. } => "LengthMismatch",
            Error::MissingStreamMarker { .. } => "MissingStreamMarker",
        }
    }

    /// Raw bytes useful to a human looking at the failure, if any.
    pub fn excerpt(&self) -> Option<&[u8]> {
        match self {
            Error::MalformedDictionary { window, .. } => Some(window),
            Error::MissingLength { dictionary, .. } => Some(dictionary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryProblem {
    /// The lookback window ran out before the matching `<<`.
    WindowExhausted,
    /// A `<<` was reached before any `>>` at the same nesting level.
    OpenBeforeClose { at: usize },
}

impl fmt::Display for DictionaryProblem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DictionaryProblem::WindowExhausted => write!(f, "lookback window exhausted"),
            DictionaryProblem::OpenBeforeClose { at } => write!(f, "<< at offset {} has no matching >>", at),
        }
    }
}

impl std::error::Error for DictionaryProblem {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LengthProblem {
    #[error("no /Length key")]
    Absent,
    /// Indirect lengths are reported, never resolved.
    #[error("length is an indirect reference {0} {1} R")]
    Indirect(u32, u16),
    #[error("{0} /Length keys")]
    Ambiguous(usize),
    #[error("length value is not a non-negative integer")]
    NotANumber,
}
