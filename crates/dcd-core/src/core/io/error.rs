use std::io;
use thiserror::Error;

/// Errors produced while encoding, decoding, or writing DCD trajectories.
///
/// The variants mirror the four failure classes of the codec: misuse of the
/// writer's lifecycle, frames that do not fit the trajectory, structurally
/// invalid bytes, and failures of the underlying stream.
#[derive(Debug, Error)]
pub enum DcdError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid writer state: {0}")]
    State(StateErrorKind),
    #[error("Inconsistent frame: {0}")]
    Consistency(ConsistencyErrorKind),
    #[error("Malformed DCD data: {0}")]
    Format(FormatErrorKind),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateErrorKind {
    #[error("header already written")]
    HeaderAlreadyWritten,
    #[error("header must be written at the start of the stream (position is {position})")]
    HeaderNotAtStart { position: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsistencyErrorKind {
    #[error("frame has {actual} atoms but the trajectory has {expected}")]
    AtomCountMismatch { expected: u32, actual: usize },
    #[error("periodic box data was requested for the trajectory but the frame is missing it")]
    MissingPeriodicBox,
    #[error("frame contains no atoms")]
    EmptyFrame,
    #[error("frame has {0} atoms, more than a DCD atom count can hold")]
    TooManyAtoms(usize),
    #[error("trajectory already holds {0} frames, the most a DCD frame count can hold")]
    TooManyFrames(u64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatErrorKind {
    #[error("record length fields disagree (leading {leading}, trailing {trailing})")]
    RecordLengthMismatch { leading: u32, trailing: u32 },
    #[error("stream ended in the middle of a record")]
    TruncatedRecord,
    #[error("bad magic tag {found:?} (expected \"CORD\")")]
    BadMagic { found: [u8; 4] },
    #[error("{record} record is {actual} bytes, expected {expected}")]
    UnexpectedRecordLength {
        record: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("title record of {length} bytes does not hold whole 80-byte titles")]
    InvalidTitleBlock { length: usize },
    #[error("title record declares {declared} titles but holds {actual}")]
    TitleCountMismatch { declared: u32, actual: usize },
    #[error("stream is {length} bytes, shorter than the minimum header size of {minimum}")]
    FileTooShort { length: u64, minimum: u64 },
    #[error("{trailing} trailing bytes do not form a whole frame of {frame_size} bytes")]
    PartialFrame { trailing: u64, frame_size: u64 },
    #[error("frame index {index} is out of range ({count} frames)")]
    FrameOutOfRange { index: u64, count: u64 },
}

impl DcdError {
    /// Maps an unexpected end of stream onto a truncated-record format error.
    ///
    /// Every other I/O failure is passed through untouched.
    pub(crate) fn from_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DcdError::Format(FormatErrorKind::TruncatedRecord)
        } else {
            DcdError::Io(err)
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, DcdError::Format(_))
    }

    pub fn is_consistency(&self) -> bool {
        matches!(self, DcdError::Consistency(_))
    }

    pub fn is_state(&self) -> bool {
        matches!(self, DcdError::State(_))
    }
}
