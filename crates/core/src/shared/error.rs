use std::path::PathBuf;

use thiserror::Error;

use crate::codec::domain::codec_handle::MediaKind;
use crate::stream::stream_phase::StreamPhase;

/// Failure reported by a codec, container or conversion backend.
///
/// Backends speak in library terms; the writer wraps these into a
/// [`WriterError`] that names the stream or step that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("codec not found: {name}")]
    CodecNotFound { name: String },
    #[error("no {kind} codec has been resolved")]
    CodecUnavailable { kind: MediaKind },
    #[error("invalid stream parameters: {0}")]
    InvalidParameters(String),
    #[error("slot {slot} is out of range (max {max})")]
    SlotOutOfRange { slot: usize, max: usize },
    #[error("stream {slot} is already opened")]
    AlreadyOpened { slot: usize },
    #[error("stream {slot} is not configured")]
    NotConfigured { slot: usize },
    #[error("stream {slot} is {phase}, expected {expected}")]
    InvalidPhase {
        slot: usize,
        phase: StreamPhase,
        expected: StreamPhase,
    },
    #[error("stream {slot} is not a {expected} stream")]
    MediaKindMismatch { slot: usize, expected: MediaKind },
    #[error("failed to open encoder for stream {slot}: {source}")]
    EncoderOpenFailed {
        slot: usize,
        #[source]
        source: BackendError,
    },
    #[error("output cannot start: {reason}")]
    IncompleteConfiguration { reason: String },
    #[error("failed to open output file {path}: {source}")]
    FileOpenFailed {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("an output file is already open")]
    OutputAlreadyOpen,
    #[error("no output file is open")]
    NoOutputFile,
    #[error("the container header has already been written")]
    HeaderAlreadyWritten,
    #[error("the container header has not been written")]
    HeaderNotWritten,
    #[error("failed to write container header: {0}")]
    HeaderWriteFailed(#[source] BackendError),
    #[error("invalid sample buffer: {0}")]
    InvalidSampleBuffer(String),
    #[error("failed to build audio converter for stream {slot}: {source}")]
    ConverterBuildFailed {
        slot: usize,
        #[source]
        source: BackendError,
    },
    #[error("audio conversion failed on stream {slot}: {source}")]
    ConversionFailed {
        slot: usize,
        #[source]
        source: BackendError,
    },
    #[error("encoding failed on stream {slot}: {source}")]
    EncodeFailed {
        slot: usize,
        #[source]
        source: BackendError,
    },
    #[error("failed to write packet for container stream {stream}: {source}")]
    WriteFailed {
        stream: usize,
        #[source]
        source: BackendError,
    },
    #[error("failed to write container trailer: {0}")]
    TrailerWriteFailed(#[source] BackendError),
    #[error("stream {slot} stopped after an earlier failure")]
    StreamFaulted { slot: usize },
    #[error("output stopped after an earlier write failure")]
    OutputFaulted,
    #[error("stream {slot} is {phase}, every stream must be finished first")]
    IncompleteFinalization { slot: usize, phase: StreamPhase },
}

pub type Result<T> = std::result::Result<T, WriterError>;
