//! Error types for the dump codec.
//!
//! Every failure is fatal for the call that produced it; the codec never
//! skips a bad record or resynchronises. Each variant carries the offending
//! token, version, or name so callers can report what broke.

use thiserror::Error;

/// Errors produced by the dump writer and reader.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The stream header declares a format version this codec does not speak.
    #[error("unsupported dump format version `{0}`")]
    UnsupportedVersion(String),

    /// A record carried a command token that is either unrecognised or not
    /// valid in the reader's current state.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    /// A metadata reference named a key, or a metadata entry on that key,
    /// that has not been materialised yet. Indicates a corrupt or
    /// hand-altered stream.
    #[error("dangling metadata reference: key `{key}`, metadata `{meta}`")]
    DanglingReference { key: String, meta: String },

    /// The stream ended before an expected fixed-length payload or record
    /// was complete.
    #[error("stream truncated while reading {context}")]
    Truncated { context: String },

    /// A record violated the framing rules: a length field that is not a
    /// decimal integer, or a payload not followed by its terminator.
    #[error("malformed `{command}` record: {detail}")]
    Malformed { command: String, detail: String },

    /// The underlying byte source or sink failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for dump codec operations.
pub type Result<T> = std::result::Result<T, DumpError>;
