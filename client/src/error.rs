//! Error taxonomy for the client.
//!
//! Transport- and decode-level failures are contained within the worker
//! that hit them; the only error an editor-event caller ever sees is a
//! failed launch. Stale tokens and routing failures are classifications
//! handled inside the dispatch loop, not `Error` values.

use std::io;

/// Errors surfaced by the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server subprocess could not be started. Fatal to the client;
    /// reported once, never retried.
    #[error("failed to launch analysis server `{command}`")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The configured executable is a bare name and was not found on `PATH`.
    #[error("`{command}` not found in PATH")]
    ExecutableNotFound { command: String },

    /// A write was attempted after the server's input stream was closed.
    #[error("transport closed")]
    TransportClosed,

    /// The server emitted a line that is not valid JSON.
    #[error("malformed server message")]
    Decode(#[source] serde_json::Error),

    /// The server emitted a line larger than the frame limit.
    #[error("server line of {len} bytes exceeds the frame limit")]
    OversizedLine { len: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}
