//! Client for a long-lived source-analysis server speaking
//! newline-delimited JSON over stdio.
//!
//! The embedding editor layer starts an [`AnalysisClient`], feeds it
//! document events, and consumes [`AnalysisEvent`]s for diagnostics,
//! navigation, completions, search results, and status text.

pub mod codec;
pub mod error;
pub mod protocol;

pub(crate) mod classify;
pub(crate) mod registry;
pub(crate) mod roots;
pub(crate) mod transport;

mod client;
mod events;

pub use client::AnalysisClient;
pub use error::Error;
pub use events::{AnalysisEvent, StopReason};
pub use protocol::ContentChange;
pub use registry::ViewContext;
