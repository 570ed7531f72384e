//! Typed error variants for the notify-relay crate.
//!
//! These cover the caller-facing failure modes: spawning the listener
//! process, serializing channel messages, and writing to a channel that the
//! other side may have closed. Failures inside the drain thread are not
//! represented here; per the crate's error policy they are either logged and
//! dropped (unknown identifiers) or surfaced as drain-thread panics
//! (contract/protocol violations).

use thiserror::Error;

/// Errors produced by [`NotificationManager`](crate::NotificationManager)
/// and [`ListenerProcess`](crate::process::ListenerProcess) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The listener process could not be spawned.
    #[error("failed to spawn listener process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The listener process was spawned but a stdio pipe was unavailable.
    #[error("failed to capture listener {0} pipe")]
    Pipe(&'static str),

    /// A channel message could not be serialized to JSON.
    #[error("failed to serialize channel message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The request channel to the listener process is already closed.
    #[error("listener channel is closed")]
    ChannelClosed,

    /// Writing a request to the listener process failed.
    #[error("failed to write to listener channel: {0}")]
    ChannelWrite(#[source] std::io::Error),

    /// The notification backend rejected a display request.
    #[error("notification backend error: {0}")]
    Backend(String),
}
