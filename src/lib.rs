//! Desktop notifications with interaction callbacks, relayed through a
//! dedicated listener process.
//!
//! Native notification APIs come with two awkward constraints: the delivery
//! object can only be instantiated once per process, and observing user
//! interactions requires a blocking, exclusive event loop. This crate
//! reconciles both with a normal, non-blocking, multi-notification
//! application by confining the native surface to a listener subprocess and
//! relaying everything over a JSON-lines channel:
//!
//! - the **listener process** owns the only backend instance and its
//!   blocking event loop ([`listener`]);
//! - a **drain thread** in the caller's process turns incoming interaction
//!   events into callback invocations ([`drain`]);
//! - a bounded FIFO **registry** tracks in-flight notifications awaiting a
//!   callback ([`registry`]);
//! - the [`NotificationManager`] orchestrates the lifecycle: lazy start on
//!   first send, fire-and-forget cancellation, idempotent shutdown.
//!
//! # Usage
//!
//! Because the listener is the current binary re-executed in listener mode,
//! hand it control at the top of `main`:
//!
//! ```no_run
//! use notify_relay::{Notification, NotificationManager};
//!
//! fn main() -> Result<(), notify_relay::Error> {
//!     // Takes over (and never returns) only in the listener child.
//!     notify_relay::listener::run_if_listener();
//!
//!     let manager = NotificationManager::new();
//!     let handle = manager.send(
//!         Notification::new("Build finished")
//!             .text("All 42 tests passed")
//!             .action_button("Open logs", || println!("opening logs"))
//!             .reply_button("Comment", "Type a comment...", |text| {
//!                 println!("comment: {text}");
//!             }),
//!     )?;
//!
//!     // ... later, if the notification is no longer relevant:
//!     handle.cancel();
//!
//!     // Dropping the manager tears the listener process down; an explicit
//!     // call works too and is safe to repeat.
//!     manager.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! Notifications without callbacks are pure fire-and-forget: they are
//! displayed but never tracked. The count of active notifications is
//! best-effort only; interactions the user performs natively (snoozing,
//! dismissing) are invisible to this crate.

pub mod backend;
pub mod drain;
pub mod error;
pub mod listener;
pub mod process;
pub mod protocol;
pub mod registry;

mod manager;

pub use backend::{DesktopBackend, NotificationBackend};
pub use error::Error;
pub use manager::{Notification, NotificationHandle, NotificationManager};
pub use protocol::{ActivationEvent, ActivationKind, ListenerRequest, NotificationConfig};
pub use registry::NotificationRegistry;
