//! Callback drain thread.
//!
//! Bridges asynchronous cross-process activation events into synchronous
//! in-process callback execution. The drain thread reads
//! [`ActivationEvent`] JSON lines from the listener's stdout and resolves
//! each against the registry via [`dispatch_activation`]. End-of-stream is
//! the expected shutdown signal (the manager kills the listener, which
//! closes the pipe), not an error.
//!
//! Error policy, deliberately asymmetric:
//! - an event for an unknown uid (already handled, cancelled, or evicted)
//!   is logged at debug level and dropped;
//! - an event for a *known* uid whose matching callback was never attached
//!   is a caller contract violation and panics the drain thread, as does an
//!   event kind outside the known set. Both indicate unrecoverable
//!   inconsistency and are allowed to surface as thread-level failures.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::protocol::{ActivationEvent, ActivationKind};
use crate::registry::NotificationRegistry;

/// Spawn the drain thread over the listener's stdout.
///
/// The thread exits when the stream ends or becomes unreadable.
pub fn spawn(
    stream: impl Read + Send + 'static,
    registry: Arc<NotificationRegistry>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ActivationEvent>(&text) {
                        Ok(event) => dispatch_activation(&registry, event),
                        Err(e) => {
                            log::warn!("failed to parse activation event: {}: {:?}", e, text);
                        }
                    }
                }
                Err(e) => {
                    log::debug!("activation channel read error: {e}");
                    break;
                }
            }
        }
        log::debug!("activation channel closed; drain thread exiting");
    })
}

/// Resolve a single activation event against the registry, invoking the
/// matching callback.
///
/// Callbacks run outside the registry lock, so they may send further
/// notifications or cancel pending ones. Shutting the manager down from a
/// callback is also safe: close detects it is running on the drain thread
/// and skips joining it. After invocation the uid is unconditionally removed
/// from the registry, making duplicate deliveries of the same event no-ops.
///
/// # Panics
/// Panics on a caller contract violation (a button was shown without a
/// handler) or a protocol violation (unknown event kind). See the module
/// docs for why these are fatal rather than ignored.
pub fn dispatch_activation(registry: &NotificationRegistry, event: ActivationEvent) {
    if !registry.contains(&event.uid) {
        log::debug!(
            "received an interaction for notification {} which we don't know",
            event.uid
        );
        return;
    }

    match event.kind {
        ActivationKind::ActionButtonClicked => {
            let Some(pending) = registry.take(&event.uid) else {
                return;
            };
            log::debug!("executing action callback for notification {}", pending.title);
            match pending.on_action {
                Some(callback) => callback(),
                None => {
                    log::error!(
                        "action button pressed for notification {} without a callback",
                        event.uid
                    );
                    panic!(
                        "action button pressed without callback: {} ({})",
                        event.uid, pending.title
                    );
                }
            }
        }
        ActivationKind::ReplyButtonClicked => {
            let Some(pending) = registry.take(&event.uid) else {
                return;
            };
            let reply_text = event.reply_text.clone().unwrap_or_default();
            log::debug!(
                "executing reply callback for notification {}, {:?}",
                pending.title,
                reply_text
            );
            match pending.on_reply {
                Some(callback) => callback(reply_text),
                None => {
                    log::error!(
                        "reply button pressed for notification {} without a callback",
                        event.uid
                    );
                    panic!(
                        "reply button pressed without callback: {} ({})",
                        event.uid, pending.title
                    );
                }
            }
        }
        ActivationKind::Other(ref kind) => {
            log::error!("unknown activation kind {kind:?} for notification {}", event.uid);
            panic!("unknown activation kind: {kind:?}");
        }
    }

    registry.remove(&event.uid);
}
