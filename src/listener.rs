//! Listener-process side of the notification channel.
//!
//! The listener process isolates two native constraints from the caller: the
//! notification-center delegate can only be registered once per process, and
//! observing interactions requires a blocking event loop. [`serve`] runs the
//! whole listener side: a forwarding thread pulls [`ListenerRequest`] JSON
//! lines from stdin and dispatches them to the backend, while the main
//! thread runs the backend's event loop with a sink that writes each
//! [`ActivationEvent`] back to stdout as a JSON line.
//!
//! The listener has no graceful-shutdown path (the native event loop exposes
//! no cancellation hook); the manager terminates it by killing the process.
//! As an orphan guard the process also exits once its stdin reaches
//! end-of-stream, which happens when the caller closes the channel or dies.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Arc, Mutex};

use crate::backend::{ActivationSink, DesktopBackend, NotificationBackend};
use crate::protocol::{ActivationEvent, ListenerRequest};

/// Environment variable marking a process as a spawned listener.
pub const LISTENER_ENV: &str = "NOTIFY_RELAY_LISTENER";

/// Listener-mode guard for host binaries.
///
/// Call this first thing in `main`. If the process was spawned as a listener
/// (the [`LISTENER_ENV`] variable is set), it takes over the process, serves
/// notifications until killed, and never returns. Otherwise it is a no-op.
pub fn run_if_listener() {
    if std::env::var_os(LISTENER_ENV).is_none() {
        return;
    }
    serve(DesktopBackend::new());
    std::process::exit(0);
}

/// Run the listener side on the process's stdin/stdout with the given
/// backend. Blocks for the lifetime of the process.
pub fn serve<B: NotificationBackend>(backend: B) {
    let backend = Arc::new(backend);
    let forwarder = Arc::clone(&backend);
    std::thread::spawn(move || {
        forward_requests(forwarder.as_ref(), BufReader::new(io::stdin()));
        // Stdin EOF means the caller closed the channel or is gone; the
        // event loop cannot be interrupted, so exit the whole process.
        std::process::exit(0);
    });
    backend.run_event_loop(activation_sink(io::stdout()));
}

/// Pull [`ListenerRequest`]s off `input` and dispatch them to the backend
/// until end-of-stream. EOF is the expected shutdown signal, not an error;
/// malformed lines are logged and skipped.
pub fn forward_requests<B: NotificationBackend + ?Sized>(backend: &B, input: impl BufRead) {
    for line in input.lines() {
        match line {
            Ok(text) => {
                if text.is_empty() {
                    continue;
                }
                match serde_json::from_str::<ListenerRequest>(&text) {
                    Ok(ListenerRequest::Display { config }) => {
                        log::debug!("displaying notification {}", config.uid);
                        if let Err(e) = backend.display(&config) {
                            log::warn!("failed to display notification {}: {}", config.uid, e);
                        }
                    }
                    Ok(ListenerRequest::Cancel { uid }) => {
                        log::debug!("cancelling notification {uid}");
                        backend.cancel(&uid);
                    }
                    Err(e) => {
                        log::warn!("failed to parse listener request: {}: {:?}", e, text);
                    }
                }
            }
            Err(e) => {
                log::debug!("request channel read error: {e}");
                break;
            }
        }
    }
    log::debug!("request channel closed");
}

/// Build an [`ActivationSink`] that serializes each event as a JSON line on
/// `output`, flushing after every write. Write failures are logged; by the
/// time they can occur the caller is already tearing the channel down.
pub fn activation_sink<W: Write + Send + 'static>(output: W) -> ActivationSink {
    let output = Mutex::new(output);
    Arc::new(move |event: ActivationEvent| {
        let mut out = output.lock().unwrap_or_else(|e| {
            log::warn!("activation channel mutex poisoned, recovering");
            e.into_inner()
        });
        match serde_json::to_string(&event) {
            Ok(json) => {
                if writeln!(out, "{json}").and_then(|_| out.flush()).is_err() {
                    log::debug!("failed to write activation event; channel closed");
                }
            }
            Err(e) => log::warn!("failed to serialize activation event: {e}"),
        }
    })
}
