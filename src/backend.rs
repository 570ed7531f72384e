//! Native notification backend boundary.
//!
//! [`NotificationBackend`] is the seam between the coordination core and the
//! platform notification surface. Exactly one backend instance lives inside
//! the listener process; its event loop may be run on one thread only, for
//! the lifetime of that process.
//!
//! [`DesktopBackend`] is the stock implementation. Platform differences live
//! only here:
//! - **macOS**: `osascript` AppleScript `display notification` command.
//!   Display-only; AppleScript exposes no activation feedback, so clicks are
//!   not observed on this path.
//! - **Other Unix**: the `notify_rust` crate with notification actions. A
//!   waiter thread per displayed notification forwards the chosen action as
//!   an [`ActivationEvent`].
//! - **Windows**: `notify_rust` display without action feedback.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Error;
use crate::protocol::{ActivationEvent, NotificationConfig};

/// Shared sink the backend pushes activation events into.
///
/// Inside the listener process this writes the event to the channel back to
/// the caller; tests substitute an in-memory collector.
pub type ActivationSink = Arc<dyn Fn(ActivationEvent) + Send + Sync>;

/// The native platform surface used to display notifications and observe
/// activations. All methods take `&self`; the listener process shares one
/// instance between its request-forwarding thread and its event-loop thread.
pub trait NotificationBackend: Send + Sync + 'static {
    /// Create and schedule a native notification.
    ///
    /// Delivery is not guaranteed to be synchronous: `config.delay_secs`
    /// may schedule it for a future time.
    fn display(&self, config: &NotificationConfig) -> Result<(), Error>;

    /// Withdraw a previously displayed, still-pending notification.
    /// No-op if it was already dismissed or expired.
    fn cancel(&self, uid: &str);

    /// Block indefinitely, invoking `on_activation` for every user
    /// interaction that is not a plain dismiss.
    ///
    /// Must run on exactly one thread within the listener process for the
    /// process's lifetime; the underlying notification-center delegate can
    /// only be registered once per process.
    fn run_event_loop(&self, on_activation: ActivationSink);
}

/// Identifier of the main action button when mapped to a platform action.
#[cfg(all(unix, not(target_os = "macos")))]
const ACTION_ID: &str = "action";
/// Identifier of the secondary (snooze) button.
#[cfg(all(unix, not(target_os = "macos")))]
const SNOOZE_ID: &str = "snooze";
/// Well-known action identifier servers use for inline reply fields.
#[cfg(all(unix, not(target_os = "macos")))]
const REPLY_ID: &str = "inline-reply";

/// Escape a string for safe embedding inside an AppleScript double-quoted string.
///
/// AppleScript requires that backslashes, double-quotes, and newlines are escaped.
/// The order of replacements matters: backslashes must be escaped *first* so that
/// the subsequent replacements do not accidentally double-escape them.
#[cfg(target_os = "macos")]
pub fn escape_for_applescript(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Stock desktop notification backend. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct DesktopBackend {
    inner: Arc<BackendState>,
}

#[derive(Default)]
struct BackendState {
    /// Uids cancelled before or while their notification was pending.
    /// Activations for these uids are suppressed.
    cancelled: Mutex<HashSet<String>>,
    /// Sink installed by [`NotificationBackend::run_event_loop`]; waiter
    /// threads clone it to forward activations.
    sink: Mutex<Option<ActivationSink>>,
    /// Handles for buttonless notifications so `cancel` can close them.
    #[cfg(all(unix, not(target_os = "macos")))]
    handles: Mutex<std::collections::HashMap<String, notify_rust::NotificationHandle>>,
}

impl DesktopBackend {
    /// Create a backend with no event sink installed yet. Activations that
    /// occur before the event loop starts are dropped.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackendState {
    fn cancelled(&self) -> MutexGuard<'_, HashSet<String>> {
        self.cancelled.lock().unwrap_or_else(|e| {
            log::warn!("cancelled-set mutex poisoned, recovering");
            e.into_inner()
        })
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn current_sink(&self) -> Option<ActivationSink> {
        self.sink
            .lock()
            .unwrap_or_else(|e| {
                log::warn!("sink mutex poisoned, recovering");
                e.into_inner()
            })
            .clone()
    }

    /// Display immediately, without honoring `delay_secs`. Called either
    /// inline or from the timer thread once the delay has elapsed.
    fn display_now(self: &Arc<Self>, config: &NotificationConfig) {
        if self.cancelled().contains(&config.uid) {
            log::debug!("not displaying cancelled notification {}", config.uid);
            return;
        }

        #[cfg(target_os = "macos")]
        {
            let escaped_title = escape_for_applescript(&config.title);
            let escaped_message =
                escape_for_applescript(config.text.as_deref().unwrap_or_default());
            let mut script = format!(
                r#"display notification "{}" with title "{}""#,
                escaped_message, escaped_title,
            );
            if let Some(subtitle) = &config.subtitle {
                script.push_str(&format!(
                    r#" subtitle "{}""#,
                    escape_for_applescript(subtitle)
                ));
            }
            if let Err(e) = std::process::Command::new("osascript")
                .arg("-e")
                .arg(&script)
                .output()
            {
                log::warn!("failed to send macOS desktop notification: {}", e);
            } else {
                log::debug!("delivered notification {}", config.uid);
            }
        }

        #[cfg(not(target_os = "macos"))]
        {
            use notify_rust::Notification;

            let mut notification = Notification::new();
            notification.summary(&config.title);
            // Servers without a subtitle concept get it folded into the body.
            let body = match (&config.subtitle, &config.text) {
                (Some(subtitle), Some(text)) => format!("{subtitle}\n{text}"),
                (Some(subtitle), None) => subtitle.clone(),
                (None, Some(text)) => text.clone(),
                (None, None) => String::new(),
            };
            notification.body(&body);
            if let Some(icon) = &config.icon {
                notification.icon(&icon.to_string_lossy());
            }

            #[cfg(unix)]
            {
                let has_buttons = config.action_button.is_some()
                    || config.snooze_button.is_some()
                    || config.reply_button.is_some();
                if let Some(label) = &config.action_button {
                    notification.action(ACTION_ID, label);
                }
                if let Some(label) = &config.snooze_button {
                    notification.action(SNOOZE_ID, label);
                }
                if let Some(label) = &config.reply_button {
                    notification.action(REPLY_ID, label);
                }
                if has_buttons {
                    // Keep interactive notifications up until acted upon.
                    notification.timeout(notify_rust::Timeout::Never);
                }

                match notification.show() {
                    Ok(handle) => {
                        log::debug!("delivered notification {}", config.uid);
                        if has_buttons {
                            let state = Arc::clone(self);
                            let uid = config.uid.clone();
                            std::thread::spawn(move || state.wait_for_action(uid, handle));
                        } else {
                            self.handles
                                .lock()
                                .unwrap_or_else(|e| {
                                    log::warn!("handle-map mutex poisoned, recovering");
                                    e.into_inner()
                                })
                                .insert(config.uid.clone(), handle);
                        }
                    }
                    Err(e) => log::warn!("failed to send desktop notification: {}", e),
                }
            }

            #[cfg(not(unix))]
            {
                if let Err(e) = notification.show() {
                    log::warn!("failed to send desktop notification: {}", e);
                } else {
                    log::debug!("delivered notification {}", config.uid);
                }
            }
        }
    }

    /// Block on a notification handle until the user picks an action, then
    /// forward the matching activation event. Runs on its own thread, one
    /// per interactive notification.
    #[cfg(all(unix, not(target_os = "macos")))]
    fn wait_for_action(self: Arc<Self>, uid: String, handle: notify_rust::NotificationHandle) {
        use crate::protocol::ActivationKind;

        let mut chosen = None;
        handle.wait_for_action(|action| chosen = Some(action.to_string()));
        let Some(action) = chosen else { return };

        if self.cancelled().contains(&uid) {
            log::debug!("suppressing activation for cancelled notification {uid}");
            return;
        }
        let event = match action.as_str() {
            ACTION_ID => ActivationEvent {
                uid,
                kind: ActivationKind::ActionButtonClicked,
                reply_text: None,
            },
            // notify_rust reports the chosen action but cannot deliver typed
            // reply text; the wire format still carries it for backends that can.
            REPLY_ID => ActivationEvent {
                uid,
                kind: ActivationKind::ReplyButtonClicked,
                reply_text: Some(String::new()),
            },
            // Snooze, plain dismiss ("__closed"), or server-specific extras
            // are not reported to the caller.
            _ => return,
        };
        match self.current_sink() {
            Some(sink) => sink(event),
            None => log::debug!("dropping activation received before event loop start"),
        }
    }
}

impl NotificationBackend for DesktopBackend {
    fn display(&self, config: &NotificationConfig) -> Result<(), Error> {
        if config.uid.is_empty() {
            return Err(Error::Backend("notification has no uid".into()));
        }
        if config.delay_secs > 0.0 {
            let state = Arc::clone(&self.inner);
            let config = config.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs_f64(config.delay_secs));
                state.display_now(&config);
            });
        } else {
            self.inner.display_now(config);
        }
        Ok(())
    }

    fn cancel(&self, uid: &str) {
        self.inner.cancelled().insert(uid.to_string());
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let handle = self
                .inner
                .handles
                .lock()
                .unwrap_or_else(|e| {
                    log::warn!("handle-map mutex poisoned, recovering");
                    e.into_inner()
                })
                .remove(uid);
            if let Some(handle) = handle {
                handle.close();
            }
        }
    }

    fn run_event_loop(&self, on_activation: ActivationSink) {
        *self.inner.sink.lock().unwrap_or_else(|e| {
            log::warn!("sink mutex poisoned, recovering");
            e.into_inner()
        }) = Some(on_activation);
        log::debug!("started listening for user interactions with notifications");
        // Interactions are forwarded by per-notification waiter threads;
        // this thread just has to stay alive and blocked.
        loop {
            std::thread::park();
        }
    }
}
