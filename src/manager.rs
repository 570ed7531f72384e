//! Notification lifecycle orchestration.
//!
//! [`NotificationManager`] is the caller-facing entry point. It lazily
//! starts the listener subprocess and the drain thread on the first
//! [`send`](NotificationManager::send) (starting a process is expensive),
//! tracks notifications with callbacks in a bounded registry, and tears
//! everything down on [`shutdown`](NotificationManager::shutdown) or drop.
//! No manager operation blocks: sends over the channel are fire-and-forget.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use uuid::Uuid;

use crate::drain;
use crate::error::Error;
use crate::process::ListenerProcess;
use crate::protocol::{ListenerRequest, NotificationConfig};
use crate::registry::{ActionCallback, NotificationRegistry, PendingNotification, ReplyCallback};

/// A notification to send, built up with chained setters.
///
/// The serializable content travels to the listener process; the callbacks
/// stay on the caller's side, tracked by the registry until the user
/// interacts with the notification (or the entry is evicted or cancelled).
///
/// # Example
/// ```
/// use notify_relay::Notification;
///
/// let notification = Notification::new("Build finished")
///     .subtitle("my-project")
///     .text("All 42 tests passed")
///     .action_button("Open logs", || println!("opening logs"));
/// ```
pub struct Notification {
    config: NotificationConfig,
    on_action: Option<ActionCallback>,
    on_reply: Option<ReplyCallback>,
}

impl Notification {
    /// Create a notification with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            config: NotificationConfig {
                title: title.into(),
                ..NotificationConfig::default()
            },
            on_action: None,
            on_reply: None,
        }
    }

    /// Override the generated identifier. Mainly useful for correlating
    /// notifications with external systems.
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.config.uid = uid.into();
        self
    }

    /// Set the subtitle shown under the title.
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.config.subtitle = Some(subtitle.into());
        self
    }

    /// Set the informative body text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.config.text = Some(text.into());
        self
    }

    /// Set the path of an image to show with the notification.
    pub fn icon(mut self, icon: impl Into<std::path::PathBuf>) -> Self {
        self.config.icon = Some(icon.into());
        self
    }

    /// Add a main action button with the callback to invoke when clicked.
    pub fn action_button(
        mut self,
        label: impl Into<String>,
        callback: impl FnOnce() + Send + 'static,
    ) -> Self {
        self.config.action_button = Some(label.into());
        self.on_action = Some(Box::new(callback));
        self
    }

    /// Add a secondary (snooze/dismiss) button. Clicking it produces no
    /// callback; it only gives the notification a second way to go away.
    pub fn snooze_button(mut self, label: impl Into<String>) -> Self {
        self.config.snooze_button = Some(label.into());
        self
    }

    /// Add a reply button with a placeholder shown in the reply field and
    /// the callback to invoke with the submitted text.
    pub fn reply_button(
        mut self,
        label: impl Into<String>,
        placeholder: impl Into<String>,
        callback: impl FnOnce(String) + Send + 'static,
    ) -> Self {
        self.config.reply_button = Some(label.into());
        self.config.reply_placeholder = Some(placeholder.into());
        self.on_reply = Some(Box::new(callback));
        self
    }

    /// Delay delivery by the given number of (fractional) seconds.
    pub fn delay_secs(mut self, delay_secs: f64) -> Self {
        self.config.delay_secs = delay_secs;
        self
    }

    fn has_callbacks(&self) -> bool {
        self.on_action.is_some() || self.on_reply.is_some()
    }
}

/// Cloneable, closeable writer end of the request channel.
///
/// Sends become no-ops (or [`Error::ChannelClosed`]) once the channel has
/// been closed by shutdown.
#[derive(Clone)]
pub(crate) struct RequestSender {
    writer: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
}

impl RequestSender {
    fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Some(writer))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Write + Send>>> {
        self.writer.lock().unwrap_or_else(|e| {
            log::warn!("request channel mutex poisoned, recovering");
            e.into_inner()
        })
    }

    fn send(&self, request: &ListenerRequest) -> Result<(), Error> {
        let mut guard = self.lock();
        let writer = guard.as_mut().ok_or(Error::ChannelClosed)?;
        let json = serde_json::to_string(request)?;
        writeln!(writer, "{json}").map_err(Error::ChannelWrite)?;
        writer.flush().map_err(Error::ChannelWrite)?;
        Ok(())
    }

    /// Send, treating a closed channel as a no-op. Used by cancellation,
    /// which must stay safe after teardown.
    fn send_best_effort(&self, request: &ListenerRequest) {
        match self.send(request) {
            Ok(()) | Err(Error::ChannelClosed) => {}
            Err(e) => log::debug!("dropping best-effort request: {e}"),
        }
    }

    /// Drop the writer, closing the caller's end of the channel.
    fn close(&self) {
        self.lock().take();
    }
}

/// Handle for cancelling a sent notification.
///
/// A plain value type: cancellation sends a [`ListenerRequest::Cancel`] over
/// the channel (a no-op once the channel is closed) and removes the pending
/// entry so a near-simultaneous activation is ignored rather than invoked.
pub struct NotificationHandle {
    uid: String,
    sender: RequestSender,
    registry: Arc<NotificationRegistry>,
}

impl NotificationHandle {
    /// Identifier of the notification this handle refers to.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Withdraw the notification and forget its callbacks.
    ///
    /// Always safe: after shutdown, or if the notification was already
    /// resolved, this does nothing.
    pub fn cancel(&self) {
        self.sender.send_best_effort(&ListenerRequest::Cancel {
            uid: self.uid.clone(),
        });
        self.registry.remove(&self.uid);
    }
}

/// Everything that exists only while the listener is up: the subprocess,
/// the shared request writer, and the drain thread.
struct Resources {
    listener: ListenerProcess,
    sender: RequestSender,
    drain_thread: Option<JoinHandle<()>>,
}

impl Resources {
    fn start(
        registry: Arc<NotificationRegistry>,
        listener_command: Option<&(String, Vec<String>)>,
    ) -> Result<Self, Error> {
        let mut listener = match listener_command {
            Some((command, args)) => {
                let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
                ListenerProcess::spawn(command, &arg_refs, &HashMap::new())?
            }
            None => ListenerProcess::spawn_self()?,
        };
        let stdout = listener.take_stdout().ok_or(Error::Pipe("stdout"))?;
        let stdin = listener.take_stdin().ok_or(Error::Pipe("stdin"))?;
        let sender = RequestSender::new(Box::new(stdin));
        let drain_thread = drain::spawn(stdout, registry);
        Ok(Self {
            listener,
            sender,
            drain_thread: Some(drain_thread),
        })
    }

    /// Stop all processes related to notification callback handling.
    fn close(&mut self) {
        // Closing the writer drops the child's stdin
        self.sender.close();
        // Killing the child closes its stdout, unblocking the drain thread
        self.listener.stop();
        if let Some(handle) = self.drain_thread.take() {
            if handle.thread().id() == std::thread::current().id() {
                // Shutdown invoked from inside a notification callback;
                // joining here would deadlock. The thread exits on its own
                // once the killed listener's pipe reaches end-of-stream.
                log::debug!("shutdown from drain thread; skipping self-join");
            } else if handle.join().is_err() {
                log::error!("drain thread terminated with a panic");
            }
        }
    }
}

/// Orchestrates notification delivery and callback routing.
///
/// The manager is intended to live for the whole program: create one,
/// share it (it is `Send + Sync`; methods take `&self`), and let it drop on
/// exit — dropping runs [`shutdown`](Self::shutdown). The listener process
/// and drain thread are only started once the first notification is sent.
///
/// Host binaries must call
/// [`listener::run_if_listener`](crate::listener::run_if_listener) at the
/// top of `main` so the re-executed listener child takes the listener path
/// instead of running the program again.
pub struct NotificationManager {
    registry: Arc<NotificationRegistry>,
    resources: Mutex<Option<Resources>>,
    /// Override for the listener command, instead of re-executing the
    /// current binary. Used by tests and embedders shipping a dedicated
    /// listener binary.
    listener_command: Option<(String, Vec<String>)>,
}

impl NotificationManager {
    /// Create a manager tracking at most
    /// [`DEFAULT_CAPACITY`](crate::registry::DEFAULT_CAPACITY) pending
    /// callbacks.
    pub fn new() -> Self {
        Self::with_registry(NotificationRegistry::new())
    }

    /// Create a manager tracking at most `capacity` pending callbacks; once
    /// past the bound, the oldest unresolved entries are silently dropped.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_registry(NotificationRegistry::with_capacity(capacity))
    }

    fn with_registry(registry: NotificationRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            resources: Mutex::new(None),
            listener_command: None,
        }
    }

    /// Use `command args...` as the listener process instead of re-executing
    /// the current binary.
    pub fn with_listener_command(
        mut self,
        command: impl Into<String>,
        args: impl IntoIterator<Item = String>,
    ) -> Self {
        self.listener_command = Some((command.into(), args.into_iter().collect()));
        self
    }

    fn resources(&self) -> MutexGuard<'_, Option<Resources>> {
        self.resources.lock().unwrap_or_else(|e| {
            log::warn!("resources mutex poisoned, recovering");
            e.into_inner()
        })
    }

    /// Send a notification, starting the listener process and drain thread
    /// if this is the first use.
    ///
    /// A fresh uid is assigned unless the notification carries one. If the
    /// notification has at least one callback it is registered for
    /// interaction tracking (possibly evicting the oldest pending entries);
    /// otherwise it is pure fire-and-forget.
    ///
    /// # Errors
    /// Fails if the listener process cannot be spawned or the display
    /// request cannot be written to the channel.
    pub fn send(&self, notification: Notification) -> Result<NotificationHandle, Error> {
        let has_callbacks = notification.has_callbacks();
        let Notification {
            mut config,
            on_action,
            on_reply,
        } = notification;
        if config.uid.is_empty() {
            config.uid = Uuid::new_v4().to_string();
        }

        let sender = {
            let mut guard = self.resources();
            if guard.is_none() {
                *guard = Some(Resources::start(
                    Arc::clone(&self.registry),
                    self.listener_command.as_ref(),
                )?);
            }
            // In-flight messages stay bounded, so this send does not block.
            guard
                .as_ref()
                .map(|resources| resources.sender.clone())
                .ok_or(Error::ChannelClosed)?
        };

        sender.send(&ListenerRequest::Display {
            config: config.clone(),
        })?;

        if has_callbacks {
            let evicted = self.registry.insert(PendingNotification {
                uid: config.uid.clone(),
                title: config.title.clone(),
                on_action,
                on_reply,
            });
            if evicted > 0 {
                log::debug!("evicted {evicted} old pending notification(s) over capacity");
            }
        }

        Ok(NotificationHandle {
            uid: config.uid,
            sender,
            registry: Arc::clone(&self.registry),
        })
    }

    /// Attempt to count the currently active notifications.
    ///
    /// WARNING: this is wildly inaccurate. It counts pending callback
    /// entries; if the user snoozed or deleted a notification natively, we
    /// never hear about it.
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Tear down the listener process, the drain thread, and all pending
    /// callbacks.
    ///
    /// Idempotent: safe to call repeatedly, or when nothing was ever
    /// started. Runs automatically when the manager is dropped.
    pub fn shutdown(&self) {
        if let Some(mut resources) = self.resources().take() {
            resources.close();
        }
        self.registry.clear();
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NotificationManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
