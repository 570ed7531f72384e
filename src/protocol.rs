//! JSON protocol types for communication between the caller and the listener process.
//!
//! The caller writes [`ListenerRequest`] objects to the listener's stdin (one JSON
//! object per line) and the listener writes [`ActivationEvent`] objects to its
//! stdout (one JSON object per line). The channel carries no version field; both
//! ends must be built from the same definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Wire description of a notification to display.
///
/// This is the serializable half of a notification; callbacks stay on the
/// caller's side of the channel (see
/// [`PendingNotification`](crate::registry::PendingNotification)).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NotificationConfig {
    /// Unique identifier correlating this notification with its pending
    /// callback state across the process boundary.
    pub uid: String,
    /// Notification title / summary line.
    pub title: String,
    /// Optional subtitle shown under the title.
    pub subtitle: Option<String>,
    /// Optional informative body text.
    pub text: Option<String>,
    /// Optional path to an image shown with the notification.
    pub icon: Option<PathBuf>,
    /// Label for the main action button, if any.
    pub action_button: Option<String>,
    /// Label for the secondary (snooze/dismiss) button, if any.
    pub snooze_button: Option<String>,
    /// Label for the reply button, if any.
    pub reply_button: Option<String>,
    /// Placeholder text shown inside the reply field.
    pub reply_placeholder: Option<String>,
    /// Delivery delay in (fractional) seconds. Zero means immediate.
    pub delay_secs: f64,
}

/// A request sent from the caller to the listener process (via stdin).
///
/// Tagged with `type` for easy JSON dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ListenerRequest {
    /// Display a notification natively.
    Display {
        /// The notification to display.
        config: NotificationConfig,
    },

    /// Withdraw a previously displayed, still-pending notification.
    Cancel {
        /// Identifier of the notification to withdraw.
        uid: String,
    },
}

/// The kind of user interaction reported by the backend.
///
/// Serializes to the exact wire strings `"action_button_clicked"` and
/// `"reply_button_clicked"`. Unrecognized strings deserialize into
/// [`ActivationKind::Other`] instead of failing, so the drain thread can
/// report protocol drift itself rather than silently skipping the line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ActivationKind {
    /// The user clicked the main action button.
    #[serde(rename = "action_button_clicked")]
    ActionButtonClicked,

    /// The user submitted text through the reply button.
    #[serde(rename = "reply_button_clicked")]
    ReplyButtonClicked,

    /// An event kind outside the known set. Reaching the drain thread with
    /// this variant is a fatal protocol violation.
    #[serde(untagged)]
    Other(String),
}

/// A user-interaction event sent from the listener process back to the
/// caller (via stdout). Consumed exactly once by the drain thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivationEvent {
    /// Identifier of the notification that was interacted with.
    pub uid: String,
    /// What the user did.
    pub kind: ActivationKind,
    /// Text the user typed, present only for reply interactions.
    pub reply_text: Option<String>,
}
