use notify_relay::backend::{ActivationSink, NotificationBackend};
use notify_relay::listener;
use notify_relay::protocol::{ActivationEvent, ActivationKind, NotificationConfig};
use notify_relay::Error;

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

/// Backend double that records every display/cancel call.
#[derive(Default)]
struct RecordingBackend {
    displayed: Mutex<Vec<NotificationConfig>>,
    cancelled: Mutex<Vec<String>>,
}

impl NotificationBackend for RecordingBackend {
    fn display(&self, config: &NotificationConfig) -> Result<(), Error> {
        if config.uid == "reject-me" {
            return Err(Error::Backend("rejected by test backend".to_string()));
        }
        self.displayed.lock().unwrap().push(config.clone());
        Ok(())
    }

    fn cancel(&self, uid: &str) {
        self.cancelled.lock().unwrap().push(uid.to_string());
    }

    fn run_event_loop(&self, _on_activation: ActivationSink) {
        // Not exercised in-process.
    }
}

#[test]
fn test_forward_requests_dispatches_display_and_cancel() {
    let backend = RecordingBackend::default();
    let input = concat!(
        r#"{"type": "Display", "config": {"uid": "n1", "title": "hi", "subtitle": null, "text": null, "icon": null, "action_button": null, "snooze_button": null, "reply_button": null, "reply_placeholder": null, "delay_secs": 0.0}}"#,
        "\n",
        "not json at all\n",
        "\n",
        r#"{"type": "Cancel", "uid": "n1"}"#,
        "\n",
    );

    listener::forward_requests(&backend, Cursor::new(input.as_bytes()));

    let displayed = backend.displayed.lock().unwrap();
    assert_eq!(displayed.len(), 1);
    assert_eq!(displayed[0].uid, "n1");
    assert_eq!(displayed[0].title, "hi");
    assert_eq!(*backend.cancelled.lock().unwrap(), vec!["n1".to_string()]);
}

#[test]
fn test_forward_requests_survives_backend_display_errors() {
    let backend = RecordingBackend::default();
    let mut input = String::new();
    for uid in ["reject-me", "n2"] {
        let request = notify_relay::ListenerRequest::Display {
            config: NotificationConfig {
                uid: uid.to_string(),
                title: "t".to_string(),
                ..NotificationConfig::default()
            },
        };
        input.push_str(&serde_json::to_string(&request).unwrap());
        input.push('\n');
    }

    listener::forward_requests(&backend, Cursor::new(input.into_bytes()));

    // The rejected display is logged and skipped; later requests still land.
    let displayed = backend.displayed.lock().unwrap();
    assert_eq!(displayed.len(), 1);
    assert_eq!(displayed[0].uid, "n2");
}

/// Shared in-memory writer so the test can inspect what the sink wrote.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_activation_sink_writes_json_lines() {
    let buf = SharedBuf::default();
    let sink = listener::activation_sink(buf.clone());

    sink(ActivationEvent {
        uid: "n1".to_string(),
        kind: ActivationKind::ReplyButtonClicked,
        reply_text: Some("on my way".to_string()),
    });
    sink(ActivationEvent {
        uid: "n2".to_string(),
        kind: ActivationKind::ActionButtonClicked,
        reply_text: None,
    });

    let bytes = buf.0.lock().unwrap().clone();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: ActivationEvent = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first.uid, "n1");
    assert_eq!(first.kind, ActivationKind::ReplyButtonClicked);
    assert_eq!(first.reply_text.as_deref(), Some("on my way"));

    let second: ActivationEvent = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second.kind, ActivationKind::ActionButtonClicked);
}
