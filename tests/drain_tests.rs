use notify_relay::drain;
use notify_relay::protocol::{ActivationEvent, ActivationKind};
use notify_relay::registry::{NotificationRegistry, PendingNotification};

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn action_event(uid: &str) -> ActivationEvent {
    ActivationEvent {
        uid: uid.to_string(),
        kind: ActivationKind::ActionButtonClicked,
        reply_text: None,
    }
}

#[test]
fn test_action_callback_fires_exactly_once() {
    let registry = NotificationRegistry::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    registry.insert(PendingNotification {
        uid: "n1".to_string(),
        title: "test".to_string(),
        on_action: Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        on_reply: None,
    });

    drain::dispatch_activation(&registry, action_event("n1"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 0, "Entry should be removed after dispatch");

    // A duplicate delivery of the same event is ignored.
    drain::dispatch_activation(&registry, action_event("n1"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_reply_text_delivered_verbatim() {
    let registry = NotificationRegistry::new();
    let received = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&received);
    registry.insert(PendingNotification {
        uid: "n1".to_string(),
        title: "test".to_string(),
        on_action: None,
        on_reply: Some(Box::new(move |text| {
            *sink.lock().unwrap() = Some(text);
        })),
    });

    drain::dispatch_activation(
        &registry,
        ActivationEvent {
            uid: "n1".to_string(),
            kind: ActivationKind::ReplyButtonClicked,
            reply_text: Some("Hello,  \"world\"\nsecond line".to_string()),
        },
    );

    assert_eq!(
        received.lock().unwrap().as_deref(),
        Some("Hello,  \"world\"\nsecond line")
    );
    assert!(registry.is_empty());
}

#[test]
fn test_unknown_uid_is_ignored() {
    let registry = NotificationRegistry::new();
    // Must neither panic nor create state.
    drain::dispatch_activation(&registry, action_event("never-seen"));
    assert!(registry.is_empty());
}

#[test]
fn test_cancelled_notification_ignores_late_activation() {
    let registry = NotificationRegistry::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    registry.insert(PendingNotification {
        uid: "n1".to_string(),
        title: "test".to_string(),
        on_action: Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        on_reply: None,
    });

    // Cancellation removes the entry before the in-flight event lands.
    registry.remove("n1");
    drain::dispatch_activation(&registry, action_event("n1"));

    assert_eq!(fired.load(Ordering::SeqCst), 0, "Callback must not fire");
}

#[test]
fn test_missing_action_callback_is_fatal() {
    let registry = Arc::new(NotificationRegistry::new());
    registry.insert(PendingNotification {
        uid: "n1".to_string(),
        title: "reply only".to_string(),
        on_action: None,
        on_reply: Some(Box::new(|_| {})),
    });

    let result = std::thread::spawn(move || {
        drain::dispatch_activation(&registry, action_event("n1"));
    })
    .join();
    assert!(
        result.is_err(),
        "Action event without an action callback should panic the drain thread"
    );
}

#[test]
fn test_unknown_event_kind_is_fatal() {
    let registry = Arc::new(NotificationRegistry::new());
    registry.insert(PendingNotification {
        uid: "n1".to_string(),
        title: "test".to_string(),
        on_action: Some(Box::new(|| {})),
        on_reply: None,
    });

    let result = std::thread::spawn(move || {
        drain::dispatch_activation(
            &registry,
            ActivationEvent {
                uid: "n1".to_string(),
                kind: ActivationKind::Other("snoozed".to_string()),
                reply_text: None,
            },
        );
    })
    .join();
    assert!(
        result.is_err(),
        "An event kind outside the known set should panic the drain thread"
    );
}

#[test]
fn test_drain_thread_processes_stream_and_exits_on_eof() {
    let registry = Arc::new(NotificationRegistry::new());
    let fired = Arc::new(AtomicUsize::new(0));

    for uid in ["n1", "n2"] {
        let counter = Arc::clone(&fired);
        registry.insert(PendingNotification {
            uid: uid.to_string(),
            title: uid.to_string(),
            on_action: Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            on_reply: None,
        });
    }

    let mut stream = String::new();
    stream.push_str(&serde_json::to_string(&action_event("n1")).unwrap());
    stream.push('\n');
    stream.push_str("this is not json\n");
    stream.push('\n');
    stream.push_str(&serde_json::to_string(&action_event("n2")).unwrap());
    stream.push('\n');

    let handle = drain::spawn(Cursor::new(stream.into_bytes()), Arc::clone(&registry));
    handle
        .join()
        .expect("Drain thread should exit cleanly at end-of-stream");

    assert_eq!(fired.load(Ordering::SeqCst), 2);
    assert!(registry.is_empty());
}
