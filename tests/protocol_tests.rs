use notify_relay::protocol::{
    ActivationEvent, ActivationKind, ListenerRequest, NotificationConfig,
};

use serde_json::json;

#[test]
fn test_activation_kinds_use_exact_wire_strings() {
    assert_eq!(
        serde_json::to_value(ActivationKind::ActionButtonClicked).unwrap(),
        json!("action_button_clicked")
    );
    assert_eq!(
        serde_json::to_value(ActivationKind::ReplyButtonClicked).unwrap(),
        json!("reply_button_clicked")
    );
}

#[test]
fn test_unknown_activation_kind_survives_deserialization() {
    // The drain thread raises the protocol violation itself; a drifted peer
    // must not fail at the parse layer.
    let kind: ActivationKind = serde_json::from_str("\"notification_snoozed\"").unwrap();
    assert_eq!(kind, ActivationKind::Other("notification_snoozed".to_string()));
}

#[test]
fn test_listener_requests_are_type_tagged() {
    let display = ListenerRequest::Display {
        config: NotificationConfig {
            uid: "abc-123".to_string(),
            title: "Meeting".to_string(),
            ..NotificationConfig::default()
        },
    };
    let value = serde_json::to_value(&display).unwrap();
    assert_eq!(value["type"], "Display");
    assert_eq!(value["config"]["uid"], "abc-123");
    assert_eq!(value["config"]["title"], "Meeting");

    let cancel = ListenerRequest::Cancel {
        uid: "abc-123".to_string(),
    };
    let value = serde_json::to_value(&cancel).unwrap();
    assert_eq!(value["type"], "Cancel");
    assert_eq!(value["uid"], "abc-123");
}

#[test]
fn test_cancel_request_parses_from_wire_form() {
    let parsed: ListenerRequest =
        serde_json::from_str(r#"{"type": "Cancel", "uid": "abc-123"}"#).unwrap();
    assert_eq!(
        parsed,
        ListenerRequest::Cancel {
            uid: "abc-123".to_string()
        }
    );
}

#[test]
fn test_activation_event_with_null_reply_text() {
    let parsed: ActivationEvent = serde_json::from_str(
        r#"{"uid": "n1", "kind": "action_button_clicked", "reply_text": null}"#,
    )
    .unwrap();
    assert_eq!(parsed.uid, "n1");
    assert_eq!(parsed.kind, ActivationKind::ActionButtonClicked);
    assert_eq!(parsed.reply_text, None);
}

#[test]
fn test_display_request_carries_full_config() {
    let config = NotificationConfig {
        uid: "n1".to_string(),
        title: "Reminder".to_string(),
        subtitle: Some("Standup".to_string()),
        text: Some("Starts in 5 minutes".to_string()),
        icon: Some("/tmp/icon.png".into()),
        action_button: Some("Join".to_string()),
        snooze_button: Some("Snooze".to_string()),
        reply_button: Some("Reply".to_string()),
        reply_placeholder: Some("Type a message...".to_string()),
        delay_secs: 2.5,
    };
    let json = serde_json::to_string(&ListenerRequest::Display {
        config: config.clone(),
    })
    .unwrap();
    let parsed: ListenerRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, ListenerRequest::Display { config });
}
