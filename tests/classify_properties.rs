use proptest::prelude::*;

use playlog::classify::{
    classify_event, classify_failure, StatusLabel, GATHERING_FACTS_TASK, HIDE_ON_SUCCESS_MARKER,
};
use playlog::event::{EventKind, Payload, RunEvent};
use serde_json::json;

fn kind_strategy() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::Start),
        Just(EventKind::Ok),
        Just(EventKind::Failed),
        Just(EventKind::Unreachable),
        Just(EventKind::Skipped),
        "[a-z_]{1,12}".prop_map(|s| s.parse::<EventKind>().unwrap()),
    ]
    .prop_filter("sentinel handled separately", |k| *k != EventKind::NoHostsMatched)
}

fn payload_strategy() -> impl Strategy<Value = Payload> {
    (
        proptest::option::of(-3i32..4),
        proptest::option::of("[ -~]{0,40}"),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(rc, msg, unreachable, skipped)| {
            let mut obj = serde_json::Map::new();
            if let Some(rc) = rc {
                obj.insert("rc".into(), json!(rc));
            }
            if let Some(msg) = msg {
                obj.insert("msg".into(), json!(msg));
            }
            obj.insert("unreachable".into(), json!(unreachable));
            obj.insert("skipped".into(), json!(skipped));
            Payload::new(serde_json::Value::Object(obj))
        })
}

proptest! {
    #[test]
    fn missing_host_or_task_yields_nothing(
        kind in kind_strategy(),
        payload in payload_strategy(),
        host in proptest::option::of("[a-z0-9]{1,8}"),
        task in proptest::option::of("[A-Za-z ]{1,16}"),
    ) {
        prop_assume!(host.is_none() || task.is_none());
        let event = RunEvent { kind, host, task, result: payload, start: None, end: None };
        prop_assert!(classify_event(&event).is_none());
    }

    #[test]
    fn successful_hidden_tasks_never_surface(
        payload in payload_strategy(),
        suffix in "[A-Za-z ]{0,16}",
        gathering in any::<bool>(),
    ) {
        prop_assume!(!payload.is_unreachable());
        let task = if gathering {
            GATHERING_FACTS_TASK.to_string()
        } else {
            format!("{HIDE_ON_SUCCESS_MARKER}{suffix}")
        };
        let mut event = RunEvent::new(EventKind::Ok);
        event.host = Some("web1".into());
        event.task = Some(task);
        event.result = payload;
        prop_assert!(classify_event(&event).is_none());
    }

    #[test]
    fn surfaced_outcomes_are_consistent(
        kind in kind_strategy(),
        payload in payload_strategy(),
    ) {
        let mut event = RunEvent::new(kind);
        event.host = Some("web1".into());
        event.task = Some("task".into());
        event.result = payload;

        if let Some(outcome) = classify_event(&event) {
            prop_assert!(
                !outcome.stdout_lines.is_empty()
                    || !outcome.stderr_lines.is_empty()
                    || !outcome.msg_lines.is_empty()
            );
            if outcome.unreachable {
                prop_assert_eq!(outcome.retval, -1);
                prop_assert!(outcome.status.is_unreachable());
            }
            if outcome.status == StatusLabel::Success {
                prop_assert_eq!(outcome.retval, 0);
            }
        }
    }

    #[test]
    fn classification_always_yields_a_label(
        retval in any::<i32>(),
        lines in proptest::collection::vec("[ -~]{0,30}", 0..5),
        skipped in any::<bool>(),
        unreachable in any::<bool>(),
    ) {
        let label = classify_failure(retval, lines.as_slice(), skipped, unreachable);
        if unreachable {
            prop_assert!(label.is_unreachable());
        } else if skipped {
            prop_assert_eq!(label, StatusLabel::Skipped);
        } else if retval != 0 {
            prop_assert!(label.is_failed());
        } else {
            prop_assert_eq!(label, StatusLabel::Success);
        }
    }
}
