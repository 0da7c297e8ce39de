use std::io::Cursor;
use std::path::PathBuf;

use playlog::errors::PlaylogError;
use playlog::event::{
    CommandSource, EventKind, EventSource, JsonLinesSource, Payload, RunEvent,
};
use playlog::types::{HostSelection, RunRequest};

fn request(selection: HostSelection) -> RunRequest {
    RunRequest {
        playbook: PathBuf::from("playbooks/site.yml"),
        selection,
        forks: 7,
    }
}

fn drain<S: EventSource>(source: &mut S) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Some(event) = source.next_event().unwrap() {
        events.push(event);
    }
    events
}

#[test]
fn json_lines_are_read_in_order_and_blank_lines_skipped() {
    let input = concat!(
        r#"{"kind":"start","host":"web1","task":"install"}"#,
        "\n\n",
        r#"{"event":"runner_on_ok","host":"web1","task":"install","res":{"rc":0,"stdout":"done"}}"#,
        "\n",
        r#"{"kind":"playbook_on_no_hosts_matched"}"#,
        "\n",
    );
    let mut source = JsonLinesSource::new(Cursor::new(input));

    let events = drain(&mut source);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].kind, EventKind::Start);
    assert_eq!(events[1].kind, EventKind::Ok);
    assert_eq!(events[1].result.return_code(), Some(0));
    assert_eq!(events[1].result.stdout_lines(), vec!["done"]);
    assert_eq!(events[2].kind, EventKind::NoHostsMatched);
    assert!(events[2].host.is_none());
}

#[test]
fn malformed_line_ends_the_stream_with_its_line_number() {
    let input = "{\"kind\":\"ok\",\"host\":\"a\",\"task\":\"t\"}\n\nnot json\n";
    let mut source = JsonLinesSource::new(Cursor::new(input));

    assert!(source.next_event().unwrap().is_some());
    match source.next_event() {
        Err(PlaylogError::EventSource(msg)) => assert!(msg.contains("line 3"), "{msg}"),
        other => panic!("expected EventSource error, got {other:?}"),
    }
}

#[test]
fn engine_callback_names_map_to_kinds() {
    let cases = [
        ("runner_on_ok", EventKind::Ok),
        ("runner_on_failed", EventKind::Failed),
        ("runner_on_unreachable", EventKind::Unreachable),
        ("runner_on_skipped", EventKind::Skipped),
        ("runner_on_start", EventKind::Start),
        ("no-hosts-matched", EventKind::NoHostsMatched),
        ("OK", EventKind::Ok),
    ];
    for (tag, kind) in cases {
        assert_eq!(tag.parse::<EventKind>().unwrap(), kind, "tag {tag}");
    }
    assert_eq!(
        "runner_on_async_poll".parse::<EventKind>().unwrap(),
        EventKind::Other("runner_on_async_poll".to_string())
    );
}

#[test]
fn payload_accessors_tolerate_odd_shapes() {
    let event: RunEvent = serde_json::from_str(
        r#"{"kind":"failed","host":"h","task":"t",
            "result":{"return_code":"2","stdout_lines":["a",1],"stdout":"x\ny",
                      "msg":["m1","m2"],"unreachable":"yes","facts":{"k":"v"}}}"#,
    )
    .unwrap();

    assert_eq!(event.result.return_code(), Some(2));
    // mixed array is not a line array; falls back to the text
    assert_eq!(event.result.stdout_lines(), vec!["x", "y"]);
    assert_eq!(event.result.msg_lines(), vec!["m1", "m2"]);
    assert!(!event.result.is_unreachable());
    assert_eq!(event.result.facts().len(), 1);
}

#[test]
fn out_of_range_return_codes_saturate() {
    let rc = |value: serde_json::Value| Payload::new(serde_json::json!({ "rc": value })).return_code();

    assert_eq!(rc(serde_json::json!(3_000_000_000_i64)), Some(i32::MAX));
    assert_eq!(rc(serde_json::json!(-3_000_000_000_i64)), Some(i32::MIN));
    assert_eq!(rc(serde_json::json!(u64::MAX)), Some(i32::MAX));
    assert_eq!(rc(serde_json::json!("99999999999999999999")), Some(i32::MAX));
    assert_eq!(rc(serde_json::json!("-99999999999999999999")), Some(i32::MIN));
    assert_eq!(rc(serde_json::json!("not a number")), None);
}

#[test]
fn command_arguments_carry_selection_and_forks() {
    let source = CommandSource::new("engine", vec!["--json".to_string()]);
    let selection = HostSelection::new(vec!["web1".into()], vec!["db".into()]);

    assert_eq!(
        source.command_args(&request(selection)),
        vec!["--json", "playbooks/site.yml", "--limit", "web1,db", "--forks", "7"]
    );
    assert_eq!(
        source.command_args(&request(HostSelection::default())),
        vec!["--json", "playbooks/site.yml", "--forks", "7"]
    );
}

#[test]
fn missing_engine_is_a_start_failure() {
    let mut source = CommandSource::new("/nonexistent/playlog-engine", Vec::new());
    match source.start(&request(HostSelection::default())) {
        Err(PlaylogError::RunStart(msg)) => assert!(msg.contains("playlog-engine")),
        other => panic!("expected RunStart, got {other:?}"),
    }
}

#[test]
fn next_event_before_start_is_an_error() {
    let mut source = CommandSource::new("engine", Vec::new());
    assert!(matches!(
        source.next_event(),
        Err(PlaylogError::EventSource(_))
    ));
}

#[cfg(unix)]
#[test]
fn engine_stdout_is_streamed_as_events() {
    let script = r#"printf '%s\n' '{"kind":"ok","host":"web1","task":"install"}' '{"kind":"failed","host":"web1","task":"migrate"}'; exit 2"#;
    let mut source = CommandSource::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "engine".to_string()],
    );
    source.start(&request(HostSelection::default())).unwrap();

    let events = drain(&mut source);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].task.as_deref(), Some("migrate"));
    // exhausted sources stay exhausted
    assert!(source.next_event().unwrap().is_none());
}
