use playlog::classify::{classify_failure, Reason, StatusLabel};

const NONE: &[&str] = &[];

#[test]
fn zero_retval_without_flags_is_success() {
    assert_eq!(classify_failure(0, NONE, false, false), StatusLabel::Success);
}

#[test]
fn unreachable_reasons_follow_the_pattern_table() {
    let cases = [
        (
            "ssh: Could not resolve hostname db9: Name or service not known",
            Reason::CouldNotResolve,
        ),
        ("user@web1: Permission denied (publickey).", Reason::PermissionDenied),
        ("connect to host 10.0.0.7 port 22: No route to host", Reason::NoRouteToHost),
        ("connect to host web2 port 22: Connection timed out", Reason::ConnectionTimedOut),
    ];

    for (line, reason) in cases {
        assert_eq!(
            classify_failure(-1, &[line], false, true),
            StatusLabel::Unreachable(reason),
            "line: {line}"
        );
    }
}

#[test]
fn unreachable_without_lines_has_unknown_reason() {
    assert_eq!(
        classify_failure(-1, NONE, false, true),
        StatusLabel::Unreachable(Reason::UnknownReason)
    );
}

#[test]
fn unreachable_with_unmatched_lines_is_unknown_error() {
    assert_eq!(
        classify_failure(-1, &["kex_exchange_identification: read: Connection reset"], false, true),
        StatusLabel::Unreachable(Reason::UnknownError)
    );
}

#[test]
fn first_matching_line_wins() {
    let lines = [
        "warning: something odd",
        "Permission denied",
        "No route to host",
    ];
    assert_eq!(
        classify_failure(-1, &lines, false, true),
        StatusLabel::Unreachable(Reason::PermissionDenied)
    );
}

#[test]
fn unreachable_beats_skipped_and_retval() {
    assert!(classify_failure(0, NONE, true, true).is_unreachable());
    assert!(classify_failure(2, NONE, false, true).is_unreachable());
}

#[test]
fn skipped_beats_non_zero_retval() {
    assert_eq!(classify_failure(1, &["boom"], true, false), StatusLabel::Skipped);
}

#[test]
fn missing_interpreter_is_detected() {
    assert_eq!(
        classify_failure(1, &["The module failed to execute correctly"], false, false),
        StatusLabel::Failed(Reason::MissingInterpreter)
    );
}

#[test]
fn failures_without_known_text() {
    assert_eq!(
        classify_failure(2, &["exit status 2"], false, false),
        StatusLabel::Failed(Reason::UnknownError)
    );
    assert_eq!(
        classify_failure(-1, NONE, false, false),
        StatusLabel::Failed(Reason::UnknownReason)
    );
}

#[test]
fn connection_patterns_do_not_apply_to_plain_failures() {
    assert_eq!(
        classify_failure(1, &["No route to host"], false, false),
        StatusLabel::Failed(Reason::UnknownError)
    );
}

#[test]
fn labels_render_with_reason() {
    assert_eq!(StatusLabel::Success.to_string(), "SUCCESS");
    assert_eq!(StatusLabel::NoHostsMatched.to_string(), "NO_HOSTS_MATCHED");
    assert_eq!(
        StatusLabel::Unreachable(Reason::NoRouteToHost).to_string(),
        "UNREACHABLE_NO_ROUTE_TO_HOST"
    );
    assert_eq!(
        StatusLabel::Failed(Reason::UnknownReason).to_string(),
        "FAILED_UNKNOWN_REASON"
    );
    assert_eq!(StatusLabel::Failed(Reason::MissingInterpreter).reason(), Some(Reason::MissingInterpreter));
    assert_eq!(StatusLabel::Skipped.reason(), None);
}
