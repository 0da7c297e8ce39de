mod common;

use std::path::{Path, PathBuf};

use playlog::classify::{Reason, StatusLabel};
use playlog::engine::{Persistence, RunOptions, Runner, RUN_START_FAILED};
use playlog::errors::Result;
use playlog::event::{EventSource, RunEvent};
use playlog::fs::mock::MockFileSystem;
use playlog::store::RunLogStore;
use playlog::types::{HostSelection, RunRequest};
use playlog::{exit_code, run_playbook};
use playlog_test_utils::builders::{ConfigFileBuilder, EventBuilder, PayloadBuilder};
use playlog_test_utils::fake_source::ScriptedSource;

use common::{mock_fs, read_entries, str_field};

fn playbook() -> PathBuf {
    PathBuf::from("playbooks/site.yml")
}

fn two_task_events() -> Vec<RunEvent> {
    vec![
        EventBuilder::ok("web1", "install")
            .payload(PayloadBuilder::new().rc(0).stdout_lines(&["done"]))
            .build(),
        EventBuilder::unreachable("web1", "ping")
            .payload(
                PayloadBuilder::new()
                    .unreachable()
                    .msg("ssh: connect to host web1 port 22: No route to host"),
            )
            .build(),
    ]
}

#[test]
fn one_host_with_an_unreachable_task() {
    playlog_test_utils::init_tracing();
    let (fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").build();
    let mut source = ScriptedSource::new(two_task_events());

    let (report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::default(),
        &mut source,
        shared,
    )
    .unwrap();

    assert_eq!(report.retval, -1);
    let result = report.result.as_ref().unwrap();
    let outcomes = result.outcomes("web1").unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].status, StatusLabel::Success);
    assert_eq!(
        outcomes[1].status,
        StatusLabel::Unreachable(Reason::NoRouteToHost)
    );

    let summary = summary.unwrap();
    assert_eq!(summary.counters.unreachable, 1);
    assert_eq!(summary.counters.success, 1);
    assert_eq!(summary.counters.tasks, 2);
    assert_eq!(summary.counters.hosts, 1);
    assert_eq!(exit_code(&report), 1);

    let Persistence::Written(dir) = &report.persistence else {
        panic!("expected run logs, got {:?}", report.persistence);
    };
    assert!(fs.contents(dir.join("01-web1_install.yml")).is_some());
    assert!(fs.contents(dir.join("02-web1_ping.yml")).is_some());
}

#[test]
fn sentinel_alone_gives_an_empty_result() {
    let (_fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").build();
    let mut source = ScriptedSource::new(vec![EventBuilder::no_hosts_matched().build()]);

    let (report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::new(vec![], vec!["nobody".into()]),
        &mut source,
        shared,
    )
    .unwrap();

    assert_eq!(report.retval, -1);
    let result = report.result.as_ref().unwrap();
    assert!(result.is_empty());
    assert_eq!(result.unmatched().len(), 1);

    let summary = summary.unwrap();
    assert_eq!(summary.counters.no_hosts_matched, 1);
    assert_eq!(summary.counters.hosts, 0);
    assert_eq!(summary.counters.tasks, 0);
    assert_eq!(summary.lines.len(), 1);
    assert_eq!(summary.lines[0].text(), "no hosts matched");
}

#[test]
fn start_failure_is_distinct_from_an_empty_run() {
    let (fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").build();
    let mut source = ScriptedSource::new(vec![]).failing_start("engine not found");

    let (report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::default(),
        &mut source,
        shared.clone(),
    )
    .unwrap();

    assert_eq!(report.retval, RUN_START_FAILED);
    assert!(report.result.is_none());
    assert!(summary.is_none());
    assert_eq!(report.persistence, Persistence::Skipped);
    assert!(report.aborted.as_deref().unwrap().contains("engine not found"));
    assert_eq!(exit_code(&report), 2);
    assert!(RunLogStore::new("logs", shared).list_runs().unwrap().is_empty());

    let audit = read_entries(&fs, "logs/audit1.yml");
    assert_eq!(audit.len(), 2);
    assert_eq!(str_field(&audit[1], "severity"), Some("warning"));
}

#[test]
fn empty_run_succeeds() {
    let (_fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").build();
    let mut source = ScriptedSource::new(vec![]);

    let (report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::default(),
        &mut source,
        shared,
    )
    .unwrap();

    assert_eq!(report.retval, 0);
    assert!(report.result.as_ref().unwrap().is_empty());
    assert_eq!(summary.unwrap().counters.tasks, 0);
    assert_eq!(exit_code(&report), 0);
}

#[test]
fn aborted_source_keeps_what_was_collected() {
    let (fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").build();
    let mut events = two_task_events();
    events.push(EventBuilder::ok("web2", "install").build());
    let mut source = ScriptedSource::new(events).abort_after(1, "engine killed");

    let (report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::default(),
        &mut source,
        shared,
    )
    .unwrap();

    assert_eq!(report.retval, 0);
    assert_eq!(report.aborted.as_deref(), Some("Event source failed: engine killed"));
    assert_eq!(report.result.as_ref().unwrap().outcome_count(), 1);
    assert_eq!(summary.unwrap().counters.success, 1);
    assert_eq!(exit_code(&report), 1);

    let Persistence::Written(dir) = &report.persistence else {
        panic!("aborted runs are still persisted");
    };
    let metadata = common::read_document(&fs, dir.join("metadata.yml"));
    assert_eq!(str_field(&metadata, "aborted"), Some("Event source failed: engine killed"));
}

#[test]
fn disabled_persistence_writes_nothing() {
    let (fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").persist(false).build();
    let mut source = ScriptedSource::new(two_task_events());

    let (report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::default(),
        &mut source,
        shared,
    )
    .unwrap();

    assert_eq!(report.persistence, Persistence::Disabled);
    assert!(summary.is_some());
    assert!(fs.file_paths().is_empty());
}

#[test]
fn audit_and_debug_streams_record_the_run() {
    let (fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").verbose(true).build();
    let mut source = ScriptedSource::new(two_task_events());

    let (_report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::new(vec!["web1".into()], vec![]),
        &mut source,
        shared,
    )
    .unwrap();

    let audit = read_entries(&fs, "logs/audit1.yml");
    assert_eq!(audit.len(), 2);
    assert_eq!(str_field(&audit[0], "facility"), Some("audit"));
    assert_eq!(audit[0]["lines"][0].as_str(), Some("run started: playbooks/site.yml"));
    assert_eq!(audit[1]["lines"][1].as_str(), Some("retval: -1"));

    let debug = read_entries(&fs, "logs/debug1.yml");
    assert_eq!(debug.len(), 1);
    let styled = debug[0]["styled_lines"].as_sequence().unwrap();
    assert_eq!(styled.len(), summary.unwrap().lines.len());
    assert_eq!(styled[0][0].as_str(), Some("web1"));
    assert_eq!(styled[0][1].as_str(), Some("unreachable"));
}

#[test]
fn run_request_carries_selection_and_forks() {
    let (_fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").forks(12).build();
    let source = ScriptedSource::new(vec![]);
    let requests = source.requests();
    let mut source = source;

    run_playbook(
        &cfg,
        Path::new("deploy.yml"),
        &HostSelection::new(vec!["web1".into()], vec!["db".into()]),
        &mut source,
        shared,
    )
    .unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].forks, 12);
    assert_eq!(requests[0].playbook, PathBuf::from("deploy.yml"));
    assert_eq!(requests[0].selection.limit_pattern().as_deref(), Some("web1,db"));
}

#[test]
fn persistence_failure_does_not_hide_the_result() {
    let (fs, shared) = mock_fs();
    fs.fail_writes("read-only filesystem");
    let runner = Runner::new(RunOptions::default(), Some(RunLogStore::new("logs", shared)));
    let mut source = ScriptedSource::new(two_task_events());

    let report = runner.run(&playbook(), &HostSelection::default(), &mut source);

    assert!(matches!(report.persistence, Persistence::Failed(_)));
    assert_eq!(report.result.as_ref().unwrap().outcome_count(), 2);
    assert_eq!(report.retval, -1);
}

#[test]
fn hosts_keep_first_seen_order_and_first_failure_wins() {
    let runner = Runner::new(RunOptions::default(), None);
    let mut source = ScriptedSource::new(vec![
        EventBuilder::ok("db1", "install").build(),
        EventBuilder::failed("web1", "migrate")
            .payload(PayloadBuilder::new().rc(3))
            .build(),
        EventBuilder::new(playlog::event::EventKind::Other("runner_item_on_ok".into()))
            .host("db1")
            .task("loop")
            .payload(PayloadBuilder::new().rc(7))
            .build(),
    ]);

    let report = runner.run(&playbook(), &HostSelection::default(), &mut source);
    let result = report.result.unwrap();

    let hosts: Vec<&str> = result.hosts().map(|(h, _)| h).collect();
    assert_eq!(hosts, vec!["db1", "web1"]);
    assert_eq!(report.retval, -1);
    let order: Vec<(Option<&str>, &str)> = result
        .in_arrival_order()
        .map(|(h, o)| (h, o.task.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (Some("db1"), "install"),
            (Some("web1"), "migrate"),
            (Some("db1"), "loop"),
        ]
    );
}

/// Replays its events, then makes the disk fail once the stream is done.
struct DiskFailsAtEnd {
    inner: ScriptedSource,
    fs: MockFileSystem,
}

impl EventSource for DiskFailsAtEnd {
    fn start(&mut self, request: &RunRequest) -> Result<()> {
        self.inner.start(request)
    }

    fn next_event(&mut self) -> Result<Option<RunEvent>> {
        let next = self.inner.next_event()?;
        if next.is_none() {
            self.fs.fail_writes("disk full");
        }
        Ok(next)
    }
}

#[test]
fn audit_failure_after_the_run_keeps_the_summary() {
    let (fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").build();
    let mut source = DiskFailsAtEnd {
        inner: ScriptedSource::new(vec![EventBuilder::ok("web1", "install").build()]),
        fs: fs.clone(),
    };

    let (report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::default(),
        &mut source,
        shared,
    )
    .unwrap();

    assert_eq!(report.retval, 0);
    let summary = summary.unwrap();
    assert_eq!(summary.counters.success, 1);
    assert!(matches!(report.persistence, Persistence::Failed(_)));
    assert!(report.log_errors.iter().any(|e| e.contains("audit1.yml")));
    assert!(report.log_errors.iter().any(|e| e.contains("disk full")));
    assert_eq!(exit_code(&report), 1);

    // the start entry made it to disk before the failure
    assert_eq!(read_entries(&fs, "logs/audit1.yml").len(), 1);
}

#[test]
fn audit_failure_before_the_run_still_runs_it() {
    let (fs, shared) = mock_fs();
    fs.fail_path("logs/audit1.yml", "read-only");
    let cfg = ConfigFileBuilder::new().logs_root("logs").build();
    let mut source = ScriptedSource::new(two_task_events());

    let (report, summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::default(),
        &mut source,
        shared,
    )
    .unwrap();

    assert_eq!(report.log_errors.len(), 1);
    assert!(matches!(report.persistence, Persistence::Written(_)));
    assert_eq!(summary.unwrap().counters.tasks, 2);
    assert!(fs.contents("logs/audit1.yml").is_none());
    assert_eq!(exit_code(&report), 1);
}

#[test]
fn clean_runs_have_no_log_errors() {
    let (_fs, shared) = mock_fs();
    let cfg = ConfigFileBuilder::new().logs_root("logs").build();
    let mut source = ScriptedSource::new(vec![EventBuilder::ok("web1", "install").build()]);

    let (report, _summary) = run_playbook(
        &cfg,
        &playbook(),
        &HostSelection::default(),
        &mut source,
        shared,
    )
    .unwrap();

    assert!(report.log_errors.is_empty());
    assert_eq!(exit_code(&report), 0);
}
