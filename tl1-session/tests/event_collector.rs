//! EventCollector against scripted equipment

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use tl1_client::testing::{Reply, ScriptedConnector};
use tl1_session::{EventCollector, MemoryCollector};

fn parse(line: &str) -> serde_json::Value {
    serde_json::from_str(line).expect("collected line is JSON")
}

fn spawn(
    connector: &ScriptedConnector,
    sink: &MemoryCollector,
    collecting: bool,
) -> EventCollector {
    let connector = Box::new(connector.clone());
    let sink = Arc::new(sink.clone());
    let collector = if collecting {
        EventCollector::spawn_collecting(test_config(), connector, sink)
    } else {
        EventCollector::spawn(test_config(), connector, sink)
    };
    collector.expect("collector thread starts")
}

#[test]
fn test_collects_autonomous_messages() {
    let stream = format!("{LOGIN_COMPLD}{ALARM}{KEEP_ALIVE}{DBCHG}");
    let connector = ScriptedConnector::single(vec![Reply::Text(stream)]);
    let sink = MemoryCollector::new();

    let collector = spawn(&connector, &sink, true);

    assert!(wait_for(|| sink.len() == 2));
    collector.join();

    let lines = sink.lines();
    let alarm = parse(&lines[0]);
    assert_eq!(alarm["kind"], "Autonomous");
    assert_eq!(alarm["code"], "**");
    assert_eq!(alarm["tag"], "2041");
    assert_eq!(alarm["aid"], "SLOT-1-4");
    assert_eq!(parse(&lines[1])["tag"], "2042");

    assert_eq!(connector.attempts(), 1);
    assert_eq!(connector.writes(), vec!["ACT-USER::admin:1::secret;\r\n"]);
}

#[test]
fn test_stopped_collector_discards_messages() {
    let stream = format!("{LOGIN_COMPLD}{ALARM}");
    let connector = ScriptedConnector::single(vec![Reply::Text(stream)]);
    let sink = MemoryCollector::new();

    let collector = spawn(&connector, &sink, false);
    assert!(!collector.is_collecting());

    assert!(wait_for(|| connector.writes().len() == 1));
    std::thread::sleep(Duration::from_millis(100));
    assert!(sink.is_empty());

    collector.start();
    assert!(collector.is_collecting());
    collector.stop();
    assert!(!collector.is_collecting());
    collector.join();
}

#[test]
fn test_login_is_retried_until_accepted() {
    let connector = ScriptedConnector::new(vec![
        None,
        Some(vec![Reply::text(LOGIN_DENY)]),
        Some(vec![Reply::Text(format!("{LOGIN_COMPLD}{ALARM}"))]),
    ]);
    let sink = MemoryCollector::new();

    let collector = spawn(&connector, &sink, true);

    assert!(wait_for(|| sink.len() == 1));
    collector.join();

    assert_eq!(connector.attempts(), 3);
    assert_eq!(
        connector.writes(),
        vec!["ACT-USER::admin:1::secret;\r\n", "ACT-USER::admin:2::secret;\r\n"]
    );
}

#[test]
fn test_disconnect_returns_to_login() {
    let connector = ScriptedConnector::new(vec![
        Some(vec![Reply::Final(format!("{LOGIN_COMPLD}{ALARM}"))]),
        Some(vec![Reply::Text(format!("{LOGIN_COMPLD}{DBCHG}"))]),
    ]);
    let sink = MemoryCollector::new();

    let collector = spawn(&connector, &sink, true);

    assert!(wait_for(|| sink.len() == 2));
    collector.join();

    assert_eq!(connector.attempts(), 2);
    let tags: Vec<serde_json::Value> = sink
        .lines()
        .iter()
        .map(|line| parse(line)["tag"].clone())
        .collect();
    assert_eq!(tags, vec!["2041", "2042"]);
}

#[test]
fn test_terminate_is_observed_within_one_read() {
    let connector = ScriptedConnector::single(vec![Reply::text(LOGIN_COMPLD)]);
    let collector = spawn(&connector, &MemoryCollector::new(), false);

    assert!(wait_for(|| connector.writes().len() == 1));
    assert!(collector.is_running());

    collector.terminate();
    assert!(wait_for(|| !collector.is_running()));
    collector.join();
}

#[test]
fn test_terminate_interrupts_login_retries() {
    let connector = ScriptedConnector::new(Vec::new());
    let collector = spawn(&connector, &MemoryCollector::new(), false);

    assert!(wait_for(|| connector.attempts() >= 2));
    collector.terminate();
    assert!(wait_for(|| !collector.is_running()));
}
