//! Session bundling over scripted connections

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use tl1_client::testing::{Reply, ScriptedConnector};
use tl1_session::prelude::*;
use tl1_session::Verdict;

#[test]
fn test_session_runs_both_connections() {
    let command = ScriptedConnector::single(vec![
        Reply::text(LOGIN_COMPLD),
        Reply::Text(fac_response(2, "IS-NR")),
        Reply::Silence,
    ]);
    let events = ScriptedConnector::single(vec![Reply::Text(format!("{LOGIN_COMPLD}{ALARM}"))]);
    let report = Arc::new(MemoryReport::new());
    let sink = MemoryCollector::new();

    let mut session = Session::with_connectors(
        test_config(),
        Box::new(command.clone()),
        Box::new(events.clone()),
        report.clone(),
        Arc::new(sink.clone()),
    )
    .unwrap();
    assert_eq!(session.label(), "NE-1");

    session.events().start();
    assert!(session.command().login().success);

    let outcome = session.command().execute(
        "RTRV-FAC::FAC-1-1-1:2;",
        Policy::Cond,
        Duration::from_secs(2),
        Some(("IS-NR", "")),
    );
    assert!(outcome.success, "{}", outcome.summary());

    let mut filter = Filter::new();
    filter.add_pst("IS-NR");
    let matched = filter.evaluate(outcome.message.as_ref().unwrap(), Rule::Or, Rule::Or, Rule::Or);
    assert_eq!(matched.aids(), vec!["FAC-1-1-1"]);

    assert!(wait_for(|| sink.len() == 1));

    let logout = session.close();
    assert!(logout.success);
    assert_eq!(report.count(Verdict::Success), 3);
    assert_eq!(command.writes().last().map(String::as_str), Some("CANC-USER;\r\n"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = test_config().with_host("");
    let result = Session::with_connectors(
        config,
        Box::new(ScriptedConnector::single(Vec::new())),
        Box::new(ScriptedConnector::single(Vec::new())),
        Arc::new(MemoryReport::new()),
        Arc::new(MemoryCollector::new()),
    );
    assert!(matches!(result, Err(SessionError::Config(_))));
}
