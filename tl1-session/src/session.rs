//! One network element: a command client plus an event collector

use std::sync::Arc;

use tl1_client::Connector;

use crate::collector::EventCollector;
use crate::command::{CommandClient, CommandOutcome};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::report::ReportSink;
use crate::sink::CollectorSink;

/// Command and event connections of one piece of equipment
///
/// Both connections share one [`SessionConfig`] and are otherwise independent.
#[derive(Debug)]
pub struct Session {
    command: CommandClient,
    events: EventCollector,
}

impl Session {
    /// Open both connections over TCP
    pub fn open(
        config: SessionConfig,
        report: Arc<dyn ReportSink>,
        sink: Arc<dyn CollectorSink>,
    ) -> Result<Self> {
        let command_connector = Box::new(config.command_connector());
        let event_connector = Box::new(config.event_connector());
        Self::with_connectors(config, command_connector, event_connector, report, sink)
    }

    /// Build a session over caller supplied connectors
    pub fn with_connectors(
        config: SessionConfig,
        command_connector: Box<dyn Connector>,
        event_connector: Box<dyn Connector>,
        report: Arc<dyn ReportSink>,
        sink: Arc<dyn CollectorSink>,
    ) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "[{}] Opening session to {}",
            config.label,
            command_connector.describe()
        );

        let events = EventCollector::spawn(config.clone(), event_connector, sink)?;
        let command = CommandClient::new(config, command_connector, report);
        Ok(Self { command, events })
    }

    pub fn label(&self) -> &str {
        &self.command.config().label
    }

    pub fn command(&mut self) -> &mut CommandClient {
        &mut self.command
    }

    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    /// Log out, stop the collector and wait for its thread
    pub fn close(mut self) -> CommandOutcome {
        let outcome = self.command.logout();
        self.events.join();
        tracing::info!("[{}] Session closed", self.command.config().label);
        outcome
    }
}
