//! Blocking command client
//!
//! [`CommandClient`] owns the command connection of one network element. Every
//! call sends one command (or polls one command), judges the response against
//! a [`Policy`] and records exactly one entry in the [`ReportSink`].
//!
//! Transport failures never escape a call: the connection is torn down and
//! reopened every `reconnect_interval` until the call's deadline, logging in
//! again when the session had authenticated.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tl1_session::{CommandClient, Policy, SessionConfig, TracingReport};
//!
//! let config = SessionConfig::new("NE-1", "10.0.0.5").with_credentials("admin", "secret");
//! let connector = Box::new(config.command_connector());
//! let mut client = CommandClient::new(config, connector, Arc::new(TracingReport::new()));
//!
//! client.login();
//! let outcome = client.execute(
//!     "RTRV-FAC::FAC-1-1-1:2;",
//!     Policy::Cond,
//!     Duration::from_secs(10),
//!     Some(("IS-NR", "")),
//! );
//! assert!(outcome.success);
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tl1_client::{Channel, ChannelError, Connector, Role};
use tl1_parser::{decode, MessageModel};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::exchange::{act_user, first_state, format_state, is_completed, read_response};
use crate::report::ReportSink;

const LOGOUT_COMMAND: &str = "CANC-USER;";

/// How a response is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Success when the command completes
    Compld,
    /// Success when the equipment denies the command
    Deny,
    /// Success when the command completes and the first AID is in the expected state
    Cond,
}

/// Result of one client call
#[derive(Debug)]
pub struct CommandOutcome {
    pub success: bool,
    /// Raw text of the last response, empty when none arrived
    pub raw: String,
    pub message: Option<MessageModel>,
    pub error: Option<SessionError>,
    pub elapsed: Duration,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Human readable summary
    pub fn summary(&self) -> String {
        match &self.error {
            None => format!("success in {:?}", self.elapsed),
            Some(error) => format!("failure in {:?}: {}", self.elapsed, error),
        }
    }
}

/// Blocking request/response client for one network element
pub struct CommandClient {
    config: SessionConfig,
    connector: Box<dyn Connector>,
    report: Arc<dyn ReportSink>,
    channel: Option<Channel>,
    authenticated: bool,
    ctag: u32,
    last_raw: String,
    last_message: Option<MessageModel>,
}

impl CommandClient {
    /// Create a client; the connection is opened by the first call
    pub fn new(
        config: SessionConfig,
        connector: Box<dyn Connector>,
        report: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            config,
            connector,
            report,
            channel: None,
            authenticated: false,
            ctag: 0,
            last_raw: String::new(),
            last_message: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open the connection now instead of on the first call
    pub fn connect(&mut self) -> Result<()> {
        if self.channel.is_none() {
            let deadline = Instant::now() + self.config.connect_timeout;
            let channel = self.open_channel(deadline)?;
            self.channel = Some(channel);
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    pub fn disconnect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn last_raw(&self) -> &str {
        &self.last_raw
    }

    pub fn last_message(&self) -> Option<&MessageModel> {
        self.last_message.as_ref()
    }

    /// Log in with the configured credentials
    pub fn login(&mut self) -> CommandOutcome {
        self.reset_last();
        self.ctag += 1;
        let command = self.config.login_command(self.ctag);
        let title = format!("ACT-USER::{}:{}", self.config.user, self.ctag);

        // A reconnect inside this exchange must not log in on its own
        self.authenticated = false;

        let started = Instant::now();
        let deadline = started + self.config.command_timeout;
        let result = self
            .exchange(&command, deadline)
            .and_then(|raw| self.judge(&raw, Policy::Compld, None));

        if result.is_ok() {
            self.authenticated = true;
            tracing::info!("[{}] Logged in as {}", self.config.label, self.config.user);
        }
        self.finish(&title, started, result)
    }

    /// Send `CANC-USER;` without waiting for the answer
    pub fn logout(&mut self) -> CommandOutcome {
        self.logout_with(LOGOUT_COMMAND)
    }

    /// Send `command` and judge the response
    ///
    /// `cond` is the expected `(PST, SST)` of the first AID and only applies to
    /// [`Policy::Cond`]; states are `&`-joined, an empty SST means none.
    pub fn execute(
        &mut self,
        command: &str,
        policy: Policy,
        timeout: Duration,
        cond: Option<(&str, &str)>,
    ) -> CommandOutcome {
        if command.trim_start().starts_with("CANC-USER") {
            return self.logout_with(command);
        }

        self.reset_last();
        let started = Instant::now();
        let result = self
            .exchange(command, started + timeout)
            .and_then(|raw| self.judge(&raw, policy, cond));
        self.finish(command, started, result)
    }

    /// Poll `command` every `poll_interval` until the first AID's PST is `cond_pst`
    ///
    /// Records one report entry for the whole poll.
    pub fn execute_until(
        &mut self,
        command: &str,
        timeout: Duration,
        cond_pst: &str,
    ) -> CommandOutcome {
        self.reset_last();
        let started = Instant::now();
        let deadline = started + timeout;
        let mut polls = 0u32;

        let result = loop {
            polls += 1;
            let observed = match self.exchange(command, deadline) {
                Ok(raw) => match self.judge(&raw, Policy::Compld, None) {
                    Ok(()) => self
                        .last_message
                        .as_ref()
                        .and_then(first_state)
                        .map(|(pst, _)| pst),
                    Err(e) => {
                        tracing::debug!(
                            "[{}] Poll {} of {} failed: {}",
                            self.config.label,
                            polls,
                            command,
                            e
                        );
                        None
                    }
                },
                Err(e) => break Err(e),
            };

            if observed.as_deref() == Some(cond_pst) {
                tracing::debug!(
                    "[{}] {} reached {} after {} polls",
                    self.config.label,
                    command,
                    cond_pst,
                    polls
                );
                break Ok(());
            }

            if Instant::now() + self.config.poll_interval > deadline {
                break Err(SessionError::ConditionMismatch {
                    expected: cond_pst.to_string(),
                    observed: observed.unwrap_or_else(|| "no state".to_string()),
                });
            }
            thread::sleep(self.config.poll_interval);
        };

        let title = format!("{command} until PST {cond_pst}");
        self.finish(&title, started, result)
    }

    /// Record a step that was not run
    pub fn skip(&self, title: &str, reason: &str) {
        self.report.add_skipped(&self.config.label, title, None, reason);
    }

    fn logout_with(&mut self, command: &str) -> CommandOutcome {
        self.reset_last();
        let started = Instant::now();

        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.write(command) {
                tracing::debug!("[{}] Logout write failed: {}", self.config.label, e);
            }
            channel.close();
        }

        if self.authenticated {
            tracing::info!("[{}] Logged out", self.config.label);
        }
        self.authenticated = false;
        self.finish(command, started, Ok(()))
    }

    /// Send `command` and return the response text, reconnecting on failure
    ///
    /// Connection attempts are counted across the whole call; every attempt
    /// after the first waits `reconnect_interval`, so equipment that accepts
    /// and then drops the connection is retried at the same pace as one that
    /// refuses it. Running out of time after a drop is a reconnect failure,
    /// not a response timeout.
    fn exchange(&mut self, command: &str, deadline: Instant) -> Result<String> {
        let mut attempts = 0u32;
        let mut dropped = false;
        loop {
            let mut channel = match self.channel.take() {
                Some(channel) => channel,
                None => self.reconnect(deadline, &mut attempts)?,
            };

            let response = channel
                .write(command)
                .and_then(|()| read_response(&mut channel, deadline));

            match response {
                Ok(raw) => {
                    self.channel = Some(channel);
                    self.last_raw.clone_from(&raw);
                    return Ok(raw);
                }
                Err(ChannelError::Timeout) if dropped => {
                    channel.close();
                    tracing::error!(
                        "[{}] Connection to {} kept dropping until the deadline",
                        self.config.label,
                        self.connector.describe()
                    );
                    return Err(SessionError::ReconnectExhausted { attempts });
                }
                Err(ChannelError::Timeout) => {
                    self.channel = Some(channel);
                    tracing::warn!(
                        "[{}] No response to {} before the deadline",
                        self.config.label,
                        command
                    );
                    return Err(SessionError::Timeout);
                }
                Err(e) => {
                    tracing::warn!(
                        "[{}] {} failed: {}, reconnecting",
                        self.config.label,
                        command,
                        e
                    );
                    channel.close();
                    dropped = true;
                }
            }
        }
    }

    /// Open a new channel, waiting `reconnect_interval` before each attempt but
    /// the first of the call
    fn reconnect(&mut self, deadline: Instant, attempts: &mut u32) -> Result<Channel> {
        loop {
            if *attempts > 0 {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining < self.config.reconnect_interval {
                    tracing::error!(
                        "[{}] Giving up on {} after {} attempts",
                        self.config.label,
                        self.connector.describe(),
                        attempts
                    );
                    return Err(SessionError::ReconnectExhausted { attempts: *attempts });
                }
                thread::sleep(self.config.reconnect_interval);
            }

            *attempts += 1;
            match self.open_channel(deadline) {
                Ok(channel) => {
                    if *attempts > 1 {
                        tracing::info!(
                            "[{}] Reconnected on attempt {}",
                            self.config.label,
                            attempts
                        );
                    }
                    return Ok(channel);
                }
                Err(e) => {
                    tracing::warn!(
                        "[{}] Connection attempt {} to {} failed: {}",
                        self.config.label,
                        attempts,
                        self.connector.describe(),
                        e
                    );
                }
            }
        }
    }

    /// Connect and, when the session had logged in, log in again
    fn open_channel(&mut self, deadline: Instant) -> Result<Channel> {
        let mut channel = Channel::open(self.connector.as_ref(), Role::Command)?
            .with_keep_alive_limit(self.config.keep_alive_limit)
            .with_line_terminator(self.config.line_terminator.clone());

        if self.authenticated {
            self.ctag += 1;
            let login = self.config.login_command(self.ctag);
            if !act_user(&mut channel, &login, deadline)? {
                channel.close();
                return Err(ChannelError::Connect(format!(
                    "{}: login rejected",
                    self.connector.describe()
                ))
                .into());
            }
            tracing::debug!("[{}] Re-authenticated after reconnect", self.config.label);
        }
        Ok(channel)
    }

    fn judge(&mut self, raw: &str, policy: Policy, cond: Option<(&str, &str)>) -> Result<()> {
        let completed = is_completed(raw);
        let decoded = decode(raw);
        self.last_message = match &decoded {
            Ok(message) => Some(message.clone()),
            Err(e) => {
                tracing::warn!("[{}] Response could not be decoded: {}", self.config.label, e);
                None
            }
        };

        match policy {
            Policy::Deny if completed => Err(SessionError::UnexpectedCompletion),
            Policy::Deny => Ok(()),
            Policy::Compld | Policy::Cond if !completed => {
                Err(deny_error(self.last_message.as_ref()))
            }
            Policy::Compld => Ok(()),
            Policy::Cond => {
                let Some((pst, sst)) = cond else {
                    return Ok(());
                };
                let message = decoded?;
                let expected = format_state(pst, sst);
                match first_state(&message) {
                    Some((observed_pst, observed_sst))
                        if observed_pst == pst && observed_sst == sst =>
                    {
                        Ok(())
                    }
                    Some((observed_pst, observed_sst)) => Err(SessionError::ConditionMismatch {
                        expected,
                        observed: format_state(&observed_pst, &observed_sst),
                    }),
                    None => Err(SessionError::ConditionMismatch {
                        expected,
                        observed: "no AID".to_string(),
                    }),
                }
            }
        }
    }

    fn finish(&self, title: &str, started: Instant, result: Result<()>) -> CommandOutcome {
        let elapsed = started.elapsed();
        let reference = &self.config.label;
        match &result {
            Ok(()) => self
                .report
                .add_success(reference, title, Some(elapsed), &self.last_raw),
            Err(e) => self.report.add_failure(
                reference,
                title,
                Some(elapsed),
                &self.last_raw,
                &e.to_string(),
            ),
        }

        CommandOutcome {
            success: result.is_ok(),
            raw: self.last_raw.clone(),
            message: self.last_message.clone(),
            error: result.err(),
            elapsed,
        }
    }

    fn reset_last(&mut self) {
        self.last_raw.clear();
        self.last_message = None;
    }
}

impl Drop for CommandClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for CommandClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandClient")
            .field("label", &self.config.label)
            .field("endpoint", &self.connector.describe())
            .field("connected", &self.channel.is_some())
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

fn deny_error(message: Option<&MessageModel>) -> SessionError {
    match message.and_then(MessageModel::error_frame) {
        Some(frame) => SessionError::Deny {
            code: frame.code.clone(),
            lines: frame.free_lines.clone(),
        },
        None => SessionError::Deny {
            code: message
                .and_then(MessageModel::status)
                .map(|status| status.as_str().to_string())
                .unwrap_or_default(),
            lines: Vec::new(),
        },
    }
}
