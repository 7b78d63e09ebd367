//! Background collection of autonomous messages
//!
//! The [`EventCollector`] owns the event connection of one network element
//! and runs on a dedicated thread for the lifetime of the session:
//!
//! 1. `auth_init` connects and sends ACT-USER every `auth_retry_interval`
//!    until the login is accepted or shutdown is requested.
//! 2. `event_loop` reads frames with `event_read_timeout`; a timeout only
//!    re-checks the shutdown flag. Decoded autonomous messages are written
//!    to the [`CollectorSink`] as JSON while collection is enabled.
//! 3. A dropped connection returns to step 1.
//!
//! The caller and the thread share only a pair of flags behind one mutex.
//! [`EventCollector::terminate`] returns immediately; the thread notices it
//! after at most one pending read.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;
use tl1_client::{Channel, ChannelError, Connector, ReadOutcome, Role};
use tl1_parser::decode;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::exchange::act_user;
use crate::sink::CollectorSink;

#[derive(Debug, Default)]
struct Flags {
    /// Set once by `terminate`, never cleared
    shutdown_requested: bool,
    collection_enabled: bool,
}

/// Handle to the collector thread
#[derive(Debug)]
pub struct EventCollector {
    label: String,
    flags: Arc<Mutex<Flags>>,
    handle: Option<JoinHandle<()>>,
}

impl EventCollector {
    /// Start the thread with collection disabled
    pub fn spawn(
        config: SessionConfig,
        connector: Box<dyn Connector>,
        sink: Arc<dyn CollectorSink>,
    ) -> Result<Self> {
        Self::spawn_with(config, connector, sink, false)
    }

    /// Start the thread with collection already enabled
    pub fn spawn_collecting(
        config: SessionConfig,
        connector: Box<dyn Connector>,
        sink: Arc<dyn CollectorSink>,
    ) -> Result<Self> {
        Self::spawn_with(config, connector, sink, true)
    }

    fn spawn_with(
        config: SessionConfig,
        connector: Box<dyn Connector>,
        sink: Arc<dyn CollectorSink>,
        collecting: bool,
    ) -> Result<Self> {
        let label = config.label.clone();
        let flags = Arc::new(Mutex::new(Flags {
            shutdown_requested: false,
            collection_enabled: collecting,
        }));

        let worker = CollectorWorker {
            config,
            connector,
            sink,
            flags: Arc::clone(&flags),
            ctag: 0,
        };

        let handle = thread::Builder::new()
            .name(format!("tl1-events-{label}"))
            .spawn(move || worker.run())
            .map_err(SessionError::Spawn)?;

        tracing::info!("[{}] Event collector started", label);
        Ok(Self {
            label,
            flags,
            handle: Some(handle),
        })
    }

    /// Forward autonomous messages to the sink
    pub fn start(&self) {
        self.flags.lock().collection_enabled = true;
        tracing::debug!("[{}] Event collection enabled", self.label);
    }

    /// Keep reading but discard autonomous messages
    pub fn stop(&self) {
        self.flags.lock().collection_enabled = false;
        tracing::debug!("[{}] Event collection disabled", self.label);
    }

    /// Ask the thread to exit; does not wait for it
    pub fn terminate(&self) {
        let mut flags = self.flags.lock();
        if !flags.shutdown_requested {
            flags.shutdown_requested = true;
            tracing::info!("[{}] Event collector shutdown requested", self.label);
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.flags.lock().collection_enabled
    }

    /// Whether the thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Terminate and wait for the thread to exit
    pub fn join(mut self) {
        self.terminate();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("[{}] Event collector thread panicked", self.label);
            }
        }
    }
}

impl Drop for EventCollector {
    fn drop(&mut self) {
        self.terminate();
    }
}

struct CollectorWorker {
    config: SessionConfig,
    connector: Box<dyn Connector>,
    sink: Arc<dyn CollectorSink>,
    flags: Arc<Mutex<Flags>>,
    ctag: u32,
}

impl CollectorWorker {
    fn run(mut self) {
        while !self.shutdown_requested() {
            let Some(channel) = self.auth_init() else {
                break;
            };
            self.event_loop(channel);
        }
        tracing::info!("[{}] Event collector stopped", self.config.label);
    }

    fn shutdown_requested(&self) -> bool {
        self.flags.lock().shutdown_requested
    }

    fn collection_enabled(&self) -> bool {
        self.flags.lock().collection_enabled
    }

    /// Connect and log in, retrying until success or shutdown
    fn auth_init(&mut self) -> Option<Channel> {
        let mut attempts = 0u32;
        while !self.shutdown_requested() {
            attempts += 1;
            match self.try_login() {
                Ok(channel) => {
                    tracing::info!(
                        "[{}] Event channel authenticated after {} attempts",
                        self.config.label,
                        attempts
                    );
                    return Some(channel);
                }
                Err(e) => {
                    tracing::debug!(
                        "[{}] Event channel login attempt {} failed: {}",
                        self.config.label,
                        attempts,
                        e
                    );
                }
            }
            thread::sleep(self.config.auth_retry_interval);
        }
        None
    }

    fn try_login(&mut self) -> std::result::Result<Channel, ChannelError> {
        let mut channel = Channel::open(self.connector.as_ref(), Role::Event)?
            .with_keep_alive_limit(self.config.keep_alive_limit)
            .with_line_terminator(self.config.line_terminator.clone());

        self.ctag += 1;
        let login = self.config.login_command(self.ctag);
        let deadline = Instant::now() + self.config.event_read_timeout;
        match act_user(&mut channel, &login, deadline) {
            Ok(true) => Ok(channel),
            Ok(false) => {
                channel.close();
                Err(ChannelError::Connect(format!(
                    "{}: login rejected",
                    self.connector.describe()
                )))
            }
            Err(e) => {
                channel.close();
                Err(e)
            }
        }
    }

    /// Read autonomous messages until shutdown or a transport failure
    fn event_loop(&mut self, mut channel: Channel) {
        loop {
            if self.shutdown_requested() {
                channel.close();
                return;
            }

            let deadline = Instant::now() + self.config.event_read_timeout;
            match channel.read_frame(deadline) {
                Ok(ReadOutcome::Message(raw)) => self.handle_message(&raw),
                Ok(ReadOutcome::Idle) | Err(ChannelError::Timeout) => continue,
                Err(e) => {
                    tracing::warn!("[{}] Event channel lost: {}", self.config.label, e);
                    channel.close();
                    return;
                }
            }
        }
    }

    fn handle_message(&self, raw: &str) {
        let message = match decode(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("[{}] Dropping undecodable event frame: {}", self.config.label, e);
                return;
            }
        };

        if !message.is_autonomous() {
            tracing::debug!(
                "[{}] Ignoring response {} on event channel",
                self.config.label,
                message.tag()
            );
            return;
        }
        if !self.collection_enabled() {
            return;
        }

        match message.to_json() {
            Ok(json) => {
                if let Err(e) = self.sink.append(&json) {
                    tracing::error!(
                        "[{}] Failed to write collected event: {}",
                        self.config.label,
                        e
                    );
                }
            }
            Err(e) => tracing::warn!("[{}] Failed to serialize event: {}", self.config.label, e),
        }
    }
}
