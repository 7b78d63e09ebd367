//! Configuration for one equipment session
//!
//! A [`SessionConfig`] is shared by the command client and the event
//! collector of the same network element.

use std::time::Duration;

use tl1_client::{TcpConnector, DEFAULT_KEEP_ALIVE_LIMIT, DEFAULT_LINE_TERMINATOR};

use crate::error::{Result, SessionError};

/// Connection and timing settings for one network element
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Equipment label used to attribute report entries
    /// Default: "NE"
    pub label: String,

    /// Host name or address of the TL1 gateway
    /// Default: "127.0.0.1"
    pub host: String,

    /// Port of the command connection
    /// Default: 3083
    pub command_port: u16,

    /// Port of the autonomous event connection
    /// Default: 3083
    pub event_port: u16,

    /// User for ACT-USER
    pub user: String,

    /// Password for ACT-USER
    pub password: String,

    /// TCP connect timeout
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Timeout used by login and logout
    /// Default: 30 seconds
    pub command_timeout: Duration,

    /// Delay between polls of `execute_until`
    /// Default: 1 second
    pub poll_interval: Duration,

    /// Delay between reconnect attempts of the command client
    /// Default: 1 second
    pub reconnect_interval: Duration,

    /// Delay between login attempts of the event collector
    /// Default: 1 second
    pub auth_retry_interval: Duration,

    /// Per-read timeout of the event collector, bounds how long terminate takes
    /// Default: 10 seconds
    pub event_read_timeout: Duration,

    /// Consecutive keep-alive frames absorbed by one read
    /// Default: 100
    pub keep_alive_limit: usize,

    /// Appended to every command sent
    /// Default: "\r\n"
    pub line_terminator: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            label: "NE".to_string(),
            host: "127.0.0.1".to_string(),
            command_port: 3083,
            event_port: 3083,
            user: String::new(),
            password: String::new(),
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            reconnect_interval: Duration::from_secs(1),
            auth_retry_interval: Duration::from_secs(1),
            event_read_timeout: Duration::from_secs(10),
            keep_alive_limit: DEFAULT_KEEP_ALIVE_LIMIT,
            line_terminator: DEFAULT_LINE_TERMINATOR.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn new(label: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            host: host.into(),
            ..Default::default()
        }
    }

    /// Short intervals for simulators and loopback equipment
    pub fn fast_retry() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            reconnect_interval: Duration::from_millis(100),
            auth_retry_interval: Duration::from_millis(100),
            event_read_timeout: Duration::from_secs(1),
            ..Default::default()
        }
    }

    /// Long timeouts for equipment that answers slowly, e.g. while rebooting cards
    pub fn patient() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            command_timeout: Duration::from_secs(120),
            reconnect_interval: Duration::from_secs(5),
            auth_retry_interval: Duration::from_secs(5),
            ..Default::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SessionError::Config("Host must not be empty".to_string()));
        }

        if self.command_port == 0 || self.event_port == 0 {
            return Err(SessionError::Config("Ports must be greater than 0".to_string()));
        }

        let timings = [
            ("connect timeout", self.connect_timeout),
            ("command timeout", self.command_timeout),
            ("poll interval", self.poll_interval),
            ("reconnect interval", self.reconnect_interval),
            ("auth retry interval", self.auth_retry_interval),
            ("event read timeout", self.event_read_timeout),
        ];
        if let Some((name, _)) = timings.iter().find(|(_, value)| value.is_zero()) {
            return Err(SessionError::Config(format!("The {name} must be greater than 0")));
        }

        if self.keep_alive_limit == 0 {
            return Err(SessionError::Config(
                "Keep-alive limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Connector for the command connection
    pub fn command_connector(&self) -> TcpConnector {
        TcpConnector::new(self.host.clone(), self.command_port, self.connect_timeout)
    }

    /// Connector for the event connection
    pub fn event_connector(&self) -> TcpConnector {
        TcpConnector::new(self.host.clone(), self.event_port, self.connect_timeout)
    }

    /// ACT-USER command for `ctag`
    pub(crate) fn login_command(&self, ctag: u32) -> String {
        format!("ACT-USER::{}:{}::{};", self.user, ctag, self.password)
    }

    // Builder methods

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_ports(mut self, command_port: u16, event_port: u16) -> Self {
        self.command_port = command_port;
        self.event_port = event_port;
        self
    }

    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry_intervals(mut self, reconnect: Duration, auth: Duration) -> Self {
        self.reconnect_interval = reconnect;
        self.auth_retry_interval = auth;
        self
    }

    pub fn with_event_read_timeout(mut self, timeout: Duration) -> Self {
        self.event_read_timeout = timeout;
        self
    }

    pub fn with_keep_alive_limit(mut self, limit: usize) -> Self {
        self.keep_alive_limit = limit;
        self
    }

    pub fn with_line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl1_client::Connector;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.command_port, 3083);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.event_read_timeout, Duration::from_secs(10));
        assert_eq!(config.keep_alive_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(SessionConfig::fast_retry().validate().is_ok());
        assert!(SessionConfig::patient().validate().is_ok());
        assert!(
            SessionConfig::fast_retry().reconnect_interval
                < SessionConfig::patient().reconnect_interval
        );
    }

    #[test]
    fn test_config_validation() {
        let empty_host = SessionConfig::new("NE-1", "  ");
        assert!(empty_host.validate().is_err());

        let zero_timeout = SessionConfig::default().with_event_read_timeout(Duration::ZERO);
        match zero_timeout.validate() {
            Err(SessionError::Config(message)) => assert!(message.contains("event read timeout")),
            other => panic!("unexpected validation result: {other:?}"),
        }

        let zero_limit = SessionConfig::default().with_keep_alive_limit(0);
        assert!(zero_limit.validate().is_err());
    }

    #[test]
    fn test_builder_and_login_command() {
        let config = SessionConfig::new("NE-1", "10.0.0.5")
            .with_ports(3083, 3082)
            .with_credentials("admin", "secret");

        assert_eq!(config.login_command(7), "ACT-USER::admin:7::secret;");
        assert_eq!(config.command_connector().describe(), "10.0.0.5:3083");
        assert_eq!(config.event_connector().describe(), "10.0.0.5:3082");
    }
}
