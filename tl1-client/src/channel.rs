//! Framed TL1 reads over one live connection
//!
//! A [`Channel`] turns the byte stream into complete messages. Lines are
//! accumulated until a `;` terminator closes a segment; a `>` line closes a
//! segment that continues in the next frame. Closed segments that are noise
//! (keep-alive pings anywhere, autonomous reports on the command channel) are
//! dropped, and the remaining text is returned as one message.
//!
//! The equipment may ping continuously, so the number of consecutive noise
//! segments absorbed by one read is bounded by the keep-alive limit. Reaching
//! it yields [`ReadOutcome::Idle`] and the caller decides whether its own
//! deadline allows another read.

use std::time::{Duration, Instant};

use tl1_parser::{ident_code, KEEP_ALIVE_MARKER};

use crate::error::{ChannelError, Result};
use crate::transport::{is_timeout, Connector, Transport};

/// Consecutive noise segments absorbed before a read reports [`ReadOutcome::Idle`]
pub const DEFAULT_KEEP_ALIVE_LIMIT: usize = 100;

/// Line terminator appended to outgoing commands
pub const DEFAULT_LINE_TERMINATOR: &str = "\r\n";

/// Per-read window while flushing stale bytes before a write
const STALE_READ: Duration = Duration::from_millis(20);

/// Upper bound on stale bytes discarded before a write
const STALE_FLUSH_LIMIT: usize = 1 << 20;

/// What a connection is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Request/response traffic, autonomous reports are noise
    Command,
    /// Autonomous report stream
    Event,
}

/// Result of [`Channel::read_frame`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete message
    Message(String),
    /// Only noise arrived up to the keep-alive limit
    Idle,
}

/// One connection to a network element
pub struct Channel {
    transport: Box<dyn Transport>,
    role: Role,
    endpoint: String,
    /// Bytes after the last complete line
    pending: Vec<u8>,
    /// Kept text of the message being assembled
    frame: String,
    /// Offset in `frame` where the open segment begins
    segment_start: usize,
    noise_count: usize,
    keep_alive_limit: usize,
    line_terminator: String,
    last_raw: String,
}

impl Channel {
    /// Connect through `connector` and wrap the transport
    pub fn open(connector: &dyn Connector, role: Role) -> Result<Self> {
        let endpoint = connector.describe();
        let transport = connector.connect()?;
        tracing::info!("Opened {:?} channel to {}", role, endpoint);
        Ok(Self::new(transport, role).with_endpoint(endpoint))
    }

    pub fn new(transport: Box<dyn Transport>, role: Role) -> Self {
        Self {
            transport,
            role,
            endpoint: String::from("unknown"),
            pending: Vec::new(),
            frame: String::new(),
            segment_start: 0,
            noise_count: 0,
            keep_alive_limit: DEFAULT_KEEP_ALIVE_LIMIT,
            line_terminator: DEFAULT_LINE_TERMINATOR.to_string(),
            last_raw: String::new(),
        }
    }

    pub fn with_keep_alive_limit(mut self, limit: usize) -> Self {
        self.keep_alive_limit = limit.max(1);
        self
    }

    pub fn with_line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Text of the last message returned by [`read_frame`](Self::read_frame)
    pub fn last_raw(&self) -> &str {
        &self.last_raw
    }

    /// Send one command
    ///
    /// Anything still buffered from earlier traffic is discarded first so the
    /// next read starts on the response to this command.
    pub fn write(&mut self, command: &str) -> Result<()> {
        self.flush_stale()?;

        tracing::debug!("[{}] >> {}", self.endpoint, command);
        let mut line = String::with_capacity(command.len() + self.line_terminator.len());
        line.push_str(command);
        line.push_str(&self.line_terminator);
        self.transport.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read until a complete message, the keep-alive limit or `deadline`
    pub fn read_frame(&mut self, deadline: Instant) -> Result<ReadOutcome> {
        let mut buf = [0u8; 4096];
        loop {
            while let Some(line) = self.next_line() {
                if let Some(outcome) = self.accept_line(&line) {
                    return Ok(outcome);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ChannelError::Timeout);
            }

            match self.transport.read_timeout(&mut buf, deadline - now) {
                Ok(0) => {
                    tracing::warn!("[{}] Connection closed by peer", self.endpoint);
                    return Err(ChannelError::Disconnected);
                }
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if is_timeout(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn close(&mut self) {
        tracing::debug!("[{}] Closing {:?} channel", self.endpoint, self.role);
        self.transport.shutdown();
    }

    fn flush_stale(&mut self) -> Result<()> {
        let mut discarded = self.pending.len() + self.frame.len();
        self.pending.clear();
        self.frame.clear();
        self.segment_start = 0;
        self.noise_count = 0;

        let mut buf = [0u8; 4096];
        while discarded < STALE_FLUSH_LIMIT {
            match self.transport.read_timeout(&mut buf, STALE_READ) {
                Ok(0) => return Err(ChannelError::Disconnected),
                Ok(n) => discarded += n,
                Err(e) if is_timeout(&e) => break,
                Err(e) => return Err(e.into()),
            }
        }

        if discarded > 0 {
            tracing::debug!("[{}] Discarded {} stale bytes", self.endpoint, discarded);
        }
        Ok(())
    }

    fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        let line = String::from_utf8_lossy(&raw);
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn accept_line(&mut self, line: &str) -> Option<ReadOutcome> {
        self.frame.push_str(line);
        self.frame.push('\n');

        let marker = line.trim_start();
        if marker.starts_with('>') {
            self.close_segment();
            return None;
        }
        if !marker.starts_with(';') {
            return None;
        }

        if self.close_segment() {
            self.noise_count += 1;
            if self.noise_count >= self.keep_alive_limit {
                tracing::debug!(
                    "[{}] {} consecutive noise frames, returning idle",
                    self.endpoint,
                    self.noise_count
                );
                self.noise_count = 0;
                return Some(ReadOutcome::Idle);
            }
            return None;
        }

        let message = std::mem::take(&mut self.frame);
        self.segment_start = 0;
        self.noise_count = 0;
        tracing::trace!("[{}] << {}", self.endpoint, message);
        self.last_raw.clone_from(&message);
        Some(ReadOutcome::Message(message))
    }

    /// Close the open segment, dropping it when it is noise
    ///
    /// Returns whether the segment was dropped.
    fn close_segment(&mut self) -> bool {
        let segment = &self.frame[self.segment_start..];
        let noise = self.is_noise(segment);
        if noise {
            self.frame.truncate(self.segment_start);
        } else {
            self.segment_start = self.frame.len();
        }
        noise
    }

    fn is_noise(&self, segment: &str) -> bool {
        if segment.contains(KEEP_ALIVE_MARKER) {
            return true;
        }

        let has_content = segment
            .lines()
            .map(str::trim)
            .any(|line| !line.is_empty() && !line.starts_with(';') && !line.starts_with('>'));
        if !has_content {
            return true;
        }

        self.role == Role::Command
            && ident_code(segment).is_ok_and(|code| code.is_autonomous())
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("role", &self.role)
            .field("endpoint", &self.endpoint)
            .field("keep_alive_limit", &self.keep_alive_limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedTransport};

    const COMPLD: &str = concat!(
        "\n   NE-1 24-03-05 10:00:00\n",
        "M  1 COMPLD\n",
        "   \"FAC-1-1::RATE=10GE:IS-NR\"\n",
        "   /* RTRV-FAC::ALL [1] */\n",
        ";\n",
    );
    const KEEP_ALIVE: &str = concat!(
        "\n   NE-1 24-03-05 10:00:00\n",
        "A  0 REPT EVT SESSION\n",
        "   \"KEEP ALIVE MESSAGE\"\n",
        ";\n",
    );
    const ALARM: &str = concat!(
        "\n   NE-1 24-03-05 10:00:00\n",
        "** 17 REPT ALM EQPT\n",
        "   \"SLOT-1-4:MJ,REPLUNITMISS,SA\"\n",
        ";\n",
    );

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(2)
    }

    fn scripted(text: &str, role: Role) -> Channel {
        Channel::new(Box::new(ScriptedTransport::with_input(text)), role)
    }

    #[test]
    fn test_alarm_is_noise_on_command_channel_only() {
        let text = format!("{ALARM}{COMPLD}");

        let mut command = scripted(&text, Role::Command);
        assert_eq!(
            command.read_frame(deadline()).unwrap(),
            ReadOutcome::Message(COMPLD.to_string())
        );

        let mut event = scripted(&text, Role::Event);
        assert_eq!(
            event.read_frame(deadline()).unwrap(),
            ReadOutcome::Message(ALARM.to_string())
        );
        assert_eq!(event.last_raw(), ALARM);
    }

    #[test]
    fn test_keep_alive_limit_yields_idle() {
        let text = KEEP_ALIVE.repeat(3);
        let mut channel = scripted(&text, Role::Event).with_keep_alive_limit(3);
        assert_eq!(channel.read_frame(deadline()).unwrap(), ReadOutcome::Idle);
    }

    #[test]
    fn test_closed_stream_is_disconnect() {
        let transport = ScriptedTransport::with_input("M  1 COMP").closing();
        let mut channel = Channel::new(Box::new(transport), Role::Command);
        assert!(matches!(
            channel.read_frame(deadline()),
            Err(ChannelError::Disconnected)
        ));
    }

    #[test]
    fn test_write_appends_terminator() {
        let transport = ScriptedTransport::new(vec![Reply::Text(COMPLD.to_string())]);
        let writes = transport.writes();
        let mut channel =
            Channel::new(Box::new(transport), Role::Command).with_line_terminator(";\n");
        channel.write("RTRV-FAC::ALL:1").unwrap();
        assert_eq!(*writes.lock().unwrap(), vec!["RTRV-FAC::ALL:1;\n".to_string()]);
    }

    #[test]
    fn test_keep_alive_tolerance_below_limit() {
        let text = format!("{}{COMPLD}", KEEP_ALIVE.repeat(DEFAULT_KEEP_ALIVE_LIMIT - 1));
        let mut channel = scripted(&text, Role::Command);
        assert_eq!(
            channel.read_frame(deadline()).unwrap(),
            ReadOutcome::Message(COMPLD.to_string())
        );
    }

    #[test]
    fn test_continuation_frames_form_one_message() {
        let first = concat!(
            "\n   NE-1 24-03-05 10:00:00\n",
            "M  5 COMPLD\n",
            "   \"A-1,B-1:2WAY:CCT=ACT:IS-NR\"\n",
            ">\n",
        );
        let second = concat!(
            "\n   NE-1 24-03-05 10:00:01\n",
            "M  5 COMPLD\n",
            "   \"A-2,B-2:2WAY:CCT=ACT:IS-NR\"\n",
            "   /* RTRV-CRS-VC4::ALL [5] */\n",
            ";\n",
        );
        let text = format!("{first}{KEEP_ALIVE}{second}");

        let mut channel = scripted(&text, Role::Command);
        assert_eq!(
            channel.read_frame(deadline()).unwrap(),
            ReadOutcome::Message(format!("{first}{second}"))
        );
    }

    #[test]
    fn test_write_discards_stale_input() {
        let mut transport = ScriptedTransport::new(vec![Reply::Text(COMPLD.to_string())]);
        transport.push_input("\n   NE-1 24-03-05 09:59:00\nM  0 COMPLD\n   /* late */\n;\n");
        let mut channel = Channel::new(Box::new(transport), Role::Command);

        channel.write("RTRV-FAC::ALL:1;").unwrap();
        assert_eq!(
            channel.read_frame(deadline()).unwrap(),
            ReadOutcome::Message(COMPLD.to_string())
        );
    }

    #[test]
    fn test_partial_frame_times_out() {
        let mut channel = Channel::new(
            Box::new(ScriptedTransport::with_input("\n   NE-1 24-03-05 10:00:00\nM  1 COMPLD\n")),
            Role::Command,
        );
        let deadline = Instant::now() + Duration::from_millis(30);
        assert!(matches!(channel.read_frame(deadline), Err(ChannelError::Timeout)));
    }
}
