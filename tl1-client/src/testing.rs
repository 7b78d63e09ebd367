//! Scripted in-memory transport for tests
//!
//! A [`ScriptedTransport`] answers each written command with the next
//! [`Reply`] of its script. [`ScriptedConnector`] hands out one scripted
//! transport per connection attempt, which lets tests drive reconnects.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::error::{ChannelError, Result};
use crate::transport::{Connector, Transport};

/// Longest sleep of a read that finds nothing to return
const IDLE_READ: Duration = Duration::from_millis(5);

/// Shared record of every command written
pub type WriteLog = Arc<Mutex<Vec<String>>>;

/// Reaction to one written command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Make the text readable
    Text(String),
    /// Make the text readable, then report end of stream
    Final(String),
    /// Close the stream
    Disconnect,
    /// Send nothing
    Silence,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

#[derive(Debug)]
pub struct ScriptedTransport {
    readable: VecDeque<u8>,
    replies: VecDeque<Reply>,
    writes: WriteLog,
    closed: bool,
    close_when_drained: bool,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            readable: VecDeque::new(),
            replies: replies.into(),
            writes: WriteLog::default(),
            closed: false,
            close_when_drained: false,
        }
    }

    /// Transport with `text` readable before anything is written
    pub fn with_input(text: &str) -> Self {
        let mut transport = Self::new(Vec::new());
        transport.readable.extend(text.as_bytes());
        transport
    }

    /// Report end of stream once the readable bytes are consumed
    pub fn closing(mut self) -> Self {
        self.close_when_drained = true;
        self
    }

    /// Queue more unsolicited input
    pub fn push_input(&mut self, text: &str) {
        self.readable.extend(text.as_bytes());
    }

    fn with_log(mut self, writes: WriteLog) -> Self {
        self.writes = writes;
        self
    }

    pub fn writes(&self) -> WriteLog {
        Arc::clone(&self.writes)
    }
}

impl Transport for ScriptedTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted stream closed"));
        }

        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(String::from_utf8_lossy(bytes).into_owned());

        match self.replies.pop_front() {
            Some(Reply::Text(text)) => self.readable.extend(text.as_bytes()),
            Some(Reply::Final(text)) => {
                self.readable.extend(text.as_bytes());
                self.close_when_drained = true;
            }
            Some(Reply::Disconnect) => self.closed = true,
            Some(Reply::Silence) | None => {}
        }
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        if !self.readable.is_empty() {
            let n = buf.len().min(self.readable.len());
            for (slot, byte) in buf.iter_mut().zip(self.readable.drain(..n)) {
                *slot = byte;
            }
            return Ok(n);
        }

        if self.closed || self.close_when_drained {
            return Ok(0);
        }

        thread::sleep(timeout.min(IDLE_READ));
        Err(io::Error::new(io::ErrorKind::TimedOut, "scripted read timed out"))
    }

    fn shutdown(&mut self) {
        self.closed = true;
    }
}

/// Hands out one scripted transport per connection attempt
///
/// Attempts past the end of the script fail with [`ChannelError::Connect`].
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    scripts: Arc<Mutex<VecDeque<Option<Vec<Reply>>>>>,
    writes: WriteLog,
    attempts: Arc<Mutex<usize>>,
}

impl ScriptedConnector {
    /// One entry per connection attempt, `None` for a refused attempt
    pub fn new(scripts: Vec<Option<Vec<Reply>>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            writes: WriteLog::default(),
            attempts: Arc::new(Mutex::new(0)),
        }
    }

    /// A single connection answering with `replies`
    pub fn single(replies: Vec<Reply>) -> Self {
        Self::new(vec![Some(replies)])
    }

    /// Commands written on every connection handed out so far
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self) -> Result<Box<dyn Transport>> {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        let next = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Some(replies)) => Ok(Box::new(
                ScriptedTransport::new(replies).with_log(Arc::clone(&self.writes)),
            )),
            Some(None) => Err(ChannelError::Connect(format!("{}: refused", self.describe()))),
            None => Err(ChannelError::Connect(format!(
                "{}: script exhausted",
                self.describe()
            ))),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
