//! # tl1-client
//!
//! One live TL1 connection: a byte [`Transport`] (TCP with telnet option
//! refusal in production) wrapped by a [`Channel`] that frames complete
//! messages, tolerates keep-alive pings and filters autonomous reports off the
//! command connection.
//!
//! ```rust,ignore
//! use std::time::{Duration, Instant};
//! use tl1_client::{Channel, ReadOutcome, Role, TcpConnector};
//!
//! let connector = TcpConnector::new("10.0.0.5", 3083, Duration::from_secs(5));
//! let mut channel = Channel::open(&connector, Role::Command)?;
//! channel.write("RTRV-HDR:::1;")?;
//! let deadline = Instant::now() + Duration::from_secs(10);
//! if let ReadOutcome::Message(text) = channel.read_frame(deadline)? {
//!     println!("{text}");
//! }
//! ```

pub mod channel;
pub mod error;
pub mod telnet;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use channel::{Channel, ReadOutcome, Role, DEFAULT_KEEP_ALIVE_LIMIT, DEFAULT_LINE_TERMINATOR};
pub use error::{ChannelError, Result};
pub use transport::{Connector, TcpConnector, TcpTransport, Transport};
