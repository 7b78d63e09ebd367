//! # tl1-session
//!
//! A sync-first TL1 session manager for one network element.
//!
//! - [`CommandClient`]: blocking request/response over the command
//!   connection, with deadline-bounded reconnects and one report entry per
//!   call.
//! - [`EventCollector`]: a background thread on a second connection that logs
//!   in, decodes autonomous messages and appends them as JSON lines to a
//!   [`CollectorSink`].
//! - [`Session`]: both of the above sharing one [`SessionConfig`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tl1_session::prelude::*;
//!
//! tl1_session::logging::init_logging_from_env()?;
//!
//! let config = SessionConfig::new("NE-1", "10.0.0.5").with_credentials("admin", "secret");
//! let report = Arc::new(TracingReport::new());
//! let sink = Arc::new(JsonLinesCollector::create("events.jsonl")?);
//!
//! let mut session = Session::open(config, report, sink)?;
//! session.command().login();
//! session.events().start();
//! session
//!     .command()
//!     .execute_until("RTRV-FAC::FAC-1-1-1:3;", Duration::from_secs(60), "IS-NR");
//! session.close();
//! ```

pub mod collector;
pub mod command;
pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod report;
pub mod session;
pub mod sink;

pub use collector::EventCollector;
pub use command::{CommandClient, CommandOutcome, Policy};
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use report::{MemoryReport, ReportEntry, ReportSink, TracingReport, Verdict};
pub use session::Session;
pub use sink::{CollectorSink, JsonLinesCollector, MemoryCollector};

/// Everything needed to drive a session
pub mod prelude {
    pub use crate::{
        CollectorSink, CommandClient, CommandOutcome, EventCollector, JsonLinesCollector,
        MemoryCollector, MemoryReport, Policy, ReportSink, Session, SessionConfig, SessionError,
        TracingReport,
    };
    pub use tl1_parser::{Filter, MessageModel, Rule};
}
