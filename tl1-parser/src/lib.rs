//! # tl1-parser
//!
//! Decoding of TL1 (Transaction Language 1) messages and a declarative match
//! engine over the decoded result.
//!
//! A raw frame is routed by its ident line: autonomous codes (`*C`, `**`, `*`,
//! `A`, `I`) go to the autonomous decoder, `M` responses are dispatched on the
//! verb found in the text to one of several body grammars ([`Shape`]).
//!
//! ## Usage
//!
//! ```rust
//! use tl1_parser::{decode, Filter, Rule};
//!
//! let raw = concat!(
//!     "\n   NE-1 24-03-05 10:00:00\n",
//!     "M  7 COMPLD\n",
//!     "   \"FAC-1-1::RATE=10G:IS-NR\"\n",
//!     "   /* RTRV-FAC::ALL [7] (1) */\n",
//!     ";\n",
//! );
//! let message = decode(raw).unwrap();
//! assert_eq!(message.aids(), vec!["FAC-1-1"]);
//!
//! let mut filter = Filter::new();
//! filter.add_pst("IS-NR");
//! assert!(filter.evaluate(&message, Rule::Or, Rule::Or, Rule::Or).matched);
//! ```

pub mod error;
pub mod filter;
pub mod model;
pub mod router;
mod shapes;

pub use error::{DecodeError, DecodeResult};
pub use filter::{Filter, FilterResult, Match, Rule};
pub use model::{
    AutonomousEvent, BodyByAid, CommandResponse, DecodeWarning, ErrorFrame, MessageCode,
    MessageKind, MessageModel, ResponseStatus, Row, Values,
};
pub use router::{decode, ident_code, route, Route, Shape};

/// Marker carried by the equipment's liveness pings
pub const KEEP_ALIVE_MARKER: &str = "KEEP ALIVE MESSAGE";
