//! Decoded representation of a single TL1 message
//!
//! A [`MessageModel`] is produced once by the decoder and never mutated
//! afterwards. It is either a command response (with a completion status and a
//! body keyed by AID) or an autonomous message pushed by the equipment.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;

/// Ident-line code of a TL1 message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCode {
    /// `M`: response to a command
    M,
    /// `*C`: critical alarm
    AutonomousCritical,
    /// `**`: major alarm
    AutonomousMajor,
    /// `*`: minor alarm
    AutonomousMinor,
    /// `A`: non-alarm autonomous event
    AutonomousEvent,
    /// `I`: informational autonomous message
    AutonomousInfo,
}

impl MessageCode {
    /// Parse the first token of an ident line
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "M" => Some(Self::M),
            "*C" => Some(Self::AutonomousCritical),
            "**" => Some(Self::AutonomousMajor),
            "*" => Some(Self::AutonomousMinor),
            "A" => Some(Self::AutonomousEvent),
            "I" => Some(Self::AutonomousInfo),
            _ => None,
        }
    }

    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M => "M",
            Self::AutonomousCritical => "*C",
            Self::AutonomousMajor => "**",
            Self::AutonomousMinor => "*",
            Self::AutonomousEvent => "A",
            Self::AutonomousInfo => "I",
        }
    }

    pub fn is_autonomous(&self) -> bool {
        !matches!(self, Self::M)
    }

    /// Alarm codes carry `aid:body` lines
    pub fn is_alarm(&self) -> bool {
        matches!(
            self,
            Self::AutonomousCritical | Self::AutonomousMajor | Self::AutonomousMinor
        )
    }
}

impl Serialize for MessageCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Completion code of a command response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    Compld,
    Delay,
    Deny,
    Prtl,
    Rtrv,
    /// Completion code this decoder does not know; the body is not decoded
    Unknown,
}

impl ResponseStatus {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "COMPLD" => Some(Self::Compld),
            "DELAY" => Some(Self::Delay),
            "DENY" => Some(Self::Deny),
            "PRTL" => Some(Self::Prtl),
            "RTRV" => Some(Self::Rtrv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compld => "COMPLD",
            Self::Delay => "DELAY",
            Self::Deny => "DENY",
            Self::Prtl => "PRTL",
            Self::Rtrv => "RTRV",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResponseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error code and explanation lines of a DENY response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorFrame {
    /// Four-character error code, e.g. `IIAC`
    pub code: String,
    /// Remaining body lines, in order
    pub free_lines: Vec<String>,
}

/// Attribute values of a body row
///
/// Named shapes keep `attr=val` pairs in wire order. Positional shapes keep a
/// plain list addressed by 1-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Values {
    Named(Vec<(String, String)>),
    Positional(Vec<String>),
}

impl Values {
    /// Look up a value by attribute name, or by 1-based index for positional rows
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Values::Named(pairs) => pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            Values::Positional(list) => key
                .parse::<usize>()
                .ok()
                .and_then(|index| index.checked_sub(1))
                .and_then(|index| list.get(index))
                .map(String::as_str),
        }
    }

    /// All entries as `(key, value)`; positional keys are the 1-based index
    pub fn entries(&self) -> Vec<(Cow<'_, str>, &str)> {
        match self {
            Values::Named(pairs) => pairs
                .iter()
                .map(|(name, value)| (Cow::Borrowed(name.as_str()), value.as_str()))
                .collect(),
            Values::Positional(list) => list
                .iter()
                .enumerate()
                .map(|(index, value)| (Cow::Owned((index + 1).to_string()), value.as_str()))
                .collect(),
        }
    }

    pub fn positional(&self) -> Option<&[String]> {
        match self {
            Values::Positional(list) => Some(list),
            Values::Named(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Named(pairs) => pairs.len(),
            Values::Positional(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Values {
    fn default() -> Self {
        Values::Named(Vec::new())
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Values::Named(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (name, value) in pairs {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            Values::Positional(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for value in list {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}

/// One body line of a command response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    pub values: Values,
    pub pst: Vec<String>,
    pub sst: Vec<String>,
}

impl Row {
    pub fn named(pairs: Vec<(String, String)>) -> Self {
        Self {
            values: Values::Named(pairs),
            ..Default::default()
        }
    }

    pub fn positional(list: Vec<String>) -> Self {
        Self {
            values: Values::Positional(list),
            ..Default::default()
        }
    }

    pub fn with_states(mut self, pst: Vec<String>, sst: Vec<String>) -> Self {
        self.pst = pst;
        self.sst = sst;
        self
    }
}

/// Insertion-ordered mapping from AID to its rows
///
/// An AID seen again (for instance in a later continuation frame) gets the new
/// row appended; existing rows are never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyByAid {
    entries: Vec<(String, Vec<Row>)>,
    /// Position of each AID in `entries`
    index: HashMap<String, usize>,
}

impl BodyByAid {
    pub fn push(&mut self, aid: String, row: Row) {
        match self.index.get(&aid) {
            Some(&position) => self.entries[position].1.push(row),
            None => {
                self.index.insert(aid.clone(), self.entries.len());
                self.entries.push((aid, vec![row]));
            }
        }
    }

    pub fn get(&self, aid: &str) -> Option<&[Row]> {
        self.index
            .get(aid)
            .map(|&position| self.entries[position].1.as_slice())
    }

    pub fn aids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(aid, _)| aid.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.entries
            .iter()
            .map(|(aid, rows)| (aid.as_str(), rows.as_slice()))
    }

    /// Number of distinct AIDs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for BodyByAid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (aid, rows) in &self.entries {
            map.serialize_entry(aid, rows)?;
        }
        map.end()
    }
}

/// Payload of an `M` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub status: ResponseStatus,
    pub body: BodyByAid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_frame: Option<ErrorFrame>,
}

/// Payload of an autonomous message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutonomousEvent {
    /// Verb and modifiers from the ident line, e.g. `["REPT", "ALM", "EQPT"]`
    pub verb_and_modifiers: Vec<String>,
    pub aid: String,
    pub body_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum MessageKind {
    CommandResponse(CommandResponse),
    Autonomous(AutonomousEvent),
}

/// Non-fatal anomalies observed while decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning")]
pub enum DecodeWarning {
    /// No shape matched the verb and the STD fallback could not parse every row
    UnsupportedShape {
        verb: Option<String>,
        skipped_rows: usize,
    },
    /// A body line did not fit the grammar of its shape
    SkippedRow { line: String, reason: String },
    /// The ident line carried no recognised completion code
    UnknownStatus { token: String },
}

/// An immutable decoded TL1 message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageModel {
    sid: String,
    date: String,
    time: String,
    code: MessageCode,
    tag: String,
    #[serde(flatten)]
    kind: MessageKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<DecodeWarning>,
}

impl MessageModel {
    pub(crate) fn new(
        header: crate::shapes::Header,
        code: MessageCode,
        tag: String,
        kind: MessageKind,
        warnings: Vec<DecodeWarning>,
    ) -> Self {
        Self {
            sid: header.sid,
            date: header.date,
            time: header.time,
            code,
            tag,
            kind,
            warnings,
        }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn code(&self) -> MessageCode {
        self.code
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    pub fn is_autonomous(&self) -> bool {
        matches!(self.kind, MessageKind::Autonomous(_))
    }

    pub fn command_response(&self) -> Option<&CommandResponse> {
        match &self.kind {
            MessageKind::CommandResponse(response) => Some(response),
            MessageKind::Autonomous(_) => None,
        }
    }

    pub fn autonomous(&self) -> Option<&AutonomousEvent> {
        match &self.kind {
            MessageKind::Autonomous(event) => Some(event),
            MessageKind::CommandResponse(_) => None,
        }
    }

    /// Completion status, `None` for autonomous messages
    pub fn status(&self) -> Option<ResponseStatus> {
        self.command_response().map(|response| response.status)
    }

    pub fn body(&self) -> Option<&BodyByAid> {
        self.command_response().map(|response| &response.body)
    }

    pub fn error_frame(&self) -> Option<&ErrorFrame> {
        self.command_response()
            .and_then(|response| response.error_frame.as_ref())
    }

    /// AIDs of the response body, in wire order
    pub fn aids(&self) -> Vec<&str> {
        self.body()
            .map(|body| body.aids().collect())
            .unwrap_or_default()
    }

    /// Number of distinct AIDs in the response body
    pub fn response_size(&self) -> usize {
        self.body().map(BodyByAid::len).unwrap_or(0)
    }

    pub fn rows(&self, aid: &str) -> &[Row] {
        self.body().and_then(|body| body.get(aid)).unwrap_or(&[])
    }

    /// Every value of `attr` across all rows of `aid`
    pub fn attr_values(&self, aid: &str, attr: &str) -> Vec<&str> {
        self.rows(aid)
            .iter()
            .filter_map(|row| row.values.get(attr))
            .collect()
    }

    /// Primary states of the first row of `aid`
    pub fn first_pst(&self, aid: &str) -> Option<&[String]> {
        self.rows(aid).first().map(|row| row.pst.as_slice())
    }

    /// Secondary states of the first row of `aid`
    pub fn first_sst(&self, aid: &str) -> Option<&[String]> {
        self.rows(aid).first().map(|row| row.sst.as_slice())
    }

    /// JSON dump used by the event collector
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
