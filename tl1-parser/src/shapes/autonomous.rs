//! Autonomous messages (`*C`, `**`, `*`, `A`, `I`)
//!
//! Alarm codes carry `aid:body` lines. Non-alarm messages locate the AID by
//! colon count: with five colons it is the third field, with one colon the
//! first, otherwise the message has no AID.

use super::{locate_ident, strip_quotes, BodyLine, BodyScanner};
use crate::error::{DecodeError, DecodeResult};
use crate::model::{AutonomousEvent, MessageCode, MessageKind, MessageModel};

pub(crate) fn decode_autonomous(raw: &str) -> DecodeResult<MessageModel> {
    let lines: Vec<&str> = raw.lines().collect();
    let (ident_index, header, ident) = locate_ident(&lines)?;

    let mut tokens = ident.split_whitespace();
    let code_token = tokens.next().unwrap_or_default();
    let code = MessageCode::from_token(code_token)
        .filter(MessageCode::is_autonomous)
        .ok_or_else(|| DecodeError::MalformedMessage(code_token.to_string()))?;
    let tag = tokens.next().unwrap_or_default().to_string();
    let verb_and_modifiers: Vec<String> = tokens.map(str::to_string).collect();

    let mut aid: Option<String> = None;
    let mut body_lines = Vec::new();
    let mut scanner = BodyScanner::new(&tag);

    for raw_line in &lines[ident_index + 1..] {
        let line = match scanner.classify(raw_line, false) {
            BodyLine::Skip => continue,
            BodyLine::End => break,
            BodyLine::Content(line) => strip_quotes(line),
        };

        let (line_aid, text) = if code.is_alarm() {
            match line.split_once(':') {
                Some((aid, body)) => (aid.trim().to_string(), body.to_string()),
                None => (String::new(), line.to_string()),
            }
        } else {
            (event_aid(line), line.to_string())
        };

        if aid.is_none() {
            aid = Some(line_aid);
        }
        body_lines.push(text);
    }

    tracing::debug!(
        "Decoded autonomous {} message {} with {} body lines",
        code.as_str(),
        tag,
        body_lines.len()
    );

    Ok(MessageModel::new(
        header,
        code,
        tag,
        MessageKind::Autonomous(AutonomousEvent {
            verb_and_modifiers,
            aid: aid.unwrap_or_default(),
            body_text: body_lines.join("\n"),
        }),
        Vec::new(),
    ))
}

fn event_aid(line: &str) -> String {
    let fields: Vec<&str> = line.split(':').collect();
    match fields.len() - 1 {
        5 => fields[2].trim().to_string(),
        1 => fields[0].trim().to_string(),
        _ => String::new(),
    }
}
