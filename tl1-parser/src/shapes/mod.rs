//! Body grammars for the different TL1 response shapes
//!
//! Every shape shares the same line scanner: locate the header (SID, date,
//! time), read the ident line (code, tag, status) and then hand each body line
//! to the shape's [`RowDecoder`]. Long responses, closing remarks, comments and
//! DENY error frames are handled here so that each shape only describes how a
//! single `:`-separated row turns into an AID and a [`Row`].

mod asap_prof;
mod autonomous;
mod crs;
mod ent_crs;
mod lopool;
mod pos_and_name;
mod rtrv_cond;
mod std_shape;

pub(crate) use asap_prof::AsapProfRows;
pub(crate) use autonomous::decode_autonomous;
pub(crate) use crs::RtrvCrsRows;
pub(crate) use ent_crs::EntCrsRows;
pub(crate) use lopool::LopoolRows;
pub(crate) use pos_and_name::PosAndNameRows;
pub(crate) use rtrv_cond::RtrvCondRows;
pub(crate) use std_shape::StdRows;

use std::ops::RangeInclusive;

use crate::error::{DecodeError, DecodeResult};
use crate::model::{
    BodyByAid, CommandResponse, DecodeWarning, ErrorFrame, MessageCode, MessageKind,
    MessageModel, ResponseStatus, Row,
};

/// Header line fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub sid: String,
    pub date: String,
    pub time: String,
}

/// Decodes one body line of a given response shape
pub(crate) trait RowDecoder {
    /// Accepted number of `:`-separated fields
    fn field_count(&self) -> RangeInclusive<usize>;

    /// Turn the fields of one body line into an AID and its row
    fn decode(&mut self, fields: &[&str]) -> (String, Row);

    /// Whether the ident line may omit the completion status
    fn status_optional(&self) -> bool {
        false
    }
}

/// Parse a header line: `<SID free text> <YY-MM-DD> <HH:MM:SS>`
pub(crate) fn parse_header(line: &str) -> Option<Header> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }

    let time = tokens[tokens.len() - 1];
    let date = tokens[tokens.len() - 2];
    if !is_numeric_triplet(date, '-') || !is_numeric_triplet(time, ':') {
        return None;
    }

    let sid = tokens[..tokens.len() - 2].join(" ");
    Some(Header {
        sid: sid.trim_matches('"').to_string(),
        date: date.to_string(),
        time: time.to_string(),
    })
}

fn is_numeric_triplet(token: &str, separator: char) -> bool {
    let parts: Vec<&str> = token.split(separator).collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Locate the header and the ident line that follows it
///
/// Anything before the header (prompt characters, echoed command text) is
/// ignored. Returns the index of the ident line, the header and the ident text.
pub(crate) fn locate_ident<'a>(lines: &[&'a str]) -> DecodeResult<(usize, Header, &'a str)> {
    let (header_index, header) = lines
        .iter()
        .enumerate()
        .find_map(|(index, line)| parse_header(line).map(|header| (index, header)))
        .ok_or(DecodeError::MissingHeader)?;

    lines
        .iter()
        .enumerate()
        .skip(header_index + 1)
        .find(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index, header, line.trim()))
        .ok_or(DecodeError::MissingIdent)
}

/// Strip one pair of surrounding double quotes
pub(crate) fn strip_quotes(line: &str) -> &str {
    let line = line.strip_prefix('"').unwrap_or(line);
    line.strip_suffix('"').unwrap_or(line)
}

/// `/* ... [tag] ... */` ends the body
pub(crate) fn is_closing_remark(stripped: &str, tag: &str) -> bool {
    stripped.contains("/*") && stripped.contains(&format!("[{tag}]")) && stripped.contains("*/")
}

/// Split `attr=val,attr=val` into ordered pairs
///
/// A token without `=` is kept with an empty value. Escaped quotes around a
/// value are removed.
pub(crate) fn parse_named(field: &str) -> Vec<(String, String)> {
    field
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('=') {
            Some((name, value)) => (name.trim().to_string(), unquote_value(value)),
            None => (token.to_string(), String::new()),
        })
        .collect()
}

fn unquote_value(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '\\' || c == '"')
        .to_string()
}

/// Split a comma-separated positional list, keeping empty slots
pub(crate) fn parse_positional(field: &str) -> Vec<String> {
    field.split(',').map(|value| value.trim().to_string()).collect()
}

/// Split a state field into primary and secondary states
///
/// `OOS-AU,WRK&FLT` gives `[OOS-AU]` and `[WRK, FLT]`; without a comma the
/// whole field is primary state.
pub(crate) fn parse_states(field: &str) -> (Vec<String>, Vec<String>) {
    let (pst, sst) = match field.split_once(',') {
        Some((pst, sst)) => (pst, sst),
        None => (field, ""),
    };
    (split_states(pst), split_states(sst))
}

fn split_states(part: &str) -> Vec<String> {
    part.split('&')
        .map(str::trim)
        .filter(|state| !state.is_empty())
        .map(str::to_string)
        .collect()
}

/// Body line classification shared by every shape
pub(crate) enum BodyLine<'a> {
    /// Blank, comment or repeated header/ident of a continuation frame
    Skip,
    /// Closing remark or terminator
    End,
    /// A line to interpret
    Content(&'a str),
}

/// Walks body lines applying the continuation, remark and terminator rules
pub(crate) struct BodyScanner<'t> {
    tag: &'t str,
    pending_skip: usize,
    in_comment: bool,
}

impl<'t> BodyScanner<'t> {
    pub(crate) fn new(tag: &'t str) -> Self {
        Self {
            tag,
            pending_skip: 0,
            in_comment: false,
        }
    }

    /// Classify one raw line
    ///
    /// `keep_comments` is set for DENY bodies, where comment lines are part of
    /// the explanation text.
    pub(crate) fn classify<'a>(&mut self, raw: &'a str, keep_comments: bool) -> BodyLine<'a> {
        let stripped = raw.trim();
        if stripped.is_empty() {
            return BodyLine::Skip;
        }

        if self.pending_skip > 0 {
            self.pending_skip -= 1;
            return BodyLine::Skip;
        }

        if stripped == ">" {
            self.pending_skip = 2;
            return BodyLine::Skip;
        }

        if stripped == ";" {
            return BodyLine::End;
        }

        if is_closing_remark(stripped, self.tag) {
            return BodyLine::End;
        }

        if self.in_comment {
            if stripped.contains("*/") {
                self.in_comment = false;
            }
            return if keep_comments {
                BodyLine::Content(stripped)
            } else {
                BodyLine::Skip
            };
        }

        if stripped.starts_with("/*") {
            if !stripped.contains("*/") {
                self.in_comment = true;
            }
            return if keep_comments {
                BodyLine::Content(stripped)
            } else {
                BodyLine::Skip
            };
        }

        BodyLine::Content(stripped)
    }
}

/// Decode a command response with the given row grammar
pub(crate) fn decode_response<D: RowDecoder>(
    raw: &str,
    mut rows: D,
    fallback_verb: Option<Option<String>>,
) -> DecodeResult<MessageModel> {
    let lines: Vec<&str> = raw.lines().collect();
    let (ident_index, header, ident) = locate_ident(&lines)?;

    let mut tokens = ident.split_whitespace();
    let code_token = tokens.next().unwrap_or_default();
    let code = MessageCode::from_token(code_token)
        .filter(|code| !code.is_autonomous())
        .ok_or_else(|| DecodeError::MalformedMessage(code_token.to_string()))?;
    let tag = tokens.next().unwrap_or_default().to_string();
    let mut warnings = Vec::new();
    let status = match tokens.next().map(|token| (token, ResponseStatus::from_token(token))) {
        Some((_, Some(status))) => status,
        None if rows.status_optional() => ResponseStatus::Compld,
        unknown => {
            let token = unknown.map(|(token, _)| token).unwrap_or_default();
            tracing::warn!("Unknown response status {:?} for tag {}, body ignored", token, tag);
            warnings.push(DecodeWarning::UnknownStatus {
                token: token.to_string(),
            });
            ResponseStatus::Unknown
        }
    };

    let mut body = BodyByAid::default();
    let mut deny_code: Option<String> = None;
    let mut free_lines = Vec::new();
    let mut skipped_rows = 0usize;
    let mut scanner = BodyScanner::new(&tag);

    for raw_line in &lines[ident_index + 1..] {
        let line = match scanner.classify(raw_line, status == ResponseStatus::Deny) {
            BodyLine::Skip => continue,
            BodyLine::End => break,
            BodyLine::Content(line) => line,
        };

        match status {
            ResponseStatus::Compld => {
                let content = strip_quotes(line);
                let fields: Vec<&str> = content.split(':').collect();
                let accepted = rows.field_count();
                if !accepted.contains(&fields.len()) {
                    tracing::debug!(
                        "Skipping row with {} fields (expected {:?}): {}",
                        fields.len(),
                        accepted,
                        line
                    );
                    skipped_rows += 1;
                    warnings.push(DecodeWarning::SkippedRow {
                        line: line.to_string(),
                        reason: format!(
                            "expected {}..={} fields, found {}",
                            accepted.start(),
                            accepted.end(),
                            fields.len()
                        ),
                    });
                    continue;
                }

                let (aid, row) = rows.decode(&fields);
                body.push(aid, row);
            }
            ResponseStatus::Deny => {
                if deny_code.is_none() && line.chars().count() == 4 {
                    deny_code = Some(line.to_string());
                } else {
                    free_lines.push(line.to_string());
                }
            }
            other => {
                tracing::debug!("Ignoring body line of {} response: {}", other, line);
            }
        }
    }

    if let Some(verb) = fallback_verb {
        if skipped_rows > 0 {
            tracing::warn!(
                "Unsupported response shape for verb {:?}: STD fallback skipped {} rows",
                verb,
                skipped_rows
            );
            warnings.insert(0, DecodeWarning::UnsupportedShape { verb, skipped_rows });
        }
    }

    let error_frame = if status == ResponseStatus::Deny {
        Some(ErrorFrame {
            code: deny_code.unwrap_or_default(),
            free_lines,
        })
    } else {
        None
    };

    Ok(MessageModel::new(
        header,
        code,
        tag,
        MessageKind::CommandResponse(CommandResponse {
            status,
            body,
            error_frame,
        }),
        warnings,
    ))
}
