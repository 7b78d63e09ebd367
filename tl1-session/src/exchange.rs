//! Request/response helpers shared by the command client and the collector

use std::time::Instant;

use tl1_client::{Channel, ChannelError, ReadOutcome};
use tl1_parser::{ident_code, MessageModel};

/// Text-level completion check
///
/// DELAY is an accepted command that completes later, so it counts as completed.
pub fn is_completed(raw: &str) -> bool {
    raw.contains(" COMPLD") || raw.contains(" DELAY")
}

/// Read until a response message or `deadline`
///
/// Autonomous reports that reach this point (only possible on the event
/// channel) are skipped.
pub(crate) fn read_response(
    channel: &mut Channel,
    deadline: Instant,
) -> Result<String, ChannelError> {
    loop {
        match channel.read_frame(deadline)? {
            ReadOutcome::Message(text) => {
                if ident_code(&text).is_ok_and(|code| code.is_autonomous()) {
                    tracing::debug!("Skipping autonomous report while awaiting a response");
                    continue;
                }
                return Ok(text);
            }
            ReadOutcome::Idle => {
                if Instant::now() >= deadline {
                    return Err(ChannelError::Timeout);
                }
            }
        }
    }
}

/// Send ACT-USER and report whether the equipment accepted it
pub(crate) fn act_user(
    channel: &mut Channel,
    login: &str,
    deadline: Instant,
) -> Result<bool, ChannelError> {
    channel.write(login)?;
    let raw = read_response(channel, deadline)?;
    Ok(is_completed(&raw))
}

/// PST and SST of the first row of the first AID, `&`-joined
pub fn first_state(message: &MessageModel) -> Option<(String, String)> {
    let aid = *message.aids().first()?;
    let pst = message.first_pst(aid)?.join("&");
    let sst = message.first_sst(aid)?.join("&");
    Some((pst, sst))
}

/// `PST` or `PST,SST` as printed on the wire
pub(crate) fn format_state(pst: &str, sst: &str) -> String {
    if sst.is_empty() {
        pst.to_string()
    } else {
        format!("{pst},{sst}")
    }
}
