//! Shape selection for raw TL1 text
//!
//! The ident line tells autonomous messages apart from command responses.
//! Responses carry no verb on the ident line, so the raw text (closing remark,
//! echoed command) is searched for verb substrings to pick the body grammar.

use crate::error::{DecodeError, DecodeResult};
use crate::model::{MessageCode, MessageModel};
use crate::shapes::{
    self, AsapProfRows, EntCrsRows, LopoolRows, PosAndNameRows, RtrvCondRows, RtrvCrsRows,
    StdRows,
};

/// Body grammar of a command response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Std,
    AsapProf,
    RtrvCond,
    EntCrs,
    RtrvLopool,
    RtrvPosAndName,
    RtrvCrs,
}

/// Verb substrings checked in order; the first hit selects the shape
const SHAPE_VERBS: &[(&[&str], Shape)] = &[
    (&["RTRV-ASAP-PROF", "RTRV-FFP-STM"], Shape::AsapProf),
    (&["RTRV-COND", "RTRV-ALM"], Shape::RtrvCond),
    (&["ENT-CRS"], Shape::EntCrs),
    (&["RTRV-LOPOOL"], Shape::RtrvLopool),
    (&["RTRV-PM"], Shape::RtrvPosAndName),
    (&["RTRV-CRS"], Shape::RtrvCrs),
];

/// Decoder selected for a raw message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Autonomous,
    Response {
        shape: Shape,
        /// No verb matched and STD was chosen by default
        fallback: bool,
    },
}

/// Pick the decoder for a raw message
pub fn route(raw: &str) -> DecodeResult<Route> {
    let code = ident_code(raw)?;
    if code.is_autonomous() {
        return Ok(Route::Autonomous);
    }

    let (shape, fallback) = select_shape(raw);
    Ok(Route::Response { shape, fallback })
}

/// Decode one complete raw frame into a [`MessageModel`]
pub fn decode(raw: &str) -> DecodeResult<MessageModel> {
    match route(raw)? {
        Route::Autonomous => shapes::decode_autonomous(raw),
        Route::Response { shape, fallback } => {
            tracing::debug!("Decoding response as {:?} (fallback: {})", shape, fallback);
            match shape {
                Shape::Std => {
                    let fallback_verb = fallback.then(|| remark_verb(raw));
                    shapes::decode_response(raw, StdRows, fallback_verb)
                }
                Shape::AsapProf => shapes::decode_response(raw, AsapProfRows::default(), None),
                Shape::RtrvCond => shapes::decode_response(raw, RtrvCondRows, None),
                Shape::EntCrs => shapes::decode_response(raw, EntCrsRows, None),
                Shape::RtrvLopool => shapes::decode_response(raw, LopoolRows, None),
                Shape::RtrvPosAndName => shapes::decode_response(raw, PosAndNameRows, None),
                Shape::RtrvCrs => shapes::decode_response(raw, RtrvCrsRows, None),
            }
        }
    }
}

/// Code token of the ident line
pub fn ident_code(raw: &str) -> DecodeResult<MessageCode> {
    let lines: Vec<&str> = raw.lines().collect();
    let (_, _, ident) = shapes::locate_ident(&lines)?;
    let token = ident.split_whitespace().next().unwrap_or_default();
    MessageCode::from_token(token).ok_or_else(|| {
        tracing::warn!("Unrecognized ident token '{}'", token);
        DecodeError::MalformedMessage(token.to_string())
    })
}

fn select_shape(raw: &str) -> (Shape, bool) {
    SHAPE_VERBS
        .iter()
        .find(|(verbs, _)| verbs.iter().any(|verb| raw.contains(verb)))
        .map(|(_, shape)| (*shape, false))
        .unwrap_or((Shape::Std, true))
}

/// Verb echoed in the closing remark, e.g. `RTRV-EQPT` from `/* RTRV-EQPT::ALL [7] */`
fn remark_verb(raw: &str) -> Option<String> {
    raw.lines()
        .filter_map(|line| line.trim().strip_prefix("/*"))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(|token| token.split(':').next().unwrap_or(token).to_string())
        .find(|verb| !verb.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(remark: &str) -> String {
        format!("\n   NE 24-01-01 00:00:00\nM  1 COMPLD\n   {remark}\n;\n")
    }

    #[test]
    fn test_verb_precedence() {
        let cases = [
            ("/* RTRV-ASAP-PROF::ALL [1] */", Shape::AsapProf),
            ("/* RTRV-FFP-STM16::ALL [1] */", Shape::AsapProf),
            ("/* RTRV-COND-ALL::ALL [1] */", Shape::RtrvCond),
            ("/* RTRV-ALM-EQPT::ALL [1] */", Shape::RtrvCond),
            ("/* ENT-CRS-VC4::A,B [1] */", Shape::EntCrs),
            ("/* RTRV-LOPOOL::ALL [1] */", Shape::RtrvLopool),
            ("/* RTRV-PM-VC4::ALL [1] */", Shape::RtrvPosAndName),
            ("/* RTRV-CRS-VC4::ALL [1] */", Shape::RtrvCrs),
        ];
        for (remark, expected) in cases {
            assert_eq!(
                route(&response(remark)).unwrap(),
                Route::Response {
                    shape: expected,
                    fallback: false
                },
                "{remark}"
            );
        }
    }

    #[test]
    fn test_unknown_verb_falls_back_to_std() {
        assert_eq!(
            route(&response("/* RTRV-EQPT::ALL [1] */")).unwrap(),
            Route::Response {
                shape: Shape::Std,
                fallback: true
            }
        );
        assert_eq!(
            remark_verb(&response("/* RTRV-EQPT::ALL [1] */")),
            Some("RTRV-EQPT".to_string())
        );
    }

    #[test]
    fn test_autonomous_codes_route_to_autonomous() {
        for code in ["*C", "**", "*", "A", "I"] {
            let raw = format!("   NE 24-01-01 00:00:00\n{code} 12 REPT EVT\n;");
            assert_eq!(route(&raw).unwrap(), Route::Autonomous);
        }
    }

    #[test]
    fn test_unknown_ident_token_is_malformed() {
        let raw = "   NE 24-01-01 00:00:00\nQ 12 COMPLD\n;";
        assert_eq!(
            route(raw),
            Err(DecodeError::MalformedMessage("Q".to_string()))
        );
    }
}
