//! Telnet option refusal
//!
//! TL1 gateways commonly sit behind a telnet listener that opens with option
//! negotiation. The channel speaks plain NVT text, so every option is refused:
//! `DO` is answered with `WONT`, `WILL` with `DONT`. Sub-negotiation blocks are
//! dropped and an escaped `IAC IAC` becomes a literal 0xFF.
//!
//! Sequences may straddle reads, so the filter keeps its state between calls.

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Data,
    Command,
    Option(u8),
    SubNegotiation,
    SubNegotiationIac,
}

/// Incremental IAC stripper
#[derive(Debug, Default)]
pub struct TelnetFilter {
    state: State,
}

impl TelnetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip telnet commands from `input`
    ///
    /// Returns the payload bytes and the replies that must be written back to
    /// the peer.
    pub fn filter(&mut self, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::with_capacity(input.len());
        let mut replies = Vec::new();

        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Data, IAC) => State::Command,
                (State::Data, _) => {
                    data.push(byte);
                    State::Data
                }
                (State::Command, IAC) => {
                    data.push(IAC);
                    State::Data
                }
                (State::Command, DO | DONT | WILL | WONT) => State::Option(byte),
                (State::Command, SB) => State::SubNegotiation,
                // NOP, GA and friends carry no option byte
                (State::Command, _) => State::Data,
                (State::Option(verb), option) => {
                    match verb {
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    tracing::trace!("Refused telnet option {} (verb {})", option, verb);
                    State::Data
                }
                (State::SubNegotiation, IAC) => State::SubNegotiationIac,
                (State::SubNegotiation, _) => State::SubNegotiation,
                (State::SubNegotiationIac, SE) => State::Data,
                (State::SubNegotiationIac, _) => State::SubNegotiation,
            };
        }

        (data, replies)
    }
}
