//! Test helpers for fixture-based decoding tests

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

/// A captured TL1 frame
#[derive(Debug, Clone)]
pub struct MessageFixture {
    pub name: String,
    pub raw: String,
}

impl MessageFixture {
    /// Load a fixture from the fixtures directory
    pub fn load(filename: &str) -> Self {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests/fixtures");
        path.push(filename);

        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e));

        Self {
            name: filename.to_string(),
            raw,
        }
    }

    /// Same frame with CRLF line endings, as received over telnet
    pub fn with_crlf(&self) -> String {
        self.raw.replace('\n', "\r\n")
    }

    /// Same frame preceded by a prompt and the echoed command
    pub fn with_echo(&self, command: &str) -> String {
        format!("<{}\n{}", command, self.raw)
    }
}

/// Every command-response fixture
pub fn response_fixtures() -> Vec<MessageFixture> {
    [
        "msg1_std_compld.txt",
        "msg2_deny.txt",
        "msg3_asap_prof.txt",
        "msg4_cond.txt",
        "msg5_crs_continuation.txt",
        "msg6_pm.txt",
        "msg7_ent_crs.txt",
        "msg8_lopool.txt",
        "msg9_cond_single.txt",
        "msg13_unknown_verb.txt",
        "msg14_delay.txt",
    ]
    .into_iter()
    .map(MessageFixture::load)
    .collect()
}

/// Every autonomous fixture
pub fn autonomous_fixtures() -> Vec<MessageFixture> {
    ["msg10_alarm.txt", "msg11_event.txt", "msg12_keepalive.txt"]
        .into_iter()
        .map(MessageFixture::load)
        .collect()
}
