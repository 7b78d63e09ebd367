//! Shared frames and configuration for session tests

#![allow(dead_code)]

use std::time::{Duration, Instant};

use tl1_session::SessionConfig;

pub const LOGIN_COMPLD: &str = concat!(
    "\n   \"NE-1\" 24-03-05 10:00:00\n",
    "M  1 COMPLD\n",
    "   /* ACT-USER::admin [1] */\n",
    ";\n",
);

pub const LOGIN_DENY: &str = concat!(
    "\n   \"NE-1\" 24-03-05 10:00:00\n",
    "M  1 DENY\n",
    "   PICC\n",
    "   /* Privilege, Illegal Command Code */\n",
    ";\n",
);

pub const FAC_DENY: &str = concat!(
    "\n   \"NE-1\" 24-03-05 10:00:01\n",
    "M  2 DENY\n",
    "   \"FAC-9-9-9\"\n",
    "   IIAC\n",
    "   /* Input, Invalid ACcess identifier */\n",
    ";\n",
);

pub const KEEP_ALIVE: &str = concat!(
    "\n   \"NE-1\" 24-03-05 10:00:00\n",
    "A  0 REPT EVT SESSION\n",
    "   \"KEEP ALIVE MESSAGE\"\n",
    ";\n",
);

pub const ALARM: &str = concat!(
    "\n   \"NE-1\" 24-03-05 10:00:02\n",
    "** 2041 REPT ALM EQPT\n",
    "   \"SLOT-1-4:MJ,REPLUNITMISS,SA,03-05,10-23-00,NEND\"\n",
    ";\n",
);

pub const DBCHG: &str = concat!(
    "\n   \"NE-1\" 24-03-05 10:00:03\n",
    "A  2042 REPT DBCHG\n",
    "   \"10-00-03,ENT-CRS-VC4,VC4-1-1-1-9,VC4-1-2-1-9:::\"\n",
    ";\n",
);

/// COMPLD response for one facility in `state`
pub fn fac_response(tag: u32, state: &str) -> String {
    format!(
        concat!(
            "\n   \"NE-1\" 24-03-05 10:00:01\n",
            "M  {tag} COMPLD\n",
            "   \"FAC-1-1-1::RATE=10GE,FEC=ON:{state}\"\n",
            "   /* RTRV-FAC::FAC-1-1-1 [{tag}] */\n",
            ";\n",
        ),
        tag = tag,
        state = state,
    )
}

/// Configuration with intervals short enough for tests
///
/// Also routes the crate logs into the test capture.
pub fn test_config() -> SessionConfig {
    tl1_session::logging::init_test_logging();
    SessionConfig::new("NE-1", "127.0.0.1")
        .with_credentials("admin", "secret")
        .with_poll_interval(Duration::from_millis(10))
        .with_retry_intervals(Duration::from_millis(10), Duration::from_millis(10))
        .with_event_read_timeout(Duration::from_millis(50))
        .with_command_timeout(Duration::from_secs(2))
}

/// Poll `condition` until it holds or two seconds pass
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
