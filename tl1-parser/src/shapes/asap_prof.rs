//! ASAP_PROF shape (`RTRV-ASAP-PROF`, `RTRV-FFP-STM`)
//!
//! Rows look like STD rows without states. Profile listings often leave the
//! AID empty; those rows get a pseudo-AID counting from 1 and keep their raw
//! tokens positionally.

use std::ops::RangeInclusive;

use super::{parse_named, RowDecoder};
use crate::model::Row;

#[derive(Debug, Default)]
pub(crate) struct AsapProfRows {
    next_pseudo_aid: usize,
}

impl RowDecoder for AsapProfRows {
    fn field_count(&self) -> RangeInclusive<usize> {
        3..=4
    }

    fn decode(&mut self, fields: &[&str]) -> (String, Row) {
        let aid = fields[0].trim();
        if aid.is_empty() {
            self.next_pseudo_aid += 1;
            let tokens = fields[2]
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            return (self.next_pseudo_aid.to_string(), Row::positional(tokens));
        }

        (aid.to_string(), Row::named(parse_named(fields[2])))
    }
}
