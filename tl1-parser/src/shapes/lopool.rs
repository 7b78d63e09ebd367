//! RTRV_LOPOOL shape: `aid::attr=val,...`
//!
//! Some equipment answers `RTRV-LOPOOL` with an ident line that carries no
//! completion code; a missing status is read as COMPLD.

use std::ops::RangeInclusive;

use super::{parse_named, RowDecoder};
use crate::model::Row;

pub(crate) struct LopoolRows;

impl RowDecoder for LopoolRows {
    fn field_count(&self) -> RangeInclusive<usize> {
        3..=3
    }

    fn decode(&mut self, fields: &[&str]) -> (String, Row) {
        (
            fields[0].trim().to_string(),
            Row::named(parse_named(fields[2])),
        )
    }

    fn status_optional(&self) -> bool {
        true
    }
}
