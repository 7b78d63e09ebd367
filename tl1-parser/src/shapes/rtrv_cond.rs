//! RTRV_COND shape (`RTRV-COND`, `RTRV-ALM`): `aid:v1,v2,...`

use std::ops::RangeInclusive;

use super::{parse_positional, RowDecoder};
use crate::model::Row;

pub(crate) struct RtrvCondRows;

impl RowDecoder for RtrvCondRows {
    fn field_count(&self) -> RangeInclusive<usize> {
        2..=3
    }

    fn decode(&mut self, fields: &[&str]) -> (String, Row) {
        (
            fields[0].trim().to_string(),
            Row::positional(parse_positional(fields[1])),
        )
    }
}
