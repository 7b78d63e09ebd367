//! RTRV_CRS shape: `from,to:cct:attr=val,...[:pst,sst]`

use std::ops::RangeInclusive;

use super::pos_and_name::merge_positional_and_named;
use super::{parse_states, RowDecoder};
use crate::model::Row;

pub(crate) struct RtrvCrsRows;

impl RowDecoder for RtrvCrsRows {
    fn field_count(&self) -> RangeInclusive<usize> {
        3..=4
    }

    fn decode(&mut self, fields: &[&str]) -> (String, Row) {
        let values = merge_positional_and_named(fields[1], Some(fields[2]));
        let (pst, sst) = fields.get(3).map(|f| parse_states(f)).unwrap_or_default();
        (
            fields[0].trim().to_string(),
            Row::named(values).with_states(pst, sst),
        )
    }
}
