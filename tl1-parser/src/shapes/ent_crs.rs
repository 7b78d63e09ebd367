//! ENT_CRS shape: only the presence of an AID matters

use std::ops::RangeInclusive;

use super::RowDecoder;
use crate::model::Row;

pub(crate) struct EntCrsRows;

impl RowDecoder for EntCrsRows {
    fn field_count(&self) -> RangeInclusive<usize> {
        1..=usize::MAX
    }

    fn decode(&mut self, fields: &[&str]) -> (String, Row) {
        (fields[0].trim().to_string(), Row::default())
    }
}
