//! RTRV_POS_AND_NAME shape (`RTRV-PM`): `aid:v1,v2,...[:attr=val,...]`

use std::ops::RangeInclusive;

use super::{parse_named, parse_positional, RowDecoder};
use crate::model::Row;

pub(crate) struct PosAndNameRows;

/// Positional entries keyed `1..n` followed by the named entries
pub(crate) fn merge_positional_and_named(
    positional: &str,
    named: Option<&str>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = parse_positional(positional)
        .into_iter()
        .enumerate()
        .map(|(index, value)| ((index + 1).to_string(), value))
        .collect();
    if let Some(named) = named {
        merged.extend(parse_named(named));
    }
    merged
}

impl RowDecoder for PosAndNameRows {
    fn field_count(&self) -> RangeInclusive<usize> {
        2..=3
    }

    fn decode(&mut self, fields: &[&str]) -> (String, Row) {
        let values = merge_positional_and_named(fields[1], fields.get(2).copied());
        (fields[0].trim().to_string(), Row::named(values))
    }
}
