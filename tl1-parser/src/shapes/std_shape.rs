//! STD shape: `aid::attr=val,...:pst&pst,sst&sst`

use std::ops::RangeInclusive;

use super::{parse_named, parse_states, RowDecoder};
use crate::model::Row;

/// Default grammar for named-attribute responses with optional state field
pub(crate) struct StdRows;

impl RowDecoder for StdRows {
    fn field_count(&self) -> RangeInclusive<usize> {
        3..=4
    }

    fn decode(&mut self, fields: &[&str]) -> (String, Row) {
        let (pst, sst) = fields.get(3).map(|f| parse_states(f)).unwrap_or_default();
        let row = Row::named(parse_named(fields[2])).with_states(pst, sst);
        (fields[0].trim().to_string(), row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Values;

    #[test]
    fn test_std_row_with_states() {
        let (aid, row) = StdRows.decode(&["FAC-1-1", "", "RATE=10G,FEC=ON", "OOS-AU,WRK&FLT"]);
        assert_eq!(aid, "FAC-1-1");
        assert_eq!(row.values.get("RATE"), Some("10G"));
        assert_eq!(row.pst, vec!["OOS-AU"]);
        assert_eq!(row.sst, vec!["WRK", "FLT"]);
    }

    #[test]
    fn test_std_row_without_states() {
        let (_, row) = StdRows.decode(&["FAC-1-2", "", "RATE=1G"]);
        assert!(row.pst.is_empty());
        assert!(row.sst.is_empty());
        assert!(matches!(row.values, Values::Named(_)));
    }
}
