//! Declarative match criteria over decoded command responses
//!
//! A [`Filter`] holds four independent axes: AID, primary state, secondary
//! state and attribute values. [`Filter::evaluate`] applies them to every AID of
//! a COMPLD response and reports which AIDs matched and why.
//!
//! Only the first row of an AID is consulted for PST/SST; attribute matching
//! walks every row.

use std::collections::HashSet;

use regex::Regex;

use crate::model::{MessageModel, ResponseStatus};

/// How the members of a state or attribute axis combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rule {
    /// At least one configured member is present
    #[default]
    Or,
    /// Every configured member is present
    And,
}

/// Why an AID matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// The AID itself satisfied an AID-only filter
    Aid(String),
    /// Primary states shared by the row and the filter
    Pst(Vec<String>),
    /// Secondary states shared by the row and the filter
    Sst(Vec<String>),
    /// An attribute whose observed value is one of the configured values
    Attr { name: String, value: String },
}

/// Outcome of [`Filter::evaluate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    pub matched: bool,
    /// Matching AIDs in body order with their match descriptors
    pub matches: Vec<(String, Vec<Match>)>,
}

impl FilterResult {
    pub fn get(&self, aid: &str) -> Option<&[Match]> {
        self.matches
            .iter()
            .find(|(candidate, _)| candidate == aid)
            .map(|(_, matches)| matches.as_slice())
    }

    pub fn aids(&self) -> Vec<&str> {
        self.matches.iter().map(|(aid, _)| aid.as_str()).collect()
    }
}

/// Match criteria built by the caller
#[derive(Debug, Clone, Default)]
pub struct Filter {
    aids: Vec<String>,
    aid_patterns: Vec<Regex>,
    pst: Vec<String>,
    sst: Vec<String>,
    attrs: Vec<(String, Vec<String>)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept an AID by exact membership
    pub fn add_aid(&mut self, aid: impl Into<String>) -> &mut Self {
        push_unique(&mut self.aids, aid.into());
        self
    }

    pub fn remove_aid(&mut self, aid: &str) -> &mut Self {
        self.aids.retain(|existing| existing != aid);
        self
    }

    /// Accept every AID fully matched by `pattern`
    pub fn add_aid_regex(&mut self, pattern: &str) -> Result<&mut Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))?;
        self.aid_patterns.push(anchored);
        Ok(self)
    }

    pub fn clear_aid_regexes(&mut self) -> &mut Self {
        self.aid_patterns.clear();
        self
    }

    pub fn add_pst(&mut self, state: impl Into<String>) -> &mut Self {
        push_unique(&mut self.pst, state.into());
        self
    }

    pub fn remove_pst(&mut self, state: &str) -> &mut Self {
        self.pst.retain(|existing| existing != state);
        self
    }

    pub fn add_sst(&mut self, state: impl Into<String>) -> &mut Self {
        push_unique(&mut self.sst, state.into());
        self
    }

    pub fn remove_sst(&mut self, state: &str) -> &mut Self {
        self.sst.retain(|existing| existing != state);
        self
    }

    /// Add one accepted value for an attribute
    pub fn add_attr(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => push_unique(values, value),
            None => self.attrs.push((name, vec![value])),
        }
        self
    }

    /// Add several accepted values for an attribute
    pub fn add_attr_values<I, V>(&mut self, name: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self.add_attr(name, value);
        }
        self
    }

    /// Drop one accepted value, or the whole attribute when `value` is `None`
    pub fn remove_attr(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => {
                if let Some((_, values)) = self
                    .attrs
                    .iter_mut()
                    .find(|(existing, _)| existing == name)
                {
                    values.retain(|existing| existing != value);
                }
                self.attrs.retain(|(_, values)| !values.is_empty());
            }
            None => self.attrs.retain(|(existing, _)| existing != name),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.aids.is_empty()
            && self.aid_patterns.is_empty()
            && self.pst.is_empty()
            && self.sst.is_empty()
            && self.attrs.is_empty()
    }

    /// Apply the filter to a decoded message
    ///
    /// Anything other than a COMPLD command response yields an empty,
    /// non-matching result.
    pub fn evaluate(
        &self,
        message: &MessageModel,
        pst_rule: Rule,
        sst_rule: Rule,
        fld_rule: Rule,
    ) -> FilterResult {
        let body = match message.command_response() {
            Some(response) if response.status == ResponseStatus::Compld => &response.body,
            _ => {
                tracing::debug!("Filter applied to unmanaged scenario: {:?}", message.status());
                return FilterResult::default();
            }
        };

        if fld_rule == Rule::And && !self.attrs.is_empty() {
            tracing::warn!("AND rule on attribute values is not supported, axis ignored");
        }

        let mut result = FilterResult::default();
        for (aid, rows) in body.iter() {
            if !self.aid_matches(aid) {
                continue;
            }

            let Some(first) = rows.first() else {
                continue;
            };

            let mut matches = Vec::new();

            let Some(pst) = state_axis(&self.pst, &first.pst, pst_rule) else {
                continue;
            };
            let Some(sst) = state_axis(&self.sst, &first.sst, sst_rule) else {
                continue;
            };
            if !pst.is_empty() {
                matches.push(Match::Pst(pst));
            }
            if !sst.is_empty() {
                matches.push(Match::Sst(sst));
            }

            let mut attr_hit = false;
            if fld_rule == Rule::Or {
                for row in rows {
                    for (name, value) in row.values.entries() {
                        if self.attr_accepts(&name, value) {
                            attr_hit = true;
                            matches.push(Match::Attr {
                                name: name.into_owned(),
                                value: value.to_string(),
                            });
                        }
                    }
                }
            }
            let attrs_ok = self.attrs.is_empty() || fld_rule == Rule::And || attr_hit;
            if !attrs_ok {
                continue;
            }

            if matches.is_empty() && self.has_aid_criteria() {
                matches.push(Match::Aid(aid.to_string()));
            }

            if !matches.is_empty() {
                result.matches.push((aid.to_string(), matches));
            }
        }

        result.matched = !result.matches.is_empty();
        tracing::debug!(
            "Filter matched {} of {} AIDs",
            result.matches.len(),
            body.len()
        );
        result
    }

    fn has_aid_criteria(&self) -> bool {
        !self.aids.is_empty() || !self.aid_patterns.is_empty()
    }

    fn aid_matches(&self, aid: &str) -> bool {
        if !self.has_aid_criteria() {
            return true;
        }
        self.aids.iter().any(|existing| existing == aid)
            || self.aid_patterns.iter().any(|pattern| pattern.is_match(aid))
    }

    fn attr_accepts(&self, name: &str, value: &str) -> bool {
        self.attrs
            .iter()
            .find(|(existing, _)| existing == name)
            .is_some_and(|(_, values)| values.iter().any(|accepted| accepted == value))
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Evaluate one state axis against a row
///
/// Returns `None` when the axis fails, otherwise the matched states (empty
/// when the filter has no states for this axis).
fn state_axis(wanted: &[String], observed: &[String], rule: Rule) -> Option<Vec<String>> {
    if wanted.is_empty() {
        return Some(Vec::new());
    }

    let observed: HashSet<&str> = observed.iter().map(String::as_str).collect();
    let shared: Vec<String> = wanted
        .iter()
        .filter(|state| observed.contains(state.as_str()))
        .cloned()
        .collect();

    let satisfied = match rule {
        Rule::Or => !shared.is_empty(),
        Rule::And => shared.len() == wanted.len(),
    };
    satisfied.then_some(shared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_state_axis_rules() {
        let wanted = states(&["A", "B"]);
        assert!(state_axis(&wanted, &states(&["A", "B"]), Rule::And).is_some());
        assert!(state_axis(&wanted, &states(&["A"]), Rule::And).is_none());
        assert!(state_axis(&wanted, &states(&["A", "B"]), Rule::Or).is_some());
        assert!(state_axis(&wanted, &states(&["A"]), Rule::Or).is_some());
        assert!(state_axis(&wanted, &states(&["C"]), Rule::Or).is_none());
        assert_eq!(state_axis(&[], &states(&["C"]), Rule::And), Some(vec![]));
    }

    #[test]
    fn test_add_and_remove_criteria() {
        let mut filter = Filter::new();
        filter.add_pst("IS").add_pst("IS").add_sst("FLT");
        filter.add_attr_values("RATE", ["10G", "1G"]);
        assert_eq!(filter.pst, vec!["IS"]);

        filter.remove_attr("RATE", Some("10G"));
        assert_eq!(filter.attrs, vec![("RATE".to_string(), vec!["1G".to_string()])]);
        filter.remove_attr("RATE", Some("1G"));
        assert!(filter.attrs.is_empty());

        filter.remove_pst("IS").remove_sst("FLT");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let mut filter = Filter::new();
        assert!(filter.add_aid_regex("FAC-(").is_err());
        assert!(filter.is_empty());
    }
}
