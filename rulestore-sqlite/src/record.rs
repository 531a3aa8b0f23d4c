//! Rule record codec
//!
//! A [`RuleRecord`] is the fixed-shape row form of one policy rule: a ptype and
//! six value slots. Unused slots hold the empty string. Gaps are not
//! rejected; a record with an empty slot followed by a non-empty one decodes
//! to a tuple truncated at the gap.

/// Number of value slots in a rule row
pub const VALUE_SLOTS: usize = 6;

/// One policy rule as stored in the rule table
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RuleRecord {
    pub ptype: String,
    pub values: [String; VALUE_SLOTS],
}

impl RuleRecord {
    /// Build a record from a rule tuple. Values past the sixth are dropped.
    pub fn from_tuple(ptype: &str, rule: &[String]) -> Self {
        if rule.len() > VALUE_SLOTS {
            tracing::warn!(
                ptype,
                len = rule.len(),
                "Rule has more than {} values, extra values dropped",
                VALUE_SLOTS
            );
        }
        let mut values: [String; VALUE_SLOTS] = Default::default();
        for (slot, value) in values.iter_mut().zip(rule) {
            slot.clone_from(value);
        }
        Self {
            ptype: ptype.to_string(),
            values,
        }
    }

    /// Leading non-empty values, stopping at the first empty slot
    pub fn to_tuple(&self) -> Vec<String> {
        self.values
            .iter()
            .take_while(|v| !v.is_empty())
            .cloned()
            .collect()
    }

    /// Render `ptype, v0, v1, ...` up to the last non-empty slot.
    ///
    /// A record with every slot empty renders as the empty string.
    pub fn to_line(&self) -> String {
        let Some(last) = self.values.iter().rposition(|v| !v.is_empty()) else {
            return String::new();
        };
        let mut fields = Vec::with_capacity(last + 2);
        fields.push(self.ptype.as_str());
        fields.extend(self.values[..=last].iter().map(String::as_str));
        fields.join(", ")
    }
}

/// A rule record together with its row identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredRule {
    pub id: i64,
    pub record: RuleRecord,
}

impl StoredRule {
    /// Map a `SELECT id, ptype, v0, ..., v5` row
    pub fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            record: RuleRecord {
                ptype: row.get(1)?,
                values: [
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ],
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn record(ptype: &str, values: [&str; VALUE_SLOTS]) -> RuleRecord {
        RuleRecord {
            ptype: ptype.into(),
            values: values.map(String::from),
        }
    }

    #[test]
    fn test_from_tuple_fills_leading_slots() {
        let rec = RuleRecord::from_tuple("p", &rule(&["alice", "data1", "read"]));
        assert_eq!(rec, record("p", ["alice", "data1", "read", "", "", ""]));
    }

    #[test]
    fn test_from_tuple_drops_extra_values() {
        let rec = RuleRecord::from_tuple("p", &rule(&["a", "b", "c", "d", "e", "f", "g"]));
        assert_eq!(rec, record("p", ["a", "b", "c", "d", "e", "f"]));
    }

    #[test]
    fn test_gapless_tuples_survive_the_codec() {
        let full = ["a", "b", "c", "d", "e", "f"];
        for len in 0..=VALUE_SLOTS {
            let tuple = rule(&full[..len]);
            assert_eq!(RuleRecord::from_tuple("g", &tuple).to_tuple(), tuple);
        }
    }

    #[test]
    fn test_to_tuple_truncates_at_gap() {
        let rec = record("p", ["alice", "data1", "", "x", "", ""]);
        assert_eq!(rec.to_tuple(), rule(&["alice", "data1"]));
    }

    #[test]
    fn test_to_line() {
        let rec = record("p", ["alice", "data1", "read", "", "", ""]);
        assert_eq!(rec.to_line(), "p, alice, data1, read");

        let rec = record("p", ["a", "b", "c", "d", "e", "f"]);
        assert_eq!(rec.to_line(), "p, a, b, c, d, e, f");
    }

    #[test]
    fn test_to_line_keeps_gap_before_last_value() {
        let rec = record("p", ["alice", "", "read", "", "", ""]);
        assert_eq!(rec.to_line(), "p, alice, , read");
    }

    #[test]
    fn test_to_line_all_empty_is_empty() {
        let rec = record("p", ["", "", "", "", "", ""]);
        assert_eq!(rec.to_line(), "");
    }
}
