//! Predicate building for rule table reads, deletes and updates

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::record::{RuleRecord, VALUE_SLOTS};

/// Value slot column names, in slot order
pub const VALUE_COLUMNS: [&str; VALUE_SLOTS] = ["v0", "v1", "v2", "v3", "v4", "v5"];

const SELECT_COLUMNS: &str = "id, ptype, v0, v1, v2, v3, v4, v5";

/// Sparse criteria for filtered loads.
///
/// Each field lists acceptable values for its column; an empty list leaves
/// the column unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub ptype: Vec<String>,
    pub v0: Vec<String>,
    pub v1: Vec<String>,
    pub v2: Vec<String>,
    pub v3: Vec<String>,
    pub v4: Vec<String>,
    pub v5: Vec<String>,
}

impl Filter {
    /// Value slot criteria, in slot order
    pub fn slots(&self) -> [&[String]; VALUE_SLOTS] {
        [&self.v0, &self.v1, &self.v2, &self.v3, &self.v4, &self.v5]
    }
}

/// One condition on a rule row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Equals { column: &'static str, value: String },
    OneOf { column: &'static str, values: Vec<String> },
    IdEquals(i64),
}

/// A conjunction of predicates over the rule table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleQuery {
    predicates: Vec<Predicate>,
}

impl RuleQuery {
    /// Query matching every row
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain to rows whose columns satisfy the filter
    pub fn from_filter(filter: &Filter) -> Self {
        let mut query = Self::new();
        query.push_one_of("ptype", &filter.ptype);
        for (column, values) in VALUE_COLUMNS.into_iter().zip(filter.slots()) {
            query.push_one_of(column, values);
        }
        query
    }

    /// Constrain to the single row equal to `record` on ptype and all six
    /// slots, empty ones included
    pub fn exact(record: &RuleRecord) -> Self {
        let mut query = Self::new().ptype(&record.ptype);
        for (column, value) in VALUE_COLUMNS.into_iter().zip(&record.values) {
            query.predicates.push(Predicate::Equals {
                column,
                value: value.clone(),
            });
        }
        query
    }

    /// Constrain to rows of `ptype` whose slots starting at `field_index`
    /// equal `field_values`.
    ///
    /// Slot `i` is matched against `field_values[i - field_index]` when
    /// `field_index <= i < field_index + field_values.len()`. A negative
    /// `field_index` adds no value predicates, so every row of the ptype
    /// matches.
    pub fn indexed(ptype: &str, field_index: isize, field_values: &[String]) -> Self {
        let mut query = Self::new().ptype(ptype);
        let Ok(start) = usize::try_from(field_index) else {
            return query;
        };
        for (slot, column) in VALUE_COLUMNS.into_iter().enumerate() {
            if slot < start {
                continue;
            }
            let Some(value) = field_values.get(slot - start) else {
                break;
            };
            query.predicates.push(Predicate::Equals {
                column,
                value: value.clone(),
            });
        }
        query
    }

    /// Constrain to one row identifier
    pub fn id(id: i64) -> Self {
        Self {
            predicates: vec![Predicate::IdEquals(id)],
        }
    }

    /// Add an equality predicate on ptype
    pub fn ptype(mut self, ptype: &str) -> Self {
        self.predicates.push(Predicate::Equals {
            column: "ptype",
            value: ptype.to_string(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    fn push_one_of(&mut self, column: &'static str, values: &[String]) {
        if !values.is_empty() {
            self.predicates.push(Predicate::OneOf {
                column,
                values: values.to_vec(),
            });
        }
    }

    /// Render ` WHERE ...` (or nothing), numbering placeholders after the
    /// values already in `params` and appending the bound values
    fn where_clause(&self, params: &mut Vec<Value>) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }

        let mut conditions = Vec::with_capacity(self.predicates.len());
        for predicate in &self.predicates {
            match predicate {
                Predicate::Equals { column, value } => {
                    params.push(Value::Text(value.clone()));
                    conditions.push(format!("{} = ?{}", column, params.len()));
                }
                Predicate::OneOf { column, values } => {
                    let mut placeholders = Vec::with_capacity(values.len());
                    for value in values {
                        params.push(Value::Text(value.clone()));
                        placeholders.push(format!("?{}", params.len()));
                    }
                    conditions.push(format!("{} IN ({})", column, placeholders.join(", ")));
                }
                Predicate::IdEquals(id) => {
                    params.push(Value::Integer(*id));
                    conditions.push(format!("id = ?{}", params.len()));
                }
            }
        }
        format!(" WHERE {}", conditions.join(" AND "))
    }

    /// `SELECT` of the matching rows in insertion order
    pub fn select_sql(&self, table: &str) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let where_sql = self.where_clause(&mut params);
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY id ASC",
            SELECT_COLUMNS, table, where_sql
        );
        (sql, params)
    }

    /// `DELETE` of the matching rows
    pub fn delete_sql(&self, table: &str) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let where_sql = self.where_clause(&mut params);
        (format!("DELETE FROM {}{}", table, where_sql), params)
    }

    /// `UPDATE` rewriting all six value slots of the matching rows
    pub fn update_sql(&self, table: &str, values: &[String; VALUE_SLOTS]) -> (String, Vec<Value>) {
        let mut params: Vec<Value> = values.iter().cloned().map(Value::Text).collect();
        let assignments: Vec<String> = VALUE_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, column)| format!("{} = ?{}", column, idx + 1))
            .collect();
        let where_sql = self.where_clause(&mut params);
        let sql = format!(
            "UPDATE {} SET {}{}",
            table,
            assignments.join(", "),
            where_sql
        );
        (sql, params)
    }
}

/// `INSERT` of one rule row, binding ptype then `v0..v5`
pub fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} (ptype, v0, v1, v2, v3, v4, v5) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        table
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|v| v.to_string()).collect()
    }

    fn eq(column: &'static str, value: &str) -> Predicate {
        Predicate::Equals {
            column,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_empty_filter_has_no_predicates() {
        let query = RuleQuery::from_filter(&Filter::default());
        assert!(query.predicates().is_empty());

        let (sql, params) = query.select_sql("casbin_rule");
        assert_eq!(
            sql,
            "SELECT id, ptype, v0, v1, v2, v3, v4, v5 FROM casbin_rule ORDER BY id ASC"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_skips_unconstrained_slots() {
        let filter = Filter {
            ptype: values(&["p"]),
            v0: values(&["alice", "bob"]),
            v2: values(&["read"]),
            ..Default::default()
        };
        let query = RuleQuery::from_filter(&filter);
        assert_eq!(
            query.predicates(),
            &[
                Predicate::OneOf {
                    column: "ptype",
                    values: values(&["p"])
                },
                Predicate::OneOf {
                    column: "v0",
                    values: values(&["alice", "bob"])
                },
                Predicate::OneOf {
                    column: "v2",
                    values: values(&["read"])
                },
            ]
        );

        let (sql, params) = query.select_sql("casbin_rule");
        assert!(sql.contains(" WHERE ptype IN (?1) AND v0 IN (?2, ?3) AND v2 IN (?4) "));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_exact_matches_every_slot() {
        let record = RuleRecord::from_tuple("p", &values(&["alice", "data1", "read"]));
        let query = RuleQuery::exact(&record);
        assert_eq!(
            query.predicates(),
            &[
                eq("ptype", "p"),
                eq("v0", "alice"),
                eq("v1", "data1"),
                eq("v2", "read"),
                eq("v3", ""),
                eq("v4", ""),
                eq("v5", ""),
            ]
        );
    }

    #[test]
    fn test_indexed_from_zero() {
        let query = RuleQuery::indexed("p", 0, &values(&["data2_admin"]));
        assert_eq!(
            query.predicates(),
            &[eq("ptype", "p"), eq("v0", "data2_admin")]
        );
    }

    #[test]
    fn test_indexed_from_middle_slot() {
        let query = RuleQuery::indexed("p", 2, &values(&["read", "allow"]));
        assert_eq!(
            query.predicates(),
            &[eq("ptype", "p"), eq("v2", "read"), eq("v3", "allow")]
        );
    }

    #[test]
    fn test_indexed_values_past_last_slot_ignored() {
        let query = RuleQuery::indexed("p", 4, &values(&["a", "b", "c"]));
        assert_eq!(query.predicates(), &[eq("ptype", "p"), eq("v4", "a"), eq("v5", "b")]);
    }

    #[test]
    fn test_indexed_out_of_range_matches_whole_ptype() {
        for index in [-1, -3, 6, 42] {
            let query = RuleQuery::indexed("g", index, &values(&["alice", "admin"]));
            assert_eq!(query.predicates(), &[eq("ptype", "g")]);
        }
        let query = RuleQuery::indexed("g", 0, &[]);
        assert_eq!(query.predicates(), &[eq("ptype", "g")]);
    }

    #[test]
    fn test_delete_sql() {
        let (sql, params) = RuleQuery::id(7).delete_sql("casbin_rule");
        assert_eq!(sql, "DELETE FROM casbin_rule WHERE id = ?1");
        assert_eq!(params, vec![Value::Integer(7)]);

        let (sql, params) = RuleQuery::new().delete_sql("casbin_rule");
        assert_eq!(sql, "DELETE FROM casbin_rule");
        assert!(params.is_empty());
    }

    #[test]
    fn test_update_sql_numbers_where_after_set() {
        let old = RuleRecord::from_tuple("p", &values(&["alice"]));
        let new = RuleRecord::from_tuple("p", &values(&["bob"]));
        let (sql, params) = RuleQuery::exact(&old).update_sql("casbin_rule", &new.values);

        assert!(sql.starts_with(
            "UPDATE casbin_rule SET v0 = ?1, v1 = ?2, v2 = ?3, v3 = ?4, v4 = ?5, v5 = ?6 WHERE ptype = ?7"
        ));
        assert!(sql.ends_with("v5 = ?13"));
        assert_eq!(params.len(), 13);
        assert_eq!(params[0], Value::Text("bob".into()));
        assert_eq!(params[7], Value::Text("alice".into()));
    }

    #[test]
    fn test_filter_deserializes_from_toml() {
        let filter: Filter = toml::from_str(r#"v0 = ["alice", "bob"]"#).unwrap();
        assert_eq!(filter.v0, values(&["alice", "bob"]));
        assert!(filter.ptype.is_empty());
    }
}
