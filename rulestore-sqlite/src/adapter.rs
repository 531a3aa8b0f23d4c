//! SQLite policy adapter

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use rulestore_model::{Adapter, FilterValue, Model, load_policy_line};
use tracing::debug;

use crate::config::{AdapterConfig, DEFAULT_TABLE_NAME, validate_table_name};
use crate::error::AdapterError;
use crate::query::{Filter, RuleQuery, insert_sql};
use crate::record::{RuleRecord, StoredRule};
use crate::schema;
use crate::tx::with_tx;

/// Sections written by `save_policy`, permissions before role grouping
const SAVED_SECTIONS: [&str; 2] = ["p", "g"];

/// Policy adapter persisting rules to one SQLite table.
///
/// Every mutating operation runs in its own transaction. The only state kept
/// between calls is the filtered flag set by
/// [`Adapter::load_filtered_policy`].
pub struct SqliteAdapter {
    conn: Mutex<Connection>,
    table: String,
    filtered: bool,
}

impl SqliteAdapter {
    /// Open or create a database file using the default table name
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AdapterError> {
        let conn = Connection::open(path).map_err(AdapterError::Open)?;
        Self::with_connection(conn, DEFAULT_TABLE_NAME)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, AdapterError> {
        let conn = Connection::open_in_memory().map_err(AdapterError::Open)?;
        Self::with_connection(conn, DEFAULT_TABLE_NAME)
    }

    /// Open the configured database and table
    pub fn from_config(config: &AdapterConfig) -> Result<Self, AdapterError> {
        config.validate()?;
        let conn = Connection::open(&config.database).map_err(AdapterError::Open)?;
        Self::with_connection(conn, &config.table_name)
    }

    /// Wrap an already opened connection.
    ///
    /// The rule table is created if missing; the database itself must exist.
    pub fn with_connection(conn: Connection, table_name: &str) -> Result<Self, AdapterError> {
        validate_table_name(table_name)?;
        schema::create_table(&conn, table_name)?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table_name.to_string(),
            filtered: false,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panicking unit of work is rolled back before it unwinds past the
        // guard, so a poisoned connection is still consistent.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transact<T>(
        &self,
        work: impl FnOnce(&Connection) -> Result<T, AdapterError>,
    ) -> Result<T, AdapterError> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(AdapterError::Begin)?;
        with_tx(tx, |tx| work(tx))
    }

    /// Read matching rules, then feed them to the model
    fn load_rules(&self, query: &RuleQuery, model: &mut Model) -> Result<usize, AdapterError> {
        let rules = {
            let conn = self.lock();
            query_rules(&conn, &self.table, query)?
        };
        for rule in &rules {
            load_policy_line(&rule.record.to_line(), model);
        }
        Ok(rules.len())
    }
}

fn query_rules(
    conn: &Connection,
    table: &str,
    query: &RuleQuery,
) -> Result<Vec<StoredRule>, AdapterError> {
    let (sql, params) = query.select_sql(table);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| StoredRule::from_row(row))?;
    let rules = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(rules)
}

fn execute(conn: &Connection, (sql, params): (String, Vec<Value>)) -> Result<usize, AdapterError> {
    Ok(conn.execute(&sql, params_from_iter(params.iter()))?)
}

fn insert_records(
    conn: &Connection,
    table: &str,
    records: &[RuleRecord],
) -> Result<(), AdapterError> {
    let mut stmt = conn.prepare_cached(&insert_sql(table))?;
    for record in records {
        let fields = std::iter::once(&record.ptype).chain(&record.values);
        stmt.execute(params_from_iter(fields))?;
    }
    Ok(())
}

fn to_records(ptype: &str, rules: &[Vec<String>]) -> Vec<RuleRecord> {
    rules
        .iter()
        .map(|rule| RuleRecord::from_tuple(ptype, rule))
        .collect()
}

impl Adapter for SqliteAdapter {
    type Error = AdapterError;

    fn load_policy(&self, model: &mut Model) -> Result<(), AdapterError> {
        let count = self.load_rules(&RuleQuery::new(), model)?;
        debug!(rules = count, "Loaded policy");
        Ok(())
    }

    fn load_filtered_policy(
        &mut self,
        model: &mut Model,
        filter: &dyn FilterValue,
    ) -> Result<(), AdapterError> {
        let filter = filter
            .as_any()
            .downcast_ref::<Filter>()
            .ok_or_else(|| AdapterError::InvalidFilter(filter.shape()))?;

        let count = self.load_rules(&RuleQuery::from_filter(filter), model)?;
        self.filtered = true;
        debug!(rules = count, "Loaded filtered policy");
        Ok(())
    }

    fn is_filtered(&self) -> bool {
        self.filtered
    }

    fn save_policy(&self, model: &Model) -> Result<(), AdapterError> {
        let records: Vec<RuleRecord> = SAVED_SECTIONS
            .into_iter()
            .flat_map(|sec| model.section(sec))
            .flat_map(|(ptype, assertion)| {
                assertion
                    .policy
                    .iter()
                    .map(move |rule| RuleRecord::from_tuple(ptype, rule))
            })
            .collect();

        self.transact(|conn| {
            let removed = execute(conn, RuleQuery::new().delete_sql(&self.table))?;
            insert_records(conn, &self.table, &records)?;
            debug!(removed, inserted = records.len(), "Saved policy");
            Ok(())
        })
    }

    fn add_policy(&self, _sec: &str, ptype: &str, rule: &[String]) -> Result<(), AdapterError> {
        let record = RuleRecord::from_tuple(ptype, rule);
        self.transact(|conn| insert_records(conn, &self.table, std::slice::from_ref(&record)))?;
        debug!(ptype, "Added policy");
        Ok(())
    }

    fn add_policies(
        &self,
        _sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<(), AdapterError> {
        let records = to_records(ptype, rules);
        self.transact(|conn| insert_records(conn, &self.table, &records))?;
        debug!(ptype, rules = records.len(), "Added policies");
        Ok(())
    }

    fn remove_policy(&self, _sec: &str, ptype: &str, rule: &[String]) -> Result<(), AdapterError> {
        let record = RuleRecord::from_tuple(ptype, rule);
        let removed = self.transact(|conn| {
            execute(conn, RuleQuery::exact(&record).delete_sql(&self.table))
        })?;
        debug!(ptype, removed, "Removed policy");
        Ok(())
    }

    fn remove_policies(
        &self,
        _sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<(), AdapterError> {
        let records = to_records(ptype, rules);
        let removed = self.transact(|conn| {
            let mut removed = 0;
            for record in &records {
                removed += execute(conn, RuleQuery::exact(record).delete_sql(&self.table))?;
            }
            Ok(removed)
        })?;
        debug!(ptype, removed, "Removed policies");
        Ok(())
    }

    fn remove_filtered_policy(
        &self,
        _sec: &str,
        ptype: &str,
        field_index: isize,
        field_values: &[String],
    ) -> Result<(), AdapterError> {
        let query = RuleQuery::indexed(ptype, field_index, field_values);
        let removed = self.transact(|conn| execute(conn, query.delete_sql(&self.table)))?;
        debug!(ptype, field_index, removed, "Removed filtered policy");
        Ok(())
    }

    /// Rewrite the value slots of the row equal to `old_rule`.
    ///
    /// Updating a rule that is not stored affects no rows and succeeds.
    fn update_policy(
        &self,
        _sec: &str,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<(), AdapterError> {
        let old = RuleRecord::from_tuple(ptype, old_rule);
        let new = RuleRecord::from_tuple(ptype, new_rule);
        let updated = self.transact(|conn| {
            execute(conn, RuleQuery::exact(&old).update_sql(&self.table, &new.values))
        })?;
        debug!(ptype, updated, "Updated policy");
        Ok(())
    }

    /// Delete every old rule, then insert every new rule.
    ///
    /// Both lists must have the same length; otherwise nothing is written and
    /// [`AdapterError::MismatchedUpdate`] is returned.
    fn update_policies(
        &self,
        _sec: &str,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> Result<(), AdapterError> {
        if old_rules.len() != new_rules.len() {
            return Err(AdapterError::MismatchedUpdate {
                old: old_rules.len(),
                new: new_rules.len(),
            });
        }

        let old = to_records(ptype, old_rules);
        let new = to_records(ptype, new_rules);
        let removed = self.transact(|conn| {
            let mut removed = 0;
            for record in &old {
                removed += execute(conn, RuleQuery::exact(record).delete_sql(&self.table))?;
            }
            insert_records(conn, &self.table, &new)?;
            Ok(removed)
        })?;
        debug!(ptype, removed, inserted = new.len(), "Updated policies");
        Ok(())
    }

    fn update_filtered_policies(
        &self,
        _sec: &str,
        ptype: &str,
        new_rules: &[Vec<String>],
        field_index: isize,
        field_values: &[String],
    ) -> Result<Vec<Vec<String>>, AdapterError> {
        let query = RuleQuery::indexed(ptype, field_index, field_values);
        let new = to_records(ptype, new_rules);

        let replaced = self.transact(|conn| {
            let replaced = query_rules(conn, &self.table, &query)?;
            for rule in &replaced {
                execute(conn, RuleQuery::id(rule.id).delete_sql(&self.table))?;
            }
            insert_records(conn, &self.table, &new)?;
            Ok(replaced)
        })?;

        debug!(
            ptype,
            field_index,
            replaced = replaced.len(),
            inserted = new.len(),
            "Updated filtered policies"
        );
        Ok(replaced
            .into_iter()
            .map(|rule| rule.record.to_tuple())
            .collect())
    }
}
