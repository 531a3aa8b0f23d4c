//! rulestore-sqlite: SQLite persistence for policy rules
//!
//! [`SqliteAdapter`] implements the [`rulestore_model::Adapter`] contract over a
//! single rule table. Each rule is stored as a [`RuleRecord`]: a ptype plus six
//! value slots, unique across the table.
//!
//! - **Records** - [`record`] converts between rule tuples, rows and policy lines
//! - **Queries** - [`query`] builds predicates from a [`Filter`] or a partial rule
//! - **Transactions** - [`tx::with_tx`] commits or rolls back a unit of work
//!
//! # Example
//!
//! ```
//! use rulestore_model::{Adapter, Model};
//! use rulestore_sqlite::{Filter, SqliteAdapter};
//!
//! let mut adapter = SqliteAdapter::open_in_memory()?;
//! let model = Model::from_policy_text("p, alice, data1, read\np, bob, data2, write");
//! adapter.save_policy(&model)?;
//!
//! let mut loaded = Model::new();
//! let filter = Filter {
//!     v0: vec!["bob".into()],
//!     ..Default::default()
//! };
//! adapter.load_filtered_policy(&mut loaded, &filter)?;
//! assert_eq!(loaded.get_policy("p", "p"), &[vec!["bob", "data2", "write"]]);
//! assert!(adapter.is_filtered());
//! # Ok::<(), rulestore_sqlite::AdapterError>(())
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod query;
pub mod record;
pub mod schema;
pub mod tx;

pub use adapter::SqliteAdapter;
pub use config::{AdapterConfig, DEFAULT_DATABASE, DEFAULT_TABLE_NAME};
pub use error::AdapterError;
pub use query::{Filter, Predicate, RuleQuery};
pub use record::{RuleRecord, VALUE_SLOTS};
