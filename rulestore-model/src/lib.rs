//! rulestore-model: the policy-engine side of rulestore
//!
//! This crate holds what a storage backend needs to know about the policy
//! engine it serves:
//!
//! - **Policy model** - [`Model`] groups rules by section (`p`, `g`) and ptype
//! - **Line parser** - [`load_policy_line`] turns `ptype, v0, v1, ...` text into rules
//! - **Adapter contract** - [`Adapter`] is implemented by pluggable storage backends
//!
//! # Example
//!
//! ```
//! use rulestore_model::Model;
//!
//! let model = Model::from_policy_text("p, alice, data1, read\ng, alice, admin");
//! assert_eq!(model.get_policy("p", "p"), &[vec!["alice", "data1", "read"]]);
//! assert_eq!(model.get_policy("g", "g").len(), 1);
//! ```

pub mod adapter;
pub mod error;
pub mod model;
pub mod persist;

pub use adapter::{Adapter, FilterValue};
pub use error::ModelError;
pub use model::{Assertion, Model};
pub use persist::{load_policy_file, load_policy_line, load_policy_text};
