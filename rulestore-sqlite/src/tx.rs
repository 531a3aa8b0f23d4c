//! All-or-nothing units of work
//!
//! [`with_tx`] runs a closure against an open transaction and always finishes
//! it: commit on success, rollback on an error or a panic. A panic is rolled
//! back and then resumed unchanged; it never becomes an `Err`.

use std::panic::{self, AssertUnwindSafe};

use crate::error::AdapterError;

/// An open transaction that is finished exactly once
pub trait TxHandle {
    fn commit(self) -> Result<(), rusqlite::Error>;
    fn rollback(self) -> Result<(), rusqlite::Error>;
}

impl TxHandle for rusqlite::Transaction<'_> {
    fn commit(self) -> Result<(), rusqlite::Error> {
        rusqlite::Transaction::commit(self)
    }

    fn rollback(self) -> Result<(), rusqlite::Error> {
        rusqlite::Transaction::rollback(self)
    }
}

/// Run `work` inside `tx`.
///
/// If `work` fails and the rollback fails as well, both errors are returned
/// together as [`AdapterError::Rollback`].
pub fn with_tx<H, T, F>(tx: H, work: F) -> Result<T, AdapterError>
where
    H: TxHandle,
    F: FnOnce(&H) -> Result<T, AdapterError>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&tx)));

    match outcome {
        Err(payload) => {
            if let Err(e) = tx.rollback() {
                tracing::warn!(error = %e, "Rollback after panic failed");
            }
            panic::resume_unwind(payload)
        }
        Ok(Err(err)) => match tx.rollback() {
            Ok(()) => Err(err),
            Err(rollback) => {
                tracing::warn!(error = %err, rollback_error = %rollback, "Rollback failed");
                Err(AdapterError::Rollback {
                    source: Box::new(err),
                    rollback,
                })
            }
        },
        Ok(Ok(value)) => {
            tx.commit().map_err(AdapterError::Commit)?;
            Ok(value)
        }
    }
}
