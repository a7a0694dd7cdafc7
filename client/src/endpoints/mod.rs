//! # Endpoint Modules
//!
//! One module per entity, each composing the API client with that entity's
//! period cache to expose a CRUD-like interface with read-through and
//! write-through semantics:
//!
//! - `list` answers from the cache when the period was already fetched and
//!   only goes to the network on a miss;
//! - `create` goes to the network first (the backend assigns row identity)
//!   and inserts the returned rows into the matching buckets on success;
//! - `update` and `delete` go to the network first and then patch/prune the
//!   affected buckets.
//!
//! Nothing is written to a cache on failure, so the last-known-good bucket
//! survives any network error. Endpoints are explicit instances wired by
//! [`crate::AppContext`]; tests build isolated ones over a fake transport.

pub mod commitments;
pub mod expenses;
pub mod incomes;

pub use commitments::{CommitmentUpdate, CommitmentsEndpoint, NewCommitment};
pub use expenses::{ExpenseUpdate, ExpensesEndpoint, NewExpense};
pub use incomes::{IncomeUpdate, IncomesEndpoint, NewIncome};

use shared::Period;

use crate::cache::{CacheRecord, PeriodKey};

/// The (bucket, identity) pairs a scoped mutation must reconcile: every row
/// the backend reported as affected, each against its own period bucket; or
/// the single requested row when the backend answered with an empty body.
pub(crate) fn affected_rows<R: CacheRecord>(
    reported: &[R],
    requested_row: u32,
    requested_period: Period,
) -> Vec<(PeriodKey, u32)> {
    if reported.is_empty() {
        return vec![(PeriodKey::Month(requested_period), requested_row)];
    }
    reported
        .iter()
        .map(|row| {
            let key = row
                .period()
                .map(PeriodKey::Month)
                .unwrap_or(PeriodKey::Month(requested_period));
            (key, row.row_index())
        })
        .collect()
}
