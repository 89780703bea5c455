//! The ID type shared by every table.

/// The `INTEGER PRIMARY KEY` of a row, used for budgets, accounts, envelopes and the rest.
pub type DatabaseId = i64;
