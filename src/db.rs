//! Database initialization and helpers shared by the resource modules.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::OffsetDateTime;

use crate::{
    Error, account::create_account_table, allocation::create_allocation_table,
    budget::create_budget_table, category::create_category_table,
    envelope::{create_envelope_table, create_month_config_table},
    goal::create_goal_table, match_rule::create_match_rule_table,
    transaction::create_transaction_table,
};

/// Create all tables for the domain models, if they do not exist yet.
///
/// Also enables foreign key enforcement, which SQLite leaves off by default
/// and which the cascading deletes rely on.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_budget_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_envelope_table(&transaction)?;
    create_month_config_table(&transaction)?;
    create_allocation_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_goal_table(&transaction)?;
    create_match_rule_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// The timestamp used for `created_at` and `updated_at` columns.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Check that a row with `id` exists in `table`.
///
/// `resource` names the resource in the error message.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if there is no such row.
pub fn ensure_exists(
    table: &str,
    resource: &'static str,
    id: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let exists: bool = connection.query_row(
        &format!("SELECT EXISTS (SELECT 1 FROM \"{table}\" WHERE id = ?1)"),
        [id],
        |row| row.get(0),
    )?;

    if exists {
        Ok(())
    } else {
        Err(Error::ReferenceNotFound(resource, id))
    }
}

/// Run `create` for each item of a batch request inside one SQLite transaction.
///
/// A failing item does not roll back the others, its error is returned in its place.
///
/// # Errors
/// Returns an error if the transaction cannot be started or committed.
pub fn create_batch<I, T>(
    items: Vec<I>,
    connection: &Connection,
    mut create: impl FnMut(I, &Connection) -> Result<T, Error>,
) -> Result<Vec<Result<T, Error>>, Error> {
    let transaction = connection.unchecked_transaction()?;

    let results = items
        .into_iter()
        .map(|item| create(item, &transaction))
        .collect();

    transaction.commit()?;

    Ok(results)
}

/// Delete every row of every table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn delete_everything(connection: &Connection) -> Result<(), Error> {
    // Budgets cascade to everything else.
    connection.execute("DELETE FROM budget", ())?;

    Ok(())
}
