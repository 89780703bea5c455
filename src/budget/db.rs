//! Database operations for budgets.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    budget::{Budget, BudgetForm, BudgetId, BudgetPatch, BudgetQuery},
    db::now,
    filter::SqlFilter,
    pagination::Page,
};

const SELECT_BUDGET: &str = "SELECT id, name, note, currency, created_at, updated_at FROM budget";

/// Create a budget and return it with its generated ID.
///
/// # Errors
/// Returns [Error::EmptyName] if the name is blank.
pub fn create_budget(form: BudgetForm, connection: &Connection) -> Result<Budget, Error> {
    if form.name.trim().is_empty() {
        return Err(Error::EmptyName("budget"));
    }

    let timestamp = now();

    connection
        .prepare(
            "INSERT INTO budget (name, note, currency, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING id, name, note, currency, created_at, updated_at",
        )?
        .query_row(
            (form.name.trim(), &form.note, &form.currency, timestamp),
            map_budget_row,
        )
        .map_err(Error::from)
}

/// Retrieve a single budget by ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no budget with `id`.
pub fn get_budget(id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(&format!("{SELECT_BUDGET} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_budget_row)
        .map_err(Error::from)
}

/// Retrieve one page of the budgets matching `query`, and the total number of matches.
pub fn list_budgets(
    query: &BudgetQuery,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Budget>, u64), Error> {
    let mut filter = SqlFilter::new();
    filter
        .fuzzy("name", query.name.as_deref())
        .fuzzy("note", query.note.as_deref())
        .exact("currency", query.currency.clone())
        .search(&["name", "note"], query.search.as_deref());

    filter.query_page(SELECT_BUDGET, "name ASC, id ASC", page, connection, map_budget_row)
}

/// Apply `patch` to the budget with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no budget with `id`.
pub fn update_budget(
    id: BudgetId,
    patch: BudgetPatch,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = get_budget(id, connection)?;

    if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(Error::EmptyName("budget"));
    }

    connection
        .prepare(
            "UPDATE budget SET name = ?1, note = ?2, currency = ?3, updated_at = ?4
             WHERE id = ?5
             RETURNING id, name, note, currency, created_at, updated_at",
        )?
        .query_row(
            (
                patch.name.as_deref().map_or(budget.name.as_str(), str::trim),
                patch.note.unwrap_or(budget.note),
                patch.currency.unwrap_or(budget.currency),
                now(),
                id,
            ),
            map_budget_row,
        )
        .map_err(Error::from)
}

/// Delete a budget and, through the foreign keys, everything it owns.
///
/// # Errors
/// Returns [Error::NotFound] if there is no budget with `id`.
pub fn delete_budget(id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM budget WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            currency TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_budget_name ON budget(name);",
    )?;

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        name: row.get(1)?,
        note: row.get(2)?,
        currency: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
