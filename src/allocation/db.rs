use rusqlite::{Connection, Row};

use crate::{
    Error,
    allocation::{Allocation, AllocationForm, AllocationId, AllocationPatch, AllocationQuery},
    budget_month::BudgetMonth,
    db::{ensure_exists, now},
    envelope::EnvelopeId,
    filter::SqlFilter,
    pagination::Page,
};

const SELECT_ALLOCATION: &str =
    "SELECT id, envelope_id, month, amount, created_at, updated_at FROM allocation";

const RETURNING_ALLOCATION: &str =
    "RETURNING id, envelope_id, month, amount, created_at, updated_at";

/// Create an allocation for an envelope.
///
/// # Errors
/// Returns an error if the envelope does not exist or already has an allocation for the month.
pub fn create_allocation(
    form: AllocationForm,
    connection: &Connection,
) -> Result<Allocation, Error> {
    ensure_exists("envelope", "envelope", form.envelope_id, connection)?;

    connection
        .prepare(&format!(
            "INSERT INTO allocation (envelope_id, month, amount, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             {RETURNING_ALLOCATION}"
        ))?
        .query_row(
            (form.envelope_id, form.month, form.amount, now()),
            map_allocation_row,
        )
        .map_err(Error::from)
}

/// Set the allocation of an envelope for `month`, creating it if needed.
pub fn upsert_allocation(
    envelope_id: EnvelopeId,
    month: BudgetMonth,
    amount: f64,
    connection: &Connection,
) -> Result<Allocation, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO allocation (envelope_id, month, amount, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(envelope_id, month) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at
             {RETURNING_ALLOCATION}"
        ))?
        .query_row((envelope_id, month, amount, now()), map_allocation_row)
        .map_err(Error::from)
}

pub fn get_allocation(id: AllocationId, connection: &Connection) -> Result<Allocation, Error> {
    connection
        .prepare(&format!("{SELECT_ALLOCATION} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_allocation_row)
        .map_err(Error::from)
}

pub fn list_allocations(
    query: &AllocationQuery,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Allocation>, u64), Error> {
    if let Some(envelope_id) = query.envelope {
        ensure_exists("envelope", "envelope", envelope_id, connection)?;
    }

    let mut filter = SqlFilter::new();
    filter
        .exact("envelope_id", query.envelope)
        .exact("month", query.month)
        .exact("amount", query.amount);

    filter.query_page(
        SELECT_ALLOCATION,
        "month ASC, id ASC",
        page,
        connection,
        map_allocation_row,
    )
}

pub fn update_allocation(
    id: AllocationId,
    patch: AllocationPatch,
    connection: &Connection,
) -> Result<Allocation, Error> {
    let allocation = get_allocation(id, connection)?;

    connection
        .prepare(&format!(
            "UPDATE allocation SET month = ?1, amount = ?2, updated_at = ?3
             WHERE id = ?4
             {RETURNING_ALLOCATION}"
        ))?
        .query_row(
            (
                patch.month.unwrap_or(allocation.month),
                patch.amount.unwrap_or(allocation.amount),
                now(),
                id,
            ),
            map_allocation_row,
        )
        .map_err(Error::from)
}

pub fn delete_allocation(id: AllocationId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM allocation WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub fn create_allocation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS allocation (
            id INTEGER PRIMARY KEY,
            envelope_id INTEGER NOT NULL REFERENCES envelope(id) ON DELETE CASCADE,
            month TEXT NOT NULL,
            amount REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(envelope_id, month)
        );

        CREATE INDEX IF NOT EXISTS idx_allocation_month ON allocation(month);",
    )?;

    Ok(())
}

fn map_allocation_row(row: &Row) -> Result<Allocation, rusqlite::Error> {
    Ok(Allocation {
        id: row.get(0)?,
        envelope_id: row.get(1)?,
        month: row.get(2)?,
        amount: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
