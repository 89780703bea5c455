use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    budget::BudgetId,
    category::{CategoryId, get_category},
    db::{ensure_exists, now},
    envelope::{Envelope, EnvelopeForm, EnvelopeId, EnvelopePatch, EnvelopeQuery},
    filter::SqlFilter,
    pagination::Page,
};

const SELECT_ENVELOPE: &str =
    "SELECT id, category_id, name, note, archived, created_at, updated_at FROM envelope";

pub fn create_envelope(form: EnvelopeForm, connection: &Connection) -> Result<Envelope, Error> {
    ensure_exists("category", "category", form.category_id, connection)?;

    if form.name.trim().is_empty() {
        return Err(Error::EmptyName("envelope"));
    }

    connection
        .prepare(
            "INSERT INTO envelope (category_id, name, note, archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING id, category_id, name, note, archived, created_at, updated_at",
        )?
        .query_row(
            (
                form.category_id,
                form.name.trim(),
                &form.note,
                form.archived,
                now(),
            ),
            map_envelope_row,
        )
        .map_err(Error::from)
}

/// Retrieve a single envelope by ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no envelope with `id`.
pub fn get_envelope(id: EnvelopeId, connection: &Connection) -> Result<Envelope, Error> {
    connection
        .prepare(&format!("{SELECT_ENVELOPE} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_envelope_row)
        .map_err(Error::from)
}

/// The budget an envelope belongs to, through its category.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if there is no envelope with `id`.
pub fn envelope_budget_id(id: EnvelopeId, connection: &Connection) -> Result<BudgetId, Error> {
    connection
        .query_row(
            "SELECT category.budget_id FROM envelope
             INNER JOIN category ON category.id = envelope.category_id
             WHERE envelope.id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(Error::ReferenceNotFound("envelope", id))
}

pub fn list_envelopes(
    query: &EnvelopeQuery,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Envelope>, u64), Error> {
    if let Some(category_id) = query.category {
        ensure_exists("category", "category", category_id, connection)?;
    }

    let mut filter = SqlFilter::new();
    filter
        .exact("category_id", query.category)
        .fuzzy("name", query.name.as_deref())
        .fuzzy("note", query.note.as_deref())
        .exact("archived", query.archived)
        .search(&["name", "note"], query.search.as_deref());

    filter.query_page(SELECT_ENVELOPE, "name ASC, id ASC", page, connection, map_envelope_row)
}

/// Apply `patch` to the envelope with `id`.
///
/// # Errors
/// Returns an error if:
/// - there is no envelope with `id`,
/// - the new category does not exist or belongs to another budget,
/// - the new name is blank or taken in the category.
pub fn update_envelope(
    id: EnvelopeId,
    patch: EnvelopePatch,
    connection: &Connection,
) -> Result<Envelope, Error> {
    let envelope = get_envelope(id, connection)?;

    let category_id = match patch.category_id {
        Some(category_id) if category_id != envelope.category_id => {
            move_to_category(&envelope, category_id, connection)?;
            category_id
        }
        _ => envelope.category_id,
    };

    let name = patch.name.unwrap_or(envelope.name);
    if name.trim().is_empty() {
        return Err(Error::EmptyName("envelope"));
    }

    connection
        .prepare(
            "UPDATE envelope SET category_id = ?1, name = ?2, note = ?3, archived = ?4, updated_at = ?5
             WHERE id = ?6
             RETURNING id, category_id, name, note, archived, created_at, updated_at",
        )?
        .query_row(
            (
                category_id,
                name.trim(),
                patch.note.unwrap_or(envelope.note),
                patch.archived.unwrap_or(envelope.archived),
                now(),
                id,
            ),
            map_envelope_row,
        )
        .map_err(Error::from)
}

fn move_to_category(
    envelope: &Envelope,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let target = get_category(category_id, connection).map_err(|error| match error {
        Error::NotFound => Error::ReferenceNotFound("category", category_id),
        error => error,
    })?;
    let current = get_category(envelope.category_id, connection)?;

    if target.budget_id != current.budget_id {
        return Err(Error::EnvelopeNotInBudget);
    }

    Ok(())
}

/// Delete an envelope with its allocations, month configs and goals.
///
/// Transactions that used the envelope are kept without an envelope.
pub fn delete_envelope(id: EnvelopeId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM envelope WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub fn create_envelope_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS envelope (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(category_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_envelope_category ON envelope(category_id);",
    )?;

    Ok(())
}

fn map_envelope_row(row: &Row) -> Result<Envelope, rusqlite::Error> {
    Ok(Envelope {
        id: row.get(0)?,
        category_id: row.get(1)?,
        name: row.get(2)?,
        note: row.get(3)?,
        archived: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
