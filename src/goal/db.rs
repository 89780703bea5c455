use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{ensure_exists, now},
    filter::SqlFilter,
    goal::{Goal, GoalForm, GoalId, GoalPatch, GoalQuery},
    pagination::Page,
};

const SELECT_GOAL: &str = "SELECT id, envelope_id, name, note, amount, month, archived, \
    created_at, updated_at FROM goal";

const RETURNING_GOAL: &str =
    "RETURNING id, envelope_id, name, note, amount, month, archived, created_at, updated_at";

fn validate(name: &str, amount: f64) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::EmptyName("goal"));
    }

    if amount.is_nan() || amount < 0.0 {
        return Err(Error::NegativeGoalAmount);
    }

    Ok(())
}

pub fn create_goal(form: GoalForm, connection: &Connection) -> Result<Goal, Error> {
    ensure_exists("envelope", "envelope", form.envelope_id, connection)?;
    validate(&form.name, form.amount)?;

    connection
        .prepare(&format!(
            "INSERT INTO goal (envelope_id, name, note, amount, month, archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             {RETURNING_GOAL}"
        ))?
        .query_row(
            (
                form.envelope_id,
                form.name.trim(),
                &form.note,
                form.amount,
                form.month,
                form.archived,
                now(),
            ),
            map_goal_row,
        )
        .map_err(Error::from)
}

pub fn get_goal(id: GoalId, connection: &Connection) -> Result<Goal, Error> {
    connection
        .prepare(&format!("{SELECT_GOAL} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_goal_row)
        .map_err(Error::from)
}

pub fn list_goals(
    query: &GoalQuery,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Goal>, u64), Error> {
    if let Some(envelope_id) = query.envelope {
        ensure_exists("envelope", "envelope", envelope_id, connection)?;
    }

    let mut filter = SqlFilter::new();
    filter
        .exact("envelope_id", query.envelope)
        .fuzzy("name", query.name.as_deref())
        .fuzzy("note", query.note.as_deref())
        .exact("amount", query.amount)
        .exact("month", query.month)
        .compare("month", ">=", query.from_month)
        .compare("month", "<=", query.until_month)
        .exact("archived", query.archived)
        .search(&["name", "note"], query.search.as_deref());

    filter.query_page(
        SELECT_GOAL,
        "month ASC, name ASC, id ASC",
        page,
        connection,
        map_goal_row,
    )
}

pub fn update_goal(id: GoalId, patch: GoalPatch, connection: &Connection) -> Result<Goal, Error> {
    let goal = get_goal(id, connection)?;

    let name = patch.name.unwrap_or(goal.name);
    let amount = patch.amount.unwrap_or(goal.amount);
    validate(&name, amount)?;

    connection
        .prepare(&format!(
            "UPDATE goal SET name = ?1, note = ?2, amount = ?3, month = ?4, archived = ?5,
                updated_at = ?6
             WHERE id = ?7
             {RETURNING_GOAL}"
        ))?
        .query_row(
            (
                name.trim(),
                patch.note.unwrap_or(goal.note),
                amount,
                patch.month.unwrap_or(goal.month),
                patch.archived.unwrap_or(goal.archived),
                now(),
                id,
            ),
            map_goal_row,
        )
        .map_err(Error::from)
}

pub fn delete_goal(id: GoalId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM goal WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS goal (
            id INTEGER PRIMARY KEY,
            envelope_id INTEGER NOT NULL REFERENCES envelope(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            amount REAL NOT NULL CHECK (amount >= 0),
            month TEXT NOT NULL,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(envelope_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_goal_envelope ON goal(envelope_id);",
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        envelope_id: row.get(1)?,
        name: row.get(2)?,
        note: row.get(3)?,
        amount: row.get(4)?,
        month: row.get(5)?,
        archived: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
