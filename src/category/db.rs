use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryForm, CategoryId, CategoryPatch, CategoryQuery},
    db::{ensure_exists, now},
    filter::SqlFilter,
    pagination::Page,
};

const SELECT_CATEGORY: &str =
    "SELECT id, budget_id, name, note, archived, created_at, updated_at FROM category";

pub fn create_category(form: CategoryForm, connection: &Connection) -> Result<Category, Error> {
    ensure_exists("budget", "budget", form.budget_id, connection)?;

    if form.name.trim().is_empty() {
        return Err(Error::EmptyName("category"));
    }

    connection
        .prepare(
            "INSERT INTO category (budget_id, name, note, archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING id, budget_id, name, note, archived, created_at, updated_at",
        )?
        .query_row(
            (
                form.budget_id,
                form.name.trim(),
                &form.note,
                form.archived,
                now(),
            ),
            map_category_row,
        )
        .map_err(Error::from)
}

/// Retrieve a single category by ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no category with `id`.
pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(&format!("{SELECT_CATEGORY} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_category_row)
        .map_err(Error::from)
}

pub fn list_categories(
    query: &CategoryQuery,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Category>, u64), Error> {
    if let Some(budget_id) = query.budget {
        ensure_exists("budget", "budget", budget_id, connection)?;
    }

    let mut filter = SqlFilter::new();
    filter
        .exact("budget_id", query.budget)
        .fuzzy("name", query.name.as_deref())
        .fuzzy("note", query.note.as_deref())
        .exact("archived", query.archived)
        .search(&["name", "note"], query.search.as_deref());

    filter.query_page(SELECT_CATEGORY, "name ASC, id ASC", page, connection, map_category_row)
}

pub fn update_category(
    id: CategoryId,
    patch: CategoryPatch,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = get_category(id, connection)?;

    let name = patch.name.unwrap_or(category.name);
    if name.trim().is_empty() {
        return Err(Error::EmptyName("category"));
    }

    connection
        .prepare(
            "UPDATE category SET name = ?1, note = ?2, archived = ?3, updated_at = ?4
             WHERE id = ?5
             RETURNING id, budget_id, name, note, archived, created_at, updated_at",
        )?
        .query_row(
            (
                name.trim(),
                patch.note.unwrap_or(category.note),
                patch.archived.unwrap_or(category.archived),
                now(),
                id,
            ),
            map_category_row,
        )
        .map_err(Error::from)
}

/// Delete a category and its envelopes.
pub fn delete_category(id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            budget_id INTEGER NOT NULL REFERENCES budget(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(budget_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_category_budget ON category(budget_id);",
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        budget_id: row.get(1)?,
        name: row.get(2)?,
        note: row.get(3)?,
        archived: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        category::{CategoryForm, CategoryPatch, CategoryQuery},
        envelope::get_envelope,
        pagination::Page,
        test_utils::{
            get_test_connection, must_create_budget, must_create_category, must_create_envelope,
        },
    };

    use super::{create_category, delete_category, get_category, list_categories, update_category};

    #[test]
    fn create_category_in_budget() {
        let connection = get_test_connection();
        let budget = must_create_budget(&connection);

        let category = create_category(
            CategoryForm {
                budget_id: budget.id,
                name: "Living".to_owned(),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(category.budget_id, budget.id);
        assert_eq!(get_category(category.id, &connection), Ok(category));
    }

    #[test]
    fn duplicate_name_in_budget_is_rejected() {
        let connection = get_test_connection();
        let budget = must_create_budget(&connection);
        must_create_category(budget.id, "Living", &connection);

        let result = create_category(
            CategoryForm {
                budget_id: budget.id,
                name: "Living".to_owned(),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::Duplicate(
                "a category with this name already exists in the budget".to_owned()
            ))
        );
    }

    #[test]
    fn empty_note_filter_matches_only_empty_notes() {
        let connection = get_test_connection();
        let budget = must_create_budget(&connection);
        must_create_category(budget.id, "Living", &connection);
        let saving = must_create_category(budget.id, "Saving", &connection);
        update_category(
            saving.id,
            CategoryPatch {
                note: Some("for later".to_owned()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        let query = CategoryQuery {
            note: Some(String::new()),
            ..Default::default()
        };
        let (categories, _) = list_categories(&query, Page::all(), &connection).unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Living");
    }

    #[test]
    fn update_rejects_blank_name() {
        let connection = get_test_connection();
        let budget = must_create_budget(&connection);
        let category = must_create_category(budget.id, "Living", &connection);

        let result = update_category(
            category.id,
            CategoryPatch {
                name: Some(" ".to_owned()),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(result, Err(Error::EmptyName("category")));
    }

    #[test]
    fn delete_category_removes_envelopes() {
        let connection = get_test_connection();
        let budget = must_create_budget(&connection);
        let category = must_create_category(budget.id, "Living", &connection);
        let envelope = must_create_envelope(category.id, "Rent", &connection);

        delete_category(category.id, &connection).unwrap();

        assert_eq!(get_envelope(envelope.id, &connection), Err(Error::NotFound));
    }
}
