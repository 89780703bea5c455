//! Builds the `WHERE` clause and parameters of list queries from typed filter values.
//!
//! Every resource translates its query string into calls on [SqlFilter], which
//! keeps the SQL explicit while sharing the exact/fuzzy/search semantics.

use rusqlite::{Connection, Row, ToSql};

use crate::{Error, pagination::Page};

/// A set of conditions that are joined with `AND`.
#[derive(Default)]
pub struct SqlFilter {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl SqlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match `column` exactly when `value` is set.
    pub fn exact<T: ToSql + 'static>(&mut self, column: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.clauses.push(format!("{column} = ?"));
            self.params.push(Box::new(value));
        }

        self
    }

    /// Compare `column` with `operator` (e.g. `>=`) when `value` is set.
    pub fn compare<T: ToSql + 'static>(
        &mut self,
        column: &str,
        operator: &str,
        value: Option<T>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.clauses.push(format!("{column} {operator} ?"));
            self.params.push(Box::new(value));
        }

        self
    }

    /// Fuzzy match `column` when `value` is set.
    ///
    /// An empty value only matches empty strings, anything else matches as a substring.
    pub fn fuzzy(&mut self, column: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some("") => {
                self.clauses.push(format!("{column} = ''"));
            }
            Some(value) => {
                self.clauses.push(format!("{column} LIKE ? ESCAPE '\\'"));
                self.params.push(Box::new(like_pattern(value)));
            }
            None => {}
        }

        self
    }

    /// Fuzzy match any of `columns` when `value` is set and non-empty.
    pub fn search(&mut self, columns: &[&str], value: Option<&str>) -> &mut Self {
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            return self;
        };

        let conditions = columns
            .iter()
            .map(|column| format!("{column} LIKE ? ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.clauses.push(format!("({conditions})"));

        for _ in columns {
            self.params.push(Box::new(like_pattern(value)));
        }

        self
    }

    /// Add a condition that has no parameters, e.g. `envelope_id IS NULL`.
    pub fn condition(&mut self, clause: &str) -> &mut Self {
        self.clauses.push(clause.to_owned());
        self
    }

    /// Add a condition with a single `?` placeholder for `value`.
    pub fn condition_with<T: ToSql + 'static>(&mut self, clause: &str, value: T) -> &mut Self {
        self.clauses.push(clause.to_owned());
        self.params.push(Box::new(value));
        self
    }

    /// The `WHERE` clause, or an empty string if there are no conditions.
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|param| param.as_ref()).collect()
    }

    /// Run `select` with this filter and return one page of results plus the total count.
    ///
    /// `select` is a full `SELECT ... FROM ...` statement without a `WHERE` clause.
    pub fn query_page<T, F>(
        &self,
        select: &str,
        order_by: &str,
        page: Page,
        connection: &Connection,
        map_row: F,
    ) -> Result<(Vec<T>, u64), Error>
    where
        F: FnMut(&Row) -> Result<T, rusqlite::Error>,
    {
        let where_clause = self.where_clause();
        let params = self.params();

        let total: i64 = connection.query_row(
            &format!("SELECT COUNT(*) FROM ({select}{where_clause})"),
            params.as_slice(),
            |row| row.get(0),
        )?;
        let total = u64::try_from(total).unwrap_or_default();

        let items = connection
            .prepare(&format!(
                "{select}{where_clause} ORDER BY {order_by}{}",
                page.sql_clause()
            ))?
            .query_map(params.as_slice(), map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total))
    }
}

fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::pagination::Page;

    use super::SqlFilter;

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "CREATE TABLE item (id INTEGER PRIMARY KEY, name TEXT NOT NULL, note TEXT NOT NULL, size INTEGER NOT NULL);
                INSERT INTO item (name, note, size) VALUES ('Groceries', '', 1);
                INSERT INTO item (name, note, size) VALUES ('Rent', 'monthly', 2);
                INSERT INTO item (name, note, size) VALUES ('Groceries 100%', 'shop', 3);
                INSERT INTO item (name, note, size) VALUES ('Fun', 'groceries are fun', 4);",
            )
            .unwrap();
        connection
    }

    fn names(filter: &SqlFilter, connection: &Connection) -> Vec<String> {
        filter
            .query_page(
                "SELECT name FROM item",
                "id",
                Page::all(),
                connection,
                |row| row.get(0),
            )
            .unwrap()
            .0
    }

    #[test]
    fn empty_filter_has_no_where_clause() {
        let filter = SqlFilter::new();

        assert_eq!(filter.where_clause(), "");
        assert_eq!(names(&filter, &get_test_connection()).len(), 4);
    }

    #[test]
    fn fuzzy_matches_substrings_case_insensitively() {
        let mut filter = SqlFilter::new();
        filter.fuzzy("name", Some("grocer"));

        assert_eq!(
            names(&filter, &get_test_connection()),
            ["Groceries", "Groceries 100%"]
        );
    }

    #[test]
    fn fuzzy_escapes_wildcards() {
        let mut filter = SqlFilter::new();
        filter.fuzzy("name", Some("100%"));

        assert_eq!(names(&filter, &get_test_connection()), ["Groceries 100%"]);
    }

    #[test]
    fn fuzzy_with_empty_string_matches_empty_values() {
        let mut filter = SqlFilter::new();
        filter.fuzzy("note", Some(""));

        assert_eq!(names(&filter, &get_test_connection()), ["Groceries"]);
    }

    #[test]
    fn search_matches_any_column() {
        let mut filter = SqlFilter::new();
        filter.search(&["name", "note"], Some("groceries"));

        assert_eq!(
            names(&filter, &get_test_connection()),
            ["Groceries", "Groceries 100%", "Fun"]
        );
    }

    #[test]
    fn conditions_are_combined() {
        let mut filter = SqlFilter::new();
        filter
            .exact("name", Some("Rent".to_owned()))
            .compare("size", ">=", Some(2));

        assert_eq!(names(&filter, &get_test_connection()), ["Rent"]);
    }

    #[test]
    fn query_page_returns_total_count() {
        let connection = get_test_connection();
        let filter = SqlFilter::new();

        let (items, total): (Vec<String>, u64) = filter
            .query_page(
                "SELECT name FROM item",
                "size DESC",
                Page {
                    offset: 1,
                    limit: Some(2),
                },
                &connection,
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(items, ["Groceries 100%", "Rent"]);
        assert_eq!(total, 4);
    }
}
