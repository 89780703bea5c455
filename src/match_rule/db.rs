use rusqlite::{Connection, Row};

use crate::{
    Error,
    budget::BudgetId,
    db::{ensure_exists, now},
    filter::SqlFilter,
    match_rule::{MatchRule, MatchRuleForm, MatchRuleId, MatchRulePatch, MatchRuleQuery},
    pagination::Page,
};

const SELECT_MATCH_RULE: &str =
    "SELECT id, account_id, priority, pattern, created_at, updated_at FROM match_rule";

const RETURNING_MATCH_RULE: &str =
    "RETURNING id, account_id, priority, pattern, created_at, updated_at";

pub fn create_match_rule(form: MatchRuleForm, connection: &Connection) -> Result<MatchRule, Error> {
    ensure_exists("account", "account", form.account_id, connection)?;

    connection
        .prepare(&format!(
            "INSERT INTO match_rule (account_id, priority, pattern, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             {RETURNING_MATCH_RULE}"
        ))?
        .query_row(
            (form.account_id, form.priority, &form.pattern, now()),
            map_match_rule_row,
        )
        .map_err(Error::from)
}

pub fn get_match_rule(id: MatchRuleId, connection: &Connection) -> Result<MatchRule, Error> {
    connection
        .prepare(&format!("{SELECT_MATCH_RULE} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_match_rule_row)
        .map_err(Error::from)
}

pub fn list_match_rules(
    query: &MatchRuleQuery,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<MatchRule>, u64), Error> {
    if let Some(account_id) = query.account {
        ensure_exists("account", "account", account_id, connection)?;
    }

    let mut filter = SqlFilter::new();
    filter
        .exact("account_id", query.account)
        .exact("priority", query.priority)
        .fuzzy("pattern", query.pattern.as_deref());

    filter.query_page(
        SELECT_MATCH_RULE,
        "priority ASC, id ASC",
        page,
        connection,
        map_match_rule_row,
    )
}

/// All match rules of the accounts in a budget, in the order they are tried.
pub fn list_budget_match_rules(
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Vec<MatchRule>, Error> {
    connection
        .prepare(
            "SELECT match_rule.id, match_rule.account_id, match_rule.priority, match_rule.pattern,
                match_rule.created_at, match_rule.updated_at
             FROM match_rule
             INNER JOIN account ON account.id = match_rule.account_id
             WHERE account.budget_id = ?1
             ORDER BY match_rule.priority ASC, match_rule.id ASC",
        )?
        .query_map([budget_id], map_match_rule_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

pub fn update_match_rule(
    id: MatchRuleId,
    patch: MatchRulePatch,
    connection: &Connection,
) -> Result<MatchRule, Error> {
    let match_rule = get_match_rule(id, connection)?;

    if let Some(account_id) = patch.account_id {
        ensure_exists("account", "account", account_id, connection)?;
    }

    connection
        .prepare(&format!(
            "UPDATE match_rule SET account_id = ?1, priority = ?2, pattern = ?3, updated_at = ?4
             WHERE id = ?5
             {RETURNING_MATCH_RULE}"
        ))?
        .query_row(
            (
                patch.account_id.unwrap_or(match_rule.account_id),
                patch.priority.unwrap_or(match_rule.priority),
                patch.pattern.unwrap_or(match_rule.pattern),
                now(),
                id,
            ),
            map_match_rule_row,
        )
        .map_err(Error::from)
}

pub fn delete_match_rule(id: MatchRuleId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM match_rule WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub fn create_match_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS match_rule (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            priority INTEGER NOT NULL DEFAULT 0,
            pattern TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_match_rule_account ON match_rule(account_id);",
    )?;

    Ok(())
}

fn map_match_rule_row(row: &Row) -> Result<MatchRule, rusqlite::Error> {
    Ok(MatchRule {
        id: row.get(0)?,
        account_id: row.get(1)?,
        priority: row.get(2)?,
        pattern: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
