//! Database operations for accounts.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    account::{
        Account, AccountForm, AccountId, AccountPatch, AccountQuery, AccountResponse,
        models::AccountLinks,
    },
    database_id::DatabaseId,
    db::{ensure_exists, now},
    filter::SqlFilter,
    pagination::Page,
    response::round_cents,
};

const SELECT_ACCOUNT: &str = "SELECT id, budget_id, name, note, on_budget, external, \
    initial_balance, initial_balance_date, archived, created_at, updated_at FROM account";

const RETURNING_ACCOUNT: &str = "RETURNING id, budget_id, name, note, on_budget, external, \
    initial_balance, initial_balance_date, archived, created_at, updated_at";

/// How many of an account's latest transactions are used to find its recent envelopes.
const RECENT_TRANSACTION_COUNT: u32 = 50;
/// The maximum number of recent envelopes reported per account.
const RECENT_ENVELOPE_COUNT: u32 = 5;

/// Create an account in an existing budget.
///
/// # Errors
/// Returns an error if:
/// - the budget does not exist,
/// - the name is blank or already taken in the budget,
/// - the account is both external and on budget.
pub fn create_account(form: AccountForm, connection: &Connection) -> Result<Account, Error> {
    ensure_exists("budget", "budget", form.budget_id, connection)?;
    validate(&form.name, form.on_budget, form.external)?;

    connection
        .prepare(&format!(
            "INSERT INTO account (budget_id, name, note, on_budget, external, initial_balance,
                initial_balance_date, archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             {RETURNING_ACCOUNT}"
        ))?
        .query_row(
            (
                form.budget_id,
                form.name.trim(),
                &form.note,
                form.on_budget,
                form.external,
                form.initial_balance,
                form.initial_balance_date,
                form.archived,
                now(),
            ),
            map_account_row,
        )
        .map_err(Error::from)
}

/// Retrieve a single account by ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no account with `id`.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_account_row)
        .map_err(Error::from)
}

/// Retrieve one page of the accounts matching `query`, and the total number of matches.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if the query filters by a budget that does not exist.
pub fn list_accounts(
    query: &AccountQuery,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Account>, u64), Error> {
    if let Some(budget_id) = query.budget {
        ensure_exists("budget", "budget", budget_id, connection)?;
    }

    let mut filter = SqlFilter::new();
    filter
        .exact("budget_id", query.budget)
        .fuzzy("name", query.name.as_deref())
        .fuzzy("note", query.note.as_deref())
        .exact("on_budget", query.on_budget)
        .exact("external", query.external)
        .exact("archived", query.archived)
        .search(&["name", "note"], query.search.as_deref());

    filter.query_page(SELECT_ACCOUNT, "name ASC, id ASC", page, connection, map_account_row)
}

/// Apply `patch` to the account with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no account with `id`, or a validation
/// error if the patched account is invalid.
pub fn update_account(
    id: AccountId,
    patch: AccountPatch,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = get_account(id, connection)?;

    let name = patch.name.unwrap_or(account.name);
    let on_budget = patch.on_budget.unwrap_or(account.on_budget);
    let external = patch.external.unwrap_or(account.external);
    validate(&name, on_budget, external)?;

    if on_budget != account.on_budget || external != account.external {
        validate_transactions(id, on_budget, external, connection)?;
    }

    connection
        .prepare(&format!(
            "UPDATE account SET name = ?1, note = ?2, on_budget = ?3, external = ?4,
                initial_balance = ?5, initial_balance_date = ?6, archived = ?7, updated_at = ?8
             WHERE id = ?9
             {RETURNING_ACCOUNT}"
        ))?
        .query_row(
            (
                name.trim(),
                patch.note.unwrap_or(account.note),
                on_budget,
                external,
                patch.initial_balance.unwrap_or(account.initial_balance),
                patch
                    .initial_balance_date
                    .unwrap_or(account.initial_balance_date),
                patch.archived.unwrap_or(account.archived),
                now(),
                id,
            ),
            map_account_row,
        )
        .map_err(Error::from)
}

/// Check that the transactions of account `id` stay valid once the account is
/// `on_budget` and `external`.
fn validate_transactions(
    id: AccountId,
    on_budget: bool,
    external: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let counterpart_has = |condition: &str| -> Result<bool, Error> {
        connection
            .query_row(
                &format!(
                    "SELECT EXISTS (
                        SELECT 1 FROM \"transaction\" t
                        INNER JOIN account other ON other.id = CASE
                            WHEN t.source_account_id = ?1 THEN t.destination_account_id
                            ELSE t.source_account_id END
                        WHERE (t.source_account_id = ?1 OR t.destination_account_id = ?1)
                            AND {condition}
                    )"
                ),
                [id],
                |row| row.get(0),
            )
            .map_err(Error::from)
    };

    if on_budget && counterpart_has("t.envelope_id IS NOT NULL AND other.on_budget")? {
        return Err(Error::EnvelopeOnInternalTransfer);
    }

    if external && counterpart_has("other.external")? {
        return Err(Error::TransferBetweenExternalAccounts);
    }

    Ok(())
}

/// Delete an account together with its transactions and match rules.
///
/// # Errors
/// Returns [Error::NotFound] if there is no account with `id`.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM account WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Add the computed balances, recent envelopes and links to `account`.
pub fn account_response(
    account: Account,
    connection: &Connection,
) -> Result<AccountResponse, Error> {
    let (transaction_sum, reconciled_sum): (f64, f64) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN destination_account_id = :id THEN amount ELSE -amount END), 0),
            COALESCE(SUM(CASE
                WHEN destination_account_id = :id AND reconciled_destination THEN amount
                WHEN source_account_id = :id AND reconciled_source THEN -amount
                ELSE 0 END), 0)
         FROM \"transaction\"
         WHERE source_account_id = :id OR destination_account_id = :id",
        &[(":id", &account.id)],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(AccountResponse {
        balance: round_cents(account.initial_balance + transaction_sum),
        reconciled_balance: round_cents(account.initial_balance + reconciled_sum),
        recent_envelopes: recent_envelopes(account.id, connection)?,
        links: AccountLinks::new(&account),
        account,
    })
}

/// The envelopes used most often by the latest transactions of an account.
///
/// Ties are broken by which envelope was used more recently.
pub fn recent_envelopes(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<DatabaseId>, Error> {
    connection
        .prepare(
            "SELECT envelope_id FROM (
                SELECT envelope_id, date, id FROM \"transaction\"
                WHERE source_account_id = ?1 OR destination_account_id = ?1
                ORDER BY date DESC, id DESC
                LIMIT ?2
            )
            WHERE envelope_id IS NOT NULL
            GROUP BY envelope_id
            ORDER BY COUNT(*) DESC, MAX(date) DESC, MAX(id) DESC
            LIMIT ?3",
        )?
        .query_map(
            (account_id, RECENT_TRANSACTION_COUNT, RECENT_ENVELOPE_COUNT),
            |row| row.get(0),
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn validate(name: &str, on_budget: bool, external: bool) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::EmptyName("account"));
    }

    if external && on_budget {
        return Err(Error::ExternalAccountOnBudget);
    }

    Ok(())
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            budget_id INTEGER NOT NULL REFERENCES budget(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            on_budget INTEGER NOT NULL DEFAULT 0,
            external INTEGER NOT NULL DEFAULT 0,
            initial_balance REAL NOT NULL DEFAULT 0,
            initial_balance_date TEXT,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(budget_id, name),
            CHECK (NOT (external AND on_budget))
        );

        CREATE INDEX IF NOT EXISTS idx_account_budget ON account(budget_id);",
    )?;

    Ok(())
}

pub(crate) fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        budget_id: row.get(1)?,
        name: row.get(2)?,
        note: row.get(3)?,
        on_budget: row.get(4)?,
        external: row.get(5)?,
        initial_balance: row.get(6)?,
        initial_balance_date: row.get(7)?,
        archived: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
