//! The transaction model, its validation rules and the database functions to manage it.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{Account, AccountId, get_account},
    budget::BudgetId,
    budget_month::BudgetMonth,
    database_id::DatabaseId,
    db::now,
    endpoints::{self, format_endpoint},
    envelope::{EnvelopeId, envelope_budget_id},
    extract::double_option,
};

pub type TransactionId = DatabaseId;

/// Money moving from one account to another.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    /// The budget of the source account.
    pub budget_id: BudgetId,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    /// The envelope the money is taken from (or returned to), if any.
    pub envelope_id: Option<EnvelopeId>,
    /// Always positive, the direction is given by the accounts.
    pub amount: f64,
    pub date: Date,
    /// The month income becomes available to budget.
    pub available_from: BudgetMonth,
    pub note: String,
    pub reconciled_source: bool,
    pub reconciled_destination: bool,
    /// Identifies the imported row this transaction was created from.
    pub import_hash: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionForm {
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    #[serde(default)]
    pub envelope_id: Option<EnvelopeId>,
    pub amount: f64,
    pub date: Date,
    /// Defaults to the month of `date`.
    #[serde(default)]
    pub available_from: Option<BudgetMonth>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub reconciled_source: bool,
    #[serde(default)]
    pub reconciled_destination: bool,
    #[serde(default)]
    pub import_hash: Option<String>,
}

/// The fields of a transaction that can be changed, missing fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionPatch {
    pub source_account_id: Option<AccountId>,
    pub destination_account_id: Option<AccountId>,
    #[serde(default, deserialize_with = "double_option")]
    pub envelope_id: Option<Option<EnvelopeId>>,
    pub amount: Option<f64>,
    pub date: Option<Date>,
    pub available_from: Option<BudgetMonth>,
    pub note: Option<String>,
    pub reconciled_source: Option<bool>,
    pub reconciled_destination: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub import_hash: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub budget: String,
    pub source_account: String,
    pub destination_account: String,
    pub envelope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResponse {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub links: TransactionLinks,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            links: TransactionLinks {
                self_: format_endpoint(endpoints::TRANSACTION, transaction.id),
                budget: format_endpoint(endpoints::BUDGET, transaction.budget_id),
                source_account: format_endpoint(
                    endpoints::ACCOUNT,
                    transaction.source_account_id,
                ),
                destination_account: format_endpoint(
                    endpoints::ACCOUNT,
                    transaction.destination_account_id,
                ),
                envelope: transaction
                    .envelope_id
                    .map(|id| format_endpoint(endpoints::ENVELOPE, id)),
            },
            transaction,
        }
    }
}

const SELECT_TRANSACTION: &str = "SELECT id, budget_id, source_account_id, destination_account_id, \
    envelope_id, amount, date, available_from, note, reconciled_source, reconciled_destination, \
    import_hash, created_at, updated_at FROM \"transaction\"";

const RETURNING_TRANSACTION: &str = "RETURNING id, budget_id, source_account_id, \
    destination_account_id, envelope_id, amount, date, available_from, note, reconciled_source, \
    reconciled_destination, import_hash, created_at, updated_at";

/// The values of a transaction that are checked before it is stored.
struct Movement<'a> {
    source: &'a Account,
    destination: &'a Account,
    envelope_id: Option<EnvelopeId>,
    amount: f64,
    date: Date,
    available_from: BudgetMonth,
}

/// Check the rules every transaction must follow and return the budget it belongs to.
fn validate(movement: &Movement, connection: &Connection) -> Result<BudgetId, Error> {
    let Movement {
        source,
        destination,
        envelope_id,
        amount,
        date,
        available_from,
    } = movement;

    if amount.is_nan() || *amount <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    if source.id == destination.id {
        return Err(Error::SameSourceAndDestination);
    }

    if source.budget_id != destination.budget_id {
        return Err(Error::AccountsInDifferentBudgets);
    }

    if source.external && destination.external {
        return Err(Error::TransferBetweenExternalAccounts);
    }

    if let Some(envelope_id) = envelope_id {
        if source.on_budget && destination.on_budget {
            return Err(Error::EnvelopeOnInternalTransfer);
        }

        if envelope_budget_id(*envelope_id, connection)? != source.budget_id {
            return Err(Error::EnvelopeNotInBudget);
        }
    }

    if *available_from < BudgetMonth::of(*date) {
        return Err(Error::AvailableFromBeforeDate);
    }

    Ok(source.budget_id)
}

/// Get an account that a transaction refers to.
fn get_referenced_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    get_account(id, connection).map_err(|error| match error {
        Error::NotFound => Error::ReferenceNotFound("account", id),
        error => error,
    })
}

/// Create a transaction.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if an account or the envelope does not
/// exist, or a validation error if the transaction breaks one of the transaction rules.
pub fn create_transaction(
    form: TransactionForm,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let source = get_referenced_account(form.source_account_id, connection)?;
    let destination = get_referenced_account(form.destination_account_id, connection)?;
    let available_from = form
        .available_from
        .unwrap_or_else(|| BudgetMonth::of(form.date));

    let budget_id = validate(
        &Movement {
            source: &source,
            destination: &destination,
            envelope_id: form.envelope_id,
            amount: form.amount,
            date: form.date,
            available_from,
        },
        connection,
    )?;

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (budget_id, source_account_id, destination_account_id,
                envelope_id, amount, date, available_from, note, reconciled_source,
                reconciled_destination, import_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             {RETURNING_TRANSACTION}"
        ))?
        .query_row(
            (
                budget_id,
                source.id,
                destination.id,
                form.envelope_id,
                form.amount,
                form.date,
                available_from,
                &form.note,
                form.reconciled_source,
                form.reconciled_destination,
                &form.import_hash,
                now(),
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve a transaction by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no transaction with `id`.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!("{SELECT_TRANSACTION} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(Error::from)
}

/// Apply `patch` to the transaction with `id` and check the result.
///
/// When the date moves to another month and `availableFrom` is not part of
/// the patch, a transaction that was available in the month of its old date
/// becomes available in the month of its new date.
///
/// # Errors
/// Returns [Error::NotFound] if there is no transaction with `id`, otherwise the same errors as
/// [create_transaction].
pub fn update_transaction(
    id: TransactionId,
    patch: TransactionPatch,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection)?;

    let source = get_referenced_account(
        patch
            .source_account_id
            .unwrap_or(transaction.source_account_id),
        connection,
    )?;
    let destination = get_referenced_account(
        patch
            .destination_account_id
            .unwrap_or(transaction.destination_account_id),
        connection,
    )?;
    let envelope_id = patch.envelope_id.unwrap_or(transaction.envelope_id);
    let amount = patch.amount.unwrap_or(transaction.amount);
    let date = patch.date.unwrap_or(transaction.date);
    let available_from = match patch.available_from {
        Some(available_from) => available_from,
        None if transaction.available_from == BudgetMonth::of(transaction.date) => {
            BudgetMonth::of(date)
        }
        None => transaction.available_from,
    };

    let budget_id = validate(
        &Movement {
            source: &source,
            destination: &destination,
            envelope_id,
            amount,
            date,
            available_from,
        },
        connection,
    )?;

    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET budget_id = ?1, source_account_id = ?2,
                destination_account_id = ?3, envelope_id = ?4, amount = ?5, date = ?6,
                available_from = ?7, note = ?8, reconciled_source = ?9,
                reconciled_destination = ?10, import_hash = ?11, updated_at = ?12
             WHERE id = ?13
             {RETURNING_TRANSACTION}"
        ))?
        .query_row(
            (
                budget_id,
                source.id,
                destination.id,
                envelope_id,
                amount,
                date,
                available_from,
                patch.note.unwrap_or(transaction.note),
                patch
                    .reconciled_source
                    .unwrap_or(transaction.reconciled_source),
                patch
                    .reconciled_destination
                    .unwrap_or(transaction.reconciled_destination),
                patch.import_hash.unwrap_or(transaction.import_hash),
                now(),
                id,
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Delete a transaction.
///
/// # Errors
/// Returns [Error::NotFound] if there is no transaction with `id`.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// The IDs of the transactions of a budget that were imported from the row identified by `import_hash`.
pub fn transaction_ids_with_import_hash(
    budget_id: BudgetId,
    import_hash: &str,
    connection: &Connection,
) -> Result<Vec<TransactionId>, Error> {
    connection
        .prepare(
            "SELECT id FROM \"transaction\" WHERE budget_id = ?1 AND import_hash = ?2 ORDER BY id",
        )?
        .query_map((budget_id, import_hash), |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            budget_id INTEGER NOT NULL REFERENCES budget(id) ON DELETE CASCADE,
            source_account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            destination_account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            envelope_id INTEGER REFERENCES envelope(id) ON DELETE SET NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            available_from TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            reconciled_source INTEGER NOT NULL DEFAULT 0,
            reconciled_destination INTEGER NOT NULL DEFAULT 0,
            import_hash TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_budget_date ON \"transaction\"(budget_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_source ON \"transaction\"(source_account_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_destination ON \"transaction\"(destination_account_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_envelope ON \"transaction\"(envelope_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_import_hash ON \"transaction\"(import_hash);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        budget_id: row.get(1)?,
        source_account_id: row.get(2)?,
        destination_account_id: row.get(3)?,
        envelope_id: row.get(4)?,
        amount: row.get(5)?,
        date: row.get(6)?,
        available_from: row.get(7)?,
        note: row.get(8)?,
        reconciled_source: row.get(9)?,
        reconciled_destination: row.get(10)?,
        import_hash: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{Month, macros::date};

    use crate::{
        Error,
        account::Account,
        budget_month::BudgetMonth,
        test_utils::{
            get_test_connection, must_create_account, must_create_budget, must_create_category,
            must_create_envelope, must_create_transaction, transaction_form,
        },
    };

    use super::{
        TransactionPatch, create_transaction, delete_transaction, get_transaction,
        transaction_ids_with_import_hash, update_transaction,
    };

    struct Fixture {
        connection: Connection,
        checking: Account,
        savings: Account,
        off_budget: Account,
        shop: Account,
        employer: Account,
    }

    fn fixture() -> Fixture {
        let connection = get_test_connection();
        let budget = must_create_budget(&connection);

        Fixture {
            checking: must_create_account(budget.id, "Checking", true, false, &connection),
            savings: must_create_account(budget.id, "Savings", true, false, &connection),
            off_budget: must_create_account(budget.id, "Pension", false, false, &connection),
            shop: must_create_account(budget.id, "Shop", false, true, &connection),
            employer: must_create_account(budget.id, "Employer", false, true, &connection),
            connection,
        }
    }

    #[test]
    fn create_defaults_available_from_to_month_of_date() {
        let f = fixture();

        let transaction = create_transaction(
            transaction_form(f.employer.id, f.checking.id, 2000.0, date!(2024 - 02 - 29)),
            &f.connection,
        )
        .unwrap();

        assert_eq!(transaction.budget_id, f.checking.budget_id);
        assert_eq!(
            transaction.available_from,
            BudgetMonth::new(2024, Month::February)
        );
        assert_eq!(get_transaction(transaction.id, &f.connection), Ok(transaction));
    }

    #[test]
    fn amount_must_be_positive() {
        let f = fixture();

        for amount in [0.0, -5.0, f64::NAN] {
            let result = create_transaction(
                transaction_form(f.checking.id, f.shop.id, amount, date!(2024 - 01 - 01)),
                &f.connection,
            );

            assert_eq!(result, Err(Error::NonPositiveAmount));
        }
    }

    #[test]
    fn source_and_destination_must_differ() {
        let f = fixture();

        let result = create_transaction(
            transaction_form(f.checking.id, f.checking.id, 1.0, date!(2024 - 01 - 01)),
            &f.connection,
        );

        assert_eq!(result, Err(Error::SameSourceAndDestination));
    }

    #[test]
    fn rejects_transfer_between_external_accounts() {
        let f = fixture();

        let result = create_transaction(
            transaction_form(f.employer.id, f.shop.id, 1.0, date!(2024 - 01 - 01)),
            &f.connection,
        );

        assert_eq!(result, Err(Error::TransferBetweenExternalAccounts));
    }

    #[test]
    fn rejects_envelope_on_transfer_between_on_budget_accounts() {
        let f = fixture();
        let category = must_create_category(f.checking.budget_id, "Living", &f.connection);
        let envelope = must_create_envelope(category.id, "Rent", &f.connection);
        let mut form = transaction_form(f.checking.id, f.savings.id, 1.0, date!(2024 - 01 - 01));
        form.envelope_id = Some(envelope.id);

        assert_eq!(
            create_transaction(form.clone(), &f.connection),
            Err(Error::EnvelopeOnInternalTransfer)
        );

        form.destination_account_id = f.off_budget.id;
        assert!(create_transaction(form, &f.connection).is_ok());
    }

    #[test]
    fn rejects_accounts_and_envelopes_of_other_budgets() {
        let f = fixture();
        let other_budget = must_create_budget(&f.connection);
        let foreign_account =
            must_create_account(other_budget.id, "Foreign", true, false, &f.connection);
        let foreign_category = must_create_category(other_budget.id, "Living", &f.connection);
        let foreign_envelope = must_create_envelope(foreign_category.id, "Rent", &f.connection);

        let result = create_transaction(
            transaction_form(f.checking.id, foreign_account.id, 1.0, date!(2024 - 01 - 01)),
            &f.connection,
        );
        assert_eq!(result, Err(Error::AccountsInDifferentBudgets));

        let mut form = transaction_form(f.checking.id, f.shop.id, 1.0, date!(2024 - 01 - 01));
        form.envelope_id = Some(foreign_envelope.id);
        assert_eq!(
            create_transaction(form, &f.connection),
            Err(Error::EnvelopeNotInBudget)
        );
    }

    #[test]
    fn missing_references_are_reported() {
        let f = fixture();

        let result = create_transaction(
            transaction_form(f.checking.id, 99, 1.0, date!(2024 - 01 - 01)),
            &f.connection,
        );
        assert_eq!(result, Err(Error::ReferenceNotFound("account", 99)));

        let mut form = transaction_form(f.checking.id, f.shop.id, 1.0, date!(2024 - 01 - 01));
        form.envelope_id = Some(42);
        assert_eq!(
            create_transaction(form, &f.connection),
            Err(Error::ReferenceNotFound("envelope", 42))
        );
    }

    #[test]
    fn available_from_must_not_precede_date() {
        let f = fixture();
        let mut form = transaction_form(f.employer.id, f.checking.id, 1.0, date!(2024 - 03 - 31));
        form.available_from = Some(BudgetMonth::new(2024, Month::February));

        assert_eq!(
            create_transaction(form.clone(), &f.connection),
            Err(Error::AvailableFromBeforeDate)
        );

        form.available_from = Some(BudgetMonth::new(2024, Month::April));
        assert!(create_transaction(form, &f.connection).is_ok());
    }

    #[test]
    fn update_moves_default_available_from_with_date() {
        let f = fixture();
        let transaction = must_create_transaction(
            transaction_form(f.employer.id, f.checking.id, 1.0, date!(2024 - 03 - 31)),
            &f.connection,
        );

        let updated = update_transaction(
            transaction.id,
            TransactionPatch {
                date: Some(date!(2024 - 05 - 02)),
                ..Default::default()
            },
            &f.connection,
        )
        .unwrap();

        assert_eq!(updated.available_from, BudgetMonth::new(2024, Month::May));
    }

    #[test]
    fn update_revalidates_transaction() {
        let f = fixture();
        let transaction = must_create_transaction(
            transaction_form(f.checking.id, f.shop.id, 1.0, date!(2024 - 03 - 31)),
            &f.connection,
        );

        let result = update_transaction(
            transaction.id,
            TransactionPatch {
                source_account_id: Some(f.employer.id),
                ..Default::default()
            },
            &f.connection,
        );

        assert_eq!(result, Err(Error::TransferBetweenExternalAccounts));
    }

    #[test]
    fn update_can_clear_envelope() {
        let f = fixture();
        let category = must_create_category(f.checking.budget_id, "Living", &f.connection);
        let envelope = must_create_envelope(category.id, "Rent", &f.connection);
        let mut form = transaction_form(f.checking.id, f.shop.id, 1.0, date!(2024 - 03 - 31));
        form.envelope_id = Some(envelope.id);
        let transaction = must_create_transaction(form, &f.connection);

        let updated = update_transaction(
            transaction.id,
            TransactionPatch {
                envelope_id: Some(None),
                ..Default::default()
            },
            &f.connection,
        )
        .unwrap();

        assert_eq!(updated.envelope_id, None);
    }

    #[test]
    fn finds_transactions_by_import_hash() {
        let f = fixture();
        let mut form = transaction_form(f.checking.id, f.shop.id, 1.0, date!(2024 - 03 - 31));
        form.import_hash = Some("abc".to_owned());
        let transaction = must_create_transaction(form, &f.connection);

        assert_eq!(
            transaction_ids_with_import_hash(f.checking.budget_id, "abc", &f.connection),
            Ok(vec![transaction.id])
        );
        assert_eq!(
            transaction_ids_with_import_hash(f.checking.budget_id, "def", &f.connection),
            Ok(vec![])
        );
    }

    #[test]
    fn delete_transaction_removes_it() {
        let f = fixture();
        let transaction = must_create_transaction(
            transaction_form(f.checking.id, f.shop.id, 1.0, date!(2024 - 03 - 31)),
            &f.connection,
        );

        assert_eq!(delete_transaction(transaction.id, &f.connection), Ok(()));
        assert_eq!(
            get_transaction(transaction.id, &f.connection),
            Err(Error::NotFound)
        );
    }
}
