//! Builders for the records most tests need.

use rusqlite::Connection;
use time::Date;

use crate::{
    account::{Account, AccountForm, create_account},
    budget::{Budget, BudgetForm, BudgetId, create_budget},
    category::{Category, CategoryForm, CategoryId, create_category},
    db::initialize,
    envelope::{Envelope, EnvelopeForm, create_envelope},
    transaction::{Transaction, TransactionForm, create_transaction},
};

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");
    initialize(&connection).expect("Could not initialize test database");
    connection
}

#[track_caller]
pub(crate) fn must_create_budget(connection: &Connection) -> Budget {
    create_budget(
        BudgetForm {
            name: "Test budget".to_owned(),
            currency: "€".to_owned(),
            ..Default::default()
        },
        connection,
    )
    .expect("could not create budget")
}

#[track_caller]
pub(crate) fn must_create_account(
    budget_id: BudgetId,
    name: &str,
    on_budget: bool,
    external: bool,
    connection: &Connection,
) -> Account {
    create_account(
        AccountForm {
            budget_id,
            name: name.to_owned(),
            on_budget,
            external,
            ..Default::default()
        },
        connection,
    )
    .expect("could not create account")
}

#[track_caller]
pub(crate) fn must_create_category(
    budget_id: BudgetId,
    name: &str,
    connection: &Connection,
) -> Category {
    create_category(
        CategoryForm {
            budget_id,
            name: name.to_owned(),
            ..Default::default()
        },
        connection,
    )
    .expect("could not create category")
}

#[track_caller]
pub(crate) fn must_create_envelope(
    category_id: CategoryId,
    name: &str,
    connection: &Connection,
) -> Envelope {
    create_envelope(
        EnvelopeForm {
            category_id,
            name: name.to_owned(),
            ..Default::default()
        },
        connection,
    )
    .expect("could not create envelope")
}

/// A transaction without envelope, note or reconciliation.
pub(crate) fn transaction_form(
    source_account_id: i64,
    destination_account_id: i64,
    amount: f64,
    date: Date,
) -> TransactionForm {
    TransactionForm {
        source_account_id,
        destination_account_id,
        envelope_id: None,
        amount,
        date,
        available_from: None,
        note: String::new(),
        reconciled_source: false,
        reconciled_destination: false,
        import_hash: None,
    }
}

#[track_caller]
pub(crate) fn must_create_transaction(form: TransactionForm, connection: &Connection) -> Transaction {
    create_transaction(form, connection).expect("could not create transaction")
}
