//! Imports a complete budget from a YNAB 4 `Budget.yfull` file.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::Response,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{AccountForm, AccountId, create_account},
    allocation::upsert_allocation,
    app_state::ResourceState,
    budget::{Budget, BudgetForm, BudgetId, BudgetResponse, create_budget},
    budget_month::BudgetMonth,
    category::{CategoryForm, create_category},
    envelope::{
        EnvelopeForm, EnvelopeId, MonthConfigPatch, OverspendMode, create_envelope,
        update_month_config,
    },
    extract::ApiQuery,
    response::{DataResponse, round_cents},
    transaction::{TransactionForm, create_transaction},
};

use super::read_uploaded_file;

/// Income that is available in the month of the transaction.
const IMMEDIATE_INCOME: &str = "Category/__ImmediateIncome__";
/// Income that is available in the month after the transaction.
const DEFERRED_INCOME: &str = "Category/__DeferredIncome__";
/// Master categories with this ID prefix hold the hidden categories.
const HIDDEN_MASTER_CATEGORY: &str = "MasterCategory/__Hidden__";
/// The name of the account for transactions that have no payee.
const NO_PAYEE: &str = "No payee";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ynab4ImportQuery {
    pub budget_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4Budget {
    #[serde(default)]
    accounts: Vec<Ynab4Account>,
    #[serde(default)]
    payees: Vec<Ynab4Payee>,
    #[serde(default)]
    master_categories: Vec<Ynab4MasterCategory>,
    #[serde(default)]
    monthly_budgets: Vec<Ynab4MonthlyBudget>,
    #[serde(default)]
    transactions: Vec<Ynab4Transaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4Account {
    entity_id: String,
    account_name: String,
    #[serde(default)]
    on_budget: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    is_tombstone: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4Payee {
    entity_id: String,
    name: String,
    /// Set for the payees that stand for a transfer to another account.
    #[serde(default)]
    target_account_id: Option<String>,
    #[serde(default)]
    is_tombstone: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4MasterCategory {
    entity_id: String,
    name: String,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    sub_categories: Option<Vec<Ynab4SubCategory>>,
    #[serde(default)]
    is_tombstone: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4SubCategory {
    entity_id: String,
    name: String,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    is_tombstone: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4MonthlyBudget {
    month: BudgetMonth,
    #[serde(default)]
    monthly_sub_category_budgets: Vec<Ynab4SubCategoryBudget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4SubCategoryBudget {
    category_id: String,
    #[serde(default)]
    budgeted: f64,
    #[serde(default)]
    overspending_handling: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    is_tombstone: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4Transaction {
    entity_id: String,
    account_id: String,
    #[serde(default)]
    payee_id: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    date: Date,
    amount: f64,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    cleared: Option<String>,
    #[serde(default)]
    transfer_transaction_id: Option<String>,
    #[serde(default)]
    sub_transactions: Vec<Ynab4SubTransaction>,
    #[serde(default)]
    is_tombstone: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ynab4SubTransaction {
    entity_id: String,
    #[serde(default)]
    category_id: Option<String>,
    amount: f64,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    transfer_transaction_id: Option<String>,
    #[serde(default)]
    is_tombstone: bool,
}

/// A single movement of money taken from a transaction or one of its splits.
struct Movement<'a> {
    account_id: &'a str,
    payee_id: Option<&'a str>,
    category_id: Option<&'a str>,
    transfer_transaction_id: Option<&'a str>,
    date: Date,
    amount: f64,
    memo: &'a str,
    cleared: bool,
}

/// The IDs of the records created so far, by YNAB 4 entity ID.
#[derive(Default)]
struct CreatedIds {
    accounts: HashMap<String, AccountId>,
    on_budget_accounts: HashMap<AccountId, bool>,
    payees: HashMap<String, AccountId>,
    envelopes: HashMap<String, EnvelopeId>,
    no_payee: Option<AccountId>,
}

fn is_cleared(cleared: Option<&str>) -> bool {
    matches!(cleared, Some("Cleared" | "Reconciled"))
}

/// Parse the contents of a `Budget.yfull` file.
fn parse_budget(text: &str) -> Result<Ynab4Budget, Error> {
    serde_json::from_str(text).map_err(|error| Error::InvalidYnab4(error.to_string()))
}

/// Import a YNAB 4 budget as a new budget called `budget_name`.
///
/// Everything is imported in one SQL transaction, nothing is kept if a record fails.
///
/// # Errors
/// Returns:
/// - [Error::InvalidYnab4] if the file cannot be parsed,
/// - [Error::Duplicate] if a budget called `budget_name` exists,
/// - any error from creating the imported records.
pub fn import_ynab4(
    budget_name: &str,
    yfull: &str,
    connection: &Connection,
) -> Result<Budget, Error> {
    let ynab = parse_budget(yfull)?;

    let name_taken: bool = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM budget WHERE name = ?1)",
        [budget_name.trim()],
        |row| row.get(0),
    )?;
    if name_taken {
        return Err(Error::Duplicate(
            "a budget with this name already exists".to_owned(),
        ));
    }

    let transaction = connection.unchecked_transaction()?;

    let budget = create_budget(
        BudgetForm {
            name: budget_name.to_owned(),
            note: "Imported from YNAB 4".to_owned(),
            currency: String::new(),
        },
        &transaction,
    )?;

    let mut ids = CreatedIds::default();
    import_accounts(&ynab, budget.id, &mut ids, &transaction)?;
    import_categories(&ynab, budget.id, &mut ids, &transaction)?;
    import_monthly_budgets(&ynab, &ids, &transaction)?;
    let count = import_transactions(&ynab, budget.id, &mut ids, &transaction)?;

    transaction.commit()?;

    tracing::info!(
        "Imported YNAB 4 budget '{}' with {} accounts and {count} transactions",
        budget.name,
        ids.accounts.len() + ids.payees.len()
    );

    Ok(budget)
}

fn import_accounts(
    ynab: &Ynab4Budget,
    budget_id: BudgetId,
    ids: &mut CreatedIds,
    connection: &Connection,
) -> Result<(), Error> {
    for account in ynab.accounts.iter().filter(|account| !account.is_tombstone) {
        let created = create_account(
            AccountForm {
                budget_id,
                name: account.account_name.clone(),
                note: account.note.clone().unwrap_or_default(),
                on_budget: account.on_budget,
                archived: account.hidden,
                ..Default::default()
            },
            connection,
        )?;

        ids.accounts.insert(account.entity_id.clone(), created.id);
        ids.on_budget_accounts.insert(created.id, created.on_budget);
    }

    for payee in ynab
        .payees
        .iter()
        .filter(|payee| !payee.is_tombstone && payee.target_account_id.is_none())
    {
        let created = create_external_account(budget_id, &payee.name, connection)?;
        ids.payees.insert(payee.entity_id.clone(), created);
        ids.on_budget_accounts.insert(created, false);
    }

    Ok(())
}

/// Create an external account, renaming it if an account of the budget already has the name.
fn create_external_account(
    budget_id: BudgetId,
    name: &str,
    connection: &Connection,
) -> Result<AccountId, Error> {
    let form = |name: String| AccountForm {
        budget_id,
        name,
        external: true,
        ..Default::default()
    };

    match create_account(form(name.to_owned()), connection) {
        Ok(account) => Ok(account.id),
        Err(Error::Duplicate(_)) => {
            create_account(form(format!("{name} (payee)")), connection).map(|account| account.id)
        }
        Err(error) => Err(error),
    }
}

fn import_categories(
    ynab: &Ynab4Budget,
    budget_id: BudgetId,
    ids: &mut CreatedIds,
    connection: &Connection,
) -> Result<(), Error> {
    for master in ynab
        .master_categories
        .iter()
        .filter(|master| !master.is_tombstone)
    {
        let sub_categories: Vec<_> = master
            .sub_categories
            .iter()
            .flatten()
            .filter(|sub| !sub.is_tombstone)
            .collect();

        let hidden = master.entity_id.starts_with(HIDDEN_MASTER_CATEGORY);
        if hidden && sub_categories.is_empty() {
            continue;
        }

        let category = create_category(
            CategoryForm {
                budget_id,
                name: master.name.clone(),
                note: master.note.clone().unwrap_or_default(),
                archived: hidden,
            },
            connection,
        )?;

        for sub in sub_categories {
            let envelope = create_envelope(
                EnvelopeForm {
                    category_id: category.id,
                    name: sub.name.clone(),
                    note: sub.note.clone().unwrap_or_default(),
                    archived: hidden,
                },
                connection,
            )?;

            ids.envelopes.insert(sub.entity_id.clone(), envelope.id);
        }
    }

    Ok(())
}

fn import_monthly_budgets(
    ynab: &Ynab4Budget,
    ids: &CreatedIds,
    connection: &Connection,
) -> Result<(), Error> {
    for monthly in &ynab.monthly_budgets {
        for budgeted in monthly
            .monthly_sub_category_budgets
            .iter()
            .filter(|budgeted| !budgeted.is_tombstone)
        {
            let Some(&envelope_id) = ids.envelopes.get(&budgeted.category_id) else {
                tracing::debug!(
                    "Skipping monthly budget for unknown category {}",
                    budgeted.category_id
                );
                continue;
            };

            if budgeted.budgeted != 0.0 {
                upsert_allocation(
                    envelope_id,
                    monthly.month,
                    round_cents(budgeted.budgeted),
                    connection,
                )?;
            }

            let confined = budgeted.overspending_handling.as_deref() == Some("Confined");
            let note = budgeted.note.clone().filter(|note| !note.is_empty());

            if confined || note.is_some() {
                update_month_config(
                    envelope_id,
                    monthly.month,
                    MonthConfigPatch {
                        note,
                        overspend_mode: confined.then_some(OverspendMode::AffectEnvelope),
                    },
                    connection,
                )?;
            }
        }
    }

    Ok(())
}

impl<'a> Movement<'a> {
    fn new(
        transaction: &'a Ynab4Transaction,
        category_id: Option<&'a str>,
        transfer_transaction_id: Option<&'a str>,
        amount: f64,
        memo: Option<&'a str>,
    ) -> Self {
        Self {
            account_id: &transaction.account_id,
            payee_id: transaction.payee_id.as_deref(),
            category_id,
            transfer_transaction_id,
            date: transaction.date,
            amount,
            memo: memo.unwrap_or_default(),
            cleared: is_cleared(transaction.cleared.as_deref()),
        }
    }
}

/// Split transactions into one movement per sub transaction.
fn movements(transaction: &Ynab4Transaction) -> Vec<Movement<'_>> {
    let splits: Vec<_> = transaction
        .sub_transactions
        .iter()
        .filter(|sub| !sub.is_tombstone)
        .collect();

    if splits.is_empty() {
        return vec![Movement::new(
            transaction,
            transaction.category_id.as_deref(),
            transaction.transfer_transaction_id.as_deref(),
            transaction.amount,
            transaction.memo.as_deref(),
        )];
    }

    splits
        .into_iter()
        .map(|sub| {
            Movement::new(
                transaction,
                sub.category_id.as_deref(),
                sub.transfer_transaction_id.as_deref(),
                sub.amount,
                sub.memo.as_deref().or(transaction.memo.as_deref()),
            )
        })
        .collect()
}

fn import_transactions(
    ynab: &Ynab4Budget,
    budget_id: BudgetId,
    ids: &mut CreatedIds,
    connection: &Connection,
) -> Result<usize, Error> {
    let transactions: Vec<_> = ynab
        .transactions
        .iter()
        .filter(|transaction| !transaction.is_tombstone)
        .collect();

    // Transfers point at the transaction, or sub transaction, on the other account.
    let mut counterparts: HashMap<&str, (&str, bool)> = HashMap::new();
    for transaction in &transactions {
        let cleared = is_cleared(transaction.cleared.as_deref());
        counterparts.insert(transaction.entity_id.as_str(), (transaction.account_id.as_str(), cleared));
        for sub in &transaction.sub_transactions {
            counterparts.insert(sub.entity_id.as_str(), (transaction.account_id.as_str(), cleared));
        }
    }

    let mut count = 0;

    for movement in transactions.iter().flat_map(|transaction| movements(transaction)) {
        let Some(&account_id) = ids.accounts.get(movement.account_id) else {
            continue;
        };

        if movement.amount == 0.0 {
            continue;
        }

        let (counterparty_id, counterparty_cleared) = match movement.transfer_transaction_id {
            // Transfers appear on both accounts, the outflow side creates the transaction.
            Some(_) if movement.amount > 0.0 => continue,
            Some(transfer_id) => {
                let Some((other_account, cleared)) = counterparts.get(transfer_id) else {
                    tracing::warn!("Skipping transfer to unknown transaction {transfer_id}");
                    continue;
                };
                let Some(&other_account_id) = ids.accounts.get(*other_account) else {
                    continue;
                };
                (other_account_id, *cleared)
            }
            None => {
                let payee = movement
                    .payee_id
                    .and_then(|payee_id| ids.payees.get(payee_id).copied());
                let payee = match payee {
                    Some(payee) => payee,
                    None => no_payee_account(budget_id, ids, connection)?,
                };
                (payee, false)
            }
        };

        let on_budget = |id: AccountId| ids.on_budget_accounts.get(&id).copied().unwrap_or(false);
        let internal_transfer = on_budget(account_id) && on_budget(counterparty_id);

        let mut available_from = None;
        let envelope_id = match movement.category_id {
            Some(DEFERRED_INCOME) => {
                available_from = Some(BudgetMonth::of(movement.date).next());
                None
            }
            Some(IMMEDIATE_INCOME) | None => None,
            Some(_) if internal_transfer => None,
            Some(category_id) => ids.envelopes.get(category_id).copied(),
        };

        let outflow = movement.amount < 0.0;
        let (source, destination, reconciled_source, reconciled_destination) = if outflow {
            (account_id, counterparty_id, movement.cleared, counterparty_cleared)
        } else {
            (counterparty_id, account_id, counterparty_cleared, movement.cleared)
        };

        create_transaction(
            TransactionForm {
                source_account_id: source,
                destination_account_id: destination,
                envelope_id,
                amount: round_cents(movement.amount.abs()),
                date: movement.date,
                available_from,
                note: movement.memo.to_owned(),
                reconciled_source,
                reconciled_destination,
                import_hash: None,
            },
            connection,
        )?;

        count += 1;
    }

    Ok(count)
}

fn no_payee_account(
    budget_id: BudgetId,
    ids: &mut CreatedIds,
    connection: &Connection,
) -> Result<AccountId, Error> {
    if let Some(id) = ids.no_payee {
        return Ok(id);
    }

    let id = create_external_account(budget_id, NO_PAYEE, connection)?;
    ids.no_payee = Some(id);
    ids.on_budget_accounts.insert(id, false);

    Ok(id)
}

pub async fn import_ynab4_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<Ynab4ImportQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, Error> {
    let yfull = read_uploaded_file(multipart, ".yfull").await?;

    let connection = state.connection()?;
    let budget = import_ynab4(&query.budget_name, &yfull, &connection)?;

    Ok(DataResponse::created(BudgetResponse::from(budget)))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use time::{Month, macros::date};

    use crate::{
        Error,
        account::{AccountQuery, list_accounts},
        app_state::ResourceState,
        budget_month::BudgetMonth,
        envelope::{EnvelopeQuery, OverspendMode, get_month_config, list_envelopes},
        extract::ApiQuery,
        import::test_upload::upload,
        month::get_month,
        pagination::Page,
        test_utils::{assert_status, get_test_connection, parse_json_body},
        transaction::{TransactionQuery, list_transactions},
    };

    use super::{Ynab4ImportQuery, import_ynab4, import_ynab4_endpoint};

    fn yfull() -> String {
        json!({
            "accounts": [
                { "entityId": "A1", "accountName": "Checking", "onBudget": true },
                { "entityId": "A2", "accountName": "Savings", "onBudget": true, "hidden": true },
                { "entityId": "A3", "accountName": "Gone", "onBudget": true, "isTombstone": true },
            ],
            "payees": [
                { "entityId": "P1", "name": "Employer" },
                { "entityId": "P2", "name": "Grocer" },
                { "entityId": "P3", "name": "Transfer : Savings", "targetAccountId": "A2" },
            ],
            "masterCategories": [
                {
                    "entityId": "M1",
                    "name": "Living",
                    "subCategories": [
                        { "entityId": "C1", "name": "Groceries" },
                        { "entityId": "C2", "name": "Old", "isTombstone": true },
                    ],
                },
                {
                    "entityId": "MasterCategory/__Hidden__",
                    "name": "Hidden Categories",
                    "subCategories": [{ "entityId": "C3", "name": "Hobby" }],
                },
            ],
            "monthlyBudgets": [
                {
                    "month": "2024-01-01",
                    "monthlySubCategoryBudgets": [
                        { "categoryId": "C1", "budgeted": 300, "overspendingHandling": "Confined" },
                        { "categoryId": "C3", "budgeted": 0, "note": "paused" },
                    ],
                },
            ],
            "transactions": [
                {
                    "entityId": "T1", "accountId": "A1", "payeeId": "P1",
                    "categoryId": "Category/__ImmediateIncome__",
                    "date": "2024-01-01", "amount": 1000, "cleared": "Reconciled",
                },
                {
                    "entityId": "T2", "accountId": "A1", "payeeId": "P1",
                    "categoryId": "Category/__DeferredIncome__",
                    "date": "2024-01-30", "amount": 500,
                },
                {
                    "entityId": "T3", "accountId": "A1", "payeeId": "P2",
                    "categoryId": "Category/__Split__", "date": "2024-01-05", "amount": -60,
                    "memo": "weekly shop",
                    "subTransactions": [
                        { "entityId": "S1", "categoryId": "C1", "amount": -40 },
                        { "entityId": "S2", "categoryId": "C3", "amount": -20, "memo": "paint" },
                    ],
                },
                {
                    "entityId": "T4", "accountId": "A1", "payeeId": "P3",
                    "date": "2024-01-10", "amount": -100,
                    "transferTransactionId": "T5", "cleared": "Cleared",
                },
                {
                    "entityId": "T5", "accountId": "A2", "payeeId": "P3",
                    "date": "2024-01-10", "amount": 100, "transferTransactionId": "T4",
                },
                {
                    "entityId": "T6", "accountId": "A1", "date": "2024-01-12", "amount": -5,
                },
                {
                    "entityId": "T7", "accountId": "A1", "payeeId": "P2", "date": "2024-01-13",
                    "amount": -999, "isTombstone": true,
                },
            ],
        })
        .to_string()
    }

    #[test]
    fn imports_accounts_payees_and_envelopes() {
        let connection = get_test_connection();

        let budget = import_ynab4("Family", &yfull(), &connection).unwrap();

        let (accounts, _) = list_accounts(
            &AccountQuery {
                budget: Some(budget.id),
                ..Default::default()
            },
            Page::all(),
            &connection,
        )
        .unwrap();
        let names: Vec<_> = accounts.iter().map(|account| account.name.as_str()).collect();
        assert_eq!(names, ["Checking", "Employer", "Grocer", "No payee", "Savings"]);
        let savings = accounts.iter().find(|account| account.name == "Savings").unwrap();
        assert!(savings.archived && savings.on_budget);
        let grocer = accounts.iter().find(|account| account.name == "Grocer").unwrap();
        assert!(grocer.external && !grocer.on_budget);

        let (envelopes, _) =
            list_envelopes(&EnvelopeQuery::default(), Page::all(), &connection).unwrap();
        let envelopes: Vec<_> = envelopes
            .iter()
            .map(|envelope| (envelope.name.as_str(), envelope.archived))
            .collect();
        assert_eq!(envelopes, [("Groceries", false), ("Hobby", true)]);
    }

    #[test]
    fn imports_transactions() {
        let connection = get_test_connection();
        let budget = import_ynab4("Family", &yfull(), &connection).unwrap();

        let (transactions, total) = list_transactions(
            &TransactionQuery {
                budget: Some(budget.id),
                ..Default::default()
            },
            Page::all(),
            &connection,
        )
        .unwrap();

        // Two income, two splits, one transfer and one without payee.
        assert_eq!(total, 6);

        let deferred = transactions
            .iter()
            .find(|transaction| transaction.amount == 500.0)
            .unwrap();
        assert_eq!(deferred.available_from, BudgetMonth::new(2024, Month::February));

        let salary = transactions
            .iter()
            .find(|transaction| transaction.amount == 1000.0)
            .unwrap();
        assert!(salary.reconciled_destination);
        assert!(!salary.reconciled_source);

        let paint = transactions
            .iter()
            .find(|transaction| transaction.note == "paint")
            .unwrap();
        assert_eq!(paint.amount, 20.0);
        assert!(paint.envelope_id.is_some());
        let groceries = transactions
            .iter()
            .find(|transaction| transaction.amount == 40.0)
            .unwrap();
        assert_eq!(groceries.note, "weekly shop");

        let transfer = transactions
            .iter()
            .find(|transaction| transaction.amount == 100.0)
            .unwrap();
        assert_eq!(transfer.date, date!(2024 - 01 - 10));
        assert_eq!(transfer.envelope_id, None);
        assert!(transfer.reconciled_source);
        assert!(!transfer.reconciled_destination);
    }

    #[test]
    fn imports_monthly_budgets() {
        let connection = get_test_connection();
        let budget = import_ynab4("Family", &yfull(), &connection).unwrap();
        let january = BudgetMonth::new(2024, Month::January);

        let month = get_month(budget.id, january, &connection).unwrap();
        assert_eq!(month.income, 1000.0);
        assert_eq!(month.allocation, 300.0);

        let (envelopes, _) =
            list_envelopes(&EnvelopeQuery::default(), Page::all(), &connection).unwrap();
        let groceries = get_month_config(envelopes[0].id, january, &connection).unwrap();
        assert_eq!(groceries.overspend_mode, OverspendMode::AffectEnvelope);
        assert_eq!(groceries.allocation, 300.0);
        let hobby = get_month_config(envelopes[1].id, january, &connection).unwrap();
        assert_eq!(hobby.note, "paused");
        assert_eq!(hobby.overspend_mode, OverspendMode::AffectAvailable);
    }

    #[test]
    fn budget_name_must_be_unused() {
        let connection = get_test_connection();
        import_ynab4("Family", &yfull(), &connection).unwrap();

        assert_eq!(
            import_ynab4("Family", &yfull(), &connection),
            Err(Error::Duplicate(
                "a budget with this name already exists".to_owned()
            ))
        );
    }

    #[test]
    fn invalid_file_imports_nothing() {
        let connection = get_test_connection();

        assert!(matches!(
            import_ynab4("Family", "{\"accounts\": 3}", &connection),
            Err(Error::InvalidYnab4(_))
        ));

        let budgets: i64 = connection
            .query_row("SELECT COUNT(*) FROM budget", [], |row| row.get(0))
            .unwrap();
        assert_eq!(budgets, 0);
    }

    #[tokio::test]
    async fn endpoint_creates_budget() {
        let state = ResourceState::in_memory();
        let multipart = upload("file", "Budget.yfull", &yfull()).await;

        let response = import_ynab4_endpoint(
            State(state.clone()),
            ApiQuery(Ynab4ImportQuery {
                budget_name: "Family".to_owned(),
            }),
            multipart,
        )
        .await
        .unwrap();

        assert_status(&response, StatusCode::CREATED);
        let body = parse_json_body(response).await;
        assert_eq!(body["data"]["name"], "Family");

        let multipart = upload("file", "Budget.json", &yfull()).await;
        let response = import_ynab4_endpoint(
            State(state),
            ApiQuery(Ynab4ImportQuery {
                budget_name: "Other".to_owned(),
            }),
            multipart,
        )
        .await
        .into_response();
        assert_status(&response, StatusCode::BAD_REQUEST);
    }
}
