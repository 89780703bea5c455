//! Loads the budget history from the database and changes the allocations of a month.

use std::collections::HashMap;

use rusqlite::{Connection, params};
use time::Date;

use crate::{
    Error,
    allocation::upsert_allocation,
    budget::{BudgetId, get_budget},
    budget_month::BudgetMonth,
    category::CategoryId,
    endpoints::{self, format_endpoint, format_envelope_month},
    envelope::{EnvelopeId, OverspendMode},
    month::{
        AllocationMethod, BudgetHistory, CategorySummary, EnvelopeSummary, MonthSummary,
        models::{EnvelopeSummaryLinks, MonthLinks},
    },
    response::round_cents,
};

/// Joins an envelope ID column to the budget of its category.
const ENVELOPE_IN_BUDGET: &str = "SELECT envelope.id FROM envelope
    INNER JOIN category ON category.id = envelope.category_id
    WHERE category.budget_id = ?1";

struct EnvelopeRow {
    id: EnvelopeId,
    category_id: CategoryId,
    name: String,
    archived: bool,
}

struct CategoryRow {
    id: CategoryId,
    name: String,
    archived: bool,
}

/// Load everything the month calculation of a budget needs, up to and including `until`.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if the budget does not exist.
pub fn load_budget_history(
    budget_id: BudgetId,
    until: BudgetMonth,
    connection: &Connection,
) -> Result<BudgetHistory, Error> {
    let envelopes = load_envelopes(budget_id, connection)?
        .into_iter()
        .map(|envelope| envelope.id)
        .collect();

    Ok(BudgetHistory {
        envelopes,
        allocations: load_allocations(budget_id, until, connection)?,
        spent: load_spent(budget_id, until, connection)?,
        overspend_modes: load_overspend_modes(budget_id, until, connection)?,
        income: load_income(budget_id, until, connection)?,
    })
}

/// Calculate the summary of a budget month.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if the budget does not exist.
pub fn get_month(
    budget_id: BudgetId,
    month: BudgetMonth,
    connection: &Connection,
) -> Result<MonthSummary, Error> {
    let history = load_budget_history(budget_id, month, connection)?;
    let figures = history.calculate(month);

    let mut envelopes_by_category: HashMap<CategoryId, Vec<EnvelopeSummary>> = HashMap::new();
    for envelope in load_envelopes(budget_id, connection)? {
        let envelope_figures = figures
            .envelopes
            .get(&envelope.id)
            .copied()
            .unwrap_or_default();

        envelopes_by_category
            .entry(envelope.category_id)
            .or_default()
            .push(EnvelopeSummary {
                id: envelope.id,
                name: envelope.name,
                archived: envelope.archived,
                allocation: round_cents(envelope_figures.allocation),
                spent: round_cents(envelope_figures.spent),
                balance: round_cents(envelope_figures.balance),
                links: EnvelopeSummaryLinks {
                    envelope: format_endpoint(endpoints::ENVELOPE, envelope.id),
                    month: format_envelope_month(envelope.id, month),
                },
            });
    }

    let categories: Vec<CategorySummary> = load_categories(budget_id, connection)?
        .into_iter()
        .map(|category| {
            let envelopes = envelopes_by_category
                .remove(&category.id)
                .unwrap_or_default();

            CategorySummary {
                id: category.id,
                name: category.name,
                archived: category.archived,
                allocation: round_cents(envelopes.iter().map(|e| e.allocation).sum()),
                spent: round_cents(envelopes.iter().map(|e| e.spent).sum()),
                balance: round_cents(envelopes.iter().map(|e| e.balance).sum()),
                envelopes,
            }
        })
        .collect();

    Ok(MonthSummary {
        budget_id,
        month,
        income: round_cents(figures.income),
        available: round_cents(figures.available),
        allocation: round_cents(categories.iter().map(|c| c.allocation).sum()),
        spent: round_cents(categories.iter().map(|c| c.spent).sum()),
        balance: round_cents(categories.iter().map(|c| c.balance).sum()),
        categories,
        links: MonthLinks::new(budget_id, month),
    })
}

/// Set the allocation of every envelope that is not archived for `month`,
/// based on the previous month.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if the budget does not exist.
pub fn allocate_month(
    budget_id: BudgetId,
    month: BudgetMonth,
    method: AllocationMethod,
    connection: &Connection,
) -> Result<(), Error> {
    let previous = month.previous();
    let amounts = match method {
        AllocationMethod::SpentLastMonth => load_spent(budget_id, previous, connection)?,
        AllocationMethod::AllocatedLastMonth => load_allocations(budget_id, previous, connection)?,
    };

    let transaction = connection.unchecked_transaction()?;

    for envelope in load_envelopes(budget_id, &transaction)?
        .into_iter()
        .filter(|envelope| !envelope.archived)
    {
        let amount = amounts
            .get(&(envelope.id, previous))
            .copied()
            .unwrap_or(0.0);

        let amount = match method {
            // Spending is negative, the allocation replaces it.
            AllocationMethod::SpentLastMonth => -amount,
            AllocationMethod::AllocatedLastMonth => amount,
        };

        upsert_allocation(envelope.id, month, round_cents(amount), &transaction)?;
    }

    transaction.commit()?;

    tracing::debug!("Allocated {month} of budget {budget_id} with {method:?}");

    Ok(())
}

/// Delete all allocations of a budget for `month`.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if the budget does not exist.
pub fn delete_month_allocations(
    budget_id: BudgetId,
    month: BudgetMonth,
    connection: &Connection,
) -> Result<(), Error> {
    ensure_budget(budget_id, connection)?;

    connection.execute(
        &format!("DELETE FROM allocation WHERE month = ?2 AND envelope_id IN ({ENVELOPE_IN_BUDGET})"),
        params![budget_id, month],
    )?;

    Ok(())
}

fn ensure_budget(budget_id: BudgetId, connection: &Connection) -> Result<(), Error> {
    match get_budget(budget_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::ReferenceNotFound("budget", budget_id)),
        Err(error) => Err(error),
    }
}

fn load_envelopes(budget_id: BudgetId, connection: &Connection) -> Result<Vec<EnvelopeRow>, Error> {
    ensure_budget(budget_id, connection)?;

    connection
        .prepare(
            "SELECT envelope.id, envelope.category_id, envelope.name, envelope.archived
             FROM envelope
             INNER JOIN category ON category.id = envelope.category_id
             WHERE category.budget_id = ?1
             ORDER BY envelope.name ASC, envelope.id ASC",
        )?
        .query_map([budget_id], |row| {
            Ok(EnvelopeRow {
                id: row.get(0)?,
                category_id: row.get(1)?,
                name: row.get(2)?,
                archived: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn load_categories(budget_id: BudgetId, connection: &Connection) -> Result<Vec<CategoryRow>, Error> {
    connection
        .prepare(
            "SELECT id, name, archived FROM category WHERE budget_id = ?1
             ORDER BY name ASC, id ASC",
        )?
        .query_map([budget_id], |row| {
            Ok(CategoryRow {
                id: row.get(0)?,
                name: row.get(1)?,
                archived: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn load_allocations(
    budget_id: BudgetId,
    until: BudgetMonth,
    connection: &Connection,
) -> Result<HashMap<(EnvelopeId, BudgetMonth), f64>, Error> {
    connection
        .prepare(&format!(
            "SELECT envelope_id, month, amount FROM allocation
             WHERE month <= ?2 AND envelope_id IN ({ENVELOPE_IN_BUDGET})"
        ))?
        .query_map(params![budget_id, until], |row| {
            Ok(((row.get(0)?, row.get(1)?), row.get(2)?))
        })?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(Error::from)
}

fn load_overspend_modes(
    budget_id: BudgetId,
    until: BudgetMonth,
    connection: &Connection,
) -> Result<HashMap<(EnvelopeId, BudgetMonth), OverspendMode>, Error> {
    connection
        .prepare(&format!(
            "SELECT envelope_id, month, overspend_mode FROM month_config
             WHERE month <= ?2 AND envelope_id IN ({ENVELOPE_IN_BUDGET})"
        ))?
        .query_map(params![budget_id, until], |row| {
            Ok(((row.get(0)?, row.get(1)?), row.get(2)?))
        })?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(Error::from)
}

/// The net amount that flowed into each envelope per month.
///
/// Money coming from off budget into an on-budget account counts as positive,
/// money leaving the budget as negative. Transfers within the budget do not count.
fn load_spent(
    budget_id: BudgetId,
    until: BudgetMonth,
    connection: &Connection,
) -> Result<HashMap<(EnvelopeId, BudgetMonth), f64>, Error> {
    connection
        .prepare(
            "SELECT t.envelope_id, substr(t.date, 1, 7) AS month,
                SUM(CASE
                    WHEN source.on_budget = 0 AND destination.on_budget = 1 THEN t.amount
                    WHEN source.on_budget = 1 AND destination.on_budget = 0 THEN -t.amount
                    ELSE 0
                END)
             FROM \"transaction\" t
             INNER JOIN account source ON source.id = t.source_account_id
             INNER JOIN account destination ON destination.id = t.destination_account_id
             WHERE t.budget_id = ?1 AND t.envelope_id IS NOT NULL AND substr(t.date, 1, 7) <= ?2
             GROUP BY t.envelope_id, month",
        )?
        .query_map(params![budget_id, until], |row| {
            Ok(((row.get(0)?, row.get(1)?), row.get(2)?))
        })?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(Error::from)
}

/// The income available to budget per month.
///
/// Income is money from off budget into an on-budget account without an
/// envelope, counted in the month it is available from. Initial balances of
/// on-budget accounts count as income in the month of their date, undated
/// ones in the first month of the budget.
fn load_income(
    budget_id: BudgetId,
    until: BudgetMonth,
    connection: &Connection,
) -> Result<HashMap<BudgetMonth, f64>, Error> {
    let mut income: HashMap<BudgetMonth, f64> = connection
        .prepare(
            "SELECT t.available_from, SUM(t.amount)
             FROM \"transaction\" t
             INNER JOIN account source ON source.id = t.source_account_id
             INNER JOIN account destination ON destination.id = t.destination_account_id
             WHERE t.budget_id = ?1 AND t.envelope_id IS NULL
                AND source.on_budget = 0 AND destination.on_budget = 1
                AND t.available_from <= ?2
             GROUP BY t.available_from",
        )?
        .query_map(params![budget_id, until], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;

    let initial_balances = connection
        .prepare(
            "SELECT initial_balance_date, initial_balance FROM account
             WHERE budget_id = ?1 AND on_budget = 1 AND initial_balance != 0",
        )?
        .query_map([budget_id], |row| {
            Ok((row.get::<_, Option<Date>>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if initial_balances.is_empty() {
        return Ok(income);
    }

    let first_month = first_month(budget_id, connection)?;

    for (date, amount) in initial_balances {
        let month = date.map_or(first_month, BudgetMonth::of);

        if month <= until {
            *income.entry(month).or_default() += amount;
        }
    }

    Ok(income)
}

/// The first month with any data in the budget, or the month it was created in.
fn first_month(budget_id: BudgetId, connection: &Connection) -> Result<BudgetMonth, Error> {
    let created = BudgetMonth::of(get_budget(budget_id, connection)?.created_at.date());

    let first_data_month: Option<BudgetMonth> = connection.query_row(
        &format!(
            "SELECT MIN(month) FROM (
                SELECT substr(date, 1, 7) AS month FROM \"transaction\" WHERE budget_id = ?1
                UNION ALL
                SELECT available_from FROM \"transaction\" WHERE budget_id = ?1
                UNION ALL
                SELECT substr(initial_balance_date, 1, 7) FROM account
                    WHERE budget_id = ?1 AND initial_balance_date IS NOT NULL
                UNION ALL
                SELECT month FROM allocation WHERE envelope_id IN ({ENVELOPE_IN_BUDGET})
            )"
        ),
        [budget_id],
        |row| row.get(0),
    )?;

    Ok(first_data_month.map_or(created, |month| month.min(created)))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Month, macros::date};

    use crate::{
        Error,
        account::{AccountForm, create_account},
        allocation::upsert_allocation,
        budget::BudgetId,
        budget_month::BudgetMonth,
        envelope::{
            Envelope, EnvelopePatch, MonthConfigPatch, OverspendMode, update_envelope,
            update_month_config,
        },
        month::AllocationMethod,
        test_utils::{
            get_test_connection, must_create_account, must_create_budget, must_create_category,
            must_create_envelope, must_create_transaction, transaction_form,
        },
    };

    use super::{allocate_month, delete_month_allocations, get_month};

    const JANUARY: BudgetMonth = BudgetMonth::new(2024, Month::January);
    const FEBRUARY: BudgetMonth = BudgetMonth::new(2024, Month::February);

    struct Fixture {
        connection: Connection,
        budget_id: BudgetId,
        checking: i64,
        employer: i64,
        shop: i64,
        groceries: Envelope,
        rent: Envelope,
    }

    fn fixture() -> Fixture {
        let connection = get_test_connection();
        let budget = must_create_budget(&connection);
        let checking = must_create_account(budget.id, "Checking", true, false, &connection);
        let employer = must_create_account(budget.id, "Employer", false, true, &connection);
        let shop = must_create_account(budget.id, "Shop", false, true, &connection);
        let category = must_create_category(budget.id, "Living", &connection);
        let groceries = must_create_envelope(category.id, "Groceries", &connection);
        let rent = must_create_envelope(category.id, "Rent", &connection);

        Fixture {
            budget_id: budget.id,
            checking: checking.id,
            employer: employer.id,
            shop: shop.id,
            groceries,
            rent,
            connection,
        }
    }

    fn spend(fixture: &Fixture, envelope_id: i64, amount: f64, date: time::Date) {
        let mut form = transaction_form(fixture.checking, fixture.shop, amount, date);
        form.envelope_id = Some(envelope_id);
        must_create_transaction(form, &fixture.connection);
    }

    #[test]
    fn summarises_income_spending_and_balances() {
        let fixture = fixture();
        let connection = &fixture.connection;
        must_create_transaction(
            transaction_form(fixture.employer, fixture.checking, 1000.0, date!(2024 - 01 - 01)),
            connection,
        );
        upsert_allocation(fixture.groceries.id, JANUARY, 300.0, connection).unwrap();
        upsert_allocation(fixture.rent.id, JANUARY, 500.0, connection).unwrap();
        spend(&fixture, fixture.groceries.id, 120.5, date!(2024 - 01 - 10));
        spend(&fixture, fixture.rent.id, 500.0, date!(2024 - 01 - 02));

        let month = get_month(fixture.budget_id, JANUARY, connection).unwrap();

        assert_eq!(month.income, 1000.0);
        assert_eq!(month.available, 200.0);
        assert_eq!(month.allocation, 800.0);
        assert_eq!(month.spent, -620.5);
        assert_eq!(month.balance, 179.5);

        let category = &month.categories[0];
        assert_eq!(category.name, "Living");
        assert_eq!(category.balance, 179.5);
        let groceries = &category.envelopes[0];
        assert_eq!(groceries.name, "Groceries");
        assert_eq!(groceries.spent, -120.5);
        assert_eq!(groceries.balance, 179.5);
        assert_eq!(groceries.links.month, "/v3/envelopes/1/2024-01");
    }

    #[test]
    fn transfers_within_the_budget_are_not_spending() {
        let fixture = fixture();
        let connection = &fixture.connection;
        let savings = must_create_account(fixture.budget_id, "Savings", true, false, connection);
        must_create_transaction(
            transaction_form(fixture.checking, savings.id, 50.0, date!(2024 - 01 - 05)),
            connection,
        );

        let month = get_month(fixture.budget_id, JANUARY, connection).unwrap();

        assert_eq!(month.income, 0.0);
        assert_eq!(month.spent, 0.0);
    }

    #[test]
    fn deferred_income_counts_in_its_available_month() {
        let fixture = fixture();
        let connection = &fixture.connection;
        let mut form =
            transaction_form(fixture.employer, fixture.checking, 800.0, date!(2024 - 01 - 28));
        form.available_from = Some(FEBRUARY);
        must_create_transaction(form, connection);

        assert_eq!(
            get_month(fixture.budget_id, JANUARY, connection).unwrap().income,
            0.0
        );
        assert_eq!(
            get_month(fixture.budget_id, FEBRUARY, connection).unwrap().income,
            800.0
        );
    }

    #[test]
    fn initial_balances_are_income() {
        let fixture = fixture();
        let connection = &fixture.connection;
        create_account(
            AccountForm {
                budget_id: fixture.budget_id,
                name: "Savings".to_owned(),
                on_budget: true,
                initial_balance: 250.0,
                initial_balance_date: Some(date!(2024 - 02 - 01)),
                ..Default::default()
            },
            connection,
        )
        .unwrap();
        create_account(
            AccountForm {
                budget_id: fixture.budget_id,
                name: "Wallet".to_owned(),
                on_budget: true,
                initial_balance: 40.0,
                ..Default::default()
            },
            connection,
        )
        .unwrap();
        // The earliest activity makes January the first month of the budget.
        spend(&fixture, fixture.groceries.id, 10.0, date!(2024 - 01 - 03));

        assert_eq!(
            get_month(fixture.budget_id, JANUARY, connection).unwrap().income,
            40.0
        );
        let february = get_month(fixture.budget_id, FEBRUARY, connection).unwrap();
        assert_eq!(february.income, 250.0);
        assert_eq!(february.available, 290.0 - 10.0);
    }

    #[test]
    fn envelope_overspend_mode_keeps_negative_balance() {
        let fixture = fixture();
        let connection = &fixture.connection;
        spend(&fixture, fixture.rent.id, 100.0, date!(2024 - 01 - 15));
        update_month_config(
            fixture.rent.id,
            JANUARY,
            MonthConfigPatch {
                overspend_mode: Some(OverspendMode::AffectEnvelope),
                ..Default::default()
            },
            connection,
        )
        .unwrap();

        let february = get_month(fixture.budget_id, FEBRUARY, connection).unwrap();
        let rent = &february.categories[0].envelopes[1];

        assert_eq!(rent.balance, -100.0);
        assert_eq!(february.available, 0.0);
    }

    #[test]
    fn allocate_from_last_month() {
        let fixture = fixture();
        let connection = &fixture.connection;
        upsert_allocation(fixture.groceries.id, JANUARY, 300.0, connection).unwrap();
        upsert_allocation(fixture.rent.id, JANUARY, 500.0, connection).unwrap();
        spend(&fixture, fixture.groceries.id, 120.0, date!(2024 - 01 - 10));
        update_envelope(
            fixture.rent.id,
            EnvelopePatch {
                archived: Some(true),
                ..Default::default()
            },
            connection,
        )
        .unwrap();

        allocate_month(
            fixture.budget_id,
            FEBRUARY,
            AllocationMethod::SpentLastMonth,
            connection,
        )
        .unwrap();
        let february = get_month(fixture.budget_id, FEBRUARY, connection).unwrap();
        let envelopes = &february.categories[0].envelopes;
        assert_eq!(envelopes[0].allocation, 120.0);
        assert_eq!(envelopes[1].allocation, 0.0, "archived envelopes are skipped");

        allocate_month(
            fixture.budget_id,
            FEBRUARY,
            AllocationMethod::AllocatedLastMonth,
            connection,
        )
        .unwrap();
        let february = get_month(fixture.budget_id, FEBRUARY, connection).unwrap();
        assert_eq!(february.categories[0].envelopes[0].allocation, 300.0);
    }

    #[test]
    fn delete_month_removes_allocations_of_that_month_only() {
        let fixture = fixture();
        let connection = &fixture.connection;
        upsert_allocation(fixture.groceries.id, JANUARY, 300.0, connection).unwrap();
        upsert_allocation(fixture.groceries.id, FEBRUARY, 200.0, connection).unwrap();

        delete_month_allocations(fixture.budget_id, FEBRUARY, connection).unwrap();

        let january = get_month(fixture.budget_id, JANUARY, connection).unwrap();
        let february = get_month(fixture.budget_id, FEBRUARY, connection).unwrap();
        assert_eq!(january.allocation, 300.0);
        assert_eq!(february.allocation, 0.0);
    }

    #[test]
    fn missing_budget_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            get_month(5, JANUARY, &connection),
            Err(Error::ReferenceNotFound("budget", 5))
        );
        assert_eq!(
            delete_month_allocations(5, JANUARY, &connection),
            Err(Error::ReferenceNotFound("budget", 5))
        );
    }
}
