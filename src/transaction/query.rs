//! Filtering transactions for the list endpoint.

use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::AccountId,
    budget::BudgetId,
    db::ensure_exists,
    envelope::EnvelopeId,
    filter::SqlFilter,
    pagination::Page,
};

use super::{Transaction, map_transaction_row};

/// The query string filters for listing transactions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub budget: Option<BudgetId>,
    pub source: Option<AccountId>,
    pub destination: Option<AccountId>,
    /// Matches transactions where the account is either the source or the destination.
    pub account: Option<AccountId>,
    /// An envelope ID, or `null` for transactions without an envelope.
    pub envelope: Option<String>,
    pub from_date: Option<Date>,
    pub until_date: Option<Date>,
    pub amount_more_or_equal: Option<f64>,
    pub amount_less_or_equal: Option<f64>,
    pub note: Option<String>,
    pub reconciled_source: Option<bool>,
    pub reconciled_destination: Option<bool>,
    pub import_hash: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

/// How a query filters on the envelope of a transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
enum EnvelopeFilter {
    WithoutEnvelope,
    Envelope(EnvelopeId),
}

fn parse_envelope_filter(value: &str) -> Result<EnvelopeFilter, Error> {
    if value == "null" {
        return Ok(EnvelopeFilter::WithoutEnvelope);
    }

    value.parse().map(EnvelopeFilter::Envelope).map_err(|_| {
        Error::InvalidQuery(format!(
            "envelope must be an ID or null, got \"{value}\""
        ))
    })
}

/// Get one page of the transactions matching `query`, most recent first.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if a filter refers to a budget, account
/// or envelope that does not exist.
pub fn list_transactions(
    query: &TransactionQuery,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Transaction>, u64), Error> {
    let envelope = query
        .envelope
        .as_deref()
        .map(parse_envelope_filter)
        .transpose()?;

    if let Some(budget_id) = query.budget {
        ensure_exists("budget", "budget", budget_id, connection)?;
    }
    for account_id in [query.source, query.destination, query.account]
        .into_iter()
        .flatten()
    {
        ensure_exists("account", "account", account_id, connection)?;
    }
    if let Some(EnvelopeFilter::Envelope(envelope_id)) = envelope {
        ensure_exists("envelope", "envelope", envelope_id, connection)?;
    }

    let mut filter = SqlFilter::new();
    filter
        .exact("budget_id", query.budget)
        .exact("source_account_id", query.source)
        .exact("destination_account_id", query.destination)
        .compare("date", ">=", query.from_date)
        .compare("date", "<=", query.until_date)
        .compare("amount", ">=", query.amount_more_or_equal)
        .compare("amount", "<=", query.amount_less_or_equal)
        .fuzzy("note", query.note.as_deref())
        .exact("reconciled_source", query.reconciled_source)
        .exact("reconciled_destination", query.reconciled_destination)
        .exact("import_hash", query.import_hash.clone());

    if let Some(account_id) = query.account {
        filter.condition_with(
            "? IN (source_account_id, destination_account_id)",
            account_id,
        );
    }

    match envelope {
        Some(EnvelopeFilter::WithoutEnvelope) => {
            filter.condition("envelope_id IS NULL");
        }
        Some(EnvelopeFilter::Envelope(envelope_id)) => {
            filter.exact("envelope_id", Some(envelope_id));
        }
        None => {}
    }

    filter.query_page(
        "SELECT id, budget_id, source_account_id, destination_account_id, envelope_id, amount, \
            date, available_from, note, reconciled_source, reconciled_destination, import_hash, \
            created_at, updated_at FROM \"transaction\"",
        "date DESC, id DESC",
        page,
        connection,
        map_transaction_row,
    )
}
