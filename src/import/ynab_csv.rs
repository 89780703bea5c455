//! Previews the transactions of a YNAB import CSV for one account.
//!
//! Nothing is written to the database. The client reviews the previews and
//! creates the transactions through the transaction endpoints.

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::Response,
};
use csv::{ReaderBuilder, StringRecord};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    account::{Account, AccountId, get_account},
    budget::BudgetId,
    app_state::ResourceState,
    envelope::EnvelopeId,
    extract::ApiQuery,
    match_rule::{MatchPattern, MatchRuleId, list_budget_match_rules},
    response::{DataResponse, round_cents},
    transaction::{TransactionId, transaction_ids_with_import_hash},
};

use super::read_uploaded_file;

const ISO_DATE: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const US_DATE: &[BorrowedFormatItem] = format_description!("[month]/[day]/[year]");

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YnabPreviewQuery {
    pub account_id: AccountId,
}

/// A transaction as it would be created from a CSV row.
///
/// The counterparty account is `None` when no account could be found for the payee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedTransaction {
    pub source_account_id: Option<AccountId>,
    pub destination_account_id: Option<AccountId>,
    pub envelope_id: Option<EnvelopeId>,
    pub amount: f64,
    pub date: Date,
    pub note: String,
    pub import_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPreview {
    pub transaction: ProposedTransaction,
    /// The payee when money flows into the account.
    pub source_account_name: Option<String>,
    /// The payee when money flows out of the account.
    pub destination_account_name: Option<String>,
    /// The rule that picked the counterparty account.
    pub match_rule_id: Option<MatchRuleId>,
    /// Transactions that were already imported from the same row.
    pub duplicate_transaction_ids: Vec<TransactionId>,
}

/// One parsed row of the CSV file.
#[derive(Debug, Clone, PartialEq)]
struct CsvRow {
    date: Date,
    payee: String,
    memo: String,
    /// Negative for money leaving the account.
    amount: f64,
    /// The row as it appears in the file.
    raw: String,
}

/// Where the amount of a row is.
#[derive(Debug, Clone, Copy)]
enum AmountColumns {
    Amount(usize),
    OutflowInflow(usize, usize),
}

struct Columns {
    date: usize,
    payee: usize,
    memo: usize,
    amount: AmountColumns,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self, Error> {
        let find = |name: &str| {
            header
                .iter()
                .position(|column| column.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::InvalidCSV(format!("missing column \"{name}\"")))
        };

        let amount = match (find("Amount"), find("Outflow"), find("Inflow")) {
            (Some(amount), _, _) => AmountColumns::Amount(amount),
            (None, Some(outflow), Some(inflow)) => AmountColumns::OutflowInflow(outflow, inflow),
            _ => {
                return Err(Error::InvalidCSV(
                    "expected an Amount column or Outflow and Inflow columns".to_owned(),
                ));
            }
        };

        Ok(Self {
            date: require("Date")?,
            payee: require("Payee")?,
            memo: require("Memo")?,
            amount,
        })
    }
}

fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text, ISO_DATE)
        .or_else(|_| Date::parse(text, US_DATE))
        .ok()
}

/// Parse an amount such as `-12.30`, `$1,200.00`, `(12.30)` or an empty cell (zero).
///
/// Amounts in parentheses are negative, the way accounting exports write them.
fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        return parse_amount(inner).map(|amount| -amount.abs());
    }

    let cleaned: String = text
        .chars()
        .filter(|character| character.is_ascii_digit() || matches!(character, '-' | '.'))
        .collect();

    if cleaned.is_empty() {
        return Some(0.0);
    }

    cleaned.parse().ok()
}

fn parse_rows(text: &str) -> Result<Vec<CsvRow>, Error> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?
        .clone();
    let columns = Columns::from_header(&header)?;

    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;

    let mut rows = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let line = index + 2;
        let field = |column: usize| record.get(column).unwrap_or_default();

        let date = parse_date(field(columns.date)).ok_or_else(|| {
            Error::InvalidCSV(format!(
                "invalid date \"{}\" on line {line}",
                field(columns.date)
            ))
        })?;

        let amount = match columns.amount {
            AmountColumns::Amount(column) => parse_amount(field(column)),
            AmountColumns::OutflowInflow(outflow, inflow) => parse_amount(field(outflow))
                .zip(parse_amount(field(inflow)))
                .map(|(outflow, inflow)| inflow - outflow),
        }
        .ok_or_else(|| Error::InvalidCSV(format!("invalid amount on line {line}")))?;

        let start = record.position().map_or(0, |position| position.byte() as usize);
        let end = records
            .get(index + 1)
            .and_then(|next| next.position())
            .map_or(text.len(), |position| position.byte() as usize);
        let raw = text
            .get(start..end)
            .unwrap_or_default()
            .trim_end_matches(['\r', '\n'])
            .to_owned();

        rows.push(CsvRow {
            date,
            payee: field(columns.payee).to_owned(),
            memo: field(columns.memo).to_owned(),
            amount: round_cents(amount),
            raw,
        });
    }

    Ok(rows)
}

/// The hash that identifies a row imported into an account.
fn import_hash(account_id: AccountId, raw_row: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account_id.to_string().as_bytes());
    hasher.update(raw_row.as_bytes());

    format!("{:x}", hasher.finalize())
}

/// The account a payee name resolves to.
struct Counterparty {
    account: Account,
    match_rule_id: Option<MatchRuleId>,
}

struct CounterpartyResolver {
    budget_id: BudgetId,
    own_account_id: AccountId,
    rules: Vec<(MatchRuleId, AccountId, MatchPattern)>,
}

impl CounterpartyResolver {
    fn new(account: &Account, connection: &Connection) -> Result<Self, Error> {
        let rules = list_budget_match_rules(account.budget_id, connection)?
            .into_iter()
            .filter(|rule| rule.account_id != account.id)
            .filter_map(|rule| {
                MatchPattern::new(&rule.pattern).map(|pattern| (rule.id, rule.account_id, pattern))
            })
            .collect();

        Ok(Self {
            budget_id: account.budget_id,
            own_account_id: account.id,
            rules,
        })
    }

    /// Match rules first, then an account with the same name.
    fn resolve(&self, payee: &str, connection: &Connection) -> Result<Option<Counterparty>, Error> {
        if let Some((rule_id, account_id, _)) = self
            .rules
            .iter()
            .find(|(_, _, pattern)| pattern.is_match(payee))
        {
            return Ok(Some(Counterparty {
                account: get_account(*account_id, connection)?,
                match_rule_id: Some(*rule_id),
            }));
        }

        if payee.is_empty() {
            return Ok(None);
        }

        let account_id: Option<AccountId> = connection
            .query_row(
                "SELECT id FROM account
                 WHERE budget_id = ?1 AND id != ?2 AND name = ?3 COLLATE NOCASE
                 ORDER BY id LIMIT 1",
                (self.budget_id, self.own_account_id, payee),
                |row| row.get(0),
            )
            .optional()?;

        account_id
            .map(|id| -> Result<Counterparty, Error> {
                Ok(Counterparty {
                    account: get_account(id, connection)?,
                    match_rule_id: None,
                })
            })
            .transpose()
    }
}

/// The envelope most recently used for money sent to `account_id`.
fn latest_envelope_for(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Option<EnvelopeId>, Error> {
    connection
        .query_row(
            "SELECT envelope_id FROM \"transaction\"
             WHERE destination_account_id = ?1 AND envelope_id IS NOT NULL
             ORDER BY date DESC, id DESC
             LIMIT 1",
            [account_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
}

/// Build a preview of the transactions in `csv_text` for the account `account_id`.
///
/// # Errors
/// Returns [Error::ReferenceNotFound] if the account does not exist and
/// [Error::InvalidCSV] if the file cannot be parsed.
pub fn preview_ynab_csv(
    account_id: AccountId,
    csv_text: &str,
    connection: &Connection,
) -> Result<Vec<TransactionPreview>, Error> {
    let account = get_account(account_id, connection).map_err(|error| match error {
        Error::NotFound => Error::ReferenceNotFound("account", account_id),
        error => error,
    })?;

    let rows = parse_rows(csv_text)?;
    let resolver = CounterpartyResolver::new(&account, connection)?;

    rows.into_iter()
        .map(|row| -> Result<TransactionPreview, Error> {
            let hash = import_hash(account.id, &row.raw);
            let counterparty = resolver.resolve(&row.payee, connection)?;
            let counterparty_id = counterparty.as_ref().map(|counterparty| counterparty.account.id);
            let is_outflow = row.amount < 0.0;

            let envelope_id = match &counterparty {
                Some(counterparty) if is_outflow && !counterparty.account.on_budget => {
                    latest_envelope_for(counterparty.account.id, connection)?
                }
                _ => None,
            };

            let payee = Some(row.payee.clone()).filter(|payee| !payee.is_empty());
            let (source_account_id, destination_account_id, source_name, destination_name) =
                if is_outflow {
                    (Some(account.id), counterparty_id, None, payee)
                } else {
                    (counterparty_id, Some(account.id), payee, None)
                };

            Ok(TransactionPreview {
                duplicate_transaction_ids: transaction_ids_with_import_hash(
                    account.budget_id,
                    &hash,
                    connection,
                )?,
                match_rule_id: counterparty.and_then(|counterparty| counterparty.match_rule_id),
                source_account_name: source_name,
                destination_account_name: destination_name,
                transaction: ProposedTransaction {
                    source_account_id,
                    destination_account_id,
                    envelope_id,
                    amount: row.amount.abs(),
                    date: row.date,
                    note: row.memo,
                    import_hash: hash,
                },
            })
        })
        .collect()
}

pub async fn preview_ynab_csv_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<YnabPreviewQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, Error> {
    let csv_text = read_uploaded_file(multipart, ".csv").await?;

    let connection = state.connection()?;
    let previews = preview_ynab_csv(query.account_id, &csv_text, &connection)?;

    tracing::info!(
        "Previewed {} transactions for account {}",
        previews.len(),
        query.account_id
    );

    Ok(DataResponse::ok(previews))
}
