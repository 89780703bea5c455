use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    budget::BudgetId,
    database_id::DatabaseId,
    endpoints::{self, format_endpoint, format_filtered},
    extract::double_option,
};

pub type AccountId = DatabaseId;

/// A bank account, credit card, cash wallet or payee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub budget_id: BudgetId,
    pub name: String,
    pub note: String,
    /// Whether the money in this account can be allocated to envelopes.
    pub on_budget: bool,
    /// External accounts represent payees and are never on budget.
    pub external: bool,
    pub initial_balance: f64,
    /// The date the initial balance applies from. Without it, the initial
    /// balance counts towards the first month of the budget.
    pub initial_balance_date: Option<Date>,
    pub archived: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccountForm {
    pub budget_id: BudgetId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub on_budget: bool,
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub initial_balance: f64,
    #[serde(default)]
    pub initial_balance_date: Option<Date>,
    #[serde(default)]
    pub archived: bool,
}

/// The fields of an account that can be changed, missing fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub note: Option<String>,
    pub on_budget: Option<bool>,
    pub external: Option<bool>,
    pub initial_balance: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub initial_balance_date: Option<Option<Date>>,
    pub archived: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    pub budget: Option<BudgetId>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub on_budget: Option<bool>,
    pub external: Option<bool>,
    pub archived: Option<bool>,
    pub search: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub budget: String,
    pub transactions: String,
    pub match_rules: String,
}

/// An account with its balances, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[serde(flatten)]
    pub account: Account,
    /// The initial balance plus all incoming minus all outgoing transactions.
    pub balance: f64,
    /// Like `balance`, but only counting transactions reconciled on this account's side.
    pub reconciled_balance: f64,
    /// The envelopes used most often by the account's recent transactions, most frequent first.
    pub recent_envelopes: Vec<DatabaseId>,
    pub links: AccountLinks,
}

impl AccountLinks {
    pub fn new(account: &Account) -> Self {
        Self {
            self_: format_endpoint(endpoints::ACCOUNT, account.id),
            budget: format_endpoint(endpoints::BUDGET, account.budget_id),
            transactions: format_filtered(endpoints::TRANSACTIONS, "account", account.id),
            match_rules: format_filtered(endpoints::MATCH_RULES, "account", account.id),
        }
    }
}
