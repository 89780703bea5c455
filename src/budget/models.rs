use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    database_id::DatabaseId,
    endpoints::{self, format_endpoint, format_filtered},
};

pub type BudgetId = DatabaseId;

/// A budget, e.g. a household's finances.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: BudgetId,
    pub name: String,
    pub note: String,
    /// The currency symbol amounts are shown in, purely informational.
    pub currency: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The request body for creating a budget.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BudgetForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub currency: String,
}

/// The request body for updating a budget, missing fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub note: Option<String>,
    pub currency: Option<String>,
}

/// The query string filters for listing budgets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetQuery {
    pub name: Option<String>,
    pub note: Option<String>,
    pub currency: Option<String>,
    pub search: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

/// Links from a budget to its related resources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub accounts: String,
    pub categories: String,
    pub transactions: String,
    pub month: String,
}

/// A budget as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetResponse {
    #[serde(flatten)]
    pub budget: Budget,
    pub links: BudgetLinks,
}

impl From<Budget> for BudgetResponse {
    fn from(budget: Budget) -> Self {
        let id = budget.id;

        Self {
            budget,
            links: BudgetLinks {
                self_: format_endpoint(endpoints::BUDGET, id),
                accounts: format_filtered(endpoints::ACCOUNTS, "budget", id),
                categories: format_filtered(endpoints::CATEGORIES, "budget", id),
                transactions: format_filtered(endpoints::TRANSACTIONS, "budget", id),
                month: format!("{}&month=YYYY-MM", format_filtered(endpoints::MONTHS, "budget", id)),
            },
        }
    }
}
