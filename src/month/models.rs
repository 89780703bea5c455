use serde::{Deserialize, Serialize};

use crate::{
    budget::BudgetId, budget_month::BudgetMonth, category::CategoryId, endpoints,
    envelope::EnvelopeId,
};

/// Selects the budget month for the month endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthQuery {
    pub budget: BudgetId,
    pub month: BudgetMonth,
}

/// How the allocations of a month are derived from the previous month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationMethod {
    /// Allocate what was spent from each envelope.
    SpentLastMonth,
    /// Allocate the same amounts again.
    AllocatedLastMonth,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllocationRequest {
    pub method: AllocationMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeSummaryLinks {
    pub envelope: String,
    pub month: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSummary {
    pub id: EnvelopeId,
    pub name: String,
    pub archived: bool,
    pub allocation: f64,
    pub spent: f64,
    pub balance: f64,
    pub links: EnvelopeSummaryLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub archived: bool,
    pub allocation: f64,
    pub spent: f64,
    pub balance: f64,
    pub envelopes: Vec<EnvelopeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub budget: String,
}

impl MonthLinks {
    pub fn new(budget_id: BudgetId, month: BudgetMonth) -> Self {
        Self {
            self_: format!("{}?budget={budget_id}&month={month}", endpoints::MONTHS),
            budget: endpoints::format_endpoint(endpoints::BUDGET, budget_id),
        }
    }
}

/// The figures of a budget for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub budget_id: BudgetId,
    pub month: BudgetMonth,
    /// Income that became available this month.
    pub income: f64,
    /// Money that has not been allocated to any envelope yet.
    pub available: f64,
    pub allocation: f64,
    pub spent: f64,
    pub balance: f64,
    pub categories: Vec<CategorySummary>,
    pub links: MonthLinks,
}
