use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    budget_month::BudgetMonth,
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    envelope::EnvelopeId,
};

pub type GoalId = DatabaseId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub envelope_id: EnvelopeId,
    pub name: String,
    pub note: String,
    /// The balance the envelope should have.
    pub amount: f64,
    /// The month the balance should be reached by.
    pub month: BudgetMonth,
    pub archived: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GoalForm {
    pub envelope_id: EnvelopeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub amount: f64,
    pub month: BudgetMonth,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub note: Option<String>,
    pub amount: Option<f64>,
    pub month: Option<BudgetMonth>,
    pub archived: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalQuery {
    pub envelope: Option<EnvelopeId>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub amount: Option<f64>,
    pub month: Option<BudgetMonth>,
    pub from_month: Option<BudgetMonth>,
    pub until_month: Option<BudgetMonth>,
    pub archived: Option<bool>,
    pub search: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub envelope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalResponse {
    #[serde(flatten)]
    pub goal: Goal,
    pub links: GoalLinks,
}

impl From<Goal> for GoalResponse {
    fn from(goal: Goal) -> Self {
        Self {
            links: GoalLinks {
                self_: format_endpoint(endpoints::GOAL, goal.id),
                envelope: format_endpoint(endpoints::ENVELOPE, goal.envelope_id),
            },
            goal,
        }
    }
}
