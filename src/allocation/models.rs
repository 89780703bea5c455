use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    budget_month::BudgetMonth,
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    envelope::EnvelopeId,
};

pub type AllocationId = DatabaseId;

/// The amount of money budgeted for an envelope in a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub id: AllocationId,
    pub envelope_id: EnvelopeId,
    pub month: BudgetMonth,
    pub amount: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllocationForm {
    pub envelope_id: EnvelopeId,
    pub month: BudgetMonth,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllocationPatch {
    pub month: Option<BudgetMonth>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationQuery {
    pub envelope: Option<EnvelopeId>,
    pub month: Option<BudgetMonth>,
    pub amount: Option<f64>,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub envelope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationResponse {
    #[serde(flatten)]
    pub allocation: Allocation,
    pub links: AllocationLinks,
}

impl From<Allocation> for AllocationResponse {
    fn from(allocation: Allocation) -> Self {
        Self {
            links: AllocationLinks {
                self_: format_endpoint(endpoints::ALLOCATION, allocation.id),
                envelope: format_endpoint(endpoints::ENVELOPE, allocation.envelope_id),
            },
            allocation,
        }
    }
}
