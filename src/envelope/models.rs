use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    category::CategoryId,
    database_id::DatabaseId,
    endpoints::{self, format_endpoint, format_filtered},
};

pub type EnvelopeId = DatabaseId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub id: EnvelopeId,
    pub category_id: CategoryId,
    pub name: String,
    pub note: String,
    pub archived: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvelopeForm {
    pub category_id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub archived: bool,
}

/// The fields of an envelope that can be changed.
///
/// An envelope can move to another category of the same budget.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvelopePatch {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub archived: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeQuery {
    pub category: Option<CategoryId>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub archived: Option<bool>,
    pub search: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub category: String,
    pub allocations: String,
    pub goals: String,
    pub transactions: String,
    /// The path of the month configuration, with `YYYY-MM` as a placeholder.
    pub month: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub links: EnvelopeLinks,
}

impl From<Envelope> for EnvelopeResponse {
    fn from(envelope: Envelope) -> Self {
        let id = envelope.id;

        Self {
            links: EnvelopeLinks {
                self_: format_endpoint(endpoints::ENVELOPE, id),
                category: format_endpoint(endpoints::CATEGORY, envelope.category_id),
                allocations: format_filtered(endpoints::ALLOCATIONS, "envelope", id),
                goals: format_filtered(endpoints::GOALS, "envelope", id),
                transactions: format_filtered(endpoints::TRANSACTIONS, "envelope", id),
                month: format_endpoint(endpoints::ENVELOPE_MONTH, id).replace("{month}", "YYYY-MM"),
            },
            envelope,
        }
    }
}
