use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    budget::BudgetId,
    database_id::DatabaseId,
    endpoints::{self, format_endpoint, format_filtered},
};

pub type CategoryId = DatabaseId;

/// A group of envelopes, e.g. "Living expenses".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub budget_id: BudgetId,
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
pub struct CategoryForm {
    pub budget_id: BudgetId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub note: Option<String>,
    pub archived: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub budget: Option<BudgetId>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub archived: Option<bool>,
    pub search: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub budget: String,
    pub envelopes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResponse {
    #[serde(flatten)]
    pub category: Category,
    pub links: CategoryLinks,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            links: CategoryLinks {
                self_: format_endpoint(endpoints::CATEGORY, category.id),
                budget: format_endpoint(endpoints::BUDGET, category.budget_id),
                envelopes: format_filtered(endpoints::ENVELOPES, "category", category.id),
            },
            category,
        }
    }
}
