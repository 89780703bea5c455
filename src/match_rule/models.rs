use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    account::AccountId,
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
};

pub type MatchRuleId = DatabaseId;

/// Assigns imported transactions whose payee matches `match` to an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRule {
    pub id: MatchRuleId,
    pub account_id: AccountId,
    /// Rules with a lower priority are tried first.
    pub priority: i64,
    /// A glob pattern, `*` matches any run of characters and `?` a single character.
    #[serde(rename = "match")]
    pub pattern: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchRuleForm {
    pub account_id: AccountId,
    #[serde(default)]
    pub priority: i64,
    #[serde(rename = "match")]
    pub pattern: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchRulePatch {
    pub account_id: Option<AccountId>,
    pub priority: Option<i64>,
    #[serde(rename = "match")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRuleQuery {
    pub account: Option<AccountId>,
    pub priority: Option<i64>,
    #[serde(rename = "match")]
    pub pattern: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRuleLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRuleResponse {
    #[serde(flatten)]
    pub match_rule: MatchRule,
    pub links: MatchRuleLinks,
}

impl From<MatchRule> for MatchRuleResponse {
    fn from(match_rule: MatchRule) -> Self {
        Self {
            links: MatchRuleLinks {
                self_: format_endpoint(endpoints::MATCH_RULE, match_rule.id),
                account: format_endpoint(endpoints::ACCOUNT, match_rule.account_id),
            },
            match_rule,
        }
    }
}
