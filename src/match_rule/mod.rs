//! Match rules map payee names of imported transactions to accounts.

mod db;
mod handlers;
mod models;
mod pattern;

pub use db::{
    create_match_rule, create_match_rule_table, delete_match_rule, get_match_rule,
    list_budget_match_rules, list_match_rules, update_match_rule,
};
pub use handlers::{
    create_match_rules_endpoint, delete_match_rule_endpoint, get_match_rule_endpoint,
    list_match_rules_endpoint, update_match_rule_endpoint,
};
pub use models::{
    MatchRule, MatchRuleForm, MatchRuleId, MatchRulePatch, MatchRuleQuery, MatchRuleResponse,
};
pub use pattern::MatchPattern;
