//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/v3/budgets/{budget_id}', use [format_endpoint].

use crate::{budget_month::BudgetMonth, database_id::DatabaseId};

/// The root route, lists the API entry points.
pub const ROOT: &str = "/";
/// The route for checking that the server and database are up.
pub const HEALTH: &str = "/healthz";
/// The route for the server version.
pub const VERSION: &str = "/version";

/// The root of the API, lists the collections. DELETE removes all data.
pub const API_ROOT: &str = "/v3";
/// The route to access budgets.
pub const BUDGETS: &str = "/v3/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/v3/budgets/{budget_id}";
/// The route to access accounts.
pub const ACCOUNTS: &str = "/v3/accounts";
/// The route to access a single account.
pub const ACCOUNT: &str = "/v3/accounts/{account_id}";
/// The route to access categories.
pub const CATEGORIES: &str = "/v3/categories";
/// The route to access a single category.
pub const CATEGORY: &str = "/v3/categories/{category_id}";
/// The route to access envelopes.
pub const ENVELOPES: &str = "/v3/envelopes";
/// The route to access a single envelope.
pub const ENVELOPE: &str = "/v3/envelopes/{envelope_id}";
/// The route to access the configuration of an envelope for a month.
pub const ENVELOPE_MONTH: &str = "/v3/envelopes/{envelope_id}/{month}";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/v3/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/v3/transactions/{transaction_id}";
/// The route to access allocations.
pub const ALLOCATIONS: &str = "/v3/allocations";
/// The route to access a single allocation.
pub const ALLOCATION: &str = "/v3/allocations/{allocation_id}";
/// The route to access goals.
pub const GOALS: &str = "/v3/goals";
/// The route to access a single goal.
pub const GOAL: &str = "/v3/goals/{goal_id}";
/// The route to access match rules.
pub const MATCH_RULES: &str = "/v3/match-rules";
/// The route to access a single match rule.
pub const MATCH_RULE: &str = "/v3/match-rules/{match_rule_id}";
/// The route to get and modify a budget month.
pub const MONTHS: &str = "/v3/months";
/// The route to import a YNAB 4 budget.
pub const IMPORT_YNAB4: &str = "/v3/import/ynab4";
/// The route to preview transactions from a YNAB import CSV.
pub const IMPORT_YNAB_PREVIEW: &str = "/v3/import/ynab-import-preview";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/v3/budgets/{budget_id}', '{budget_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: DatabaseId) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// The path of an envelope's configuration for `month`.
pub fn format_envelope_month(envelope_id: DatabaseId, month: BudgetMonth) -> String {
    format_endpoint(ENVELOPE_MONTH, envelope_id).replace("{month}", &month.to_string())
}

/// The path of a collection filtered by a single parameter, e.g. `/v3/accounts?budget=1`.
pub fn format_filtered(collection: &str, parameter: &str, id: DatabaseId) -> String {
    format!("{collection}?{parameter}={id}")
}

// These tests are here so that we know the paths we hand out parse as URIs.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;
    use time::Month;

    use crate::{budget_month::BudgetMonth, endpoints};

    use super::{format_endpoint, format_envelope_month, format_filtered};

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::HEALTH,
            endpoints::VERSION,
            endpoints::API_ROOT,
            endpoints::BUDGETS,
            endpoints::BUDGET,
            endpoints::ACCOUNTS,
            endpoints::ACCOUNT,
            endpoints::CATEGORIES,
            endpoints::CATEGORY,
            endpoints::ENVELOPES,
            endpoints::ENVELOPE,
            endpoints::ENVELOPE_MONTH,
            endpoints::TRANSACTIONS,
            endpoints::TRANSACTION,
            endpoints::ALLOCATIONS,
            endpoints::ALLOCATION,
            endpoints::GOALS,
            endpoints::GOAL,
            endpoints::MATCH_RULES,
            endpoints::MATCH_RULE,
            endpoints::MONTHS,
            endpoints::IMPORT_YNAB4,
            endpoints::IMPORT_YNAB_PREVIEW,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert_endpoint_is_valid_uri(&formatted_path);
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
    }

    #[test]
    fn envelope_month_replaces_both_parameters() {
        let path = format_envelope_month(4, BudgetMonth::new(2024, Month::May));

        assert_eq!(path, "/v3/envelopes/4/2024-05");
        assert_endpoint_is_valid_uri(&path);
    }

    #[test]
    fn filtered_collection() {
        let path = format_filtered(endpoints::TRANSACTIONS, "account", 3);

        assert_eq!(path, "/v3/transactions?account=3");
        assert_endpoint_is_valid_uri(&path);
    }
}
