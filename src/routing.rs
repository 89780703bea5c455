//! Application router configuration.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, header::ALLOW},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState, Error,
    account::{
        create_accounts_endpoint, delete_account_endpoint, get_account_endpoint,
        list_accounts_endpoint, update_account_endpoint,
    },
    allocation::{
        create_allocations_endpoint, delete_allocation_endpoint, get_allocation_endpoint,
        list_allocations_endpoint, update_allocation_endpoint,
    },
    budget::{
        create_budgets_endpoint, delete_budget_endpoint, get_budget_endpoint,
        list_budgets_endpoint, update_budget_endpoint,
    },
    category::{
        create_categories_endpoint, delete_category_endpoint, get_category_endpoint,
        list_categories_endpoint, update_category_endpoint,
    },
    endpoints,
    envelope::{
        create_envelopes_endpoint, delete_envelope_endpoint, get_envelope_endpoint,
        get_month_config_endpoint, list_envelopes_endpoint, update_envelope_endpoint,
        update_month_config_endpoint,
    },
    goal::{
        create_goals_endpoint, delete_goal_endpoint, get_goal_endpoint, list_goals_endpoint,
        update_goal_endpoint,
    },
    import::{import_ynab4_endpoint, preview_ynab_csv_endpoint},
    logging::logging_middleware,
    match_rule::{
        create_match_rules_endpoint, delete_match_rule_endpoint, get_match_rule_endpoint,
        list_match_rules_endpoint, update_match_rule_endpoint,
    },
    month::{allocate_month_endpoint, delete_month_endpoint, get_month_endpoint},
    operations::{delete_everything_endpoint, get_health, get_root, get_version},
    response::{options_collection, options_resource},
    transaction::{
        create_transactions_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// YNAB 4 budget files of several years easily exceed axum's default 2 MB.
const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let resources = Router::new()
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint)
                .post(create_budgets_endpoint)
                .options(options_collection),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .patch(update_budget_endpoint)
                .delete(delete_budget_endpoint)
                .options(options_resource),
        )
        .route(
            endpoints::ACCOUNTS,
            get(list_accounts_endpoint)
                .post(create_accounts_endpoint)
                .options(options_collection),
        )
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .patch(update_account_endpoint)
                .delete(delete_account_endpoint)
                .options(options_resource),
        )
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint)
                .post(create_categories_endpoint)
                .options(options_collection),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .patch(update_category_endpoint)
                .delete(delete_category_endpoint)
                .options(options_resource),
        )
        .route(
            endpoints::ENVELOPES,
            get(list_envelopes_endpoint)
                .post(create_envelopes_endpoint)
                .options(options_collection),
        )
        .route(
            endpoints::ENVELOPE,
            get(get_envelope_endpoint)
                .patch(update_envelope_endpoint)
                .delete(delete_envelope_endpoint)
                .options(options_resource),
        )
        .route(
            endpoints::ENVELOPE_MONTH,
            get(get_month_config_endpoint)
                .patch(update_month_config_endpoint)
                .options(|| options("OPTIONS, GET, PATCH")),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint)
                .post(create_transactions_endpoint)
                .options(options_collection),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint)
                .options(options_resource),
        )
        .route(
            endpoints::ALLOCATIONS,
            get(list_allocations_endpoint)
                .post(create_allocations_endpoint)
                .options(options_collection),
        )
        .route(
            endpoints::ALLOCATION,
            get(get_allocation_endpoint)
                .patch(update_allocation_endpoint)
                .delete(delete_allocation_endpoint)
                .options(options_resource),
        )
        .route(
            endpoints::GOALS,
            get(list_goals_endpoint)
                .post(create_goals_endpoint)
                .options(options_collection),
        )
        .route(
            endpoints::GOAL,
            get(get_goal_endpoint)
                .patch(update_goal_endpoint)
                .delete(delete_goal_endpoint)
                .options(options_resource),
        )
        .route(
            endpoints::MATCH_RULES,
            get(list_match_rules_endpoint)
                .post(create_match_rules_endpoint)
                .options(options_collection),
        )
        .route(
            endpoints::MATCH_RULE,
            get(get_match_rule_endpoint)
                .patch(update_match_rule_endpoint)
                .delete(delete_match_rule_endpoint)
                .options(options_resource),
        )
        .route(
            endpoints::MONTHS,
            get(get_month_endpoint)
                .post(allocate_month_endpoint)
                .delete(delete_month_endpoint)
                .options(|| options("OPTIONS, GET, POST, DELETE")),
        );

    let imports = Router::new()
        .route(endpoints::IMPORT_YNAB4, post(import_ynab4_endpoint))
        .route(
            endpoints::IMPORT_YNAB_PREVIEW,
            post(preview_ynab_csv_endpoint),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES));

    Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(
            endpoints::API_ROOT,
            get(get_root).delete(delete_everything_endpoint),
        )
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::VERSION, get(get_version))
        .merge(resources)
        .merge(imports)
        .fallback(get_404_not_found)
        .method_not_allowed_fallback(get_405_method_not_allowed)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn options(allow: &'static str) -> Response {
    (StatusCode::NO_CONTENT, [(ALLOW, allow)]).into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

async fn get_405_method_not_allowed() -> Response {
    Error::MethodNotAllowed.into_response()
}
