//! The route handlers for budgets.

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    app_state::ResourceState,
    budget::{
        BudgetForm, BudgetId, BudgetPatch, BudgetQuery, BudgetResponse, create_budget,
        delete_budget, get_budget, list_budgets, update_budget,
    },
    db::create_batch,
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::Page,
    response::{DataResponse, ListResponse, batch_response},
};

/// A route handler for listing budgets.
pub async fn list_budgets_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<BudgetQuery>,
) -> Result<ListResponse<BudgetResponse>, Error> {
    let page = Page::new(query.offset, query.limit, &state.pagination_config);
    let connection = state.connection()?;

    let (budgets, total) = list_budgets(&query, page, &connection)?;

    Ok(ListResponse::new(
        page,
        budgets.into_iter().map(BudgetResponse::from).collect(),
        total,
    ))
}

/// A route handler for creating one or more budgets.
pub async fn create_budgets_endpoint(
    State(state): State<ResourceState>,
    ApiJson(forms): ApiJson<Vec<BudgetForm>>,
) -> Result<Response, Error> {
    let connection = state.connection()?;

    let results = create_batch(forms, &connection, create_budget)?;

    Ok(batch_response(
        results
            .into_iter()
            .map(|result| result.map(BudgetResponse::from))
            .collect(),
    ))
}

pub async fn get_budget_endpoint(
    State(state): State<ResourceState>,
    ApiPath(budget_id): ApiPath<BudgetId>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let budget = get_budget(budget_id, &connection)?;

    Ok(DataResponse::ok(BudgetResponse::from(budget)))
}

pub async fn update_budget_endpoint(
    State(state): State<ResourceState>,
    ApiPath(budget_id): ApiPath<BudgetId>,
    ApiJson(patch): ApiJson<BudgetPatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let budget = update_budget(budget_id, patch, &connection)?;

    Ok(DataResponse::ok(BudgetResponse::from(budget)))
}

/// A route handler for deleting a budget and everything in it.
pub async fn delete_budget_endpoint(
    State(state): State<ResourceState>,
    ApiPath(budget_id): ApiPath<BudgetId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_budget(budget_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
