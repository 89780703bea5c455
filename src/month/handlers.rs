//! The route handlers for budget months.

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    Error,
    app_state::ResourceState,
    extract::{ApiJson, ApiQuery},
    month::{
        AllocationRequest, MonthQuery, allocate_month, delete_month_allocations, get_month,
    },
    response::DataResponse,
};

pub async fn get_month_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let month = get_month(query.budget, query.month, &connection)?;

    Ok(DataResponse::ok(month))
}

pub async fn allocate_month_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<MonthQuery>,
    ApiJson(request): ApiJson<AllocationRequest>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    allocate_month(query.budget, query.month, request.method, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_month_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_month_allocations(query.budget, query.month, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
