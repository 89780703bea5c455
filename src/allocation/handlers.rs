//! The route handlers for allocations.

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    Error,
    allocation::{
        AllocationForm, AllocationId, AllocationPatch, AllocationQuery, AllocationResponse,
        create_allocation, delete_allocation, get_allocation, list_allocations, update_allocation,
    },
    app_state::ResourceState,
    db::create_batch,
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::Page,
    response::{DataResponse, ListResponse, batch_response},
};

pub async fn list_allocations_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<AllocationQuery>,
) -> Result<ListResponse<AllocationResponse>, Error> {
    let page = Page::new(query.offset, query.limit, &state.pagination_config);
    let connection = state.connection()?;

    let (allocations, total) = list_allocations(&query, page, &connection)?;

    Ok(ListResponse::new(
        page,
        allocations.into_iter().map(AllocationResponse::from).collect(),
        total,
    ))
}

pub async fn create_allocations_endpoint(
    State(state): State<ResourceState>,
    ApiJson(forms): ApiJson<Vec<AllocationForm>>,
) -> Result<Response, Error> {
    let connection = state.connection()?;

    let results = create_batch(forms, &connection, create_allocation)?;

    Ok(batch_response(
        results
            .into_iter()
            .map(|result| result.map(AllocationResponse::from))
            .collect(),
    ))
}

pub async fn get_allocation_endpoint(
    State(state): State<ResourceState>,
    ApiPath(allocation_id): ApiPath<AllocationId>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let allocation = get_allocation(allocation_id, &connection)?;

    Ok(DataResponse::ok(AllocationResponse::from(allocation)))
}

pub async fn update_allocation_endpoint(
    State(state): State<ResourceState>,
    ApiPath(allocation_id): ApiPath<AllocationId>,
    ApiJson(patch): ApiJson<AllocationPatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let allocation = update_allocation(allocation_id, patch, &connection)?;

    Ok(DataResponse::ok(AllocationResponse::from(allocation)))
}

pub async fn delete_allocation_endpoint(
    State(state): State<ResourceState>,
    ApiPath(allocation_id): ApiPath<AllocationId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_allocation(allocation_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
