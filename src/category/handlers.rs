//! The route handlers for categories.

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    Error,
    app_state::ResourceState,
    category::{
        CategoryForm, CategoryId, CategoryPatch, CategoryQuery, CategoryResponse, create_category,
        delete_category, get_category, list_categories, update_category,
    },
    db::create_batch,
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::Page,
    response::{DataResponse, ListResponse, batch_response},
};

pub async fn list_categories_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> Result<ListResponse<CategoryResponse>, Error> {
    let page = Page::new(query.offset, query.limit, &state.pagination_config);
    let connection = state.connection()?;

    let (categories, total) = list_categories(&query, page, &connection)?;

    Ok(ListResponse::new(
        page,
        categories.into_iter().map(CategoryResponse::from).collect(),
        total,
    ))
}

pub async fn create_categories_endpoint(
    State(state): State<ResourceState>,
    ApiJson(forms): ApiJson<Vec<CategoryForm>>,
) -> Result<Response, Error> {
    let connection = state.connection()?;

    let results = create_batch(forms, &connection, create_category)?;

    Ok(batch_response(
        results
            .into_iter()
            .map(|result| result.map(CategoryResponse::from))
            .collect(),
    ))
}

pub async fn get_category_endpoint(
    State(state): State<ResourceState>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let category = get_category(category_id, &connection)?;

    Ok(DataResponse::ok(CategoryResponse::from(category)))
}

pub async fn update_category_endpoint(
    State(state): State<ResourceState>,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let category = update_category(category_id, patch, &connection)?;

    Ok(DataResponse::ok(CategoryResponse::from(category)))
}

pub async fn delete_category_endpoint(
    State(state): State<ResourceState>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_category(category_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
