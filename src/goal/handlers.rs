//! The route handlers for goals.

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    Error,
    app_state::ResourceState,
    db::create_batch,
    extract::{ApiJson, ApiPath, ApiQuery},
    goal::{
        GoalForm, GoalId, GoalPatch, GoalQuery, GoalResponse, create_goal, delete_goal, get_goal,
        list_goals, update_goal,
    },
    pagination::Page,
    response::{DataResponse, ListResponse, batch_response},
};

pub async fn list_goals_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<GoalQuery>,
) -> Result<ListResponse<GoalResponse>, Error> {
    let page = Page::new(query.offset, query.limit, &state.pagination_config);
    let connection = state.connection()?;

    let (goals, total) = list_goals(&query, page, &connection)?;

    Ok(ListResponse::new(
        page,
        goals.into_iter().map(GoalResponse::from).collect(),
        total,
    ))
}

pub async fn create_goals_endpoint(
    State(state): State<ResourceState>,
    ApiJson(forms): ApiJson<Vec<GoalForm>>,
) -> Result<Response, Error> {
    let connection = state.connection()?;

    let results = create_batch(forms, &connection, create_goal)?;

    Ok(batch_response(
        results
            .into_iter()
            .map(|result| result.map(GoalResponse::from))
            .collect(),
    ))
}

pub async fn get_goal_endpoint(
    State(state): State<ResourceState>,
    ApiPath(goal_id): ApiPath<GoalId>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let goal = get_goal(goal_id, &connection)?;

    Ok(DataResponse::ok(GoalResponse::from(goal)))
}

pub async fn update_goal_endpoint(
    State(state): State<ResourceState>,
    ApiPath(goal_id): ApiPath<GoalId>,
    ApiJson(patch): ApiJson<GoalPatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let goal = update_goal(goal_id, patch, &connection)?;

    Ok(DataResponse::ok(GoalResponse::from(goal)))
}

pub async fn delete_goal_endpoint(
    State(state): State<ResourceState>,
    ApiPath(goal_id): ApiPath<GoalId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_goal(goal_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
