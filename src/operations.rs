//! Endpoints that are not about a single resource: the API index, health
//! and version checks, and deleting all data.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, app_state::ResourceState, db::delete_everything, endpoints, extract::ApiQuery,
    response::DataResponse,
};

/// The value of `confirm` that allows deleting all data.
const DELETE_CONFIRMATION: &str = "yes-please-delete-everything";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootLinks {
    budgets: &'static str,
    accounts: &'static str,
    categories: &'static str,
    envelopes: &'static str,
    transactions: &'static str,
    allocations: &'static str,
    goals: &'static str,
    match_rules: &'static str,
    months: &'static str,
    import_ynab4: &'static str,
    import_ynab_preview: &'static str,
    health: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    links: RootLinks,
}

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct DeleteEverythingQuery {
    confirm: Option<String>,
}

/// List the entry points of the API.
pub async fn get_root() -> Response {
    DataResponse::ok(RootResponse {
        links: RootLinks {
            budgets: endpoints::BUDGETS,
            accounts: endpoints::ACCOUNTS,
            categories: endpoints::CATEGORIES,
            envelopes: endpoints::ENVELOPES,
            transactions: endpoints::TRANSACTIONS,
            allocations: endpoints::ALLOCATIONS,
            goals: endpoints::GOALS,
            match_rules: endpoints::MATCH_RULES,
            months: endpoints::MONTHS,
            import_ynab4: endpoints::IMPORT_YNAB4,
            import_ynab_preview: endpoints::IMPORT_YNAB_PREVIEW,
            health: endpoints::HEALTH,
            version: endpoints::VERSION,
        },
    })
}

/// Respond with 204 if the database answers, otherwise 500.
pub async fn get_health(State(state): State<ResourceState>) -> Result<Response, Error> {
    let connection = state.connection()?;
    connection.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn get_version() -> Response {
    DataResponse::ok(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Delete every budget and everything in it.
///
/// The query parameter `confirm` must be `yes-please-delete-everything`.
pub async fn delete_everything_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<DeleteEverythingQuery>,
) -> Result<Response, Error> {
    if query.confirm.as_deref() != Some(DELETE_CONFIRMATION) {
        return Err(Error::InvalidConfirmation);
    }

    let connection = state.connection()?;
    delete_everything(&connection)?;
    tracing::warn!("Deleted all data");

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, response::IntoResponse};

    use crate::{
        Error,
        app_state::ResourceState,
        extract::ApiQuery,
        test_utils::{assert_status, must_create_budget, parse_json_body},
    };

    use super::{
        DeleteEverythingQuery, delete_everything_endpoint, get_health, get_root, get_version,
    };

    #[tokio::test]
    async fn root_links_to_collections() {
        let body = parse_json_body(get_root().await).await;

        assert_eq!(body["data"]["links"]["budgets"], "/v3/budgets");
        assert_eq!(body["data"]["links"]["matchRules"], "/v3/match-rules");
    }

    #[tokio::test]
    async fn healthy_database_gives_no_content() {
        let response = get_health(State(ResourceState::in_memory())).await.unwrap();

        assert_status(&response, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn version_is_package_version() {
        let body = parse_json_body(get_version().await).await;

        assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn delete_everything_requires_confirmation() {
        let state = ResourceState::in_memory();

        let result = delete_everything_endpoint(
            State(state.clone()),
            ApiQuery(DeleteEverythingQuery {
                confirm: Some("yes".to_owned()),
            }),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::InvalidConfirmation);
        assert_status(
            &Error::InvalidConfirmation.into_response(),
            StatusCode::BAD_REQUEST,
        );
    }

    #[tokio::test]
    async fn delete_everything_removes_budgets() {
        let state = ResourceState::in_memory();
        must_create_budget(&state.connection().unwrap());

        let response = delete_everything_endpoint(
            State(state.clone()),
            ApiQuery(DeleteEverythingQuery {
                confirm: Some("yes-please-delete-everything".to_owned()),
            }),
        )
        .await
        .unwrap();

        assert_status(&response, StatusCode::NO_CONTENT);
        let budgets: i64 = state
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM budget", [], |row| row.get(0))
            .unwrap();
        assert_eq!(budgets, 0);
    }
}
