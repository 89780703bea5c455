//! The route handlers for accounts.

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    Error,
    account::{
        AccountForm, AccountId, AccountPatch, AccountQuery, AccountResponse, account_response,
        create_account, delete_account, get_account, list_accounts, update_account,
    },
    app_state::ResourceState,
    db::create_batch,
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::Page,
    response::{DataResponse, ListResponse, batch_response},
};

pub async fn list_accounts_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<AccountQuery>,
) -> Result<ListResponse<AccountResponse>, Error> {
    let page = Page::new(query.offset, query.limit, &state.pagination_config);
    let connection = state.connection()?;

    let (accounts, total) = list_accounts(&query, page, &connection)?;
    let accounts = accounts
        .into_iter()
        .map(|account| account_response(account, &connection))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ListResponse::new(page, accounts, total))
}

pub async fn create_accounts_endpoint(
    State(state): State<ResourceState>,
    ApiJson(forms): ApiJson<Vec<AccountForm>>,
) -> Result<Response, Error> {
    let connection = state.connection()?;

    let results = create_batch(forms, &connection, |form, connection| {
        create_account(form, connection).and_then(|account| account_response(account, connection))
    })?;

    Ok(batch_response(results))
}

pub async fn get_account_endpoint(
    State(state): State<ResourceState>,
    ApiPath(account_id): ApiPath<AccountId>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let account = get_account(account_id, &connection)?;

    Ok(DataResponse::ok(account_response(account, &connection)?))
}

pub async fn update_account_endpoint(
    State(state): State<ResourceState>,
    ApiPath(account_id): ApiPath<AccountId>,
    ApiJson(patch): ApiJson<AccountPatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let account = update_account(account_id, patch, &connection)?;

    Ok(DataResponse::ok(account_response(account, &connection)?))
}

/// A route handler for deleting an account, its transactions and its match rules.
pub async fn delete_account_endpoint(
    State(state): State<ResourceState>,
    ApiPath(account_id): ApiPath<AccountId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_account(account_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    use crate::{
        account::{AccountForm, AccountPatch, AccountQuery},
        app_state::ResourceState,
        extract::{ApiJson, ApiPath, ApiQuery},
        test_utils::{assert_status, must_create_budget, parse_json_body},
    };

    use super::{
        create_accounts_endpoint, get_account_endpoint, list_accounts_endpoint,
        update_account_endpoint,
    };

    #[tokio::test]
    async fn create_returns_accounts_with_balances() {
        let state = ResourceState::in_memory();
        let budget = must_create_budget(&state.connection().unwrap());

        let response = create_accounts_endpoint(
            State(state),
            ApiJson(vec![AccountForm {
                budget_id: budget.id,
                name: "Checking".to_owned(),
                on_budget: true,
                initial_balance: 12.5,
                ..Default::default()
            }]),
        )
        .await
        .unwrap();

        assert_status(&response, StatusCode::CREATED);
        let body = parse_json_body(response).await;
        let account = &body["data"][0]["data"];
        assert_eq!(account["name"], "Checking");
        assert_eq!(account["onBudget"], true);
        assert_eq!(account["balance"], 12.5);
        assert_eq!(account["reconciledBalance"], 12.5);
        assert_eq!(account["recentEnvelopes"], json!([]));
        assert_eq!(account["initialBalanceDate"], json!(null));
        assert_eq!(account["links"]["matchRules"], "/v3/match-rules?account=1");
    }

    #[tokio::test]
    async fn create_with_missing_budget_is_not_found() {
        let state = ResourceState::in_memory();

        let response = create_accounts_endpoint(
            State(state),
            ApiJson(vec![AccountForm {
                budget_id: 5,
                name: "Checking".to_owned(),
                ..Default::default()
            }]),
        )
        .await
        .unwrap();

        assert_status(&response, StatusCode::NOT_FOUND);
        assert_eq!(
            parse_json_body(response).await,
            json!({"data": [{"error": "there is no budget with ID 5"}]})
        );
    }

    #[tokio::test]
    async fn list_with_missing_budget_is_not_found() {
        let state = ResourceState::in_memory();

        let response = list_accounts_endpoint(
            State(state),
            ApiQuery(AccountQuery {
                budget: Some(3),
                ..Default::default()
            }),
        )
        .await
        .into_response();

        assert_status(&response, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_and_get_account() {
        let state = ResourceState::in_memory();
        let budget = must_create_budget(&state.connection().unwrap());
        create_accounts_endpoint(
            State(state.clone()),
            ApiJson(vec![AccountForm {
                budget_id: budget.id,
                name: "Checking".to_owned(),
                ..Default::default()
            }]),
        )
        .await
        .unwrap();

        update_account_endpoint(
            State(state.clone()),
            ApiPath(1),
            ApiJson(AccountPatch {
                archived: Some(true),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let response = get_account_endpoint(State(state), ApiPath(1)).await.unwrap();

        assert_status(&response, StatusCode::OK);
        assert_eq!(parse_json_body(response).await["data"]["archived"], true);
    }
}
