//! The route handlers for match rules.

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    Error,
    app_state::ResourceState,
    db::create_batch,
    extract::{ApiJson, ApiPath, ApiQuery},
    match_rule::{
        MatchRuleForm, MatchRuleId, MatchRulePatch, MatchRuleQuery, MatchRuleResponse,
        create_match_rule, delete_match_rule, get_match_rule, list_match_rules,
        update_match_rule,
    },
    pagination::Page,
    response::{DataResponse, ListResponse, batch_response},
};

pub async fn list_match_rules_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<MatchRuleQuery>,
) -> Result<ListResponse<MatchRuleResponse>, Error> {
    let page = Page::new(query.offset, query.limit, &state.pagination_config);
    let connection = state.connection()?;

    let (match_rules, total) = list_match_rules(&query, page, &connection)?;

    Ok(ListResponse::new(
        page,
        match_rules.into_iter().map(MatchRuleResponse::from).collect(),
        total,
    ))
}

pub async fn create_match_rules_endpoint(
    State(state): State<ResourceState>,
    ApiJson(forms): ApiJson<Vec<MatchRuleForm>>,
) -> Result<Response, Error> {
    let connection = state.connection()?;

    let results = create_batch(forms, &connection, create_match_rule)?;

    Ok(batch_response(
        results
            .into_iter()
            .map(|result| result.map(MatchRuleResponse::from))
            .collect(),
    ))
}

pub async fn get_match_rule_endpoint(
    State(state): State<ResourceState>,
    ApiPath(match_rule_id): ApiPath<MatchRuleId>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let match_rule = get_match_rule(match_rule_id, &connection)?;

    Ok(DataResponse::ok(MatchRuleResponse::from(match_rule)))
}

pub async fn update_match_rule_endpoint(
    State(state): State<ResourceState>,
    ApiPath(match_rule_id): ApiPath<MatchRuleId>,
    ApiJson(patch): ApiJson<MatchRulePatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let match_rule = update_match_rule(match_rule_id, patch, &connection)?;

    Ok(DataResponse::ok(MatchRuleResponse::from(match_rule)))
}

pub async fn delete_match_rule_endpoint(
    State(state): State<ResourceState>,
    ApiPath(match_rule_id): ApiPath<MatchRuleId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_match_rule(match_rule_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode};
    use serde_json::json;

    use crate::{
        app_state::ResourceState,
        extract::{ApiJson, ApiPath},
        match_rule::MatchRulePatch,
        test_utils::{assert_status, must_create_account, must_create_budget, parse_json_body},
    };

    use super::{create_match_rules_endpoint, update_match_rule_endpoint};

    #[tokio::test]
    async fn match_is_serialized_under_its_own_name() {
        let state = ResourceState::in_memory();
        let account = {
            let connection = state.connection().unwrap();
            let budget = must_create_budget(&connection);
            must_create_account(budget.id, "Shop", false, true, &connection)
        };
        let forms = serde_json::from_value(json!([
            { "accountId": account.id, "priority": 2, "match": "Corner shop*" },
            { "accountId": 99, "match": "Nowhere" },
        ]))
        .unwrap();

        let response = create_match_rules_endpoint(State(state.clone()), ApiJson(forms))
            .await
            .unwrap();

        assert_status(&response, StatusCode::NOT_FOUND);
        let body = parse_json_body(response).await;
        assert_eq!(body["data"][0]["data"]["match"], "Corner shop*");
        assert_eq!(body["data"][0]["data"]["links"]["account"], "/v3/accounts/1");
        assert_eq!(body["data"][1]["error"], "there is no account with ID 99");

        let response = update_match_rule_endpoint(
            State(state),
            ApiPath(1),
            ApiJson(MatchRulePatch {
                pattern: Some("Corner*".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        let body = parse_json_body(response).await;
        assert_eq!(body["data"]["match"], "Corner*");
        assert_eq!(body["data"]["priority"], 2);
    }
}
