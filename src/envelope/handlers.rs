//! The route handlers for envelopes.

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    Error,
    app_state::ResourceState,
    db::create_batch,
    envelope::{
        EnvelopeForm, EnvelopeId, EnvelopePatch, EnvelopeQuery, EnvelopeResponse, create_envelope,
        delete_envelope, get_envelope, list_envelopes, update_envelope,
    },
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::Page,
    response::{DataResponse, ListResponse, batch_response},
};

pub async fn list_envelopes_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<EnvelopeQuery>,
) -> Result<ListResponse<EnvelopeResponse>, Error> {
    let page = Page::new(query.offset, query.limit, &state.pagination_config);
    let connection = state.connection()?;

    let (envelopes, total) = list_envelopes(&query, page, &connection)?;

    Ok(ListResponse::new(
        page,
        envelopes.into_iter().map(EnvelopeResponse::from).collect(),
        total,
    ))
}

pub async fn create_envelopes_endpoint(
    State(state): State<ResourceState>,
    ApiJson(forms): ApiJson<Vec<EnvelopeForm>>,
) -> Result<Response, Error> {
    let connection = state.connection()?;

    let results = create_batch(forms, &connection, create_envelope)?;

    Ok(batch_response(
        results
            .into_iter()
            .map(|result| result.map(EnvelopeResponse::from))
            .collect(),
    ))
}

pub async fn get_envelope_endpoint(
    State(state): State<ResourceState>,
    ApiPath(envelope_id): ApiPath<EnvelopeId>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let envelope = get_envelope(envelope_id, &connection)?;

    Ok(DataResponse::ok(EnvelopeResponse::from(envelope)))
}

pub async fn update_envelope_endpoint(
    State(state): State<ResourceState>,
    ApiPath(envelope_id): ApiPath<EnvelopeId>,
    ApiJson(patch): ApiJson<EnvelopePatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let envelope = update_envelope(envelope_id, patch, &connection)?;

    Ok(DataResponse::ok(EnvelopeResponse::from(envelope)))
}

pub async fn delete_envelope_endpoint(
    State(state): State<ResourceState>,
    ApiPath(envelope_id): ApiPath<EnvelopeId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_envelope(envelope_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode};

    use crate::{
        app_state::ResourceState,
        envelope::{EnvelopeForm, EnvelopePatch},
        extract::{ApiJson, ApiPath},
        test_utils::{assert_status, must_create_budget, must_create_category, parse_json_body},
    };

    use super::{create_envelopes_endpoint, update_envelope_endpoint};

    #[tokio::test]
    async fn create_and_rename_envelope() {
        let state = ResourceState::in_memory();
        let category = {
            let connection = state.connection().unwrap();
            let budget = must_create_budget(&connection);
            must_create_category(budget.id, "Living", &connection)
        };

        let response = create_envelopes_endpoint(
            State(state.clone()),
            ApiJson(vec![EnvelopeForm {
                category_id: category.id,
                name: "Rent".to_owned(),
                ..Default::default()
            }]),
        )
        .await
        .unwrap();

        assert_status(&response, StatusCode::CREATED);
        let body = parse_json_body(response).await;
        let envelope = &body["data"][0]["data"];
        assert_eq!(envelope["categoryId"], category.id);
        assert_eq!(envelope["links"]["month"], "/v3/envelopes/1/YYYY-MM");
        assert_eq!(envelope["links"]["goals"], "/v3/goals?envelope=1");

        let response = update_envelope_endpoint(
            State(state),
            ApiPath(1),
            ApiJson(EnvelopePatch {
                name: Some("Housing".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_status(&response, StatusCode::OK);
        assert_eq!(parse_json_body(response).await["data"]["name"], "Housing");
    }
}
