//! The route handlers for transactions.

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    Error,
    app_state::ResourceState,
    db::create_batch,
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::Page,
    response::{DataResponse, ListResponse, batch_response},
    transaction::{
        TransactionForm, TransactionId, TransactionPatch, TransactionQuery, TransactionResponse,
        create_transaction, delete_transaction, get_transaction, list_transactions,
        update_transaction,
    },
};

pub async fn list_transactions_endpoint(
    State(state): State<ResourceState>,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> Result<ListResponse<TransactionResponse>, Error> {
    let page = Page::new(query.offset, query.limit, &state.pagination_config);
    let connection = state.connection()?;

    let (transactions, total) = list_transactions(&query, page, &connection)?;

    Ok(ListResponse::new(
        page,
        transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
        total,
    ))
}

/// A route handler for creating transactions, e.g. the ones confirmed from an import preview.
pub async fn create_transactions_endpoint(
    State(state): State<ResourceState>,
    ApiJson(forms): ApiJson<Vec<TransactionForm>>,
) -> Result<Response, Error> {
    let connection = state.connection()?;

    let results = create_batch(forms, &connection, create_transaction)?;

    Ok(batch_response(
        results
            .into_iter()
            .map(|result| result.map(TransactionResponse::from))
            .collect(),
    ))
}

pub async fn get_transaction_endpoint(
    State(state): State<ResourceState>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let transaction = get_transaction(transaction_id, &connection)?;

    Ok(DataResponse::ok(TransactionResponse::from(transaction)))
}

pub async fn update_transaction_endpoint(
    State(state): State<ResourceState>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(patch): ApiJson<TransactionPatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let transaction = update_transaction(transaction_id, patch, &connection)?;

    Ok(DataResponse::ok(TransactionResponse::from(transaction)))
}

pub async fn delete_transaction_endpoint(
    State(state): State<ResourceState>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    delete_transaction(transaction_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
