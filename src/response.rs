//! JSON response shapes shared by all resources.

use axum::{
    Json,
    http::{StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    Error,
    pagination::{Page, Pagination},
};

/// A single resource: `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    /// Respond with `data` and status 200 OK.
    pub fn ok(data: T) -> Response {
        (StatusCode::OK, Json(Self { data })).into_response()
    }

    /// Respond with `data` and status 201 Created.
    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, Json(Self { data })).into_response()
    }
}

/// A page of resources: `{ "data": [...], "pagination": {...} }`.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> ListResponse<T> {
    pub fn new(page: Page, data: Vec<T>, total: u64) -> Self {
        Self {
            pagination: Pagination::new(page, data.len(), total),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// The outcome of creating one item of a batch create request.
#[derive(Debug, Serialize)]
pub struct BatchItem<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Respond to a batch create request.
///
/// Responds with 201 Created if every item was created, otherwise with the
/// status of the first item that failed. Each item reports its own outcome.
pub fn batch_response<T: Serialize>(results: Vec<Result<T, Error>>) -> Response {
    let mut status = StatusCode::CREATED;

    let items = results
        .into_iter()
        .map(|result| match result {
            Ok(data) => BatchItem {
                data: Some(data),
                error: None,
            },
            Err(error) => {
                if status == StatusCode::CREATED {
                    status = error.status_code();
                }

                tracing::debug!("Could not create item in batch: {error}");

                BatchItem {
                    data: None,
                    error: Some(error.client_message()),
                }
            }
        })
        .collect::<Vec<_>>();

    (status, Json(DataResponse { data: items })).into_response()
}

/// The `Allow` header value for collection endpoints.
pub const COLLECTION_METHODS: &str = "OPTIONS, GET, POST";
/// The `Allow` header value for single resource endpoints.
pub const RESOURCE_METHODS: &str = "OPTIONS, GET, PATCH, DELETE";

/// Answer an OPTIONS request on a collection.
pub async fn options_collection() -> Response {
    (StatusCode::NO_CONTENT, [(ALLOW, COLLECTION_METHODS)]).into_response()
}

/// Answer an OPTIONS request on a single resource.
pub async fn options_resource() -> Response {
    (StatusCode::NO_CONTENT, [(ALLOW, RESOURCE_METHODS)]).into_response()
}

/// Round an amount of money to whole cents.
///
/// Sums of `f64` amounts pick up representation noise (0.1 + 0.2), so
/// computed figures are rounded before they are returned.
pub fn round_cents(amount: f64) -> f64 {
    let rounded = (amount * 100.0).round() / 100.0;

    // Avoid serializing negative zero as -0.0.
    if rounded == 0.0 { 0.0 } else { rounded }
}
