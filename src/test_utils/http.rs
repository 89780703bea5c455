use axum::{body::Body, http::StatusCode, response::Response};
use serde_json::Value;

#[track_caller]
pub(crate) fn assert_status(response: &Response<Body>, status: StatusCode) {
    assert_eq!(response.status(), status);
}

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    let header_error_message = format!("Headers missing {header_name}");

    response
        .headers()
        .get(header_name)
        .expect(&header_error_message)
        .to_str()
        .expect("Could not convert to str")
        .to_string()
}

/// Read the whole body of `response` as JSON.
pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");

    serde_json::from_slice(&body).expect("response body is not valid JSON")
}
