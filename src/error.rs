//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::database_id::DatabaseId;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The route exists but does not accept the request's method.
    #[error("this method is not allowed on this resource")]
    MethodNotAllowed,

    /// A resource referenced by ID in a path, query or body does not exist.
    #[error("there is no {0} with ID {1}")]
    ReferenceNotFound(&'static str, DatabaseId),

    /// A UNIQUE constraint failed, e.g. two accounts with the same name in one budget.
    #[error("{0}")]
    Duplicate(String),

    /// A name that must not be empty was empty or just whitespace.
    #[error("the {0} name must not be empty")]
    EmptyName(&'static str),

    /// An account was marked as both external and on budget.
    #[error("external accounts cannot be on budget")]
    ExternalAccountOnBudget,

    /// A transaction amount of zero or less.
    #[error("the transaction amount must be positive")]
    NonPositiveAmount,

    /// A goal amount that is less than zero.
    #[error("the goal amount must not be negative")]
    NegativeGoalAmount,

    /// The source and destination account of a transaction are the same account.
    #[error("the source and destination accounts must be different")]
    SameSourceAndDestination,

    /// Money cannot move between two accounts that are both outside of the budget owner's control.
    #[error("transactions between two external accounts are not possible")]
    TransferBetweenExternalAccounts,

    /// Transfers between two on-budget accounts do not change any envelope.
    #[error("transfers between two on-budget accounts must not have an envelope")]
    EnvelopeOnInternalTransfer,

    /// The accounts of a transaction belong to different budgets.
    #[error("the source and destination accounts must belong to the same budget")]
    AccountsInDifferentBudgets,

    /// The envelope of a transaction belongs to a different budget than its accounts.
    #[error("the envelope must belong to the same budget as the accounts")]
    EnvelopeNotInBudget,

    /// The month a transaction's money becomes available is before the transaction happened.
    #[error("availableFrom must not be earlier than the month of the transaction date")]
    AvailableFromBeforeDate,

    /// A string could not be parsed as a month in the format `YYYY-MM`.
    #[error("invalid month \"{0}\", expected the format YYYY-MM")]
    InvalidMonth(String),

    /// The query string could not be parsed.
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// The request body could not be parsed as JSON of the expected shape.
    #[error("invalid request body: {0}")]
    InvalidJson(String),

    /// A path parameter could not be parsed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a file.
    #[error("the request did not contain a file in the form field \"file\"")]
    MissingFile,

    /// The uploaded file does not have the file type the importer expects.
    #[error("the uploaded file must be a {0} file")]
    WrongFileType(&'static str),

    /// The CSV had issues that prevented it from being parsed.
    #[error("could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The YNAB 4 budget export could not be parsed.
    #[error("could not parse the YNAB 4 budget: {0}")]
    InvalidYnab4(String),

    /// The confirmation string for deleting all data was missing or wrong.
    #[error("to delete all data, set the query parameter confirm to \"yes-please-delete-everything\"")]
    InvalidConfirmation,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::Duplicate(describe_unique_violation(desc))
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Turn SQLite's "UNIQUE constraint failed: account.budget_id, account.name"
/// into a message that makes sense to an API client.
fn describe_unique_violation(description: &str) -> String {
    let columns = description
        .strip_prefix("UNIQUE constraint failed: ")
        .unwrap_or(description);

    let table = columns.split('.').next().unwrap_or_default();

    match table {
        "account" => "an account with this name already exists in the budget".to_owned(),
        "category" => "a category with this name already exists in the budget".to_owned(),
        "envelope" => "an envelope with this name already exists in the category".to_owned(),
        "goal" => "a goal with this name already exists for the envelope".to_owned(),
        "allocation" => "the envelope already has an allocation for this month".to_owned(),
        "budget" => "a budget with this name already exists".to_owned(),
        _ => format!("a resource with these values already exists: {columns}"),
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidJson(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidQuery(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidPath(rejection.body_text())
    }
}

impl Error {
    /// The HTTP status code that best describes the error to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound | Error::ReferenceNotFound(_, _) => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::SqlError(_) | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// The message that is safe to show to a client.
    ///
    /// Internal errors are replaced with a generic message, the details only go to the server logs.
    pub fn client_message(&self) -> String {
        match self {
            Error::SqlError(_) | Error::DatabaseLockError => {
                "an unexpected error occurred, check the server logs for more details".to_owned()
            }
            error => error.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
