//! Importers for data exported from YNAB.
//!
//! Both importers take a `multipart/form-data` upload with the file in the field `file`.

mod ynab4;
mod ynab_csv;

use axum::extract::{
    Multipart,
    multipart::{Field, MultipartRejection},
};

use crate::Error;

pub use ynab4::import_ynab4_endpoint;
pub use ynab_csv::preview_ynab_csv_endpoint;

/// The name of the form field that holds the uploaded file.
const FILE_FIELD: &str = "file";

/// Read the uploaded file from the form field `file` as text.
///
/// `extension` is the file extension the importer expects, e.g. `.csv`. The
/// check is case-insensitive.
///
/// # Errors
/// Returns:
/// - [Error::MultipartError] if the form cannot be parsed,
/// - [Error::MissingFile] if there is no `file` field,
/// - [Error::WrongFileType] if the file name does not end with `extension`.
async fn read_uploaded_file(
    multipart: Result<Multipart, MultipartRejection>,
    extension: &'static str,
) -> Result<String, Error> {
    let mut multipart =
        multipart.map_err(|rejection| Error::MultipartError(rejection.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        if field.name() == Some(FILE_FIELD) {
            return read_file_field(field, extension).await;
        }
    }

    Err(Error::MissingFile)
}

async fn read_file_field(field: Field<'_>, extension: &'static str) -> Result<String, Error> {
    let file_name = field.file_name().unwrap_or_default().to_owned();

    if !file_name.to_lowercase().ends_with(extension) {
        tracing::debug!("Rejected upload '{file_name}', expected a {extension} file");
        return Err(Error::WrongFileType(extension));
    }

    let data = field.text().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("could not read the uploaded file".to_owned())
    })?;

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data)
}
