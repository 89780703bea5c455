//! The configuration of an envelope for a single month: a note and how overspending is handled.

use axum::{extract::State, response::Response};
use rusqlite::{
    Connection, OptionalExtension,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    app_state::ResourceState,
    budget_month::BudgetMonth,
    db::now,
    endpoints::{self, format_endpoint, format_envelope_month},
    envelope::{EnvelopeId, get_envelope},
    extract::{ApiJson, ApiPath},
    response::DataResponse,
};

/// What happens to a negative envelope balance at the end of a month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverspendMode {
    /// The overspent amount is taken from the money available to budget in the next month.
    #[default]
    AffectAvailable,
    /// The negative balance is carried over in the envelope.
    AffectEnvelope,
}

impl OverspendMode {
    fn as_str(&self) -> &'static str {
        match self {
            OverspendMode::AffectAvailable => "AFFECT_AVAILABLE",
            OverspendMode::AffectEnvelope => "AFFECT_ENVELOPE",
        }
    }
}

impl ToSql for OverspendMode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for OverspendMode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "AFFECT_AVAILABLE" => Ok(OverspendMode::AffectAvailable),
            "AFFECT_ENVELOPE" => Ok(OverspendMode::AffectEnvelope),
            other => Err(FromSqlError::Other(
                format!("unknown overspend mode {other}").into(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthConfigLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub envelope: String,
}

/// An envelope's configuration for a month, with the amount allocated to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthConfig {
    pub envelope_id: EnvelopeId,
    pub month: BudgetMonth,
    pub note: String,
    pub overspend_mode: OverspendMode,
    pub allocation: f64,
    pub links: MonthConfigLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MonthConfigPatch {
    pub note: Option<String>,
    pub overspend_mode: Option<OverspendMode>,
}

/// Get the configuration of an envelope for `month`.
///
/// Months without a stored configuration get the defaults.
///
/// # Errors
/// Returns [Error::NotFound] if the envelope does not exist.
pub fn get_month_config(
    envelope_id: EnvelopeId,
    month: BudgetMonth,
    connection: &Connection,
) -> Result<MonthConfig, Error> {
    get_envelope(envelope_id, connection)?;

    let (note, overspend_mode): (String, OverspendMode) = connection
        .query_row(
            "SELECT note, overspend_mode FROM month_config WHERE envelope_id = ?1 AND month = ?2",
            (envelope_id, month),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .unwrap_or_default();

    let allocation = connection
        .query_row(
            "SELECT amount FROM allocation WHERE envelope_id = ?1 AND month = ?2",
            (envelope_id, month),
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0.0);

    Ok(MonthConfig {
        envelope_id,
        month,
        note,
        overspend_mode,
        allocation,
        links: MonthConfigLinks {
            self_: format_envelope_month(envelope_id, month),
            envelope: format_endpoint(endpoints::ENVELOPE, envelope_id),
        },
    })
}

/// Create or update the configuration of an envelope for `month`.
///
/// # Errors
/// Returns [Error::NotFound] if the envelope does not exist.
pub fn update_month_config(
    envelope_id: EnvelopeId,
    month: BudgetMonth,
    patch: MonthConfigPatch,
    connection: &Connection,
) -> Result<MonthConfig, Error> {
    let current = get_month_config(envelope_id, month, connection)?;
    let timestamp = now();

    connection.execute(
        "INSERT INTO month_config (envelope_id, month, note, overspend_mode, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)
         ON CONFLICT(envelope_id, month) DO UPDATE SET
            note = excluded.note,
            overspend_mode = excluded.overspend_mode,
            updated_at = excluded.updated_at",
        (
            envelope_id,
            month,
            patch.note.unwrap_or(current.note),
            patch.overspend_mode.unwrap_or(current.overspend_mode),
            timestamp,
        ),
    )?;

    get_month_config(envelope_id, month, connection)
}

pub async fn get_month_config_endpoint(
    State(state): State<ResourceState>,
    ApiPath((envelope_id, month)): ApiPath<(EnvelopeId, BudgetMonth)>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let config = get_month_config(envelope_id, month, &connection)?;

    Ok(DataResponse::ok(config))
}

pub async fn update_month_config_endpoint(
    State(state): State<ResourceState>,
    ApiPath((envelope_id, month)): ApiPath<(EnvelopeId, BudgetMonth)>,
    ApiJson(patch): ApiJson<MonthConfigPatch>,
) -> Result<Response, Error> {
    let connection = state.connection()?;
    let config = update_month_config(envelope_id, month, patch, &connection)?;

    Ok(DataResponse::ok(config))
}

pub fn create_month_config_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS month_config (
            envelope_id INTEGER NOT NULL REFERENCES envelope(id) ON DELETE CASCADE,
            month TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            overspend_mode TEXT NOT NULL DEFAULT 'AFFECT_AVAILABLE',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (envelope_id, month)
        )",
        (),
    )?;

    Ok(())
}
