//! Envelopes hold the money allocated to one purpose, e.g. groceries, and
//! their configuration for each month.

mod db;
mod handlers;
mod models;
mod month_config;

pub use db::{
    create_envelope, create_envelope_table, delete_envelope, envelope_budget_id, get_envelope,
    list_envelopes, update_envelope,
};
pub use handlers::{
    create_envelopes_endpoint, delete_envelope_endpoint, get_envelope_endpoint,
    list_envelopes_endpoint, update_envelope_endpoint,
};
pub use models::{Envelope, EnvelopeForm, EnvelopeId, EnvelopePatch, EnvelopeQuery, EnvelopeResponse};
pub use month_config::{
    MonthConfigPatch, OverspendMode, create_month_config_table, get_month_config_endpoint,
    update_month_config, update_month_config_endpoint,
};

#[cfg(test)]
pub use month_config::get_month_config;
