#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod http;

pub(crate) use fixtures::{
    get_test_connection, must_create_account, must_create_budget, must_create_category,
    must_create_envelope, must_create_transaction, transaction_form,
};
pub(crate) use http::{assert_status, get_header, parse_json_body};
