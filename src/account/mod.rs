//! Accounts hold the money of a budget. On-budget accounts fund the envelopes,
//! off-budget and external accounts (payees) are where money comes from and goes to.

mod db;
mod handlers;
mod models;

pub use db::{
    account_response, create_account, create_account_table, delete_account, get_account,
    list_accounts, update_account,
};
pub use handlers::{
    create_accounts_endpoint, delete_account_endpoint, get_account_endpoint,
    list_accounts_endpoint, update_account_endpoint,
};
pub use models::{Account, AccountForm, AccountId, AccountPatch, AccountQuery, AccountResponse};
