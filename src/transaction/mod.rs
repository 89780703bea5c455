//! Transactions move money between two accounts of a budget.
//!
//! This module contains:
//! - The `Transaction` model and its validation rules
//! - Database functions for storing, querying, and managing transactions
//! - The route handlers for the transaction endpoints

mod core;
mod handlers;
mod query;

pub use core::{
    Transaction, TransactionForm, TransactionId, TransactionPatch, TransactionResponse,
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    map_transaction_row, transaction_ids_with_import_hash, update_transaction,
};
pub use handlers::{
    create_transactions_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    list_transactions_endpoint, update_transaction_endpoint,
};
pub use query::{TransactionQuery, list_transactions};
