//! Budgets, the top level resource that owns accounts, categories and transactions.

mod db;
mod handlers;
mod models;

pub use db::{create_budget, create_budget_table, delete_budget, get_budget, list_budgets, update_budget};
pub use handlers::{
    create_budgets_endpoint, delete_budget_endpoint, get_budget_endpoint, list_budgets_endpoint,
    update_budget_endpoint,
};
pub use models::{Budget, BudgetForm, BudgetId, BudgetPatch, BudgetQuery, BudgetResponse};
