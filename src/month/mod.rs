//! The budget month: what was allocated, spent and is left in every envelope,
//! and how much money is still available to budget.

mod calculation;
mod db;
mod handlers;
mod models;

pub use calculation::BudgetHistory;
pub use db::{allocate_month, delete_month_allocations, get_month};
pub use handlers::{allocate_month_endpoint, delete_month_endpoint, get_month_endpoint};
pub use models::{
    AllocationMethod, AllocationRequest, CategorySummary, EnvelopeSummary, MonthQuery,
    MonthSummary,
};
