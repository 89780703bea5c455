//! Allocations assign money to an envelope for one month.

mod db;
mod handlers;
mod models;

pub use db::{
    create_allocation, create_allocation_table, delete_allocation, get_allocation,
    list_allocations, update_allocation, upsert_allocation,
};
pub use handlers::{
    create_allocations_endpoint, delete_allocation_endpoint, get_allocation_endpoint,
    list_allocations_endpoint, update_allocation_endpoint,
};
pub use models::{
    Allocation, AllocationForm, AllocationId, AllocationPatch, AllocationQuery, AllocationResponse,
};
