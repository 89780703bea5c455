//! Categories group the envelopes of a budget.

mod db;
mod handlers;
mod models;

pub use db::{
    create_category, create_category_table, delete_category, get_category, list_categories,
    update_category,
};
pub use handlers::{
    create_categories_endpoint, delete_category_endpoint, get_category_endpoint,
    list_categories_endpoint, update_category_endpoint,
};
pub use models::{Category, CategoryForm, CategoryId, CategoryPatch, CategoryQuery, CategoryResponse};
