//! Goals are amounts an envelope should reach by a month, e.g. saving for a holiday.

mod db;
mod handlers;
mod models;

pub use db::{create_goal, create_goal_table, delete_goal, get_goal, list_goals, update_goal};
pub use handlers::{
    create_goals_endpoint, delete_goal_endpoint, get_goal_endpoint, list_goals_endpoint,
    update_goal_endpoint,
};
pub use models::{Goal, GoalForm, GoalId, GoalPatch, GoalQuery, GoalResponse};
