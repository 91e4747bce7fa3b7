pub mod auth;
pub mod expenses;
pub mod health;

pub use auth::{issue_token, register};
pub use expenses::{
    create_expense, delete_expense, get_expense, list_expenses, search_expenses, update_expense,
};
pub use health::health_check;
