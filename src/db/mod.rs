pub mod filter;
pub mod models;
pub mod repository;

pub use filter::{ExpenseFilter, SortField, SortOrder};
pub use models::{Expense, ExpensePatch, NewExpense, User};
pub use repository::{Database, ExpenseRepository, UserRepository};
