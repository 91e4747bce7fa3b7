use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;

use super::filter::ExpenseFilter;
use super::models::{Expense, ExpensePatch, NewExpense, User};
use crate::error::Result;

const SELECT_EXPENSE: &str = "SELECT id, expense_name, expense_date, deadline_payment, status, \
     description, in_budget, expense_amount FROM expenses";

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (\
     id INTEGER PRIMARY KEY AUTOINCREMENT, \
     username TEXT NOT NULL UNIQUE, \
     password_hash TEXT NOT NULL)";

const CREATE_EXPENSES: &str = "CREATE TABLE IF NOT EXISTS expenses (\
     id INTEGER PRIMARY KEY AUTOINCREMENT, \
     expense_name TEXT NOT NULL, \
     expense_date TEXT, \
     deadline_payment TEXT, \
     status TEXT NOT NULL DEFAULT 'open', \
     description TEXT, \
     in_budget INTEGER NOT NULL DEFAULT 1, \
     expense_amount TEXT NOT NULL)";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_USERS).execute(&self.pool).await?;
        sqlx::query(CREATE_EXPENSES).execute(&self.pool).await?;

        log::info!("Database schema ready");
        Ok(())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository {
            pool: self.pool.clone(),
        }
    }

    pub fn expenses(&self) -> ExpenseRepository {
        ExpenseRepository {
            pool: self.pool.clone(),
        }
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn insert(&self, username: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        })
    }
}

#[derive(Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub async fn insert(&self, new: NewExpense) -> Result<Expense> {
        let result = sqlx::query(
            "INSERT INTO expenses (expense_name, expense_date, deadline_payment, status, \
             description, in_budget, expense_amount) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.expense_name)
        .bind(new.expense_date)
        .bind(new.deadline_payment)
        .bind(&new.status)
        .bind(&new.description)
        .bind(new.in_budget)
        .bind(new.expense_amount.to_string())
        .execute(&self.pool)
        .await?;

        Ok(Expense {
            id: result.last_insert_rowid(),
            expense_name: new.expense_name,
            expense_date: new.expense_date,
            deadline_payment: new.deadline_payment,
            status: new.status,
            description: new.description,
            in_budget: new.in_budget,
            expense_amount: new.expense_amount,
        })
    }

    pub async fn list(&self) -> Result<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!("{SELECT_EXPENSE} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(expenses)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(&format!("{SELECT_EXPENSE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(expense)
    }

    /// Applies the fields present in the patch and returns the updated row,
    /// or `None` when no row has that id. An empty patch just re-reads.
    pub async fn update(&self, id: i64, patch: ExpensePatch) -> Result<Option<Expense>> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut qb = QueryBuilder::new("UPDATE expenses SET ");
        let mut fields = qb.separated(", ");

        if let Some(name) = patch.expense_name {
            fields.push("expense_name = ");
            fields.push_bind_unseparated(name);
        }
        if let Some(date) = patch.expense_date {
            fields.push("expense_date = ");
            fields.push_bind_unseparated(date);
        }
        if let Some(deadline) = patch.deadline_payment {
            fields.push("deadline_payment = ");
            fields.push_bind_unseparated(deadline);
        }
        if let Some(status) = patch.status {
            fields.push("status = ");
            fields.push_bind_unseparated(status);
        }
        if let Some(description) = patch.description {
            fields.push("description = ");
            fields.push_bind_unseparated(description);
        }
        if let Some(in_budget) = patch.in_budget {
            fields.push("in_budget = ");
            fields.push_bind_unseparated(in_budget);
        }
        if let Some(amount) = patch.expense_amount {
            fields.push("expense_amount = ");
            fields.push_bind_unseparated(amount.to_string());
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn search(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut qb = QueryBuilder::new(SELECT_EXPENSE);
        filter.apply(&mut qb);

        let expenses = qb
            .build_query_as::<Expense>()
            .fetch_all(&self.pool)
            .await?;
        Ok(expenses)
    }
}
