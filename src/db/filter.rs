use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

/// Columns the search endpoint accepts in `sort_by`. Anything outside this
/// set leaves the result unordered rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    ExpenseName,
    ExpenseDate,
    DeadlinePayment,
    Status,
    InBudget,
    ExpenseAmount,
}

impl SortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "expense_name" => Some(Self::ExpenseName),
            "expense_date" => Some(Self::ExpenseDate),
            "deadline_payment" => Some(Self::DeadlinePayment),
            "status" => Some(Self::Status),
            "in_budget" => Some(Self::InBudget),
            "expense_amount" => Some(Self::ExpenseAmount),
            _ => None,
        }
    }

    /// Expression the ORDER BY clause sorts on. Amounts are stored as text,
    /// so they order through a numeric cast instead of lexicographically.
    pub fn order_expr(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::ExpenseName => "expense_name",
            Self::ExpenseDate => "expense_date",
            Self::DeadlinePayment => "deadline_payment",
            Self::Status => "status",
            Self::InBudget => "in_budget",
            Self::ExpenseAmount => "CAST(expense_amount AS REAL)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only the literal `desc` flips the direction; any other value keeps
    /// the ascending default.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Search parameters, deserialised straight from the query string.
/// Every field is optional; absent fields add no predicate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilter {
    pub expense_name: Option<String>,
    pub expense_date: Option<NaiveDate>,
    pub deadline_payment: Option<NaiveDate>,
    pub status: Option<String>,
    pub in_budget: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_amount: Option<Decimal>,
    pub end_amount: Option<Decimal>,
    pub start_deadline: Option<NaiveDate>,
    pub end_deadline: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ExpenseFilter {
    /// Appends the WHERE and ORDER BY clauses for this filter. Active
    /// predicates always combine with AND; range filters only take effect
    /// when both of their bounds are present.
    pub fn apply(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1=1");

        if let Some(name) = non_empty(&self.expense_name) {
            qb.push(" AND LOWER(expense_name) LIKE '%' || LOWER(");
            qb.push_bind(name.to_string());
            qb.push(") || '%'");
        }

        if let Some(date) = self.expense_date {
            qb.push(" AND expense_date = ");
            qb.push_bind(date);
        }

        if let Some(deadline) = self.deadline_payment {
            qb.push(" AND deadline_payment = ");
            qb.push_bind(deadline);
        }

        if let Some(status) = non_empty(&self.status) {
            qb.push(" AND LOWER(status) LIKE '%' || LOWER(");
            qb.push_bind(status.to_string());
            qb.push(") || '%'");
        }

        if let Some(in_budget) = self.in_budget {
            qb.push(" AND in_budget = ");
            qb.push_bind(in_budget);
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            qb.push(" AND expense_date >= ");
            qb.push_bind(start);
            qb.push(" AND expense_date <= ");
            qb.push_bind(end);
        }

        if let (Some(start), Some(end)) = (self.start_deadline, self.end_deadline) {
            qb.push(" AND deadline_payment >= ");
            qb.push_bind(start);
            qb.push(" AND deadline_payment <= ");
            qb.push_bind(end);
        }

        if let (Some(start), Some(end)) = (self.start_amount, self.end_amount) {
            qb.push(" AND CAST(expense_amount AS REAL) >= CAST(");
            qb.push_bind(start.to_string());
            qb.push(" AS REAL) AND CAST(expense_amount AS REAL) <= CAST(");
            qb.push_bind(end.to_string());
            qb.push(" AS REAL)");
        }

        if let Some(field) = self.sort_by.as_deref().and_then(SortField::parse) {
            qb.push(" ORDER BY ");
            qb.push(field.order_expr());
            qb.push(" ");
            qb.push(SortOrder::parse(self.sort_order.as_deref()).keyword());
        }
    }
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().filter(|value| !value.is_empty())
}
