use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A single expense record. Amounts are decimals stored as canonical
/// strings; they never pass through floating point on the Rust side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub expense_name: String,
    pub expense_date: Option<NaiveDate>,
    pub deadline_payment: Option<NaiveDate>,
    pub status: String,
    pub description: Option<String>,
    pub in_budget: bool,
    pub expense_amount: Decimal,
}

impl<'r> FromRow<'r, SqliteRow> for Expense {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_amount: String = row.try_get("expense_amount")?;
        let expense_amount = raw_amount
            .parse::<Decimal>()
            .map_err(|err| sqlx::Error::ColumnDecode {
                index: "expense_amount".to_string(),
                source: Box::new(err),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            expense_name: row.try_get("expense_name")?,
            expense_date: row.try_get("expense_date")?,
            deadline_payment: row.try_get("deadline_payment")?,
            status: row.try_get("status")?,
            description: row.try_get("description")?,
            in_budget: row.try_get("in_budget")?,
            expense_amount,
        })
    }
}

fn default_status() -> String {
    "open".to_string()
}

fn default_in_budget() -> bool {
    true
}

/// Creation payload. Name and amount are required; the rest fall back to
/// the record defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub expense_name: String,
    #[serde(default)]
    pub expense_date: Option<NaiveDate>,
    #[serde(default)]
    pub deadline_payment: Option<NaiveDate>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_in_budget")]
    pub in_budget: bool,
    pub expense_amount: Decimal,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Field-level patch: only keys present in the request are applied.
/// Nullable columns are doubly optional so that an absent key, an explicit
/// `null`, and a new value stay distinguishable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePatch {
    pub expense_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub expense_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline_payment: Option<Option<NaiveDate>>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub in_budget: Option<bool>,
    pub expense_amount: Option<Decimal>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.expense_name.is_none()
            && self.expense_date.is_none()
            && self.deadline_payment.is_none()
            && self.status.is_none()
            && self.description.is_none()
            && self.in_budget.is_none()
            && self.expense_amount.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serialisation_hides_password_hash() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            password_hash: "$2b$12$secret".to_string(),
        };

        let value = serde_json::to_value(&user).expect("serialise user");
        assert_eq!(value["username"], "alice");
        assert!(value.get("password_hash").is_none());
    }

    #[test]
    fn new_expense_applies_defaults() {
        let new: NewExpense =
            serde_json::from_str(r#"{"expense_name": "Badger feed", "expense_amount": "19.99"}"#)
                .expect("minimal payload");

        assert_eq!(new.expense_name, "Badger feed");
        assert_eq!(new.status, "open");
        assert!(new.in_budget);
        assert!(new.expense_date.is_none());
        assert!(new.description.is_none());
        assert_eq!(new.expense_amount.to_string(), "19.99");
    }

    #[test]
    fn new_expense_requires_amount() {
        let result = serde_json::from_str::<NewExpense>(r#"{"expense_name": "Badger feed"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn patch_distinguishes_absent_null_and_value() {
        let patch: ExpensePatch = serde_json::from_str(
            r#"{"status": "closed", "expense_date": null, "deadline_payment": "2024-06-01"}"#,
        )
        .expect("patch payload");

        assert_eq!(patch.status.as_deref(), Some("closed"));
        assert_eq!(patch.expense_date, Some(None));
        assert_eq!(
            patch.deadline_payment,
            Some(Some(NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")))
        );
        assert!(patch.expense_name.is_none());
        assert!(patch.description.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn empty_patch_reports_empty() {
        let patch: ExpensePatch = serde_json::from_str("{}").expect("empty payload");
        assert!(patch.is_empty());
    }
}
