use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Serialize;

use crate::{
    db::filter::ExpenseFilter,
    db::models::{ExpensePatch, NewExpense},
    db::repository::Database,
    error::{ApiError, Result},
    middleware::AuthenticatedUser,
};

#[post("/expenses")]
pub async fn create_expense(
    req: web::Json<NewExpense>,
    db: web::Data<Database>,
) -> Result<HttpResponse> {
    let expense = db.expenses().insert(req.into_inner()).await?;

    log::info!("Created expense {} ({})", expense.id, expense.expense_name);
    Ok(HttpResponse::Created().json(expense))
}

#[get("/expenses")]
pub async fn list_expenses(
    user: AuthenticatedUser,
    db: web::Data<Database>,
) -> Result<HttpResponse> {
    let expenses = db.expenses().list().await?;

    log::debug!(
        "Listed {} expenses for user: {}",
        expenses.len(),
        user.0.username
    );
    Ok(HttpResponse::Ok().json(expenses))
}

#[get("/expenses/search")]
pub async fn search_expenses(
    query: web::Query<ExpenseFilter>,
    db: web::Data<Database>,
) -> Result<HttpResponse> {
    let expenses = db.expenses().search(&query).await?;
    Ok(HttpResponse::Ok().json(expenses))
}

#[get("/expenses/{id}")]
pub async fn get_expense(path: web::Path<i64>, db: web::Data<Database>) -> Result<HttpResponse> {
    let expense = db
        .expenses()
        .find_by_id(path.into_inner())
        .await?
        .ok_or(ApiError::ExpenseNotFound)?;

    Ok(HttpResponse::Ok().json(expense))
}

#[patch("/expenses/{id}")]
pub async fn update_expense(
    path: web::Path<i64>,
    req: web::Json<ExpensePatch>,
    db: web::Data<Database>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let expense = db
        .expenses()
        .update(id, req.into_inner())
        .await?
        .ok_or(ApiError::ExpenseNotFound)?;

    log::info!("Updated expense {id}");
    Ok(HttpResponse::Ok().json(expense))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[delete("/expenses/{id}")]
pub async fn delete_expense(path: web::Path<i64>, db: web::Data<Database>) -> Result<HttpResponse> {
    let id = path.into_inner();
    if !db.expenses().delete(id).await? {
        return Err(ApiError::ExpenseNotFound);
    }

    log::info!("Deleted expense {id}");

    let response = DeleteResponse {
        success: true,
        message: "Expense deleted".to_string(),
    };

    Ok(HttpResponse::Ok().json(response))
}
