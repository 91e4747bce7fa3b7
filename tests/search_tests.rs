use actix_web::{test, web, App};
use sqlx::sqlite::SqlitePoolOptions;

use expense_api::db::models::NewExpense;
use expense_api::db::repository::Database;
use expense_api::handlers;

// One connection so every query sees the same in-memory database.
async fn test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    let db = Database::new(pool);
    db.init_schema().await.expect("Failed to initialize schema");
    db
}

async fn seed(
    db: &Database,
    name: &str,
    date: Option<&str>,
    deadline: Option<&str>,
    status: &str,
    in_budget: bool,
    amount: &str,
) {
    let new = NewExpense {
        expense_name: name.to_string(),
        expense_date: date.map(|d| d.parse().expect("valid date")),
        deadline_payment: deadline.map(|d| d.parse().expect("valid date")),
        status: status.to_string(),
        description: None,
        in_budget,
        expense_amount: amount.parse().expect("valid amount"),
    };

    db.expenses().insert(new).await.expect("Failed to seed expense");
}

// The recurring fixture: three expenses spread across the year.
async fn seed_year(db: &Database) {
    seed(db, "Street A", Some("2024-01-01"), None, "open", true, "10.00").await;
    seed(db, "Street B", Some("2024-06-01"), None, "open", true, "50.00").await;
    seed(db, "Street C", Some("2024-12-01"), None, "open", true, "100.00").await;
}

async fn search(db: &Database, query: &str) -> serde_json::Value {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.clone()))
            .service(handlers::search_expenses),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/expenses/search{query}"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200, "search failed for query '{query}'");
    test::read_body_json(resp).await
}

fn names(body: &serde_json::Value) -> Vec<&str> {
    body.as_array()
        .expect("array body")
        .iter()
        .map(|e| e["expense_name"].as_str().expect("name"))
        .collect()
}

#[actix_web::test]
async fn test_search_without_filters_returns_all() {
    let db = test_db().await;
    seed_year(&db).await;

    let body = search(&db, "").await;
    assert_eq!(names(&body), vec!["Street A", "Street B", "Street C"]);
}

#[actix_web::test]
async fn test_name_filter_is_case_insensitive_substring() {
    let db = test_db().await;
    seed(&db, "Rent payment", None, None, "open", true, "1200.00").await;
    seed(&db, "Groceries", None, None, "open", true, "80.00").await;
    seed(&db, "Internet", None, None, "open", true, "40.00").await;

    let body = search(&db, "?expense_name=RENT").await;
    assert_eq!(names(&body), vec!["Rent payment"]);

    let body = search(&db, "?expense_name=eri").await;
    assert_eq!(names(&body), vec!["Groceries"]);
}

#[actix_web::test]
async fn test_status_filter_is_case_insensitive_substring() {
    let db = test_db().await;
    seed(&db, "Water", None, None, "open", true, "30.00").await;
    seed(&db, "Power", None, None, "closed", true, "60.00").await;
    seed(&db, "Gas", None, None, "open", true, "45.00").await;

    let body = search(&db, "?status=OPEN").await;
    assert_eq!(names(&body), vec!["Water", "Gas"]);
}

#[actix_web::test]
async fn test_empty_text_filter_is_ignored() {
    let db = test_db().await;
    seed_year(&db).await;

    let body = search(&db, "?expense_name=").await;
    assert_eq!(names(&body).len(), 3);
}

#[actix_web::test]
async fn test_exact_date_filter() {
    let db = test_db().await;
    seed_year(&db).await;

    let body = search(&db, "?expense_date=2024-06-01").await;
    assert_eq!(names(&body), vec!["Street B"]);
}

#[actix_web::test]
async fn test_in_budget_false_is_a_real_filter() {
    let db = test_db().await;
    seed(&db, "Planned", None, None, "open", true, "20.00").await;
    seed(&db, "Surprise", None, None, "open", false, "300.00").await;

    let body = search(&db, "?in_budget=false").await;
    assert_eq!(names(&body), vec!["Surprise"]);

    let body = search(&db, "?in_budget=true").await;
    assert_eq!(names(&body), vec!["Planned"]);
}

#[actix_web::test]
async fn test_amount_range_is_inclusive_on_both_ends() {
    let db = test_db().await;
    seed_year(&db).await;

    let body = search(&db, "?start_amount=10.00&end_amount=50.00").await;
    assert_eq!(names(&body), vec!["Street A", "Street B"]);

    let body = search(&db, "?start_amount=20&end_amount=100").await;
    assert_eq!(names(&body), vec!["Street B", "Street C"]);
}

#[actix_web::test]
async fn test_amount_range_compares_numerically() {
    let db = test_db().await;
    // Lexicographic comparison would order these "100" < "50" < "9".
    seed(&db, "Nine", None, None, "open", true, "9.00").await;
    seed(&db, "Fifty", None, None, "open", true, "50.00").await;
    seed(&db, "Hundred", None, None, "open", true, "100.00").await;

    let body = search(&db, "?start_amount=50&end_amount=150").await;
    assert_eq!(names(&body), vec!["Fifty", "Hundred"]);

    let body = search(&db, "?start_amount=5&end_amount=20").await;
    assert_eq!(names(&body), vec!["Nine"]);
}

#[actix_web::test]
async fn test_lone_range_bound_is_ignored() {
    let db = test_db().await;
    seed_year(&db).await;

    // A bound that would exclude everything, but without its partner it
    // must not filter at all.
    let body = search(&db, "?start_amount=99999").await;
    assert_eq!(names(&body).len(), 3);

    let body = search(&db, "?end_date=1900-01-01").await;
    assert_eq!(names(&body).len(), 3);
}

#[actix_web::test]
async fn test_date_range_returns_inclusive_window() {
    let db = test_db().await;
    seed_year(&db).await;

    let body = search(&db, "?start_date=2024-01-01&end_date=2024-06-01").await;
    assert_eq!(names(&body), vec!["Street A", "Street B"]);
}

#[actix_web::test]
async fn test_deadline_range_requires_both_bounds() {
    let db = test_db().await;
    seed(&db, "Invoice A", None, Some("2024-02-15"), "open", true, "500.00").await;
    seed(&db, "Invoice B", None, Some("2024-07-15"), "open", true, "500.00").await;

    let body = search(&db, "?start_deadline=2024-01-01&end_deadline=2024-03-01").await;
    assert_eq!(names(&body), vec!["Invoice A"]);

    let body = search(&db, "?start_deadline=2024-01-01").await;
    assert_eq!(names(&body).len(), 2);
}

#[actix_web::test]
async fn test_filters_combine_with_and() {
    let db = test_db().await;
    seed(&db, "Internet", None, None, "open", true, "40.00").await;
    seed(&db, "Internet backup", None, None, "closed", true, "20.00").await;
    seed(&db, "Netflix", None, None, "open", true, "15.00").await;
    seed(&db, "Rent", None, None, "open", true, "1200.00").await;

    let body = search(&db, "?expense_name=net&status=open").await;
    assert_eq!(names(&body), vec!["Internet", "Netflix"]);
}

#[actix_web::test]
async fn test_sort_by_amount_descending() {
    let db = test_db().await;
    seed(&db, "Nine", None, None, "open", true, "9.00").await;
    seed(&db, "Hundred", None, None, "open", true, "100.00").await;
    seed(&db, "Fifty", None, None, "open", true, "50.00").await;

    let body = search(&db, "?sort_by=expense_amount&sort_order=desc").await;
    assert_eq!(names(&body), vec!["Hundred", "Fifty", "Nine"]);

    let body = search(&db, "?sort_by=expense_amount").await;
    assert_eq!(names(&body), vec!["Nine", "Fifty", "Hundred"]);
}

#[actix_web::test]
async fn test_unknown_sort_field_is_tolerated() {
    let db = test_db().await;
    seed_year(&db).await;

    let body = search(&db, "?sort_by=favourite_colour").await;
    assert_eq!(names(&body).len(), 3);
}

#[actix_web::test]
async fn test_sort_order_other_than_desc_is_ascending() {
    let db = test_db().await;
    seed(&db, "Hundred", None, None, "open", true, "100.00").await;
    seed(&db, "Nine", None, None, "open", true, "9.00").await;

    let body = search(&db, "?sort_by=expense_amount&sort_order=DESC").await;
    assert_eq!(names(&body), vec!["Nine", "Hundred"]);
}

#[actix_web::test]
async fn test_search_route_is_not_shadowed_by_id_route() {
    let db = test_db().await;
    seed_year(&db).await;

    // Routes registered in the same order as the server sets them up.
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.clone()))
            .service(handlers::search_expenses)
            .service(handlers::get_expense),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/expenses/search?expense_name=Street")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(names(&body).len(), 3);

    let req = test::TestRequest::get().uri("/expenses/1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}
