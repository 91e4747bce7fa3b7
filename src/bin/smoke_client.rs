use std::time::Duration;

use anyhow::{bail, Context};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone)]
struct SmokeConfig {
    base_url: String,
    username: String,
    password: String,
    timeout_ms: u64,
}

impl SmokeConfig {
    fn from_env() -> Self {
        Self {
            base_url: std::env::var("SMOKE_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            username: std::env::var("SMOKE_USERNAME").unwrap_or_else(|_| "smoke".to_string()),
            password: std::env::var("SMOKE_PASSWORD")
                .unwrap_or_else(|_| "smoke-password".to_string()),
            timeout_ms: std::env::var("SMOKE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
}

#[derive(Debug, Deserialize)]
struct ExpenseResponse {
    id: i64,
    expense_name: String,
    status: String,
    expense_amount: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = SmokeConfig::from_env();

    println!("[smoke] base URL: {}", cfg.base_url);
    println!("[smoke] username: {}", cfg.username);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .build()
        .context("failed to build HTTP client")?;

    check_health(&cfg, &client).await?;
    register(&cfg, &client).await?;
    let token = login(&cfg, &client).await?;
    let expense_id = create_expense(&cfg, &client).await?;
    list_expenses(&cfg, &client, &token).await?;
    reject_unauthenticated_list(&cfg, &client).await?;
    search_expenses(&cfg, &client).await?;
    patch_expense(&cfg, &client, expense_id).await?;
    delete_expense(&cfg, &client, expense_id).await?;

    println!("[smoke] all checks passed");
    Ok(())
}

async fn check_health(cfg: &SmokeConfig, client: &reqwest::Client) -> anyhow::Result<()> {
    let url = cfg.url("/health");
    println!("[smoke] GET {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .context("network failure calling /health")?;

    if response.status() != StatusCode::OK {
        bail!("/health returned {}", response.status());
    }

    println!("[smoke] server is healthy");
    Ok(())
}

async fn register(cfg: &SmokeConfig, client: &reqwest::Client) -> anyhow::Result<()> {
    let url = cfg.url("/register");
    println!("[smoke] POST {}", url);

    let response = client
        .post(url)
        .json(&json!({ "username": cfg.username, "password": cfg.password }))
        .send()
        .await
        .context("network failure calling /register")?;

    match response.status() {
        StatusCode::CREATED => println!("[smoke] registered user {}", cfg.username),
        // Re-running the smoke test against the same database is fine.
        StatusCode::BAD_REQUEST => println!("[smoke] user {} already exists", cfg.username),
        status => {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            bail!("/register failed with {}: {}", status, body);
        }
    }

    Ok(())
}

async fn login(cfg: &SmokeConfig, client: &reqwest::Client) -> anyhow::Result<String> {
    let url = cfg.url("/token");
    println!("[smoke] POST {}", url);

    let response = client
        .post(url)
        .form(&[("username", cfg.username.as_str()), ("password", cfg.password.as_str())])
        .send()
        .await
        .context("network failure calling /token")?;

    if response.status() != StatusCode::OK {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        bail!("/token failed with {}: {}", status, body);
    }

    let token: TokenResponse = response
        .json()
        .await
        .context("failed to decode /token response")?;

    if token.token_type != "bearer" {
        bail!("unexpected token_type: {}", token.token_type);
    }

    println!("[smoke] obtained access token");
    Ok(token.access_token)
}

async fn create_expense(cfg: &SmokeConfig, client: &reqwest::Client) -> anyhow::Result<i64> {
    let url = cfg.url("/expenses");
    println!("[smoke] POST {}", url);

    let response = client
        .post(url)
        .json(&json!({
            "expense_name": "Smoke test expense",
            "expense_date": "2024-05-01",
            "expense_amount": "42.50"
        }))
        .send()
        .await
        .context("network failure calling POST /expenses")?;

    if response.status() != StatusCode::CREATED {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        bail!("POST /expenses failed with {}: {}", status, body);
    }

    let expense: ExpenseResponse = response
        .json()
        .await
        .context("failed to decode created expense")?;

    if expense.expense_amount != "42.50" {
        bail!("amount did not round-trip: {}", expense.expense_amount);
    }

    println!(
        "[smoke] created expense {} ({}, status={})",
        expense.id, expense.expense_name, expense.status
    );
    Ok(expense.id)
}

async fn list_expenses(
    cfg: &SmokeConfig,
    client: &reqwest::Client,
    token: &str,
) -> anyhow::Result<()> {
    let url = cfg.url("/expenses");
    println!("[smoke] GET {} (authorized)", url);

    let response = client
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .context("network failure calling GET /expenses")?;

    if response.status() != StatusCode::OK {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        bail!("GET /expenses failed with {}: {}", status, body);
    }

    let expenses: Vec<ExpenseResponse> = response
        .json()
        .await
        .context("failed to decode expense list")?;

    println!("[smoke] listed {} expenses", expenses.len());
    Ok(())
}

async fn reject_unauthenticated_list(
    cfg: &SmokeConfig,
    client: &reqwest::Client,
) -> anyhow::Result<()> {
    let url = cfg.url("/expenses");
    println!("[smoke] GET {} (no token)", url);

    let response = client
        .get(url)
        .send()
        .await
        .context("network failure calling GET /expenses")?;

    if response.status() != StatusCode::UNAUTHORIZED {
        bail!(
            "expected 401 for unauthenticated list, got {}",
            response.status()
        );
    }

    let challenge = response
        .headers()
        .get("WWW-Authenticate")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if challenge != "Bearer" {
        bail!("missing Bearer challenge, got '{}'", challenge);
    }

    println!("[smoke] unauthenticated list correctly rejected");
    Ok(())
}

async fn search_expenses(cfg: &SmokeConfig, client: &reqwest::Client) -> anyhow::Result<()> {
    let url = cfg.url("/expenses/search?expense_name=smoke&sort_by=expense_amount&sort_order=desc");
    println!("[smoke] GET {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .context("network failure calling /expenses/search")?;

    if response.status() != StatusCode::OK {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        bail!("/expenses/search failed with {}: {}", status, body);
    }

    let matches: Vec<ExpenseResponse> = response
        .json()
        .await
        .context("failed to decode search results")?;

    if matches.is_empty() {
        bail!("search found no expenses matching 'smoke'");
    }

    println!("[smoke] search matched {} expenses", matches.len());
    Ok(())
}

async fn patch_expense(
    cfg: &SmokeConfig,
    client: &reqwest::Client,
    id: i64,
) -> anyhow::Result<()> {
    let url = cfg.url(&format!("/expenses/{}", id));
    println!("[smoke] PATCH {}", url);

    let response = client
        .patch(url)
        .json(&json!({ "status": "paid" }))
        .send()
        .await
        .context("network failure calling PATCH /expenses/{id}")?;

    if response.status() != StatusCode::OK {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        bail!("PATCH /expenses/{} failed with {}: {}", id, status, body);
    }

    let expense: ExpenseResponse = response
        .json()
        .await
        .context("failed to decode patched expense")?;

    if expense.status != "paid" {
        bail!("patch did not apply, status is '{}'", expense.status);
    }

    println!("[smoke] patched expense {} to status=paid", id);
    Ok(())
}

async fn delete_expense(
    cfg: &SmokeConfig,
    client: &reqwest::Client,
    id: i64,
) -> anyhow::Result<()> {
    let url = cfg.url(&format!("/expenses/{}", id));
    println!("[smoke] DELETE {}", url);

    let response = client
        .delete(&url)
        .send()
        .await
        .context("network failure calling DELETE /expenses/{id}")?;

    if response.status() != StatusCode::OK {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        bail!("DELETE /expenses/{} failed with {}: {}", id, status, body);
    }

    // A second delete must report the row as gone.
    let response = client
        .delete(&url)
        .send()
        .await
        .context("network failure on repeat DELETE")?;

    if response.status() != StatusCode::NOT_FOUND {
        bail!(
            "expected 404 on repeat delete, got {}",
            response.status()
        );
    }

    println!("[smoke] deleted expense {}", id);
    Ok(())
}
