use std::time::Duration;

use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    db::repository::Database,
    error::{ApiError, Result},
    password,
    token::{self, TokenService},
};

/// Lifetime of tokens handed out by the login endpoint.
const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[post("/register")]
pub async fn register(
    req: web::Json<RegisterRequest>,
    db: web::Data<Database>,
) -> Result<HttpResponse> {
    log::info!("Registration attempt for user: {}", req.username);

    if db.users().find_by_username(&req.username).await?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    let password_hash = password::hash(&req.password)?;
    let user = db.users().insert(&req.username, &password_hash).await?;

    log::info!("Registered user: {}", user.username);
    Ok(HttpResponse::Created().json(user))
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[post("/token")]
pub async fn issue_token(
    form: web::Form<TokenRequest>,
    db: web::Data<Database>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse> {
    let user = db
        .users()
        .find_by_username(&form.username)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify(&form.password, &user.password_hash) {
        log::warn!("Failed login attempt for user: {}", form.username);
        return Err(ApiError::InvalidCredentials);
    }

    let access_token = tokens
        .issue_access_token(&user.username, Some(ACCESS_TOKEN_TTL), token::now_secs())
        .map_err(|err| ApiError::Internal(format!("Failed to issue access token: {err}")))?;

    log::info!("Issued access token for user: {}", user.username);

    let response = TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    };

    Ok(HttpResponse::Ok().json(response))
}
