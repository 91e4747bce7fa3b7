use actix_web::dev::Payload;
use actix_web::{http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::db::models::User;
use crate::db::repository::Database;
use crate::error::{ApiError, Result};
use crate::token::{self, TokenService};

/// The user behind a valid bearer token. Declaring this extractor on a
/// handler is what places the route behind the auth gate.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

/// Verifies a bearer token and resolves its subject to a stored user.
/// Every verification failure collapses into the same 401 so callers
/// cannot probe which check rejected them; storage failures keep their
/// own status.
pub async fn authenticate(tokens: &TokenService, db: &Database, token: &str) -> Result<User> {
    let claims = tokens
        .verify(token, token::now_secs())
        .map_err(|_| ApiError::InvalidCredentials)?;

    db.users()
        .find_by_username(&claims.sub)
        .await?
        .ok_or(ApiError::InvalidCredentials)
}

fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);
        let tokens = req.app_data::<web::Data<TokenService>>().cloned();
        let db = req.app_data::<web::Data<Database>>().cloned();

        Box::pin(async move {
            let token = token.ok_or(ApiError::InvalidCredentials)?;
            let (tokens, db) = tokens
                .zip(db)
                .ok_or_else(|| ApiError::Internal("auth state missing from app data".to_string()))?;

            let user = authenticate(&tokens, &db, &token).await?;
            Ok(AuthenticatedUser(user))
        })
    }
}
