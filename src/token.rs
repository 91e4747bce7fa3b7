use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const MIN_SECRET_LEN: usize = 32;

/// Token lifetime applied when the caller does not request one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret is too short (min {MIN_SECRET_LEN} bytes)")]
    SecretTooShort,

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid access token format")]
    InvalidFormat,

    #[error("access token signature is invalid")]
    InvalidSignature,

    #[error("access token is expired")]
    Expired,

    #[error("access token subject is missing")]
    MissingSubject,

    #[error("failed to decode access token payload")]
    PayloadDecode,

    #[error("failed to parse access token payload")]
    PayloadParse,
}

/// Symmetric signing algorithms the token service understands. The
/// identifier comes from configuration, so unknown names fail at startup
/// rather than at the first login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Hs256,
}

impl FromStr for SigningAlgorithm {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(SigningAlgorithm::Hs256),
            _ => Err(TokenError::UnsupportedAlgorithm(raw.to_string())),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningAlgorithm::Hs256 => write!(f, "HS256"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the username the token was issued for.
    pub sub: String,
    /// Expiry as unix seconds.
    pub exp: u64,
}

impl Claims {
    pub fn new(sub: String, exp: u64) -> Self {
        Self { sub, exp }
    }

    pub fn is_expired(&self, reference_secs: u64) -> bool {
        reference_secs >= self.exp
    }
}

/// Mints and validates self-contained bearer tokens. No server-side state
/// is kept: any instance holding the secret can validate any token.
#[derive(Clone)]
pub struct TokenService {
    secret: Arc<[u8]>,
    algorithm: SigningAlgorithm,
}

impl TokenService {
    pub fn new(secret: Vec<u8>, algorithm: SigningAlgorithm) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::SecretTooShort);
        }

        Ok(Self {
            secret: Arc::<[u8]>::from(secret),
            algorithm,
        })
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Issue a token for `subject` expiring `ttl` after `issued_at_secs`.
    /// Two tokens for the same subject issued at different times carry
    /// different expiries and are therefore distinct strings.
    pub fn issue_access_token(
        &self,
        subject: &str,
        ttl: Option<Duration>,
        issued_at_secs: u64,
    ) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or(DEFAULT_TTL);
        let exp = issued_at_secs.saturating_add(ttl.as_secs());
        let claims = Claims::new(subject.to_string(), exp);
        self.issue(&claims)
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims).map_err(|_| TokenError::PayloadParse)?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
        let signature = self.sign(payload_b64.as_bytes())?;
        let signature_b64 = URL_SAFE_NO_PAD.encode(signature);
        Ok(format!("{payload_b64}.{signature_b64}"))
    }

    pub fn verify(&self, token: &str, reference_secs: u64) -> Result<Claims, TokenError> {
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(TokenError::InvalidFormat)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::InvalidFormat)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::PayloadDecode)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::PayloadParse)?;

        if claims.sub.is_empty() {
            return Err(TokenError::MissingSubject);
        }
        if claims.is_expired(reference_secs) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, TokenError> {
        match self.algorithm {
            SigningAlgorithm::Hs256 => {
                let mut mac = HmacSha256::new_from_slice(&self.secret)
                    .map_err(|_| TokenError::InvalidSignature)?;
                mac.update(bytes);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
