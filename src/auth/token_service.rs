use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::env;

use crate::{Error, Result};

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub website_url: String,
    pub token_duration_min: i64,
    pub jwt_algorithm: Algorithm,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            env::var("JWT_SECRET")?,
            env::var("WEBSITE_URL")?,
            env::var("TOKEN_DURATION_MIN")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        ))
    }

    pub fn new(jwt_secret: String, website_url: String, token_duration_min: i64) -> Self {
        Self {
            jwt_secret,
            website_url,
            token_duration_min,
            jwt_algorithm: Algorithm::HS256,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user key
    pub exp: usize,
    pub iat: usize,
    pub nbf: usize,
    pub iss: String,
    pub aud: String,
    pub jti: String,
}

/// Session tokens are minted by the account service; the ledger only verifies them.
pub struct TokenService;

impl TokenService {
    pub fn validate_token(token: &str, config: &AuthConfig) -> Result<Claims> {
        let mut validation = Validation::new(config.jwt_algorithm);
        validation.set_audience(&[config.website_url.to_string()]);
        validation.set_issuer(&[config.website_url.to_string()]);

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("token rejected: {}", e);
            Error::AuthFailInvalidToken
        })?;
        Ok(decoded.claims)
    }
}

/// Token minting lives with the account service; tests mint their own.
#[cfg(test)]
impl Claims {
    pub fn new(sub: String, config: &AuthConfig) -> Self {
        use chrono::{Duration, Utc};

        let iat = Utc::now();
        let exp = iat + Duration::minutes(config.token_duration_min);

        Self {
            sub,
            exp: exp.timestamp() as usize,
            iat: iat.timestamp() as usize,
            nbf: iat.timestamp() as usize,
            iss: config.website_url.to_string(),
            aud: config.website_url.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[cfg(test)]
impl TokenService {
    pub fn create_token(sub: String, config: &AuthConfig) -> Result<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims::new(sub, config);
        let token = encode(
            &Header::new(config.jwt_algorithm),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }
}
