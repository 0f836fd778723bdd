//! OAuth2 access tokens for a Google service account (JWT bearer grant).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| SheetsError::ServiceAccount {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json(&raw).with_context(|| format!("parse service account key {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid service account json")
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Signed RS256 assertion for the token endpoint.
pub fn signed_assertion(key: &ServiceAccountKey, scope: &str, issued_at: i64) -> Result<String> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope,
        aud: key.token_uri(),
        iat: issued_at,
        exp: issued_at + ASSERTION_TTL_SECS,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .context("service account private_key is not a valid RSA PEM")?;
    jsonwebtoken::encode(&header, &claims, &encoding_key).context("sign token assertion")
}

/// Exchange the service account key for a bearer token with `scope`.
pub fn fetch_access_token(client: &Client, key: &ServiceAccountKey, scope: &str) -> Result<String> {
    let assertion = signed_assertion(key, scope, Utc::now().timestamp())?;
    let resp = client
        .post(key.token_uri())
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .context("token request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading token response")?;
    if !status.is_success() {
        return Err(SheetsError::Token {
            message: format!("http {status}: {body}"),
        }
        .into());
    }
    let token: TokenResponse = serde_json::from_str(&body).context("invalid token response")?;
    Ok(token.access_token)
}
