//! Service-account access tokens (OAuth2 JWT bearer grant).
//!
//! A signed assertion is exchanged at the account's `token_uri` for a
//! short-lived bearer token, which is reused until shortly before it expires.

use crate::config::Credentials;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Renew this long before the server-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: String,
}

pub(crate) struct ServiceAccountAuth {
    client_email: String,
    key: EncodingKey,
    key_id: Option<String>,
    token_uri: String,
    cached: Mutex<Option<(String, Instant)>>,
}

impl ServiceAccountAuth {
    /// `None` when the credentials carry no service-account key.
    pub fn from_credentials(creds: &Credentials) -> Result<Option<Self>, String> {
        let (Some(email), Some(pem)) = (&creds.client_email, &creds.private_key) else {
            return Ok(None);
        };
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| format!("service-account private_key is not a usable RSA key: {e}"))?;
        Ok(Some(Self {
            client_email: email.clone(),
            key,
            key_id: creds.private_key_id.clone(),
            token_uri: creds
                .token_uri
                .clone()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            cached: Mutex::new(None),
        }))
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    fn assertion(&self) -> Result<String, String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            iss: self.client_email.clone(),
            scope: DATASTORE_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();
        jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| format!("cannot sign token request: {e}"))
    }

    /// A valid bearer token, exchanging a fresh assertion when needed.
    pub fn token(&self, http: &Client) -> Result<String, String> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((token, expires)) = cached.as_ref() {
            if Instant::now() + EXPIRY_MARGIN < *expires {
                return Ok(token.clone());
            }
        }

        let assertion = self.assertion()?;
        let resp = http
            .post(&self.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .map_err(|e| format!("token request failed: {e}"))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| format!("reading token response: {e}"))?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<TokenError>(&body) {
                Ok(err) if err.error_description.is_empty() => err.error,
                Ok(err) => format!("{}: {}", err.error, err.error_description),
                Err(_) => body.trim().to_string(),
            };
            return Err(format!("token request rejected (HTTP {status}): {reason}"));
        }

        let granted: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| format!("malformed token response: {e}"))?;
        tracing::debug!(
            account = %self.client_email,
            expires_in = granted.expires_in,
            "service-account token issued"
        );
        let expires = Instant::now() + Duration::from_secs(granted.expires_in);
        *cached = Some((granted.access_token.clone(), expires));
        Ok(granted.access_token)
    }
}
