use std::fs;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::usecase::ports::sheets::SheetsError;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file this client needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, SheetsError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            SheetsError::Credentials(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, SheetsError> {
        let key: ServiceAccountKey = serde_json::from_str(contents)
            .map_err(|err| SheetsError::Credentials(format!("invalid service account key: {err}")))?;
        if key.client_email.trim().is_empty() {
            return Err(SheetsError::Credentials("client_email is empty".to_string()));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Signs the RS256 assertion exchanged for an access token.
pub fn build_assertion(key: &ServiceAccountKey, scope: &str, now: i64) -> Result<String, SheetsError> {
    let claims = Claims {
        iss: &key.client_email,
        scope,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|err| SheetsError::Credentials(format!("invalid private key: {err}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|err| SheetsError::Credentials(format!("failed to sign assertion: {err}")))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS > now
    }
}

/// Fetches an access token on first use and reuses it until it nears expiry.
#[derive(Debug)]
pub struct TokenProvider {
    key: ServiceAccountKey,
    scope: String,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, scope: &str, http: Client) -> Self {
        Self {
            key,
            scope: scope.to_string(),
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| SheetsError::Auth("token cache lock poisoned".to_string()))?;
        let now = Utc::now().timestamp();
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token(now)?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn fetch_token(&self, now: i64) -> Result<CachedToken, SheetsError> {
        debug!(client_email = %self.key.client_email, "requesting access token");
        let assertion = build_assertion(&self.key, &self.scope, now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {description}", err.error),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(SheetsError::Auth(format!("{status}: {message}")));
        }

        parse_token_response(&body, now)
    }
}

fn parse_token_response(body: &str, now: i64) -> Result<CachedToken, SheetsError> {
    let token: TokenResponse = serde_json::from_str(body)?;
    Ok(CachedToken {
        value: token.access_token,
        expires_at: now + token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_file_without_token_uri_uses_google_default() {
        let key = ServiceAccountKey::from_json(
            r#"{"type":"service_account","client_email":"bot@project.iam.gserviceaccount.com","private_key":"pem"}"#,
        )
        .expect("key should parse");

        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(key.client_email, "bot@project.iam.gserviceaccount.com");
    }

    #[test]
    fn key_file_missing_private_key_is_credentials_error() {
        let err = ServiceAccountKey::from_json(r#"{"client_email":"bot@example.com"}"#)
            .expect_err("missing private_key should fail");

        assert!(matches!(err, SheetsError::Credentials(_)));
    }

    #[test]
    fn garbage_private_key_fails_to_sign() {
        let key = ServiceAccountKey {
            client_email: "bot@example.com".to_string(),
            private_key: "not a pem".to_string(),
            token_uri: default_token_uri(),
        };

        let err = build_assertion(&key, SPREADSHEETS_SCOPE, 0).expect_err("signing should fail");

        assert!(matches!(err, SheetsError::Credentials(_)));
    }

    #[test]
    fn token_response_sets_expiry_from_expires_in() {
        let token = parse_token_response(r#"{"access_token":"ya29.x","expires_in":3599,"token_type":"Bearer"}"#, 100)
            .expect("token should parse");

        assert_eq!(token.value, "ya29.x");
        assert_eq!(token.expires_at, 3699);
    }

    #[test]
    fn token_response_without_expires_in_uses_assertion_lifetime() {
        let token = parse_token_response(r#"{"access_token":"ya29.y"}"#, 1_000)
            .expect("token should parse");

        assert_eq!(token.expires_at, 1_000 + ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn token_is_stale_inside_expiry_margin() {
        let token = CachedToken {
            value: "ya29.z".to_string(),
            expires_at: 1_000,
        };

        assert!(token.is_fresh(1_000 - EXPIRY_MARGIN_SECS - 1));
        assert!(!token.is_fresh(1_000 - EXPIRY_MARGIN_SECS));
        assert!(!token.is_fresh(1_000));
    }

    fn provider_with_unsignable_key() -> TokenProvider {
        let key = ServiceAccountKey {
            client_email: "bot@example.com".to_string(),
            private_key: "not a pem".to_string(),
            token_uri: "http://127.0.0.1:9/token".to_string(),
        };
        TokenProvider::new(key, SPREADSHEETS_SCOPE, Client::new())
    }

    #[test]
    fn fresh_cached_token_is_reused_without_fetching() {
        let provider = provider_with_unsignable_key();
        *provider.cached.lock().expect("cache lock") = Some(CachedToken {
            value: "ya29.cached".to_string(),
            expires_at: Utc::now().timestamp() + 3_600,
        });

        let token = provider.access_token().expect("cached token should be returned");

        assert_eq!(token, "ya29.cached");
    }

    #[test]
    fn token_near_expiry_is_fetched_again() {
        let provider = provider_with_unsignable_key();
        *provider.cached.lock().expect("cache lock") = Some(CachedToken {
            value: "ya29.old".to_string(),
            expires_at: Utc::now().timestamp() + EXPIRY_MARGIN_SECS / 2,
        });

        // the refetch fails while signing, before any request goes out
        let err = provider.access_token().expect_err("stale token should trigger a fetch");

        assert!(matches!(err, SheetsError::Credentials(_)));
    }
}
