use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::credentials::Credentials;

/// Read-only access to the remote drive
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Lifetime requested for the signed assertion
const ASSERTION_MINUTES: i64 = 60;

/// Refresh the access token this long before it actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,   // Service-account email
    scope: String, // Requested scopes
    aud: String,   // Token endpoint
    exp: i64,      // Expiration time
    iat: i64,      // Issued at
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: chrono::DateTime<Utc>,
}

/// Sign a service-account assertion (RS256)
pub fn create_assertion(credentials: &Credentials) -> anyhow::Result<String> {
    let now = Utc::now();
    let exp = now + Duration::minutes(ASSERTION_MINUTES);

    let claims = Claims {
        iss: credentials.client_email.clone(),
        scope: DRIVE_READONLY_SCOPE.to_string(),
        aud: credentials.token_uri.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &credentials.signing_key,
    )?;

    Ok(token)
}

/// Exchanges signed assertions for bearer tokens and reuses them until
/// shortly before expiry. Nothing is fetched until the first request.
pub struct TokenSource {
    credentials: Credentials,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(credentials: Credentials, http: reqwest::Client) -> Self {
        Self {
            credentials,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Get a valid access token, exchanging a fresh assertion if needed
    pub async fn access_token(&self) -> anyhow::Result<String> {
        // Held across the exchange so concurrent callers share one refresh
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let assertion = create_assertion(&self.credentials)?;
        let resp = self
            .http
            .post(&self.credentials.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Token exchange failed ({}): {}", status, body);
        }

        let token: TokenResponse = resp.json().await?;
        tracing::debug!(expires_in = token.expires_in, "obtained access token");

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });
        Ok(value)
    }
}
