//! Service-account credential resolution
//!
//! Credentials come either from a base64-encoded service-account JSON blob or
//! from a discrete email/private-key pair. Resolution is purely local: it
//! decodes and validates the material but never talks to the network.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{SyncError, SyncResult};

/// Usable service-account credentials.
#[derive(Clone)]
pub struct Credentials {
    pub client_email: String,
    pub token_uri: String,
    pub(crate) signing_key: EncodingKey,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ServiceAccountJson {
    client_email: Option<String>,
    private_key: Option<String>,
    token_uri: Option<String>,
}

/// Resolve credentials from configuration.
///
/// Prefers the base64 blob. A blob that fails to decode falls back to the
/// discrete fields when those are set, and is reported as
/// `CredentialMalformed` when they are not.
pub fn resolve(config: &Config) -> SyncResult<Credentials> {
    if let Some(blob) = &config.credentials_base64 {
        match decode_blob(blob) {
            Ok(account) => return build(account, &config.token_uri),
            Err(err) => {
                if config.service_account_email.is_none() || config.private_key.is_none() {
                    tracing::error!(error = %err, "GOOGLE_CREDENTIALS_BASE64 is unusable");
                    return Err(err);
                }
                tracing::warn!(error = %err, "GOOGLE_CREDENTIALS_BASE64 is unusable, using discrete credentials");
            }
        }
    }

    match (&config.service_account_email, &config.private_key) {
        (Some(email), Some(key)) => build(
            ServiceAccountJson {
                client_email: Some(email.clone()),
                private_key: Some(normalize_private_key(key)),
                token_uri: None,
            },
            &config.token_uri,
        ),
        _ => Err(SyncError::ConfigurationAbsent),
    }
}

fn decode_blob(blob: &str) -> SyncResult<ServiceAccountJson> {
    let bytes = STANDARD
        .decode(blob.trim())
        .map_err(|e| SyncError::CredentialMalformed(format!("invalid base64: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SyncError::CredentialMalformed(format!("invalid service-account JSON: {}", e)))
}

fn build(account: ServiceAccountJson, default_token_uri: &str) -> SyncResult<Credentials> {
    let client_email = account
        .client_email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| SyncError::CredentialMalformed("missing client_email".into()))?;
    let private_key = account
        .private_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| SyncError::CredentialMalformed("missing private_key".into()))?;

    let signing_key = EncodingKey::from_rsa_pem(private_key.as_bytes())
        .map_err(|e| SyncError::CredentialMalformed(format!("invalid private key: {}", e)))?;

    Ok(Credentials {
        client_email,
        token_uri: account
            .token_uri
            .unwrap_or_else(|| default_token_uri.to_string()),
        signing_key,
    })
}

/// Strip one layer of wrapping quotes and unescape literal `\n` sequences,
/// unless the key already carries real newlines.
pub fn normalize_private_key(raw: &str) -> String {
    let mut key = raw;
    if let Some(rest) = key.strip_prefix(['"', '\'']) {
        key = rest;
    }
    if let Some(rest) = key.strip_suffix(['"', '\'']) {
        key = rest;
    }
    let key = key.trim();

    if key.contains('\n') {
        key.to_string()
    } else {
        key.replace("\\n", "\n")
    }
}
