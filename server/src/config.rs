use std::collections::BTreeMap;
use std::time::Duration;

/// Default freshness window for cached trees (5 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Subject slug -> env var holding its root folder id
const SUBJECT_FOLDER_VARS: [(&str, &str); 2] = [
    ("cs", "DRIVE_CS_FOLDER_ID"),
    ("ict", "DRIVE_ICT_FOLDER_ID"),
];

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub server_name: String,
    pub rest_port: u16,
    /// Base64 of the full service-account JSON
    pub credentials_base64: Option<String>,
    pub service_account_email: Option<String>,
    pub private_key: Option<String>,
    /// Root folder per subject. A subject with no folder id maps to `None`.
    pub subject_folders: BTreeMap<String, Option<String>>,
    pub cache_ttl: Duration,
    pub crawl_timeout: Duration,
    pub drive_api_base: String,
    pub token_uri: String,
    pub cors_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let subject_folders = SUBJECT_FOLDER_VARS
            .iter()
            .map(|(subject, var)| (subject.to_string(), env_opt(var)))
            .collect();

        Ok(Config {
            server_name: env_opt("SERVER_NAME").unwrap_or_else(|| "vaultd".to_string()),
            rest_port: env_opt("REST_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()?,
            credentials_base64: env_opt("GOOGLE_CREDENTIALS_BASE64"),
            service_account_email: env_opt("GOOGLE_SERVICE_ACCOUNT_EMAIL"),
            private_key: env_opt("GOOGLE_PRIVATE_KEY"),
            subject_folders,
            cache_ttl: Duration::from_secs(
                env_opt("CACHE_TTL_SECS")
                    .map(|v| v.parse())
                    .transpose()?
                    .unwrap_or(DEFAULT_CACHE_TTL_SECS),
            ),
            crawl_timeout: Duration::from_secs(
                env_opt("CRAWL_TIMEOUT_SECS")
                    .map(|v| v.parse())
                    .transpose()?
                    .unwrap_or(60),
            ),
            drive_api_base: env_opt("DRIVE_API_BASE")
                .unwrap_or_else(|| DEFAULT_DRIVE_API_BASE.to_string()),
            token_uri: env_opt("GOOGLE_TOKEN_URI").unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            cors_origins: env_opt("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
        })
    }

    /// Root folder id for a subject, if the subject exists and is configured.
    /// Outer `None` means the subject is unknown.
    pub fn folder_for(&self, subject: &str) -> Option<Option<&str>> {
        self.subject_folders
            .get(&subject.to_ascii_lowercase())
            .map(|id| id.as_deref())
    }
}

/// Read an env var, treating unset and blank values alike.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_for_is_case_insensitive() {
        let mut config = Config::default();
        config
            .subject_folders
            .insert("cs".to_string(), Some("folder-cs".to_string()));
        config.subject_folders.insert("ict".to_string(), None);

        assert_eq!(config.folder_for("CS"), Some(Some("folder-cs")));
        assert_eq!(config.folder_for("ict"), Some(None));
        assert_eq!(config.folder_for("math"), None);
    }
}
