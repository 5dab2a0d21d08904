//! Credentials and endpoints resolved from CLI flags and the environment.
//!
//! `main` parses flags with clap (each flag falls back to an environment
//! variable) and hands the raw values here. Missing values are fatal.

use std::path::Path;

use thiserror::Error;

use crate::consts::DEFAULT_SPEECH_REGION;

pub const SPEECH_KEY_VARS: &[&str] = &["SPEECH_KEY", "AZURE_SPEECH_KEY"];
pub const SPEECH_REGION_VARS: &[&str] = &["SPEECH_REGION", "AZURE_SPEECH_REGION"];
pub const PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";
pub const BUCKET_VAR: &str = "SHADOWCAST_BUCKET";
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const EMULATOR_VAR: &str = "FIRESTORE_EMULATOR_HOST";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing {what}: pass {flag} or set {var}")]
    Missing {
        what: &'static str,
        flag: &'static str,
        var: &'static str,
    },
}

/// Credentials for the speech endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechConfig {
    pub key: String,
    pub region: String,
}

impl SpeechConfig {
    /// Resolve from flag values, then the environment. The region defaults
    /// to `japaneast`; the key is required.
    pub fn resolve(key: Option<String>, region: Option<String>) -> Result<Self, ConfigError> {
        let key = non_empty(key)
            .or_else(|| first_env(SPEECH_KEY_VARS))
            .ok_or(ConfigError::Missing {
                what: "speech key",
                flag: "--speech-key",
                var: SPEECH_KEY_VARS[0],
            })?;
        let region = non_empty(region)
            .or_else(|| first_env(SPEECH_REGION_VARS))
            .unwrap_or_else(|| DEFAULT_SPEECH_REGION.to_string());
        Ok(Self { key, region })
    }
}

/// Where and how to reach Firestore and Cloud Storage.
#[derive(Debug, Clone, PartialEq)]
pub struct GcpConfig {
    pub project_id: String,
    /// Bearer token; not needed against the emulator.
    pub access_token: Option<String>,
    /// `host:port` of a Firestore emulator.
    pub emulator_host: Option<String>,
}

impl GcpConfig {
    pub fn resolve(
        project_id: Option<String>,
        access_token: Option<String>,
        emulator_host: Option<String>,
    ) -> Result<Self, ConfigError> {
        let project_id = non_empty(project_id)
            .or_else(|| first_env(&[PROJECT_VAR]))
            .ok_or(ConfigError::Missing {
                what: "project id",
                flag: "--project",
                var: PROJECT_VAR,
            })?;
        let emulator_host = non_empty(emulator_host).or_else(|| first_env(&[EMULATOR_VAR]));
        let access_token = non_empty(access_token).or_else(|| first_env(&[ACCESS_TOKEN_VAR]));
        if access_token.is_none() && emulator_host.is_none() {
            return Err(ConfigError::Missing {
                what: "access token",
                flag: "--access-token",
                var: ACCESS_TOKEN_VAR,
            });
        }
        Ok(Self {
            project_id,
            access_token,
            emulator_host,
        })
    }

    /// Firestore REST root, honoring the emulator.
    pub fn firestore_base(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{host}"),
            None => "https://firestore.googleapis.com".to_string(),
        }
    }
}

/// Resolve the bucket name, defaulting to the project's Firebase bucket.
pub fn resolve_bucket(bucket: Option<String>, gcp: &GcpConfig) -> String {
    non_empty(bucket)
        .or_else(|| first_env(&[BUCKET_VAR]))
        .unwrap_or_else(|| format!("{}.firebasestorage.app", gcp.project_id))
}

/// Load `.env` from the working directory into the process environment.
/// A missing file is fine; a malformed one is an error.
pub fn load_dotenv() -> Result<(), dotenvy::Error> {
    ignore_missing(dotenvy::dotenv().map(|_| ()))
}

/// Like [`load_dotenv`], for an explicit file.
pub fn load_dotenv_from(path: &Path) -> Result<(), dotenvy::Error> {
    ignore_missing(dotenvy::from_path(path))
}

fn ignore_missing(result: Result<(), dotenvy::Error>) -> Result<(), dotenvy::Error> {
    match result {
        Err(err) if err.not_found() => Ok(()),
        other => other,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn first_env(vars: &[&str]) -> Option<String> {
    vars.iter()
        .find_map(|var| non_empty(std::env::var(var).ok()))
}
