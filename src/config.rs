use crate::error::ConfigError;
use std::path::PathBuf;

const DEFAULT_KEY_FILE: &str = "serviceAccountKey.json";
const ADC_FILE_NAME: &str = "application_default_credentials.json";
const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

pub struct Config {
    pub discord_token: String,

    /// Overrides the project id carried by the credential.
    pub project_id: Option<String>,
    pub emulator_host: Option<String>,

    pub service_account_json: Option<String>,
    pub service_account_file: PathBuf,
    pub application_credentials: Option<PathBuf>,
    pub well_known_file: Option<PathBuf>,
    pub metadata_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token =
            var("DISCORD_TOKEN").ok_or_else(|| ConfigError::MissingEnvVar("DISCORD_TOKEN".into()))?;

        let well_known_file = var("CLOUDSDK_CONFIG")
            .map(PathBuf::from)
            .or_else(|| var("HOME").map(|home| PathBuf::from(home).join(".config").join("gcloud")))
            .map(|dir| dir.join(ADC_FILE_NAME));

        Ok(Config {
            discord_token,
            project_id: var("FIREBASE_PROJECT_ID"),
            emulator_host: var("FIRESTORE_EMULATOR_HOST"),
            service_account_json: var("FIREBASE_SERVICE_ACCOUNT"),
            service_account_file: var("FIREBASE_SERVICE_ACCOUNT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE)),
            application_credentials: var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            well_known_file,
            metadata_host: var("GCE_METADATA_HOST")
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
        })
    }
}
