use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// No project id was configured and the credential does not carry one.
    #[error("no Firestore project id; set FIREBASE_PROJECT_ID")]
    MissingProjectId,
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("service account JSON is invalid: {0}")]
    InvalidServiceAccount(#[source] serde_json::Error),

    #[error("failed to read credential file `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported credential type `{0}`")]
    UnsupportedType(String),

    /// The env-var → file → application-default chain found nothing usable.
    #[error(
        "no credential source available; set FIREBASE_SERVICE_ACCOUNT or provide {}",
        "serviceAccountKey.json"
    )]
    Exhausted,

    #[error("failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("firestore request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("firestore returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Startup failures; each one ends the process with a non-zero status.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),

    /// Boxed because `serenity::Error` is large.
    #[error("discord client error: {0}")]
    Discord(#[from] Box<serenity::Error>),
}

impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::Discord(Box::new(err))
    }
}
