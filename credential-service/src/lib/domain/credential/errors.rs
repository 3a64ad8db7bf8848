use auth::PasswordError;
use thiserror::Error;

use crate::credential::models::AuthProvider;
use crate::credential::models::CredentialStatus;

/// Error for CredentialId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for parsing provider or status names
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseEnumError {
    #[error("Unknown auth provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown credential status: {0}")]
    UnknownStatus(String),
}

/// Credential invariant violations reported by `Credential::validate`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Credential ID cannot be empty")]
    MissingId,

    #[error("Email cannot be blank")]
    BlankEmail,

    #[error("Password hash is required for local authentication")]
    MissingPasswordHash,

    #[error("Auth subject is required for {0} authentication")]
    MissingAuthSubject(AuthProvider),
}

/// Top-level error for all credential-related operations
#[derive(Debug, Clone, Error)]
pub enum CredentialServiceError {
    // Value and entity validation errors (automatically converted via #[from])
    #[error("Invalid credential ID: {0}")]
    InvalidCredentialId(#[from] CredentialIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid credential: {0}")]
    InvalidCredential(#[from] CredentialError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    // Domain-level errors
    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Subject already linked: {provider}/{subject}")]
    SubjectAlreadyExists {
        provider: AuthProvider,
        subject: String,
    },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login not allowed for {0} account")]
    LoginNotAllowed(CredentialStatus),

    #[error("Credential does not use local authentication")]
    NotLocalCredential,

    #[error("Deleted credentials cannot be reactivated")]
    ReactivationNotAllowed,

    // Infrastructure errors
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for CredentialServiceError {
    fn from(err: anyhow::Error) -> Self {
        CredentialServiceError::Unknown(err.to_string())
    }
}
