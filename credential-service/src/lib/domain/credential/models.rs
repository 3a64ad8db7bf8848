use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use uuid::Uuid;

use crate::credential::errors::CredentialError;
use crate::credential::errors::CredentialIdError;
use crate::credential::errors::EmailError;
use crate::credential::errors::ParseEnumError;

/// Credential unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(pub Uuid);

impl CredentialId {
    /// Generate a new time-ordered credential ID.
    ///
    /// # Returns
    /// CredentialId with UUID v7 (sorts by creation time)
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// The empty ID, used when a builder was not given one.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse a credential ID from string.
    ///
    /// # Arguments
    /// * `s` - UUID string to parse
    ///
    /// # Returns
    /// Parsed CredentialId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, CredentialIdError> {
        Uuid::parse_str(s)
            .map(CredentialId)
            .map_err(|e| CredentialIdError::InvalidFormat(e.to_string()))
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where the user authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password, verified against the stored hash
    #[default]
    Local,
    Google,
    #[serde(rename = "azuread", alias = "microsoft")]
    Microsoft,
    Apple,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
            AuthProvider::Microsoft => "azuread",
            AuthProvider::Apple => "apple",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProvider {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(AuthProvider::Local),
            "google" => Ok(AuthProvider::Google),
            "azuread" | "microsoft" => Ok(AuthProvider::Microsoft),
            "apple" => Ok(AuthProvider::Apple),
            _ => Err(ParseEnumError::UnknownProvider(s.to_string())),
        }
    }
}

/// Account status controlling whether login is allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    #[default]
    Active,
    Suspended,
    Deleted,
}

impl CredentialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStatus::Active => "active",
            CredentialStatus::Suspended => "suspended",
            CredentialStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(CredentialStatus::Active),
            "suspended" => Ok(CredentialStatus::Suspended),
            "deleted" => Ok(CredentialStatus::Deleted),
            _ => Err(ParseEnumError::UnknownStatus(s.to_string())),
        }
    }
}

/// Email address type
///
/// Validated with an RFC 5322 parser, trimmed and lowercased so that
/// uniqueness checks are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated, normalized email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Lowercased EmailAddress value object
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = normalize_email(&email);
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    ///
    /// # Returns
    /// Email string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn deserialize_email<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|email| normalize_email(&email))
}

/// One user's authentication record.
///
/// Values are never changed in place: every transition returns a new
/// credential and leaves the receiver untouched, so a credential can be
/// shared between tasks without locking. Two credentials with the same ID are
/// the same entity; `==` ignores every other field.
///
/// Construction does not enforce the invariants. Call [`validate`](Self::validate)
/// on a freshly built credential before persisting or using it.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    id: CredentialId,
    #[serde(deserialize_with = "deserialize_email")]
    email: String,
    password_hash: Option<String>,
    auth_provider: AuthProvider,
    auth_subject: Option<String>,
    mfa_enabled: bool,
    status: CredentialStatus,
    email_verified_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn builder() -> CredentialBuilder {
        CredentialBuilder::default()
    }

    /// Start a builder pre-filled with this credential's fields.
    pub fn to_builder(&self) -> CredentialBuilder {
        CredentialBuilder {
            id: Some(self.id),
            email: Some(self.email.clone()),
            password_hash: self.password_hash.clone(),
            auth_provider: self.auth_provider,
            auth_subject: self.auth_subject.clone(),
            mfa_enabled: self.mfa_enabled,
            status: self.status,
            email_verified_at: self.email_verified_at,
            last_login_at: self.last_login_at,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
            deleted_at: self.deleted_at,
        }
    }

    /// Check the domain invariants.
    ///
    /// # Errors
    /// * `MissingId` - ID is nil
    /// * `BlankEmail` - Email is empty or whitespace
    /// * `MissingPasswordHash` - Local credential without a password hash
    /// * `MissingAuthSubject` - Federated credential without a provider subject
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.id.is_nil() {
            return Err(CredentialError::MissingId);
        }
        if self.email.trim().is_empty() {
            return Err(CredentialError::BlankEmail);
        }

        if self.auth_provider == AuthProvider::Local {
            if is_blank(self.password_hash.as_deref()) {
                return Err(CredentialError::MissingPasswordHash);
            }
        } else if is_blank(self.auth_subject.as_deref()) {
            return Err(CredentialError::MissingAuthSubject(self.auth_provider));
        }

        Ok(())
    }

    /// Validate and hand the credential back, for use at the end of a builder chain.
    pub fn validated(self) -> Result<Self, CredentialError> {
        self.validate()?;
        Ok(self)
    }

    // Queries

    /// Whether the account may log in: active and not soft-deleted.
    pub fn can_login(&self) -> bool {
        self.status == CredentialStatus::Active && self.deleted_at.is_none()
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    pub fn is_local_auth(&self) -> bool {
        self.auth_provider == AuthProvider::Local
    }

    // Transitions

    /// Record a successful login at `login_time`.
    pub fn with_last_login(&self, login_time: DateTime<Utc>) -> Self {
        Self {
            last_login_at: Some(login_time),
            ..self.touched()
        }
    }

    /// Mark the email as verified now.
    pub fn with_verified_email(&self) -> Self {
        let now = Utc::now();
        Self {
            email_verified_at: Some(now),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Replace the password hash.
    ///
    /// Takes an already computed PHC string; this type never hashes passwords.
    pub fn with_password_hash(&self, password_hash: impl Into<String>) -> Self {
        Self {
            password_hash: Some(password_hash.into()),
            ..self.touched()
        }
    }

    pub fn with_mfa_enabled(&self, enabled: bool) -> Self {
        Self {
            mfa_enabled: enabled,
            ..self.touched()
        }
    }

    pub fn as_suspended(&self) -> Self {
        Self {
            status: CredentialStatus::Suspended,
            ..self.touched()
        }
    }

    /// Soft-delete: the record is kept but can no longer log in.
    pub fn as_soft_deleted(&self) -> Self {
        let now = Utc::now();
        Self {
            status: CredentialStatus::Deleted,
            deleted_at: Some(now),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Restore a suspended or soft-deleted credential to active.
    ///
    /// Whether deleted accounts may be restored is decided by the caller.
    pub fn as_reactivated(&self) -> Self {
        Self {
            status: CredentialStatus::Active,
            deleted_at: None,
            ..self.touched()
        }
    }

    fn touched(&self) -> Self {
        Self {
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    // Accessors

    pub fn id(&self) -> CredentialId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn auth_provider(&self) -> AuthProvider {
        self.auth_provider
    }

    pub fn auth_subject(&self) -> Option<&str> {
        self.auth_subject.as_deref()
    }

    pub fn mfa_enabled(&self) -> bool {
        self.mfa_enabled
    }

    pub fn status(&self) -> CredentialStatus {
        self.status
    }

    pub fn email_verified_at(&self) -> Option<DateTime<Utc>> {
        self.email_verified_at
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Credential {}

impl Hash for Credential {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("email", &self.email)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "<redacted>"),
            )
            .field("auth_provider", &self.auth_provider)
            .field("auth_subject", &self.auth_subject)
            .field("mfa_enabled", &self.mfa_enabled)
            .field("status", &self.status)
            .field("email_verified_at", &self.email_verified_at)
            .field("last_login_at", &self.last_login_at)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("deleted_at", &self.deleted_at)
            .finish()
    }
}

/// Builder for [`Credential`].
///
/// Unset fields get the defaults of a new account: nil ID, empty email,
/// local provider, active status, MFA off, `created_at` now and `updated_at`
/// equal to `created_at`.
#[derive(Clone, Default)]
pub struct CredentialBuilder {
    id: Option<CredentialId>,
    email: Option<String>,
    password_hash: Option<String>,
    auth_provider: AuthProvider,
    auth_subject: Option<String>,
    mfa_enabled: bool,
    status: CredentialStatus,
    email_verified_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl CredentialBuilder {
    pub fn id(mut self, id: CredentialId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the email; it is trimmed and lowercased.
    pub fn email(mut self, email: impl AsRef<str>) -> Self {
        self.email = Some(normalize_email(email.as_ref()));
        self
    }

    pub fn password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = Some(password_hash.into());
        self
    }

    pub fn auth_provider(mut self, auth_provider: AuthProvider) -> Self {
        self.auth_provider = auth_provider;
        self
    }

    pub fn auth_subject(mut self, auth_subject: impl Into<String>) -> Self {
        self.auth_subject = Some(auth_subject.into());
        self
    }

    pub fn mfa_enabled(mut self, mfa_enabled: bool) -> Self {
        self.mfa_enabled = mfa_enabled;
        self
    }

    pub fn status(mut self, status: CredentialStatus) -> Self {
        self.status = status;
        self
    }

    pub fn email_verified_at(mut self, at: DateTime<Utc>) -> Self {
        self.email_verified_at = Some(at);
        self
    }

    pub fn last_login_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_login_at = Some(at);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn deleted_at(mut self, at: DateTime<Utc>) -> Self {
        self.deleted_at = Some(at);
        self
    }

    pub fn build(self) -> Credential {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Credential {
            id: self.id.unwrap_or_else(CredentialId::nil),
            email: self.email.unwrap_or_default(),
            password_hash: self.password_hash,
            auth_provider: self.auth_provider,
            auth_subject: self.auth_subject,
            mfa_enabled: self.mfa_enabled,
            status: self.status,
            email_verified_at: self.email_verified_at,
            last_login_at: self.last_login_at,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
            deleted_at: self.deleted_at,
        }
    }
}

/// Command to register an email/password credential
pub struct RegisterLocalCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl fmt::Debug for RegisterLocalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterLocalCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RegisterLocalCommand {
    /// Construct a new local registration command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password` - Plain text password (will be hashed by service)
    pub fn new(email: EmailAddress, password: String) -> Self {
        Self { email, password }
    }
}

/// Command to register a credential backed by an external identity provider
#[derive(Debug)]
pub struct RegisterFederatedCommand {
    pub email: EmailAddress,
    pub provider: AuthProvider,
    /// Provider's user identifier (e.g. the ID token `sub` claim)
    pub subject: String,
    /// Whether the provider has already verified the email
    pub email_verified: bool,
}
