use async_trait::async_trait;

use crate::credential::errors::CredentialServiceError;
use crate::credential::models::AuthProvider;
use crate::credential::models::Credential;
use crate::credential::models::CredentialId;
use crate::credential::models::EmailAddress;
use crate::credential::models::RegisterFederatedCommand;
use crate::credential::models::RegisterLocalCommand;

/// Port for credential domain service operations.
#[async_trait]
pub trait CredentialServicePort: Send + Sync + 'static {
    /// Register an email/password credential.
    ///
    /// # Arguments
    /// * `command` - Validated email and plaintext password
    ///
    /// # Returns
    /// Created credential (active, email unverified)
    ///
    /// # Errors
    /// * `Password` - Password violates the length policy or hashing failed
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Repository` - Storage operation failed
    async fn register_local(
        &self,
        command: RegisterLocalCommand,
    ) -> Result<Credential, CredentialServiceError>;

    /// Register a credential backed by an external identity provider.
    ///
    /// # Errors
    /// * `InvalidCredential` - Provider is `Local` or the subject is blank
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `SubjectAlreadyExists` - Provider subject is already linked
    /// * `Repository` - Storage operation failed
    async fn register_federated(
        &self,
        command: RegisterFederatedCommand,
    ) -> Result<Credential, CredentialServiceError>;

    /// Check an email/password pair and record the login.
    ///
    /// Rehashes the password under the current parameters when the stored
    /// hash was produced with different ones.
    ///
    /// # Returns
    /// Updated credential with `last_login_at` set
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, federated account or wrong password
    /// * `LoginNotAllowed` - Account is suspended or deleted
    /// * `Password` - Stored hash is malformed
    /// * `Repository` - Storage operation failed
    async fn authenticate(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<Credential, CredentialServiceError>;

    /// Replace the password of a local credential after checking the current one.
    ///
    /// # Errors
    /// * `NotFound` - Credential does not exist
    /// * `NotLocalCredential` - Credential uses an external provider
    /// * `InvalidCredentials` - Current password is wrong
    /// * `LoginNotAllowed` - Credential is suspended or deleted
    /// * `Password` - New password violates the policy
    async fn change_password(
        &self,
        id: &CredentialId,
        current_password: &str,
        new_password: &str,
    ) -> Result<Credential, CredentialServiceError>;

    /// Mark the credential's email as verified.
    async fn verify_email(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError>;

    /// Suspend the credential; it can no longer log in.
    async fn suspend(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError>;

    /// Soft-delete the credential.
    async fn soft_delete(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError>;

    /// Restore a suspended (or, if allowed by configuration, deleted) credential.
    ///
    /// # Errors
    /// * `NotFound` - Credential does not exist
    /// * `ReactivationNotAllowed` - Credential is deleted and restoring deleted
    ///   accounts is disabled
    async fn reactivate(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError>;

    /// Retrieve credential by identifier.
    ///
    /// # Errors
    /// * `NotFound` - Credential does not exist
    async fn get_credential(&self, id: &CredentialId)
        -> Result<Credential, CredentialServiceError>;
}

/// Persistence port for credentials.
///
/// Implementations store the plain field set; all rules live in the domain.
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Store a new credential.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Another credential uses the email
    /// * `SubjectAlreadyExists` - Another credential uses the provider subject
    async fn create(&self, credential: Credential) -> Result<Credential, CredentialServiceError>;

    async fn find_by_id(
        &self,
        id: &CredentialId,
    ) -> Result<Option<Credential>, CredentialServiceError>;

    /// Find by normalized (lowercase) email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Credential>, CredentialServiceError>;

    async fn find_by_subject(
        &self,
        provider: AuthProvider,
        subject: &str,
    ) -> Result<Option<Credential>, CredentialServiceError>;

    /// Overwrite an existing credential.
    ///
    /// # Errors
    /// * `NotFound` - No credential with this ID
    async fn update(&self, credential: Credential) -> Result<Credential, CredentialServiceError>;
}
