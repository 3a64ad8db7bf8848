use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use chrono::Utc;

use crate::config::ServiceConfig;
use crate::credential::errors::CredentialServiceError;
use crate::credential::models::Credential;
use crate::credential::models::CredentialId;
use crate::credential::models::CredentialStatus;
use crate::credential::models::EmailAddress;
use crate::credential::models::RegisterFederatedCommand;
use crate::credential::models::RegisterLocalCommand;
use crate::credential::ports::CredentialRepository;
use crate::credential::ports::CredentialServicePort;

/// Domain service implementation for credential operations.
///
/// Argon2 derivations are CPU and memory bound, so they run on the blocking
/// thread pool instead of the async workers. Each concurrent derivation holds
/// the configured memory cost for its duration.
pub struct CredentialService<R>
where
    R: CredentialRepository,
{
    repository: Arc<R>,
    password_hasher: Arc<PasswordHasher>,
    config: ServiceConfig,
}

impl<R> CredentialService<R>
where
    R: CredentialRepository,
{
    /// Create a new credential service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential persistence implementation
    /// * `password_hasher` - Hasher carrying the current parameter policy
    /// * `config` - Account lifecycle settings
    ///
    /// # Returns
    /// Configured credential service instance
    pub fn new(repository: Arc<R>, password_hasher: PasswordHasher, config: ServiceConfig) -> Self {
        Self {
            repository,
            password_hasher: Arc::new(password_hasher),
            config,
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, CredentialServiceError> {
        let hasher = Arc::clone(&self.password_hasher);
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| CredentialServiceError::Unknown(format!("Hashing task failed: {}", e)))?
            .map_err(CredentialServiceError::from)
    }

    async fn verify_password(
        &self,
        credential: &Credential,
        password: &str,
    ) -> Result<bool, CredentialServiceError> {
        let stored_hash = credential
            .password_hash()
            .ok_or(CredentialServiceError::NotLocalCredential)?
            .to_owned();
        let hasher = Arc::clone(&self.password_hasher);
        let password = password.to_owned();

        let result = tokio::task::spawn_blocking(move || hasher.verify(&stored_hash, &password))
            .await
            .map_err(|e| {
                CredentialServiceError::Unknown(format!("Verification task failed: {}", e))
            })?;

        result.map_err(|e| {
            if e.is_malformed() {
                tracing::error!(
                    credential_id = %credential.id(),
                    error = %e,
                    "Stored password hash is malformed"
                );
            }
            CredentialServiceError::from(e)
        })
    }

    async fn load(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CredentialServiceError::NotFound(id.to_string()))
    }

    async fn transition<F>(
        &self,
        id: &CredentialId,
        action: &'static str,
        apply: F,
    ) -> Result<Credential, CredentialServiceError>
    where
        F: FnOnce(&Credential) -> Result<Credential, CredentialServiceError> + Send,
    {
        let credential = self.load(id).await?;
        let updated = self.repository.update(apply(&credential)?).await?;

        tracing::info!(
            credential_id = %updated.id(),
            action,
            from = %credential.status(),
            status = %updated.status(),
            "Credential updated"
        );

        Ok(updated)
    }
}

#[async_trait]
impl<R> CredentialServicePort for CredentialService<R>
where
    R: CredentialRepository,
{
    async fn register_local(
        &self,
        command: RegisterLocalCommand,
    ) -> Result<Credential, CredentialServiceError> {
        if self.repository.find_by_email(&command.email).await?.is_some() {
            return Err(CredentialServiceError::EmailAlreadyExists(
                command.email.to_string(),
            ));
        }

        let password_hash = self.hash_password(&command.password).await?;

        let credential = Credential::builder()
            .id(CredentialId::generate())
            .email(command.email.as_str())
            .password_hash(password_hash)
            .build()
            .validated()?;

        let created = self.repository.create(credential).await?;
        tracing::info!(
            credential_id = %created.id(),
            provider = %created.auth_provider(),
            "Local credential registered"
        );

        Ok(created)
    }

    async fn register_federated(
        &self,
        command: RegisterFederatedCommand,
    ) -> Result<Credential, CredentialServiceError> {
        let mut builder = Credential::builder()
            .id(CredentialId::generate())
            .email(command.email.as_str())
            .auth_provider(command.provider)
            .auth_subject(command.subject);
        if command.email_verified {
            builder = builder.email_verified_at(Utc::now());
        }
        let credential = builder.build().validated()?;

        if self.repository.find_by_email(&command.email).await?.is_some() {
            return Err(CredentialServiceError::EmailAlreadyExists(
                command.email.to_string(),
            ));
        }

        let subject = credential.auth_subject().unwrap_or_default();
        if self
            .repository
            .find_by_subject(command.provider, subject)
            .await?
            .is_some()
        {
            return Err(CredentialServiceError::SubjectAlreadyExists {
                provider: command.provider,
                subject: subject.to_string(),
            });
        }

        let created = self.repository.create(credential).await?;
        tracing::info!(
            credential_id = %created.id(),
            provider = %created.auth_provider(),
            "Federated credential registered"
        );

        Ok(created)
    }

    async fn authenticate(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<Credential, CredentialServiceError> {
        let Some(credential) = self.repository.find_by_email(email).await? else {
            tracing::debug!("Login attempt for unknown email");
            return Err(CredentialServiceError::InvalidCredentials);
        };

        if !credential.is_local_auth() {
            tracing::debug!(
                credential_id = %credential.id(),
                provider = %credential.auth_provider(),
                "Password login attempted on federated credential"
            );
            return Err(CredentialServiceError::InvalidCredentials);
        }

        if !self.verify_password(&credential, password).await? {
            tracing::debug!(credential_id = %credential.id(), "Password mismatch");
            return Err(CredentialServiceError::InvalidCredentials);
        }

        // Status is only disclosed to callers that proved the password.
        if !credential.can_login() {
            tracing::info!(
                credential_id = %credential.id(),
                status = %credential.status(),
                "Login refused"
            );
            return Err(CredentialServiceError::LoginNotAllowed(credential.status()));
        }

        let mut updated = credential.with_last_login(Utc::now());

        // verify_password succeeded, so the stored hash is present and well-formed.
        let stored_hash = credential.password_hash().unwrap_or_default();
        if self.password_hasher.needs_rehash(stored_hash)? {
            match self.hash_password(password).await {
                Ok(new_hash) => {
                    updated = updated.with_password_hash(new_hash);
                    tracing::info!(
                        credential_id = %credential.id(),
                        "Password rehashed with current parameters"
                    );
                }
                // A password accepted under an older length policy can fail
                // the current one; the login still stands.
                Err(e) => tracing::warn!(
                    credential_id = %credential.id(),
                    error = %e,
                    "Skipping password rehash"
                ),
            }
        }

        self.repository.update(updated).await
    }

    async fn change_password(
        &self,
        id: &CredentialId,
        current_password: &str,
        new_password: &str,
    ) -> Result<Credential, CredentialServiceError> {
        let credential = self.load(id).await?;
        if !credential.is_local_auth() {
            return Err(CredentialServiceError::NotLocalCredential);
        }

        if !self.verify_password(&credential, current_password).await? {
            return Err(CredentialServiceError::InvalidCredentials);
        }
        if !credential.can_login() {
            tracing::warn!(
                credential_id = %credential.id(),
                status = %credential.status(),
                "Password change refused"
            );
            return Err(CredentialServiceError::LoginNotAllowed(credential.status()));
        }

        let new_hash = self.hash_password(new_password).await?;
        let updated = self
            .repository
            .update(credential.with_password_hash(new_hash))
            .await?;

        tracing::info!(credential_id = %updated.id(), "Password changed");

        Ok(updated)
    }

    async fn verify_email(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError> {
        self.transition(id, "verify_email", |c| Ok(c.with_verified_email()))
            .await
    }

    async fn suspend(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError> {
        self.transition(id, "suspend", |c| Ok(c.as_suspended())).await
    }

    async fn soft_delete(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError> {
        self.transition(id, "soft_delete", |c| Ok(c.as_soft_deleted()))
            .await
    }

    async fn reactivate(&self, id: &CredentialId) -> Result<Credential, CredentialServiceError> {
        let allow_deleted = self.config.allow_reactivate_deleted;
        self.transition(id, "reactivate", move |c| {
            if c.status() == CredentialStatus::Deleted && !allow_deleted {
                return Err(CredentialServiceError::ReactivationNotAllowed);
            }
            Ok(c.as_reactivated())
        })
        .await
    }

    async fn get_credential(
        &self,
        id: &CredentialId,
    ) -> Result<Credential, CredentialServiceError> {
        self.load(id).await
    }
}
