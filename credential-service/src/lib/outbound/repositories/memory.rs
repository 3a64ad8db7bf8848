use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::credential::errors::CredentialServiceError;
use crate::credential::models::AuthProvider;
use crate::credential::models::Credential;
use crate::credential::models::CredentialId;
use crate::credential::models::EmailAddress;
use crate::credential::ports::CredentialRepository;

/// Process-local credential store.
///
/// Enforces the same uniqueness rules a database schema would: one
/// credential per lowercase email and per (provider, subject) pair.
#[derive(Default)]
pub struct InMemoryCredentialRepository {
    credentials: RwLock<HashMap<CredentialId, Credential>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        credentials: &HashMap<CredentialId, Credential>,
        candidate: &Credential,
    ) -> Result<(), CredentialServiceError> {
        for existing in credentials.values().filter(|c| c.id() != candidate.id()) {
            if existing.email() == candidate.email() {
                return Err(CredentialServiceError::EmailAlreadyExists(
                    candidate.email().to_string(),
                ));
            }
            if let Some(subject) = candidate.auth_subject() {
                if existing.auth_provider() == candidate.auth_provider()
                    && existing.auth_subject() == Some(subject)
                {
                    return Err(CredentialServiceError::SubjectAlreadyExists {
                        provider: candidate.auth_provider(),
                        subject: subject.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn create(&self, credential: Credential) -> Result<Credential, CredentialServiceError> {
        let mut credentials = self.credentials.write().await;

        if credentials.contains_key(&credential.id()) {
            return Err(CredentialServiceError::Repository(format!(
                "Duplicate credential ID: {}",
                credential.id()
            )));
        }
        Self::check_unique(&credentials, &credential)?;

        credentials.insert(credential.id(), credential.clone());
        Ok(credential)
    }

    async fn find_by_id(
        &self,
        id: &CredentialId,
    ) -> Result<Option<Credential>, CredentialServiceError> {
        Ok(self.credentials.read().await.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Credential>, CredentialServiceError> {
        Ok(self
            .credentials
            .read()
            .await
            .values()
            .find(|c| c.email() == email.as_str())
            .cloned())
    }

    async fn find_by_subject(
        &self,
        provider: AuthProvider,
        subject: &str,
    ) -> Result<Option<Credential>, CredentialServiceError> {
        Ok(self
            .credentials
            .read()
            .await
            .values()
            .find(|c| c.auth_provider() == provider && c.auth_subject() == Some(subject))
            .cloned())
    }

    async fn update(&self, credential: Credential) -> Result<Credential, CredentialServiceError> {
        let mut credentials = self.credentials.write().await;

        if !credentials.contains_key(&credential.id()) {
            return Err(CredentialServiceError::NotFound(credential.id().to_string()));
        }
        Self::check_unique(&credentials, &credential)?;

        credentials.insert(credential.id(), credential.clone());
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "$argon2id$v=19$m=8,t=1,p=1$c29tZXNhbHQ$c29tZWhhc2g";

    fn local(email: &str) -> Credential {
        Credential::builder()
            .id(CredentialId::generate())
            .email(email)
            .password_hash(HASH)
            .build()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repository = InMemoryCredentialRepository::new();
        let credential = local("user@example.com");
        let id = credential.id();

        repository.create(credential).await.unwrap();

        let by_id = repository.find_by_id(&id).await.unwrap();
        assert!(by_id.is_some());

        let email = EmailAddress::new("USER@example.com".to_string()).unwrap();
        let by_email = repository.find_by_email(&email).await.unwrap();
        assert_eq!(by_email.map(|c| c.id()), Some(id));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repository = InMemoryCredentialRepository::new();
        repository.create(local("user@example.com")).await.unwrap();

        let result = repository.create(local("User@Example.com")).await;
        assert!(matches!(
            result,
            Err(CredentialServiceError::EmailAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_subject_rejected() {
        let repository = InMemoryCredentialRepository::new();
        let federated = |email: &str| {
            Credential::builder()
                .id(CredentialId::generate())
                .email(email)
                .auth_provider(AuthProvider::Google)
                .auth_subject("sub-1")
                .build()
        };

        repository.create(federated("a@example.com")).await.unwrap();
        let result = repository.create(federated("b@example.com")).await;
        assert!(matches!(
            result,
            Err(CredentialServiceError::SubjectAlreadyExists { .. })
        ));

        let found = repository
            .find_by_subject(AuthProvider::Google, "sub-1")
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.email().to_string()), Some("a@example.com".to_string()));
        assert!(repository
            .find_by_subject(AuthProvider::Apple, "sub-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_stored_instance() {
        let repository = InMemoryCredentialRepository::new();
        let credential = repository.create(local("user@example.com")).await.unwrap();

        repository.update(credential.as_suspended()).await.unwrap();

        let stored = repository.find_by_id(&credential.id()).await.unwrap().unwrap();
        assert!(!stored.can_login());
        // The caller's instance is untouched
        assert!(credential.can_login());
    }

    #[tokio::test]
    async fn test_update_unknown_credential() {
        let repository = InMemoryCredentialRepository::new();
        let result = repository.update(local("user@example.com")).await;
        assert!(matches!(result, Err(CredentialServiceError::NotFound(_))));
    }
}
