use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::constant_time::constant_time_eq;
use super::errors::PasswordError;
use super::params::CostLimits;
use super::params::HashingParams;
use super::params::PasswordPolicy;
use super::phc::EncodedHash;
use super::phc::VERSION;

/// Password hashing implementation.
///
/// Produces and checks Argon2id hashes in PHC string format. Holds only the
/// current policy; salts come from the OS generator on every call, so a single
/// instance can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: HashingParams,
    policy: PasswordPolicy,
    limits: CostLimits,
}

impl PasswordHasher {
    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    /// (m=65536, t=3, p=4, 32-byte output, 16-byte salt, no length policy)
    pub fn new() -> Self {
        Self {
            params: HashingParams::default(),
            policy: PasswordPolicy::default(),
            limits: CostLimits::default(),
        }
    }

    /// Create a password hasher with explicit cost parameters and length policy.
    ///
    /// # Arguments
    /// * `params` - Cost parameters applied to new hashes
    /// * `policy` - Length bounds enforced before hashing
    ///
    /// # Returns
    /// Configured PasswordHasher
    ///
    /// Verification limits are derived from `params` with
    /// [`CostLimits::for_params`]; see [`with_limits`](Self::with_limits).
    ///
    /// # Errors
    /// * `InvalidParams` - Argon2 cannot run with `params`
    pub fn with_config(
        params: HashingParams,
        policy: PasswordPolicy,
    ) -> Result<Self, PasswordError> {
        params.validate()?;
        Ok(Self {
            params,
            policy,
            limits: CostLimits::for_params(&params),
        })
    }

    /// Replace the ceiling on stored-hash costs accepted by `verify`.
    ///
    /// # Errors
    /// * `InvalidParams` - The limits would reject hashes this hasher produces
    pub fn with_limits(mut self, limits: CostLimits) -> Result<Self, PasswordError> {
        if !limits.admits(&self.params) {
            return Err(PasswordError::InvalidParams(format!(
                "verification limits {:?} are below the hashing parameters",
                limits
            )));
        }
        self.limits = limits;
        Ok(self)
    }

    /// Current cost parameters.
    pub fn params(&self) -> &HashingParams {
        &self.params
    }

    /// Current password length policy.
    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    pub fn limits(&self) -> &CostLimits {
        &self.limits
    }

    /// Hash a plaintext password securely.
    ///
    /// Every call draws a fresh salt, so hashing the same password twice
    /// yields two different strings. Compare passwords with [`verify`](Self::verify),
    /// never by comparing hash strings.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `EmptyPassword` - Password is empty
    /// * `TooShort` / `TooLong` - Password violates the length policy
    /// * `HashingFailed` - Salt generation or key derivation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        self.policy.check(password)?;

        let mut salt = vec![0u8; self.params.salt_len];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| PasswordError::HashingFailed(format!("salt generation: {}", e)))?;

        let mut hash = vec![0u8; self.params.output_len];
        derive(
            password.as_bytes(),
            &salt,
            VERSION,
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            &mut hash,
        )?;

        let encoded = EncodedHash {
            version: VERSION,
            memory_kib: self.params.memory_kib,
            iterations: self.params.iterations,
            parallelism: self.params.parallelism,
            salt,
            hash,
        };

        Ok(encoded.to_string())
    }

    /// Verify a password against a stored hash.
    ///
    /// Derivation uses the parameters and salt read from `encoded_hash`, not
    /// the current policy, so hashes created under older settings still verify.
    ///
    /// # Arguments
    /// * `encoded_hash` - Stored password hash in PHC string format
    /// * `password` - Plaintext password to verify
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `EmptyHash` / `EmptyPassword` - An argument is empty
    /// * `MalformedHash` - Stored hash cannot be decoded, or asks for costs
    ///   above [`limits`](Self::limits)
    /// * `HashingFailed` - Key derivation failed
    pub fn verify(&self, encoded_hash: &str, password: &str) -> Result<bool, PasswordError> {
        if encoded_hash.is_empty() {
            return Err(PasswordError::EmptyHash);
        }
        if password.is_empty() {
            return Err(PasswordError::EmptyPassword);
        }

        let stored = self.decode(encoded_hash)?;

        let mut candidate = vec![0u8; stored.hash.len()];
        derive(
            password.as_bytes(),
            &stored.salt,
            stored.version,
            stored.memory_kib,
            stored.iterations,
            stored.parallelism,
            &mut candidate,
        )?;

        Ok(constant_time_eq(&candidate, &stored.hash))
    }

    /// Check if a stored hash was produced under different settings.
    ///
    /// Only call this right after a successful [`verify`](Self::verify): the
    /// plaintext is needed to produce the replacement hash.
    ///
    /// # Arguments
    /// * `encoded_hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if version, memory, iterations, parallelism, salt length or
    /// output length differ from the current parameters
    ///
    /// # Errors
    /// * `EmptyHash` - Hash is empty
    /// * `MalformedHash` - Stored hash cannot be decoded, or asks for costs
    ///   above [`limits`](Self::limits)
    pub fn needs_rehash(&self, encoded_hash: &str) -> Result<bool, PasswordError> {
        if encoded_hash.is_empty() {
            return Err(PasswordError::EmptyHash);
        }

        let stored = self.decode(encoded_hash)?;

        Ok(stored.version != VERSION
            || stored.memory_kib != self.params.memory_kib
            || stored.iterations != self.params.iterations
            || stored.parallelism != self.params.parallelism
            || stored.salt.len() != self.params.salt_len
            || stored.hash.len() != self.params.output_len)
    }

    fn decode(&self, encoded_hash: &str) -> Result<EncodedHash, PasswordError> {
        let stored = EncodedHash::parse(encoded_hash)?;
        self.limits.check(&stored)?;
        Ok(stored)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn derive(
    password: &[u8],
    salt: &[u8],
    version: u32,
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    out: &mut [u8],
) -> Result<(), PasswordError> {
    let version =
        Version::try_from(version).map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
    let params = Params::new(memory_kib, iterations, parallelism, Some(out.len()))
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Argon2::new(Algorithm::Argon2id, version, params)
        .hash_password_into(password, salt, out)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::errors::HashFormatError;

    fn fast_params() -> HashingParams {
        HashingParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
            ..HashingParams::default()
        }
    }

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_config(fast_params(), PasswordPolicy::unbounded())
            .expect("Failed to build hasher")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "my_secure_password";

        // Hash the password
        let hash = hasher.hash(password).expect("Failed to hash password");

        // Verify correct password
        assert!(hasher
            .verify(&hash, password)
            .expect("Failed to verify password"));

        // Verify incorrect password
        assert!(!hasher
            .verify(&hash, "wrong_password")
            .expect("Failed to verify password"));
    }

    #[test]
    fn test_hash_format() {
        let hasher = fast_hasher();
        let hash = hasher.hash("password").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$v=19$m=8,t=1,p=1$"));
        let parsed = EncodedHash::parse(&hash).expect("Failed to parse hash");
        assert_eq!(parsed.salt.len(), 16);
        assert_eq!(parsed.hash.len(), 32);
        assert!(!hash.contains('='));
    }

    #[test]
    fn test_default_hash_uses_policy_constants() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("CorrectHorse123").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=3,p=4$"));
        assert!(hasher.verify(&hash, "CorrectHorse123").unwrap());
        assert!(!hasher.needs_rehash(&hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let hasher = fast_hasher();
        let first = hasher.hash("password").unwrap();
        let second = hasher.hash("password").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify(&first, "password").unwrap());
        assert!(hasher.verify(&second, "password").unwrap());
    }

    #[test]
    fn test_verify_uses_stored_parameters() {
        let old = PasswordHasher::with_config(
            HashingParams {
                memory_kib: 16,
                iterations: 2,
                parallelism: 2,
                output_len: 24,
                salt_len: 8,
            },
            PasswordPolicy::unbounded(),
        )
        .unwrap();
        let hash = old.hash("legacy-password").unwrap();

        // A hasher with a different policy still verifies the old hash
        let current = fast_hasher();
        assert!(current.verify(&hash, "legacy-password").unwrap());
        assert!(!current.verify(&hash, "legacy-passwort").unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = fast_hasher();
        let result = hasher.verify("not-a-hash", "x");
        assert!(matches!(
            result,
            Err(PasswordError::MalformedHash(HashFormatError::SegmentCount { .. }))
        ));
        assert!(result.unwrap_err().is_malformed());
    }

    #[test]
    fn test_verify_rejects_empty_arguments() {
        let hasher = fast_hasher();
        let hash = hasher.hash("password").unwrap();

        assert_eq!(hasher.verify(&hash, ""), Err(PasswordError::EmptyPassword));
        assert_eq!(hasher.verify("", "password"), Err(PasswordError::EmptyHash));
    }

    #[test]
    fn test_hash_rejects_empty_password() {
        let hasher = fast_hasher();
        assert_eq!(hasher.hash(""), Err(PasswordError::EmptyPassword));
    }

    #[test]
    fn test_hash_enforces_length_policy() {
        let hasher =
            PasswordHasher::with_config(fast_params(), PasswordPolicy::bounded(12, 24)).unwrap();

        assert!(matches!(
            hasher.hash("short"),
            Err(PasswordError::TooShort { min: 12, .. })
        ));
        assert!(matches!(
            hasher.hash("this-password-is-far-too-long"),
            Err(PasswordError::TooLong { max: 24, .. })
        ));
        assert!(hasher.hash("CorrectHorse123").is_ok());
    }

    #[test]
    fn test_verify_ignores_length_policy() {
        let hash = fast_hasher().hash("short").unwrap();
        let strict =
            PasswordHasher::with_config(fast_params(), PasswordPolicy::bounded(12, 24)).unwrap();
        assert!(strict.verify(&hash, "short").unwrap());
    }

    #[test]
    fn test_tampered_hash_does_not_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("password").unwrap();

        let mut parsed = EncodedHash::parse(&hash).unwrap();
        let last = parsed.hash.len() - 1;
        parsed.hash[last] ^= 0x80;

        assert!(!hasher.verify(&parsed.to_string(), "password").unwrap());
    }

    #[test]
    fn test_truncated_hash_does_not_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("password").unwrap();

        let mut parsed = EncodedHash::parse(&hash).unwrap();
        parsed.hash.truncate(16);

        assert!(!hasher.verify(&parsed.to_string(), "password").unwrap());
    }

    #[test]
    fn test_needs_rehash() {
        let hasher = fast_hasher();
        let hash = hasher.hash("password").unwrap();
        assert!(!hasher.needs_rehash(&hash).unwrap());

        let mut parsed = EncodedHash::parse(&hash).unwrap();
        parsed.iterations = 2;
        assert!(hasher.needs_rehash(&parsed.to_string()).unwrap());

        let mut parsed = EncodedHash::parse(&hash).unwrap();
        parsed.memory_kib = 16;
        assert!(hasher.needs_rehash(&parsed.to_string()).unwrap());

        let mut parsed = EncodedHash::parse(&hash).unwrap();
        parsed.parallelism = 2;
        assert!(hasher.needs_rehash(&parsed.to_string()).unwrap());

        let mut parsed = EncodedHash::parse(&hash).unwrap();
        parsed.version = 0x10;
        assert!(hasher.needs_rehash(&parsed.to_string()).unwrap());
    }

    #[test]
    fn test_needs_rehash_hand_built_hash() {
        let hasher = PasswordHasher::new();
        let old = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$CTFhFdXPJO1aFaMaO6Mm5c8y7cJHAph8ArZWb2GRPPc";
        assert!(hasher.needs_rehash(old).unwrap());
    }

    #[test]
    fn test_needs_rehash_malformed() {
        let hasher = fast_hasher();
        assert!(hasher.needs_rehash("$argon2id$v=19$m=x,t=1,p=1$AAAA$AAAA").is_err());
        assert_eq!(hasher.needs_rehash(""), Err(PasswordError::EmptyHash));
    }

    // Costs near u32::MAX would allocate terabytes or never return
    #[test]
    fn test_verify_rejects_costs_above_limits() {
        let hasher = fast_hasher();

        for hash in [
            "$argon2id$v=19$m=4294967295,t=1,p=1$c29tZXNhbHQ$CTFhFdXPJO1aFaMaO6Mm5c8y7cJHAph8ArZWb2GRPPc",
            "$argon2id$v=19$m=8,t=4294967295,p=1$c29tZXNhbHQ$CTFhFdXPJO1aFaMaO6Mm5c8y7cJHAph8ArZWb2GRPPc",
            "$argon2id$v=19$m=65536,t=1,p=4096$c29tZXNhbHQ$CTFhFdXPJO1aFaMaO6Mm5c8y7cJHAph8ArZWb2GRPPc",
        ] {
            let result = hasher.verify(hash, "x");
            assert!(
                matches!(
                    result,
                    Err(PasswordError::MalformedHash(HashFormatError::CostExceedsLimit { .. }))
                ),
                "accepted {hash}"
            );
            assert!(result.unwrap_err().is_malformed());
            assert!(hasher.needs_rehash(hash).unwrap_err().is_malformed());
        }
    }

    #[test]
    fn test_stored_values_argon2_cannot_run_with_are_malformed() {
        let hasher = fast_hasher();

        for hash in [
            "$argon2id$v=19$m=8,t=1,p=1$AAAA$AAAA",
            "$argon2id$v=17$m=8,t=1,p=1$c29tZXNhbHQ$c29tZWhhc2g",
            "$argon2id$v=19$m=8,t=1,p=4$c29tZXNhbHQ$c29tZWhhc2g",
            "$argon2id$v=19$m=8,t=0,p=1$c29tZXNhbHQ$c29tZWhhc2g",
        ] {
            let verified = hasher.verify(hash, "x");
            assert!(
                verified.as_ref().is_err_and(PasswordError::is_malformed),
                "{hash}: {verified:?}"
            );
            let rehash = hasher.needs_rehash(hash);
            assert!(
                rehash.as_ref().is_err_and(PasswordError::is_malformed),
                "{hash}: {rehash:?}"
            );
        }
    }

    #[test]
    fn test_limits_admit_older_costlier_hashes() {
        let costly = PasswordHasher::with_config(
            HashingParams {
                memory_kib: 32,
                iterations: 3,
                parallelism: 2,
                ..HashingParams::default()
            },
            PasswordPolicy::unbounded(),
        )
        .unwrap();
        let hash = costly.hash("password").unwrap();

        let current = fast_hasher()
            .with_limits(CostLimits {
                max_memory_kib: 32,
                max_iterations: 3,
                max_parallelism: 2,
            })
            .unwrap();
        assert!(current.verify(&hash, "password").unwrap());

        let strict = fast_hasher()
            .with_limits(CostLimits {
                max_memory_kib: 16,
                max_iterations: 3,
                max_parallelism: 2,
            })
            .unwrap();
        assert!(strict.verify(&hash, "password").unwrap_err().is_malformed());
    }

    #[test]
    fn test_limits_below_hashing_params_rejected() {
        let result = PasswordHasher::new().with_limits(CostLimits {
            max_memory_kib: 1024,
            ..CostLimits::default()
        });
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordHasher::with_config(
            HashingParams {
                parallelism: 0,
                ..HashingParams::default()
            },
            PasswordPolicy::unbounded(),
        );
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }
}
