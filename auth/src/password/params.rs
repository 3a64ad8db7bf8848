use serde::Deserialize;
use serde::Serialize;

use super::errors::HashFormatError;
use super::errors::PasswordError;
use super::phc::EncodedHash;

/// Argon2id cost parameters for newly produced hashes.
///
/// These describe the *current* policy only. Stored hashes carry their own
/// parameters and are always verified with those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes over memory
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
    /// Derived hash length in bytes
    pub output_len: usize,
    /// Random salt length in bytes
    pub salt_len: usize,
}

impl HashingParams {
    pub const DEFAULT_MEMORY_KIB: u32 = 65536;
    pub const DEFAULT_ITERATIONS: u32 = 3;
    pub const DEFAULT_PARALLELISM: u32 = 4;
    pub const DEFAULT_OUTPUT_LEN: usize = 32;
    pub const DEFAULT_SALT_LEN: usize = 16;

    /// Shortest salt accepted by Argon2.
    pub const MIN_SALT_LEN: usize = 8;

    /// Check that Argon2 can run with these parameters.
    ///
    /// # Returns
    /// The equivalent `argon2::Params`
    ///
    /// # Errors
    /// * `InvalidParams` - A cost, output or salt length is out of range
    pub fn validate(&self) -> Result<argon2::Params, PasswordError> {
        if self.salt_len < Self::MIN_SALT_LEN {
            return Err(PasswordError::InvalidParams(format!(
                "salt length must be at least {} bytes, got {}",
                Self::MIN_SALT_LEN,
                self.salt_len
            )));
        }

        argon2::Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Self::DEFAULT_MEMORY_KIB,
            iterations: Self::DEFAULT_ITERATIONS,
            parallelism: Self::DEFAULT_PARALLELISM,
            output_len: Self::DEFAULT_OUTPUT_LEN,
            salt_len: Self::DEFAULT_SALT_LEN,
        }
    }
}

/// Ceiling on the costs a stored hash may request during verification.
///
/// Stored hashes are verified with their own parameters, so a corrupt value
/// such as `m=4294967295` would otherwise allocate terabytes or never finish.
/// Hashes above any limit are treated as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostLimits {
    pub max_memory_kib: u32,
    pub max_iterations: u32,
    pub max_parallelism: u32,
}

impl CostLimits {
    /// 1 GiB
    pub const DEFAULT_MAX_MEMORY_KIB: u32 = 1_048_576;
    pub const DEFAULT_MAX_ITERATIONS: u32 = 64;
    pub const DEFAULT_MAX_PARALLELISM: u32 = 64;

    /// Multiple of the current policy always admitted.
    pub const HEADROOM: u32 = 4;

    /// Limits leaving room for hashes made under a costlier past policy.
    ///
    /// # Returns
    /// The defaults, raised to `HEADROOM` times `params` where that is higher
    pub fn for_params(params: &HashingParams) -> Self {
        Self {
            max_memory_kib: Self::DEFAULT_MAX_MEMORY_KIB
                .max(params.memory_kib.saturating_mul(Self::HEADROOM)),
            max_iterations: Self::DEFAULT_MAX_ITERATIONS
                .max(params.iterations.saturating_mul(Self::HEADROOM)),
            max_parallelism: Self::DEFAULT_MAX_PARALLELISM
                .max(params.parallelism.saturating_mul(Self::HEADROOM)),
        }
    }

    /// Whether hashes produced with `params` stay verifiable.
    pub fn admits(&self, params: &HashingParams) -> bool {
        params.memory_kib <= self.max_memory_kib
            && params.iterations <= self.max_iterations
            && params.parallelism <= self.max_parallelism
    }

    /// Check the costs of a decoded hash.
    ///
    /// # Errors
    /// * `CostExceedsLimit` - Memory, iterations or lanes above the ceiling
    pub fn check(&self, stored: &EncodedHash) -> Result<(), HashFormatError> {
        let costs = [
            ("m", stored.memory_kib, self.max_memory_kib),
            ("t", stored.iterations, self.max_iterations),
            ("p", stored.parallelism, self.max_parallelism),
        ];
        for (name, value, max) in costs {
            if value > max {
                return Err(HashFormatError::CostExceedsLimit { name, value, max });
            }
        }
        Ok(())
    }
}

impl Default for CostLimits {
    fn default() -> Self {
        Self {
            max_memory_kib: Self::DEFAULT_MAX_MEMORY_KIB,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            max_parallelism: Self::DEFAULT_MAX_PARALLELISM,
        }
    }
}

/// Optional length bounds applied to plaintext passwords before hashing.
///
/// Lengths are counted in characters, not bytes. Verification never applies
/// the policy so that passwords set under an older policy keep working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl PasswordPolicy {
    /// Policy without length bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Policy requiring `min..=max` characters.
    pub fn bounded(min: usize, max: usize) -> Self {
        Self {
            min_length: Some(min),
            max_length: Some(max),
        }
    }

    /// Check a plaintext password against the policy.
    ///
    /// # Errors
    /// * `EmptyPassword` - Password is empty
    /// * `TooShort` - Fewer characters than `min_length`
    /// * `TooLong` - More characters than `max_length`
    pub fn check(&self, password: &str) -> Result<(), PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::EmptyPassword);
        }

        let length = password.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                return Err(PasswordError::TooShort {
                    min,
                    actual: length,
                });
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(PasswordError::TooLong {
                    max,
                    actual: length,
                });
            }
        }

        Ok(())
    }
}
