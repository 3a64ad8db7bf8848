//! Password hashing library
//!
//! Provides the reusable password primitive for the credential services:
//! - Argon2id hashing with per-call random salts
//! - PHC string encoding and decoding
//! - Constant-time hash comparison
//! - Rehash detection when cost parameters change
//!
//! Hash strings are self-describing, so they can be verified after the
//! configured parameters change and by other Argon2id implementations that
//! read the same PHC format.
//!
//! # Examples
//!
//! ## Hash and verify
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify(&hash, "my_password").unwrap());
//! assert!(!hasher.verify(&hash, "wrong").unwrap());
//! ```
//!
//! ## Upgrade parameters on login
//! ```
//! use auth::{HashingParams, PasswordHasher, PasswordPolicy};
//!
//! let old = PasswordHasher::with_config(
//!     HashingParams { memory_kib: 8, iterations: 1, parallelism: 1, ..Default::default() },
//!     PasswordPolicy::unbounded(),
//! ).unwrap();
//! let stored = old.hash("my_password").unwrap();
//!
//! let current = PasswordHasher::with_config(
//!     HashingParams { memory_kib: 16, iterations: 2, parallelism: 1, ..Default::default() },
//!     PasswordPolicy::unbounded(),
//! ).unwrap();
//! if current.verify(&stored, "my_password").unwrap() && current.needs_rehash(&stored).unwrap() {
//!     let upgraded = current.hash("my_password").unwrap();
//!     assert!(!current.needs_rehash(&upgraded).unwrap());
//! }
//! ```
//!
//! ## Malformed hashes are errors, not mismatches
//! ```
//! use auth::PasswordHasher;
//!
//! let err = PasswordHasher::new().verify("not-a-hash", "x").unwrap_err();
//! assert!(err.is_malformed());
//! ```

pub mod password;

// Re-export commonly used items
pub use password::CostLimits;
pub use password::EncodedHash;
pub use password::HashFormatError;
pub use password::HashingParams;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordPolicy;
