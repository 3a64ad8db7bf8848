use thiserror::Error;

/// Structural problems found while decoding a PHC-format hash string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HashFormatError {
    #[error("Encoded hash is empty")]
    Empty,

    #[error("Expected {expected} '$'-separated segments, got {actual}")]
    SegmentCount { expected: usize, actual: usize },

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid version segment: {0}")]
    InvalidVersion(String),

    #[error("Invalid parameter segment (expected m=<int>,t=<int>,p=<int>): {0}")]
    InvalidParameters(String),

    #[error("Parameter '{name}' is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("Invalid base64 in {field}: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },

    #[error("Unsupported Argon2 version: {0}")]
    UnsupportedVersion(u32),

    #[error("Parameter '{name}' out of range: {value}")]
    ParameterOutOfRange { name: &'static str, value: u32 },

    #[error("Memory cost {memory_kib} KiB is below 8 KiB per lane ({parallelism} lanes)")]
    MemoryBelowLanes { memory_kib: u32, parallelism: u32 },

    #[error("Parameter '{name}' exceeds the verification limit: {value} > {max}")]
    CostExceedsLimit {
        name: &'static str,
        value: u32,
        max: u32,
    },

    #[error("Decoded {field} too short: minimum {min} bytes, got {actual}")]
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },
}

/// Error type for password operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Hash cannot be empty")]
    EmptyHash,

    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Malformed password hash: {0}")]
    MalformedHash(#[from] HashFormatError),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

impl PasswordError {
    /// Whether the error comes from a corrupt or foreign stored hash rather
    /// than from the caller's input.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PasswordError::MalformedHash(_))
    }
}
