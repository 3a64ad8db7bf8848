use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::DecodePaddingMode;
use base64::Engine;

use super::errors::HashFormatError;

/// Algorithm identifier written into every encoded hash.
pub const ALGORITHM: &str = "argon2id";

/// Argon2 version 1.3.
pub const VERSION: u32 = 0x13;

/// Argon2 version 1.0, still accepted when reading stored hashes.
pub const LEGACY_VERSION: u32 = 0x10;

const MIN_SALT_LEN: usize = 8;
const MIN_HASH_LEN: usize = 4;
const MAX_PARALLELISM: u32 = 0x00FF_FFFF;

/// Standard alphabet; writes unpadded, reads padded or unpadded.
const B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded form of a PHC string:
/// `$argon2id$v=<version>$m=<memoryKB>,t=<iterations>,p=<parallelism>$<salt>$<hash>`.
///
/// The hash is self-describing: verification reads its parameters from here,
/// never from the current policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedHash {
    pub version: u32,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

impl EncodedHash {
    const SEGMENTS: usize = 6;

    /// Parse a PHC string.
    ///
    /// # Arguments
    /// * `encoded` - Stored hash string
    ///
    /// # Returns
    /// Decoded algorithm parameters, salt and derived hash
    ///
    /// # Errors
    /// * `Empty` - Input is empty
    /// * `SegmentCount` - Input does not have exactly five `$`-prefixed segments
    /// * `UnsupportedAlgorithm` - Algorithm tag is not `argon2id`
    /// * `InvalidVersion` - Version segment is not `v=<int>`
    /// * `InvalidParameters` - Parameter segment is not `m=..,t=..,p=..`
    /// * `InvalidNumber` - A numeric field does not parse
    /// * `InvalidBase64` - Salt or hash is not valid base64
    /// * `UnsupportedVersion` - Version is neither 0x10 nor 0x13
    /// * `ParameterOutOfRange` / `MemoryBelowLanes` - Costs Argon2 cannot run with
    /// * `TooShort` - Salt under 8 bytes or hash under 4 bytes
    pub fn parse(encoded: &str) -> Result<Self, HashFormatError> {
        if encoded.is_empty() {
            return Err(HashFormatError::Empty);
        }

        let segments: Vec<&str> = encoded.split('$').collect();
        if segments.len() != Self::SEGMENTS || !segments[0].is_empty() {
            return Err(HashFormatError::SegmentCount {
                expected: Self::SEGMENTS - 1,
                actual: segments.len().saturating_sub(1),
            });
        }

        if segments[1] != ALGORITHM {
            return Err(HashFormatError::UnsupportedAlgorithm(
                segments[1].to_string(),
            ));
        }

        let version = Self::parse_version(segments[2])?;
        let (memory_kib, iterations, parallelism) = Self::parse_params(segments[3])?;
        let salt = Self::decode_b64("salt", segments[4])?;
        let hash = Self::decode_b64("hash", segments[5])?;

        let decoded = Self {
            version,
            memory_kib,
            iterations,
            parallelism,
            salt,
            hash,
        };
        decoded.check_ranges()?;

        Ok(decoded)
    }

    /// Reject values that decode cleanly but that Argon2 cannot derive with.
    fn check_ranges(&self) -> Result<(), HashFormatError> {
        if self.version != VERSION && self.version != LEGACY_VERSION {
            return Err(HashFormatError::UnsupportedVersion(self.version));
        }
        if self.iterations == 0 {
            return Err(HashFormatError::ParameterOutOfRange {
                name: "t",
                value: self.iterations,
            });
        }
        if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
            return Err(HashFormatError::ParameterOutOfRange {
                name: "p",
                value: self.parallelism,
            });
        }
        if u64::from(self.memory_kib) < 8 * u64::from(self.parallelism) {
            return Err(HashFormatError::MemoryBelowLanes {
                memory_kib: self.memory_kib,
                parallelism: self.parallelism,
            });
        }
        if self.salt.len() < MIN_SALT_LEN {
            return Err(HashFormatError::TooShort {
                field: "salt",
                min: MIN_SALT_LEN,
                actual: self.salt.len(),
            });
        }
        if self.hash.len() < MIN_HASH_LEN {
            return Err(HashFormatError::TooShort {
                field: "hash",
                min: MIN_HASH_LEN,
                actual: self.hash.len(),
            });
        }
        Ok(())
    }

    fn parse_version(segment: &str) -> Result<u32, HashFormatError> {
        let value = segment
            .strip_prefix("v=")
            .ok_or_else(|| HashFormatError::InvalidVersion(segment.to_string()))?;
        parse_number("v", value)
    }

    fn parse_params(segment: &str) -> Result<(u32, u32, u32), HashFormatError> {
        let invalid = || HashFormatError::InvalidParameters(segment.to_string());

        let mut fields = segment.split(',');
        let mut next = |name: &'static str| -> Result<u32, HashFormatError> {
            let field = fields.next().ok_or_else(invalid)?;
            let (key, value) = field.split_once('=').ok_or_else(invalid)?;
            if key != name {
                return Err(invalid());
            }
            parse_number(name, value)
        };

        let memory_kib = next("m")?;
        let iterations = next("t")?;
        let parallelism = next("p")?;

        if fields.next().is_some() {
            return Err(invalid());
        }

        Ok((memory_kib, iterations, parallelism))
    }

    fn decode_b64(field: &'static str, value: &str) -> Result<Vec<u8>, HashFormatError> {
        if value.is_empty() {
            return Err(HashFormatError::InvalidBase64 {
                field,
                reason: "empty".to_string(),
            });
        }
        B64.decode(value)
            .map_err(|e| HashFormatError::InvalidBase64 {
                field,
                reason: e.to_string(),
            })
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u32, HashFormatError> {
    // u32::from_str accepts a leading '+', PHC decimals do not.
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HashFormatError::InvalidNumber {
            name,
            value: value.to_string(),
        });
    }
    value.parse().map_err(|_| HashFormatError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

impl FromStr for EncodedHash {
    type Err = HashFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}$v={}$m={},t={},p={}${}${}",
            ALGORITHM,
            self.version,
            self.memory_kib,
            self.iterations,
            self.parallelism,
            B64.encode(&self.salt),
            B64.encode(&self.hash),
        )
    }
}
