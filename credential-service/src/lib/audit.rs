use std::fmt;

use auth::PasswordError;
use auth::PasswordHasher;

/// Outcome of checking one stored hash against the current policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashVerdict {
    /// Produced with the current parameters
    Current,
    /// Valid, but produced with other parameters
    Rehash,
    /// Cannot be decoded or verified
    Malformed(PasswordError),
}

impl HashVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashVerdict::Current => "current",
            HashVerdict::Rehash => "rehash",
            HashVerdict::Malformed(_) => "malformed",
        }
    }
}

impl fmt::Display for HashVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a stored hash. Surrounding whitespace is ignored.
pub fn classify(hasher: &PasswordHasher, encoded_hash: &str) -> HashVerdict {
    match hasher.needs_rehash(encoded_hash.trim()) {
        Ok(false) => HashVerdict::Current,
        Ok(true) => HashVerdict::Rehash,
        Err(e) => HashVerdict::Malformed(e),
    }
}

/// Running totals for an audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub current: usize,
    pub rehash: usize,
    pub malformed: usize,
}

impl AuditSummary {
    pub fn record(&mut self, verdict: &HashVerdict) {
        match verdict {
            HashVerdict::Current => self.current += 1,
            HashVerdict::Rehash => self.rehash += 1,
            HashVerdict::Malformed(_) => self.malformed += 1,
        }
    }

    /// Process exit status: 1 when any hash was malformed.
    pub fn exit_code(&self) -> i32 {
        if self.malformed > 0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use auth::EncodedHash;
    use auth::HashingParams;
    use auth::PasswordPolicy;

    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_config(
            HashingParams {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
                ..HashingParams::default()
            },
            PasswordPolicy::unbounded(),
        )
        .expect("Failed to build hasher")
    }

    #[test]
    fn test_current_hash() {
        let hasher = hasher();
        let hash = hasher.hash("password").unwrap();

        assert_eq!(classify(&hasher, &hash), HashVerdict::Current);
        // Lines read from a file keep their newline
        assert_eq!(classify(&hasher, &format!("  {hash}\n")), HashVerdict::Current);
    }

    #[test]
    fn test_outdated_hash() {
        let hasher = hasher();
        let old = "$argon2id$v=19$m=65536,t=2,p=1$c29tZXNhbHQ$CTFhFdXPJO1aFaMaO6Mm5c8y7cJHAph8ArZWb2GRPPc";
        assert_eq!(classify(&hasher, old), HashVerdict::Rehash);
    }

    #[test]
    fn test_padded_base64_hash_is_current() {
        let hasher = hasher();
        let canonical = hasher.hash("password").unwrap();
        let segments: Vec<&str> = canonical.split('$').collect();
        // 16-byte salt takes two padding characters, 32-byte hash one
        let padded = format!(
            "${}${}${}${}==${}=",
            segments[1], segments[2], segments[3], segments[4], segments[5]
        );

        assert_eq!(EncodedHash::parse(&padded).unwrap().to_string(), canonical);
        assert_eq!(classify(&hasher, &padded), HashVerdict::Current);
    }

    #[test]
    fn test_malformed_hashes() {
        let hasher = hasher();
        for line in [
            "not-a-hash",
            "$argon2i$v=19$m=8,t=1,p=1$c29tZXNhbHQ$c29tZWhhc2g",
            "$argon2id$v=19$m=8,t=1,p=1$AAAA$AAAA",
            "$argon2id$v=19$m=4294967295,t=1,p=1$c29tZXNhbHQ$c29tZWhhc2g",
        ] {
            let verdict = classify(&hasher, line);
            assert!(
                matches!(&verdict, HashVerdict::Malformed(e) if e.is_malformed()),
                "{line}: {verdict:?}"
            );
            assert_eq!(verdict.to_string(), "malformed");
        }
    }

    #[test]
    fn test_summary_exit_code() {
        let hasher = hasher();
        let mut summary = AuditSummary::default();

        summary.record(&classify(&hasher, &hasher.hash("password").unwrap()));
        summary.record(&HashVerdict::Rehash);
        assert_eq!(summary.exit_code(), 0);

        summary.record(&classify(&hasher, "garbage"));
        assert_eq!(
            summary,
            AuditSummary {
                current: 1,
                rehash: 1,
                malformed: 1
            }
        );
        assert_eq!(summary.exit_code(), 1);
    }
}
