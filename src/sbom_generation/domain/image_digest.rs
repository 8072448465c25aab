use crate::shared::error::SbomError;
use crate::shared::Result;
use std::fmt;

/// Length of a hex-encoded sha256 digest
const SHA256_HEX_LENGTH: usize = 64;

/// Maximum accepted length for the hex part of any digest algorithm
const MAX_HEX_LENGTH: usize = 128;

/// Content digest of an image manifest, `<algorithm>:<hex>`.
///
/// The hex part is kept exactly as given (case-preserving) because it is
/// used verbatim as a cache directory name. Validation restricts both parts
/// to characters that cannot escape that directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDigest {
    algorithm: String,
    hex: String,
}

impl ImageDigest {
    pub fn parse(digest: &str) -> Result<Self> {
        let invalid = |reason: &str| SbomError::InvalidDigest {
            digest: digest.to_string(),
            reason: reason.to_string(),
        };

        let (algorithm, hex) = digest
            .split_once(':')
            .ok_or_else(|| invalid("missing '<algorithm>:' prefix"))?;

        if algorithm.is_empty()
            || !algorithm
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(invalid("algorithm must be lowercase alphanumeric").into());
        }

        if hex.is_empty() || hex.len() > MAX_HEX_LENGTH {
            return Err(invalid("hex part has an invalid length").into());
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("hex part contains non-hex characters").into());
        }

        if algorithm == "sha256" && hex.len() != SHA256_HEX_LENGTH {
            return Err(invalid("sha256 digests have 64 hex characters").into());
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex.to_string(),
        })
    }

    /// Whether a user-supplied reference looks like a bare content digest.
    pub fn looks_like_digest(reference: &str) -> bool {
        reference.starts_with("sha256:")
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for ImageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}
