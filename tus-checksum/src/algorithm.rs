use std::{fmt, str::FromStr};

/// A checksum algorithm the protocol may advertise or the caller may select.
///
/// The registry is intentionally a closed set rather than an open plugin system: these three
/// cover every algorithm a real tus server commonly advertises in `Tus-Extension: checksum`
/// negotiation.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// `sha256`, the default.
    Sha256,
    /// `sha1`.
    Sha1,
    /// `md5`.
    Md5,
}

impl Algorithm {
    /// The lowercase name sent literally in `Upload-Checksum` / matched against
    /// `Tus-Checksum-Algorithm`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a name does not match any algorithm in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAlgorithm(pub String);

impl fmt::Display for UnknownAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown checksum algorithm: {}", self.0)
    }
}

impl std::error::Error for UnknownAlgorithm {}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha1" => Ok(Self::Sha1),
            "md5" => Ok(Self::Md5),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}
