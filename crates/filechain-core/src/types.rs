//! Strong type definitions for filechain.
//!
//! Positions, sizes, and times are newtypes to prevent mixing them up at
//! compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ValidationError;

/// Position of a block in the chain arena. Genesis is index 0.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockIndex(pub u64);

impl BlockIndex {
    /// Index of the genesis block.
    pub const GENESIS: Self = Self(0);

    /// Index of the block that follows this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Position as a `usize` for arena lookups.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

const MICROS_PER_SEC: u64 = 1_000_000;

/// Wall-clock creation time of a block.
///
/// Held as whole microseconds since the Unix epoch so that the canonical
/// text form (`"<secs>.<micros>"`, six fractional digits) round-trips
/// exactly through storage. [`Timestamp::as_secs_f64`] gives the
/// floating-point seconds view.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Self = Self(0);

    /// Create from microseconds since the Unix epoch.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Microseconds since the Unix epoch.
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Seconds since the Unix epoch as a float.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / MICROS_PER_SEC as f64
    }

    /// Convert a system time, clamping anything before the epoch to the epoch.
    pub fn from_system_time(time: SystemTime) -> Self {
        let micros = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros().min(u64::MAX as u128) as u64)
            .unwrap_or(0);
        Self(micros)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Fixed-precision text form used for hashing and storage.
    pub fn canonical(&self) -> String {
        format!(
            "{}.{:06}",
            self.0 / MICROS_PER_SEC,
            self.0 % MICROS_PER_SEC
        )
    }

    /// Parse the canonical text form produced by [`Timestamp::canonical`].
    pub fn parse_canonical(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimestamp(s.to_string());

        let (secs, frac) = s.split_once('.').ok_or_else(invalid)?;
        if secs.is_empty()
            || frac.len() != 6
            || !secs.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let secs: u64 = secs.parse().map_err(|_| invalid())?;
        let frac: u64 = frac.parse().map_err(|_| invalid())?;
        secs.checked_mul(MICROS_PER_SEC)
            .and_then(|m| m.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.canonical())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Size of a transferred file in bytes.
///
/// Accepted from callers either as an integer or as a numeric string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSize(u64);

impl FileSize {
    pub const ZERO: Self = Self(0);

    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// Parse a decimal string of ASCII digits.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::EmptyFileSize);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidFileSize(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidFileSize(s.to_string()))
    }
}

impl fmt::Debug for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSize({})", self.0)
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for FileSize {
    type Error = ValidationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FileSize {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&String> for FileSize {
    type Error = ValidationError;

    fn try_from(s: &String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

macro_rules! file_size_from_unsigned {
    ($($t:ty),*) => {$(
        impl TryFrom<$t> for FileSize {
            type Error = ValidationError;

            fn try_from(n: $t) -> Result<Self, Self::Error> {
                Ok(Self(n as u64))
            }
        }
    )*};
}

macro_rules! file_size_from_signed {
    ($($t:ty),*) => {$(
        impl TryFrom<$t> for FileSize {
            type Error = ValidationError;

            fn try_from(n: $t) -> Result<Self, Self::Error> {
                u64::try_from(n)
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidFileSize(n.to_string()))
            }
        }
    )*};
}

file_size_from_unsigned!(u8, u16, u32, u64);
file_size_from_signed!(i8, i16, i32, i64);
