use crate::base62;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use shortline_snowflake::SnowflakeId;
use smol_str::SmolStr;
use std::fmt::Display;

/// A short code identifying a stored URL.
///
/// Short codes are the base62 encoding of a generated identifier, so they
/// contain only `[0-9A-Za-z]` and decode back to exactly one integer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortCode(SmolStr);

impl ShortCode {
    /// Encodes an identifier as a short code.
    ///
    /// # Examples
    ///
    /// ```
    /// use shortline_core::ShortCode;
    ///
    /// assert_eq!(ShortCode::generated(62).as_str(), "10");
    /// ```
    pub fn generated(id: u64) -> Self {
        Self(SmolStr::new(base62::encode(id)))
    }

    /// Creates a new `ShortCode` after validating the input.
    ///
    /// Valid codes are the canonical base62 form of some `u64`.
    pub fn new(code: impl AsRef<str>) -> Result<Self, CoreError> {
        let code = code.as_ref();
        base62::decode(code)?;
        Ok(Self(SmolStr::new(code)))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources.
    pub fn new_unchecked(code: impl AsRef<str>) -> Self {
        Self(SmolStr::new(code))
    }

    /// Decodes the short code back into the identifier it was built from.
    pub fn id(&self) -> Result<u64, CoreError> {
        base62::decode(&self.0)
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SnowflakeId> for ShortCode {
    fn from(id: SnowflakeId) -> Self {
        Self::generated(id.as_u64())
    }
}

impl std::fmt::Debug for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortCode").field(&self.0).finish()
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShortCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShortCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = SmolStr::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}
