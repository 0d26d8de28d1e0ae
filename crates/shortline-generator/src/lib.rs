use shortline_core::ShortCode;
use shortline_snowflake::{Clock, Snowflake, SnowflakeId};
use thiserror::Error;

/// Errors from a [`Generator`]. None of them are expected in normal operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error(transparent)]
    Snowflake(#[from] shortline_snowflake::Error),
}

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
///
/// Implementations can vary from simple sequential generators to
/// distributed ID generators (e.g., Snowflake, UUID, etc.)
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;
    /// Generates a type that can be converted into a globally unique short code.
    fn generate(&self) -> Result<Self::Output, GeneratorError>;
}

impl<C: Clock + 'static> Generator for Snowflake<C> {
    type Output = SnowflakeId;

    fn generate(&self) -> Result<Self::Output, GeneratorError> {
        Ok(self.next_id()?)
    }
}
