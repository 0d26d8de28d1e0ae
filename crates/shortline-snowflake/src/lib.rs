//! Time-ordered, per-instance unique 64-bit identifiers.
//!
//! Each [`SnowflakeId`] packs a millisecond timestamp (relative to a custom
//! epoch), the generator's instance id and a per-millisecond sequence.

mod clock;
pub mod error;
mod snowflake;
mod snowflake_id;

pub use clock::{Clock, SystemClock};
pub use error::Error;
pub use snowflake::{Snowflake, SnowflakeSettings, DEFAULT_EPOCH_MILLIS};
pub use snowflake_id::SnowflakeId;
