use modular_bitfield::prelude::*;
use std::cmp::Ordering;
use std::fmt;

/// A 64-bit Snowflake identifier.
///
/// Fields are declared least significant first, so the packed `u64` orders
/// by timestamp, then instance id, then sequence. The top bit is reserved and
/// always zero, which keeps every id a non-negative `i64`.
#[bitfield]
#[repr(u64)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnowflakeId {
    /// 12 bits for sequence number (resets every millisecond).
    pub sequence: B12,
    /// 10 bits for instance ID (allows up to 1024 instances).
    pub instance_id: B10,
    /// 41 bits for timestamp (milliseconds since a custom epoch).
    pub timestamp: B41,
    #[skip]
    __: B1,
}

impl SnowflakeId {
    pub const SEQUENCE_BITS: u32 = 12;
    pub const INSTANCE_ID_BITS: u32 = 10;
    pub const TIMESTAMP_BITS: u32 = 41;

    pub const MAX_SEQUENCE: u16 = (1 << Self::SEQUENCE_BITS) - 1;
    pub const MAX_INSTANCE_ID: u16 = (1 << Self::INSTANCE_ID_BITS) - 1;
    pub const MAX_TIMESTAMP: u64 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Composes an id from its three fields.
    ///
    /// Callers must keep every field within its bit width.
    pub fn from_parts(timestamp: u64, instance_id: u16, sequence: u16) -> Self {
        Self::new()
            .with_timestamp(timestamp)
            .with_instance_id(instance_id)
            .with_sequence(sequence)
    }

    pub fn as_u64(self) -> u64 {
        u64::from(self)
    }

    /// The id as a signed integer; never negative.
    pub fn as_i64(self) -> i64 {
        self.as_u64() as i64
    }
}

impl PartialOrd for SnowflakeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SnowflakeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_u64().cmp(&other.as_u64())
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("timestamp", &self.timestamp())
            .field("instance_id", &self.instance_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u64())
    }
}
