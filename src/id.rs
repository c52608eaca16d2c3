use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use lazy_static::lazy_static;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    Decode, Encode, Postgres, Type,
};
use thiserror::Error;
use time::OffsetDateTime;

const ID_LEN: usize = 12;

lazy_static! {
    static ref PROCESS_UNIQUE: [u8; 5] = rand::random();
    static ref COUNTER: AtomicU32 = AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff);
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid id {0:?}: expected 24 hex characters")]
pub struct InvalidRecordId(pub String);

/// Opaque 12-byte record identity.
///
/// Layout: 4 bytes big-endian unix seconds, 5 bytes fixed per process,
/// 3 bytes of a wrapping counter. Always rendered as 24 lowercase hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; ID_LEN]);

impl RecordId {
    pub fn new() -> Self {
        let secs = OffsetDateTime::now_utc().unix_timestamp() as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; ID_LEN];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.to_hex())
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_LEN * 2 {
            return Err(InvalidRecordId(s.to_string()));
        }
        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidRecordId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// Stored as BYTEA.
impl Type<Postgres> for RecordId {
    fn type_info() -> PgTypeInfo {
        <Vec<u8> as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <Vec<u8> as Type<Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Postgres> for RecordId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        let bytes: &[u8] = &self.0;
        <&[u8] as Encode<'q, Postgres>>::encode_by_ref(&bytes, buf)
    }
}

impl<'r> Decode<'r, Postgres> for RecordId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let bytes = <&[u8] as Decode<'r, Postgres>>::decode(value)?;
        let bytes: [u8; ID_LEN] = bytes
            .try_into()
            .map_err(|_| format!("record id must be {ID_LEN} bytes, got {}", bytes.len()))?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_is_24_lowercase_chars() {
        let id = RecordId::new();
        let hex = id.to_string();
        assert_eq!(hex.len(), 24);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hex.parse::<RecordId>().unwrap(), id);
    }

    #[test]
    fn ids_are_unique_and_time_prefixed() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);

        let secs = u32::from_be_bytes(a.0[..4].try_into().unwrap());
        let now = OffsetDateTime::now_utc().unix_timestamp() as u32;
        assert!(now - secs <= 1);
    }

    #[test]
    fn parse_rejects_wrong_length_and_non_hex() {
        assert!("abc".parse::<RecordId>().is_err());
        assert!("zzzzzzzzzzzzzzzzzzzzzzzz".parse::<RecordId>().is_err());
        assert!("0123456789abcdef0123456789".parse::<RecordId>().is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = RecordId([0xab; 12]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abababababababababababab\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<RecordId>("\"nope\"").is_err());
    }
}
