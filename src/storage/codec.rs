//! Document framing and float encoding for persisted documents.
//!
//! Every document is stored as
//!
//! ```text
//! [payload_len: u32 LE][crc32(payload): u32 LE][payload: JSON]
//! ```
//!
//! JSON has no spelling for non-finite numbers, so `f64` fields that may hold
//! them are written through the [`real`], [`reals`] and [`optional_reals`]
//! adapters, which emit the tokens `"+inf"`, `"-inf"` and `"nan"` instead.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{Error, Result};

pub const FRAME_HEADER_LEN: usize = 8;

const POS_INF: &str = "+inf";
const NEG_INF: &str = "-inf";
const NAN: &str = "nan";

pub fn frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| Error::Corrupt("document too large"))?;
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

pub fn unframe(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(Error::Corrupt("document shorter than frame header"));
    }
    let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let stored = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let payload = &bytes[FRAME_HEADER_LEN..];
    if payload.len() != len {
        return Err(Error::Corrupt("document length mismatch"));
    }
    let computed = crc32fast::hash(payload);
    if computed != stored {
        return Err(Error::ChecksumMismatch { stored, computed });
    }
    Ok(payload)
}

pub fn encode_document<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(value)?;
    frame(&payload)
}

pub fn decode_document<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(unframe(bytes)?)?)
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireReal {
    Number(f64),
    Token(String),
}

impl WireReal {
    fn encode(value: f64) -> Self {
        if value.is_finite() {
            WireReal::Number(value)
        } else if value.is_nan() {
            WireReal::Token(NAN.to_string())
        } else if value.is_sign_positive() {
            WireReal::Token(POS_INF.to_string())
        } else {
            WireReal::Token(NEG_INF.to_string())
        }
    }

    fn decode(self) -> std::result::Result<f64, String> {
        match self {
            WireReal::Number(value) => Ok(value),
            WireReal::Token(token) => match token.as_str() {
                POS_INF => Ok(f64::INFINITY),
                NEG_INF => Ok(f64::NEG_INFINITY),
                NAN => Ok(f64::NAN),
                other => Err(format!("invalid real token `{other}`")),
            },
        }
    }
}

pub mod real {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WireReal::encode(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
        WireReal::deserialize(deserializer)?
            .decode()
            .map_err(serde::de::Error::custom)
    }
}

pub mod optional_real {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<f64>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        value.map(WireReal::encode).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<f64>, D::Error> {
        Option::<WireReal>::deserialize(deserializer)?
            .map(WireReal::decode)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

pub mod reals {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| WireReal::encode(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<f64>, D::Error> {
        Vec::<WireReal>::deserialize(deserializer)?
            .into_iter()
            .map(WireReal::decode)
            .collect::<std::result::Result<_, _>>()
            .map_err(serde::de::Error::custom)
    }
}

pub mod optional_reals {
    use super::*;

    pub fn serialize<S: Serializer>(
        values: &[Option<f64>],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.map(WireReal::encode)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<Option<f64>>, D::Error> {
        Vec::<Option<WireReal>>::deserialize(deserializer)?
            .into_iter()
            .map(|v| v.map(WireReal::decode).transpose())
            .collect::<std::result::Result<_, _>>()
            .map_err(serde::de::Error::custom)
    }
}
