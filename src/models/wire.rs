//! Tolerant field decoders for backend payloads.
//!
//! The backend serializes primary keys as numbers on some routes and as strings on
//! others, and decimals as strings.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
    Float(f64),
}

pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Str(s) => s,
        StringOrNumber::Int(n) => n.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    })
}

pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Str(s)) => Some(s),
        Some(StringOrNumber::Int(n)) => Some(n.to_string()),
        Some(StringOrNumber::Float(f)) => Some(f.to_string()),
        None => None,
    })
}

pub fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Str(s)) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid decimal: {s}"))),
        Some(StringOrNumber::Int(n)) => Ok(n as f64),
        Some(StringOrNumber::Float(f)) => Ok(f),
        None => Ok(0.0),
    }
}
