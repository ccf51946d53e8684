//! Registered header parameters and their type checks

use crate::codec::{base64_std_decode, base64_url_decode};
use crate::error::{JoseError, JoseResult};
use serde::de::{self, DeserializeSeed, MapAccess, Visitor};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

pub(crate) const ALG: &str = "alg";
pub(crate) const JKU: &str = "jku";
pub(crate) const JWK: &str = "jwk";
pub(crate) const KID: &str = "kid";
pub(crate) const X5U: &str = "x5u";
pub(crate) const X5C: &str = "x5c";
pub(crate) const X5T: &str = "x5t";
pub(crate) const X5T_S256: &str = "x5t#S256";
pub(crate) const TYP: &str = "typ";
pub(crate) const CTY: &str = "cty";
pub(crate) const CRIT: &str = "crit";
pub(crate) const B64: &str = "b64";

/// Parameters defined by RFC 7515 §4.1; `crit` may not name these.
const REGISTERED: [&str; 11] = [ALG, JKU, JWK, KID, X5U, X5C, X5T, X5T_S256, TYP, CTY, CRIT];

const SHA1_LEN: usize = 20;
const SHA256_LEN: usize = 32;

/// Type-check one parameter. Unknown names always pass.
pub(crate) fn validate(name: &str, value: &Value) -> JoseResult<()> {
    match name {
        ALG | JKU | KID | X5U | TYP | CTY => expect_string(name, value).map(|_| ()),
        JWK => match value {
            Value::Object(_) => Ok(()),
            _ => Err(type_error(name, "a JSON object")),
        },
        X5C => {
            let chain = value
                .as_array()
                .ok_or_else(|| type_error(name, "an array of strings"))?;
            if chain.is_empty() {
                return Err(JoseError::invalid_header("x5c must not be empty"));
            }
            for cert in chain {
                let cert = expect_string(name, cert)?;
                let der = base64_std_decode(cert, "x5c certificate")?;
                if der.is_empty() {
                    return Err(JoseError::invalid_header("x5c certificate is empty"));
                }
            }
            Ok(())
        }
        X5T => expect_digest(name, value, SHA1_LEN),
        X5T_S256 => expect_digest(name, value, SHA256_LEN),
        CRIT => critical_names(value).map(|_| ()),
        B64 => match value {
            Value::Bool(_) => Ok(()),
            _ => Err(type_error(name, "a boolean")),
        },
        _ => Ok(()),
    }
}

/// Names listed in a `crit` value, checked for shape and uniqueness.
pub(crate) fn critical_names(value: &Value) -> JoseResult<Vec<&str>> {
    let entries = value
        .as_array()
        .ok_or_else(|| type_error(CRIT, "an array of strings"))?;
    if entries.is_empty() {
        return Err(JoseError::invalid_header("crit must not be empty"));
    }
    let mut seen = HashSet::with_capacity(entries.len());
    let mut names = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = expect_string(CRIT, entry)?;
        if REGISTERED.contains(&name) {
            return Err(JoseError::InvalidHeader(format!(
                "crit must not list registered parameter {name}"
            )));
        }
        if !seen.insert(name) {
            return Err(JoseError::InvalidHeader(format!("crit lists {name} twice")));
        }
        names.push(name);
    }
    Ok(names)
}

fn expect_string<'a>(name: &str, value: &'a Value) -> JoseResult<&'a str> {
    value.as_str().ok_or_else(|| type_error(name, "a string"))
}

fn expect_digest(name: &str, value: &Value, len: usize) -> JoseResult<()> {
    let encoded = expect_string(name, value)?;
    let digest = base64_url_decode(encoded.as_bytes(), "certificate thumbprint")?;
    if digest.len() != len {
        return Err(JoseError::InvalidHeader(format!(
            "{name} must be {len} bytes, got {}",
            digest.len()
        )));
    }
    Ok(())
}

fn type_error(name: &str, expected: &str) -> JoseError {
    JoseError::InvalidHeader(format!("{name} must be {expected}"))
}

/// Deserializes a JSON object into an ordered map, remembering the first
/// member name that appears twice. `serde_json::Map` would silently keep the
/// last value.
pub(crate) struct UniqueMembers<'a> {
    pub(crate) duplicate: &'a mut Option<String>,
}

impl<'de> DeserializeSeed<'de> for UniqueMembers<'_> {
    type Value = Map<String, Value>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for UniqueMembers<'_> {
    type Value = Map<String, Value>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut members = Map::new();
        while let Some(name) = access.next_key::<String>()? {
            if members.contains_key(&name) {
                let message = format!("duplicate member {name}");
                *self.duplicate = Some(name);
                return Err(de::Error::custom(message));
            }
            let value = access.next_value::<Value>()?;
            members.insert(name, value);
        }
        Ok(members)
    }
}
