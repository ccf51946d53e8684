//! JOSE header model
//!
//! A [`Header`] keeps every parameter in insertion order, registered or not,
//! so unknown parameters survive a parse and re-encode. Registered parameters
//! are type-checked whenever they enter the header, whether by parsing or by a
//! setter. Decoding a protected header never feeds back into a signing input:
//! the engine keeps the original wire text alongside the parsed value.

pub(crate) mod params;

use crate::codec::{base64_std_decode, base64_url_decode};
use crate::error::{JoseError, JoseResult};
use params::UniqueMembers;
use serde::de::DeserializeSeed;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Parsed JOSE header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    params: Map<String, Value>,
}

impl Header {
    /// Empty header
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a header from the bytes of a JSON object.
    ///
    /// Duplicate member names fail with [`JoseError::DuplicateParameter`];
    /// malformed JSON or a registered parameter of the wrong type fails with
    /// [`JoseError::InvalidHeader`].
    pub fn parse(json: &[u8]) -> JoseResult<Self> {
        let mut duplicate = None;
        let mut de = serde_json::Deserializer::from_slice(json);
        let parsed = UniqueMembers {
            duplicate: &mut duplicate,
        }
        .deserialize(&mut de)
        .and_then(|params| de.end().map(|()| params));

        let params = match (parsed, duplicate) {
            (_, Some(name)) => return Err(JoseError::DuplicateParameter(name)),
            (Ok(params), None) => params,
            (Err(err), None) => return Err(JoseError::InvalidHeader(err.to_string())),
        };
        for (name, value) in &params {
            params::validate(name, value)?;
        }
        Ok(Self { params })
    }

    /// Disjoint union of a protected and an unprotected header.
    ///
    /// A parameter present in both is an error, never an overwrite. Protected
    /// parameters come first in the result.
    pub fn merge(protected: &Header, unprotected: &Header) -> JoseResult<Header> {
        let mut merged = protected.clone();
        for (name, value) in &unprotected.params {
            if merged.params.contains_key(name) {
                return Err(JoseError::DuplicateParameter(name.clone()));
            }
            merged.params.insert(name.clone(), value.clone());
        }
        Ok(merged)
    }

    /// Serialize the parameters as a JSON object, in insertion order.
    pub fn encode(&self) -> JoseResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.params)?)
    }

    /// Raw parameter value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Whether `name` is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the header has no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// All parameters, in insertion order
    #[must_use]
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Insert or replace a parameter after type-checking it
    pub fn set_param(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> JoseResult<()> {
        let name = name.into();
        let value = value.into();
        params::validate(&name, &value)?;
        self.params.insert(name, value);
        Ok(())
    }

    /// Builder form of [`Header::set_param`]
    pub fn with_param(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> JoseResult<Self> {
        self.set_param(name, value)?;
        Ok(self)
    }

    /// Remove a parameter, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.params.shift_remove(name)
    }

    fn str_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    fn set_str(&mut self, name: &str, value: impl Into<String>) {
        self.params
            .insert(name.to_string(), Value::String(value.into()));
    }

    /// `alg`
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.str_param(params::ALG)
    }

    /// Set `alg`
    pub fn set_algorithm(&mut self, alg: impl Into<String>) {
        self.set_str(params::ALG, alg);
    }

    /// Builder form of [`Header::set_algorithm`]
    #[must_use]
    pub fn with_algorithm(mut self, alg: impl Into<String>) -> Self {
        self.set_algorithm(alg);
        self
    }

    /// `kid`
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.str_param(params::KID)
    }

    /// Set `kid`
    pub fn set_key_id(&mut self, kid: impl Into<String>) {
        self.set_str(params::KID, kid);
    }

    /// Builder form of [`Header::set_key_id`]
    #[must_use]
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.set_key_id(kid);
        self
    }

    /// `typ`
    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.str_param(params::TYP)
    }

    /// Set `typ`
    pub fn set_type(&mut self, typ: impl Into<String>) {
        self.set_str(params::TYP, typ);
    }

    /// Builder form of [`Header::set_type`]
    #[must_use]
    pub fn with_type(mut self, typ: impl Into<String>) -> Self {
        self.set_type(typ);
        self
    }

    /// `cty`
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.str_param(params::CTY)
    }

    /// Set `cty`
    pub fn set_content_type(&mut self, cty: impl Into<String>) {
        self.set_str(params::CTY, cty);
    }

    /// Builder form of [`Header::set_content_type`]
    #[must_use]
    pub fn with_content_type(mut self, cty: impl Into<String>) -> Self {
        self.set_content_type(cty);
        self
    }

    /// `jku`
    #[must_use]
    pub fn jwk_set_url(&self) -> Option<&str> {
        self.str_param(params::JKU)
    }

    /// `x5u`
    #[must_use]
    pub fn x509_url(&self) -> Option<&str> {
        self.str_param(params::X5U)
    }

    /// `jwk`
    #[must_use]
    pub fn jwk(&self) -> Option<&Map<String, Value>> {
        self.params.get(params::JWK).and_then(Value::as_object)
    }

    /// Set `jwk`
    pub fn set_jwk(&mut self, jwk: Map<String, Value>) {
        self.params.insert(params::JWK.to_string(), Value::Object(jwk));
    }

    /// `x5c` as DER certificates
    pub fn x509_chain(&self) -> JoseResult<Option<Vec<Vec<u8>>>> {
        let Some(chain) = self.params.get(params::X5C).and_then(Value::as_array) else {
            return Ok(None);
        };
        chain
            .iter()
            .filter_map(Value::as_str)
            .map(|cert| base64_std_decode(cert, "x5c certificate"))
            .collect::<JoseResult<Vec<_>>>()
            .map(Some)
    }

    /// `x5t` digest bytes
    pub fn x509_sha1_thumbprint(&self) -> JoseResult<Option<Vec<u8>>> {
        self.digest_param(params::X5T)
    }

    /// `x5t#S256` digest bytes
    pub fn x509_sha256_thumbprint(&self) -> JoseResult<Option<Vec<u8>>> {
        self.digest_param(params::X5T_S256)
    }

    fn digest_param(&self, name: &str) -> JoseResult<Option<Vec<u8>>> {
        self.str_param(name)
            .map(|encoded| base64_url_decode(encoded.as_bytes(), "certificate thumbprint"))
            .transpose()
    }

    /// Names listed in `crit`
    #[must_use]
    pub fn critical(&self) -> Option<Vec<&str>> {
        self.params
            .get(params::CRIT)
            .and_then(|value| params::critical_names(value).ok())
    }

    /// Set `crit`
    pub fn set_critical<I, S>(&mut self, names: I) -> JoseResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<Value> = names.into_iter().map(|n| Value::String(n.into())).collect();
        self.set_param(params::CRIT, Value::Array(names))
    }

    /// Builder form of [`Header::set_critical`]
    pub fn with_critical<I, S>(mut self, names: I) -> JoseResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_critical(names)?;
        Ok(self)
    }

    /// Whether `crit` lists `name`
    #[must_use]
    pub fn is_critical(&self, name: &str) -> bool {
        self.critical().is_some_and(|names| names.contains(&name))
    }

    /// `b64` as written, `None` when absent
    #[must_use]
    pub fn base64_payload(&self) -> Option<bool> {
        self.params.get(params::B64).and_then(Value::as_bool)
    }

    /// Set `b64`. An unencoded payload also needs `b64` in `crit`.
    pub fn set_base64_payload(&mut self, b64: bool) {
        self.params.insert(params::B64.to_string(), Value::Bool(b64));
    }

    /// Builder form of [`Header::set_base64_payload`]
    #[must_use]
    pub fn with_base64_payload(mut self, b64: bool) -> Self {
        self.set_base64_payload(b64);
        self
    }
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.params.serialize(serializer)
    }
}
