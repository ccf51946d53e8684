//! JWT claims and builder with compile-time validation.

use crate::error::JwtResult;
use crate::numeric_date::NumericDate;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, marker::PhantomData};

/// Typestate markers for builder pattern.
pub mod ts {
    /// Marker for a field that has been set.
    pub struct Set;
    /// Marker for a field that has not been set.
    pub struct Unset;
}

/// `aud` claim: a single string or an array of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// One audience, serialized as a bare string
    Single(String),
    /// Any number of audiences
    Many(Vec<String>),
}

impl Audience {
    /// Whether `value` is one of the audiences
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.iter().any(|aud| aud == value)
    }

    /// All audience values
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Audience::Single(one) => std::slice::from_ref(one),
            Audience::Many(many) => many,
        };
        values.iter().map(String::as_str)
    }
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Audience::Single(value.to_string())
    }
}

impl From<String> for Audience {
    fn from(value: String) -> Self {
        Audience::Single(value)
    }
}

impl From<Vec<String>> for Audience {
    fn from(values: Vec<String>) -> Self {
        Audience::Many(values)
    }
}

/// JWT claim set.
///
/// Registered claims are typed; everything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    /// Expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<NumericDate>,
    /// Not before.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<NumericDate>,
    /// Issued-at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<NumericDate>,
    /// JWT ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Custom data.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Claims {
    /// Start a typestate builder
    #[must_use]
    pub fn builder() -> ClaimsBuilder {
        ClaimsBuilder::new()
    }

    /// Whether a claim, registered or custom, is present
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        match name {
            "iss" => self.iss.is_some(),
            "sub" => self.sub.is_some(),
            "aud" => self.aud.is_some(),
            "exp" => self.exp.is_some(),
            "nbf" => self.nbf.is_some(),
            "iat" => self.iat.is_some(),
            "jti" => self.jti.is_some(),
            other => self.extra.contains_key(other),
        }
    }

    /// Set a claim by name. Registered names go to their typed field, so a
    /// serialized claim set never carries a name twice.
    ///
    /// # Errors
    /// `Serialization` when a registered claim's value has the wrong type
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> JwtResult<()> {
        let name = name.into();
        match name.as_str() {
            "iss" => self.iss = Some(String::deserialize(value)?),
            "sub" => self.sub = Some(String::deserialize(value)?),
            "aud" => self.aud = Some(Audience::deserialize(value)?),
            "exp" => self.exp = Some(NumericDate::deserialize(value)?),
            "nbf" => self.nbf = Some(NumericDate::deserialize(value)?),
            "iat" => self.iat = Some(NumericDate::deserialize(value)?),
            "jti" => self.jti = Some(String::deserialize(value)?),
            _ => {
                self.extra.insert(name, value);
            }
        }
        Ok(())
    }

    /// Raw custom claim
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Custom claim deserialized into `T`; `None` when absent or mistyped
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.extra
            .get(name)
            .and_then(|value| T::deserialize(value).ok())
    }
}

/// Compile-time checked builder for JWT claims.
///
/// `build` only exists once subject, expiry and issued-at are set.
pub struct ClaimsBuilder<Sub = ts::Unset, Exp = ts::Unset, Iat = ts::Unset> {
    claims: Claims,
    _phantom: PhantomData<(Sub, Exp, Iat)>,
}

impl Default for ClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimsBuilder {
    /// Create a new claims builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            claims: Claims::default(),
            _phantom: PhantomData,
        }
    }
}

impl<Sub, Exp, Iat> ClaimsBuilder<Sub, Exp, Iat> {
    fn into_state<S2, E2, I2>(self) -> ClaimsBuilder<S2, E2, I2> {
        ClaimsBuilder {
            claims: self.claims,
            _phantom: PhantomData,
        }
    }
}

impl<Exp, Iat> ClaimsBuilder<ts::Unset, Exp, Iat> {
    /// Set the subject (sub) claim.
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> ClaimsBuilder<ts::Set, Exp, Iat> {
        self.claims.sub = Some(sub.into());
        self.into_state()
    }
}

impl<Sub, Iat> ClaimsBuilder<Sub, ts::Unset, Iat> {
    /// Set the expiration time relative to now.
    #[must_use]
    pub fn expires_in(self, dur: Duration) -> ClaimsBuilder<Sub, ts::Set, Iat> {
        self.expires_at(Utc::now() + dur)
    }

    /// Set an absolute expiration time.
    #[must_use]
    pub fn expires_at(mut self, exp: impl Into<NumericDate>) -> ClaimsBuilder<Sub, ts::Set, Iat> {
        self.claims.exp = Some(exp.into());
        self.into_state()
    }
}

impl<Sub, Exp> ClaimsBuilder<Sub, Exp, ts::Unset> {
    /// Set the issued-at time to now.
    #[must_use]
    pub fn issued_now(self) -> ClaimsBuilder<Sub, Exp, ts::Set> {
        self.issued_at(Utc::now())
    }

    /// Set an explicit issued-at time.
    #[must_use]
    pub fn issued_at(mut self, iat: impl Into<NumericDate>) -> ClaimsBuilder<Sub, Exp, ts::Set> {
        self.claims.iat = Some(iat.into());
        self.into_state()
    }
}

impl<Sub, Exp, Iat> ClaimsBuilder<Sub, Exp, Iat> {
    /// Add a claim. A registered name sets its typed field; a value of the
    /// wrong type for it is dropped with a warning.
    #[must_use]
    pub fn claim(mut self, k: impl Into<String>, v: Value) -> Self {
        let name = k.into();
        if let Err(err) = self.claims.insert(name.clone(), v) {
            tracing::warn!(claim = %name, error = %err, "ignoring mistyped registered claim");
        }
        self
    }

    /// Set the issuer (iss) claim.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.claims.iss = Some(iss.into());
        self
    }

    /// Set a single audience (aud) claim.
    #[must_use]
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.claims.aud = Some(Audience::Single(aud.into()));
        self
    }

    /// Set several audiences.
    #[must_use]
    pub fn audiences<I, S>(mut self, aud: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims.aud = Some(Audience::Many(aud.into_iter().map(Into::into).collect()));
        self
    }

    /// Set the not-before (nbf) claim.
    #[must_use]
    pub fn not_before(mut self, nbf: DateTime<Utc>) -> Self {
        self.claims.nbf = Some(NumericDate::from_datetime(nbf));
        self
    }

    /// Set the JWT ID (jti) claim.
    #[must_use]
    pub fn jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.claims.jti = Some(jti.into());
        self
    }
}

impl ClaimsBuilder<ts::Set, ts::Set, ts::Set> {
    /// Build the claims.
    #[must_use]
    pub fn build(self) -> Claims {
        self.claims
    }
}
