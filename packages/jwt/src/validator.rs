//! Claims validation: time windows, value verifiers and custom rules

use crate::claims::Claims;
use crate::clock::{Clock, SystemClock};
use crate::error::{JwtError, JwtResult};
use crate::numeric_date::NumericDate;
use crate::validation::ValidationOptions;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Decides whether a string claim value is acceptable
pub trait ClaimVerifier: Send + Sync {
    /// `true` when `value` is accepted
    fn accepts(&self, value: &str) -> bool;
}

/// Accepts exactly one value
#[derive(Debug, Clone)]
pub struct Exact(pub String);

impl Exact {
    /// Verifier for `value`
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl ClaimVerifier for Exact {
    fn accepts(&self, value: &str) -> bool {
        self.0 == value
    }
}

/// Accepts any value of a fixed set
#[derive(Debug, Clone, Default)]
pub struct OneOf(HashSet<String>);

impl OneOf {
    /// Verifier for the given values
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }
}

impl ClaimVerifier for OneOf {
    fn accepts(&self, value: &str) -> bool {
        self.0.contains(value)
    }
}

/// Accepts every value. Only the presence of the claim is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsafeAcceptAnyValue;

impl ClaimVerifier for UnsafeAcceptAnyValue {
    fn accepts(&self, _value: &str) -> bool {
        true
    }
}

type CustomValidator = Box<dyn Fn(&Claims) -> JwtResult<()> + Send + Sync>;

/// Validates a decoded claim set against options, verifiers and a clock
pub struct ClaimsValidator {
    options: ValidationOptions,
    clock: Arc<dyn Clock>,
    issuer: Option<Box<dyn ClaimVerifier>>,
    audience: Option<Box<dyn ClaimVerifier>>,
    subject: Option<Box<dyn ClaimVerifier>>,
    custom_validators: Vec<CustomValidator>,
}

impl fmt::Debug for ClaimsValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsValidator")
            .field("options", &self.options)
            .field("issuer", &self.issuer.is_some())
            .field("audience", &self.audience.is_some())
            .field("subject", &self.subject.is_some())
            .field("custom_validators", &self.custom_validators.len())
            .finish_non_exhaustive()
    }
}

impl Default for ClaimsValidator {
    fn default() -> Self {
        Self::new(ValidationOptions::default())
    }
}

impl ClaimsValidator {
    /// Validator reading the system clock
    #[must_use]
    pub fn new(options: ValidationOptions) -> Self {
        Self {
            options,
            clock: Arc::new(SystemClock),
            issuer: None,
            audience: None,
            subject: None,
            custom_validators: Vec::new(),
        }
    }

    /// Options in effect
    #[must_use]
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Use another time source
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Require an `iss` the verifier accepts
    #[must_use]
    pub fn with_issuer(mut self, verifier: impl ClaimVerifier + 'static) -> Self {
        self.issuer = Some(Box::new(verifier));
        self
    }

    /// Require an `aud` with at least one value the verifier accepts
    #[must_use]
    pub fn with_audience(mut self, verifier: impl ClaimVerifier + 'static) -> Self {
        self.audience = Some(Box::new(verifier));
        self
    }

    /// Require a `sub` the verifier accepts
    #[must_use]
    pub fn with_subject(mut self, verifier: impl ClaimVerifier + 'static) -> Self {
        self.subject = Some(Box::new(verifier));
        self
    }

    /// Add a custom rule, run after the built-in checks
    #[must_use]
    pub fn with_custom_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Claims) -> JwtResult<()> + Send + Sync + 'static,
    {
        self.custom_validators.push(Box::new(validator));
        self
    }

    /// Validate claims at the clock's current time
    ///
    /// # Errors
    /// The first failed check: `MissingClaim`, `TokenExpired`,
    /// `TokenNotYetValid`, `InvalidIssuer`, `InvalidAudience`,
    /// `InvalidSubject`, `InvalidClaims` or a custom validator's error
    pub fn validate(&self, claims: &Claims) -> JwtResult<()> {
        for required in &self.options.required_claims {
            if !claims.has(required) {
                return Err(JwtError::missing_claim(required));
            }
        }

        self.validate_times(claims, self.clock.now())?;

        if let Some(verifier) = &self.issuer {
            let iss = claims.iss.as_deref().ok_or_else(|| JwtError::missing_claim("iss"))?;
            if !verifier.accepts(iss) {
                debug!(iss, "issuer rejected");
                return Err(JwtError::InvalidIssuer);
            }
        }
        if let Some(verifier) = &self.audience {
            let aud = claims.aud.as_ref().ok_or_else(|| JwtError::missing_claim("aud"))?;
            if !aud.iter().any(|value| verifier.accepts(value)) {
                debug!(?aud, "audience rejected");
                return Err(JwtError::InvalidAudience);
            }
        }
        if let Some(verifier) = &self.subject {
            let sub = claims.sub.as_deref().ok_or_else(|| JwtError::missing_claim("sub"))?;
            if !verifier.accepts(sub) {
                debug!(sub, "subject rejected");
                return Err(JwtError::InvalidSubject);
            }
        }

        for validator in &self.custom_validators {
            validator(claims)?;
        }
        Ok(())
    }

    fn validate_times(&self, claims: &Claims, now: DateTime<Utc>) -> JwtResult<()> {
        let leeway = self.options.leeway;
        let earliest = NumericDate::from_datetime(
            now.checked_sub_signed(leeway).unwrap_or(DateTime::<Utc>::MIN_UTC),
        );
        let latest = NumericDate::from_datetime(
            now.checked_add_signed(leeway).unwrap_or(DateTime::<Utc>::MAX_UTC),
        );

        if self.options.validate_exp {
            // now >= exp + leeway
            if let Some(exp) = claims.exp {
                if earliest >= exp {
                    debug!(%exp, "token expired");
                    return Err(JwtError::TokenExpired);
                }
            }
        }
        if self.options.validate_nbf {
            // now + leeway < nbf
            if let Some(nbf) = claims.nbf {
                if latest < nbf {
                    debug!(%nbf, "token not yet valid");
                    return Err(JwtError::TokenNotYetValid);
                }
            }
        }
        if let Some(max_age) = self.options.max_age {
            let iat = claims.iat.ok_or_else(|| JwtError::missing_claim("iat"))?;
            if iat > latest {
                return Err(JwtError::invalid_claims("issued in the future"));
            }
            let oldest = now
                .checked_sub_signed(max_age)
                .and_then(|t| t.checked_sub_signed(leeway))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            if iat < NumericDate::from_datetime(oldest) {
                debug!(%iat, "token too old");
                return Err(JwtError::invalid_claims("token is too old"));
            }
        }
        Ok(())
    }
}
