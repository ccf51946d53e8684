//! JWT validation options and configuration.

use chrono::Duration;
use cryypt_jose::AlgorithmRegistry;

/// JWT validation options.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Leeway for time-based claims.
    pub leeway: Duration,
    /// Validate expiry.
    pub validate_exp: bool,
    /// Validate not-before.
    pub validate_nbf: bool,
    /// Required claims.
    pub required_claims: Vec<String>,
    /// Maximum age measured from `iat`; requires `iat` when set.
    pub max_age: Option<Duration>,
    /// Algorithms the signature check accepts.
    pub allowed_algorithms: Vec<String>,
}

impl Default for ValidationOptions {
    /// Sixty seconds of leeway; every registered algorithm except `none`.
    fn default() -> Self {
        Self {
            leeway: Duration::seconds(60),
            validate_exp: true,
            validate_nbf: true,
            required_claims: vec![],
            max_age: None,
            allowed_algorithms: AlgorithmRegistry::global()
                .ids()
                .into_iter()
                .filter(|alg| *alg != "none")
                .map(str::to_string)
                .collect(),
        }
    }
}

impl ValidationOptions {
    /// Strict validation options: no leeway, `exp` required.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            leeway: Duration::zero(),
            required_claims: vec!["exp".to_string()],
            ..Self::default()
        }
    }

    /// Set the time leeway for validation.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Set whether to validate expiration.
    #[must_use]
    pub fn validate_expiration(mut self, validate: bool) -> Self {
        self.validate_exp = validate;
        self
    }

    /// Set whether to validate not-before.
    #[must_use]
    pub fn validate_not_before(mut self, validate: bool) -> Self {
        self.validate_nbf = validate;
        self
    }

    /// Add a required claim.
    #[must_use]
    pub fn require_claim(mut self, claim: impl Into<String>) -> Self {
        self.required_claims.push(claim.into());
        self
    }

    /// Set the maximum token age.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Replace the allowed algorithms.
    #[must_use]
    pub fn allowed_algorithms<I, S>(mut self, algorithms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_algorithms = algorithms.into_iter().map(Into::into).collect();
        self
    }
}
