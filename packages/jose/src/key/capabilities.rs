//! Capability flags derived from a JWK record's `use` / `key_ops` members

use serde::{Deserialize, Serialize};

/// What a key record permits. Captured once when a key is bound and checked
/// on every sign and verify call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Key may produce signatures
    pub may_sign: bool,
    /// Key may check signatures
    pub may_verify: bool,
}

impl Capabilities {
    /// Sign and verify both permitted
    pub const ALL: Capabilities = Capabilities {
        may_sign: true,
        may_verify: true,
    };

    /// Verification only
    pub const VERIFY_ONLY: Capabilities = Capabilities {
        may_sign: false,
        may_verify: true,
    };

    /// Signing only
    pub const SIGN_ONLY: Capabilities = Capabilities {
        may_sign: true,
        may_verify: false,
    };

    /// Nothing permitted
    pub const NONE: Capabilities = Capabilities {
        may_sign: false,
        may_verify: false,
    };

    /// Derive capabilities from the JWK `use` and `key_ops` members
    /// (RFC 7517 §4.2, §4.3).
    ///
    /// When both members are present the result is their intersection.
    #[must_use]
    pub fn from_usage(key_use: Option<&str>, key_ops: Option<&[String]>) -> Self {
        let from_use = match key_use {
            Some("sig") | None => Capabilities::ALL,
            Some(_) => Capabilities::NONE,
        };
        let from_ops = match key_ops {
            Some(ops) => Capabilities {
                may_sign: ops.iter().any(|op| op == "sign"),
                may_verify: ops.iter().any(|op| op == "verify"),
            },
            None => Capabilities::ALL,
        };
        Capabilities {
            may_sign: from_use.may_sign && from_ops.may_sign,
            may_verify: from_use.may_verify && from_ops.may_verify,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::ALL
    }
}

/// The subset of a JWK record the engine consumes.
///
/// Key-type specific members are parsed elsewhere; this view only carries
/// identification and usage metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyUsage {
    /// Key ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Public key use (`sig` or `enc`)
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Permitted key operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
}

impl KeyUsage {
    /// Read the usage members out of a JWK JSON object, ignoring the rest.
    pub fn from_jwk(jwk: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(jwk)
    }

    /// Capabilities granted by this record
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_usage(self.key_use.as_deref(), self.key_ops.as_deref())
    }
}
