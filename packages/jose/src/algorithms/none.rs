//! The unsecured `none` algorithm (RFC 7518 §3.6)

use super::{Algorithm, SignatureScheme, SigningKey, bind};
use crate::error::{JoseError, JoseResult};
use crate::key::Key;

/// Unsecured JWS: empty signature, no integrity.
///
/// Registered by default so that `none` resolves, but verification still has
/// to get past the algorithm policy, and the stock allow lists never include
/// it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoneAlgorithm;

impl Algorithm for NoneAlgorithm {
    fn id(&self) -> &str {
        "none"
    }

    fn new_signing_key(&self, key: &Key) -> SigningKey {
        bind(self.id(), key, Ok(Unsecured))
    }
}

struct Unsecured;

impl SignatureScheme for Unsecured {
    fn sign(&self, _input: &[u8]) -> JoseResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn verify(&self, _input: &[u8], signature: &[u8]) -> JoseResult<()> {
        if signature.is_empty() {
            Ok(())
        } else {
            Err(JoseError::SignatureMismatch)
        }
    }
}
