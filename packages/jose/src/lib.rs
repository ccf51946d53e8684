//! JSON Web Signature engine
//!
//! This crate provides:
//! - an [`AlgorithmRegistry`] mapping `alg` ids to signature algorithms
//! - caller key material ([`Key`]) bound to an algorithm as a [`SigningKey`]
//! - the JOSE [`Header`] model with byte-exact protected headers
//! - JWS [`Message`] parsing, signing and verification in compact and JSON forms

pub mod algorithms;
pub mod codec;
pub mod context;
mod error;
pub mod header;
pub mod jws;
pub mod key;
pub mod registry;

pub use algorithms::{
    Algorithm, EcCurve, EcdsaAlgorithm, EdDsaAlgorithm, HashAlg, HmacAlgorithm, NoneAlgorithm,
    RsaAlgorithm, RsaPadding, SignatureScheme, SigningKey,
};
pub use codec::Base64Scratch;
pub use context::Context;
pub use error::{JoseError, JoseResult, KeyOperation};
pub use header::Header;
pub use jws::{
    AlgorithmPolicy, AllowList, KeyFinder, KeySetFinder, Message, Signature, Signer,
    StaticKeyFinder, UnsafeAcceptAnyAlgorithm, Verified, Verifier,
};
pub use key::{Capabilities, Key, KeyKind, KeyUsage, PrivateKey, PublicKey};
pub use registry::{AlgorithmFactory, AlgorithmRegistry};

/// Re-exported so callers can create cancellation tokens for [`Context`]
pub use tokio_util::sync::CancellationToken;
