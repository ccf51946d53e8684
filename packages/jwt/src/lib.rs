//! JSON Web Token (JWT) claims layer over `cryypt_jose`
//!
//! This crate provides:
//! - typed [`Claims`] with a compile-time checked [`ClaimsBuilder`]
//! - [`NumericDate`] with nanosecond precision
//! - claim validation against a [`Clock`] with leeway and value verifiers
//! - [`encode`] and [`JwtVerifier::decode`] for compact tokens

pub mod claims;
pub mod clock;
mod error;
pub mod numeric_date;
pub mod token;
pub mod validation;
pub mod validator;

pub use claims::{Audience, Claims, ClaimsBuilder};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{JwtError, JwtResult};
pub use numeric_date::NumericDate;
pub use token::{DecodedJwt, JWT_TYPE, JwtVerifier, encode};
pub use validation::ValidationOptions;
pub use validator::{ClaimVerifier, ClaimsValidator, Exact, OneOf, UnsafeAcceptAnyValue};
