//! HS256 key material shared by token issuing and verification.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

pub use jsonwebtoken::errors::Error as JwtError;

/// Encoding and decoding keys derived from one secret.
///
/// Cheap to clone; the keys are shared behind an `Arc`.
#[derive(Clone)]
pub struct JwtKeys {
    inner: Arc<Keys>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            inner: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
        }
    }

    /// Signs `claims` with HS256.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.inner.encoding)
    }

    /// Verifies signature and expiry, returning the decoded claims.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        decode::<T>(token, &self.inner.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
    }
}
