//! App assertion (JWT) signing

use crate::error::{Error, Result};
use crate::types::SecretString;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How far `iat` is pushed into the past to absorb clock skew with GitHub.
pub const ASSERTION_BACKDATE_SECS: i64 = 30;

/// Lifetime of an assertion, measured from the backdated `iat` rather than
/// from now, so `exp - iat` is exactly ten minutes. GitHub rejects anything longer.
pub const ASSERTION_LIFETIME_SECS: i64 = 10 * 60;

/// Claims carried by a GitHub App assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expires at (seconds since epoch)
    pub exp: i64,
    /// Issuer: the decimal app ID
    pub iss: String,
}

impl AssertionClaims {
    /// Claims for an assertion minted at `now`
    pub fn new(app_id: u64, now: DateTime<Utc>) -> Self {
        let issued_at = now - Duration::seconds(ASSERTION_BACKDATE_SECS);
        let expires_at = issued_at + Duration::seconds(ASSERTION_LIFETIME_SECS);
        Self {
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: app_id.to_string(),
        }
    }
}

/// Sign an RS256 assertion identifying the app.
pub fn sign_app_assertion(app_id: u64, key: &RsaPrivateKey) -> Result<SecretString> {
    sign_app_assertion_at(app_id, key, Utc::now())
}

/// Sign an assertion as if the current time were `now`.
pub fn sign_app_assertion_at(
    app_id: u64,
    key: &RsaPrivateKey,
    now: DateTime<Utc>,
) -> Result<SecretString> {
    let der = key
        .to_pkcs1_der()
        .map_err(|e| Error::Signing(format!("encoding RSA key: {e}")))?;
    let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

    let claims = AssertionClaims::new(app_id, now);
    let token = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| Error::Signing(e.to_string()))?;

    debug!(app_id, exp = claims.exp, "signed app assertion");
    Ok(SecretString::new(token))
}
