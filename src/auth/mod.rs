//! GitHub App authentication
//!
//! Loads the app's RSA private key and signs the short-lived JWT assertion
//! that authenticates listing and token-exchange calls.

mod jwt;
mod key;

pub use jwt::{
    ASSERTION_BACKDATE_SECS, ASSERTION_LIFETIME_SECS, AssertionClaims, sign_app_assertion,
    sign_app_assertion_at,
};
pub use key::{load_private_key, parse_private_key};
