//! Private key loading
//!
//! GitHub hands out PKCS#1 keys, but keys re-exported by other tooling are
//! often PKCS#8 and sometimes bundled with a certificate. The first block
//! tagged as a private key wins; PKCS#1 is tried before PKCS#8 because the
//! tag is not always truthful about the encoding inside.

use crate::error::{Error, Result};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use std::fs;
use std::path::Path;
use tracing::debug;

/// PEM tags that may carry an RSA private key.
const PRIVATE_KEY_TAGS: &[&str] = &["RSA PRIVATE KEY", "PRIVATE KEY"];

const BEGIN_MARKER: &str = "-----BEGIN ";

/// Read and parse the app's private key file.
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey> {
    let data = fs::read(path).map_err(|source| Error::KeyRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_private_key(&data, path)
}

/// Parse PEM data into an RSA private key.
///
/// Blocks are decoded one at a time, so a garbled block elsewhere in the
/// file does not hide a usable key. `path` is only used for error messages.
pub fn parse_private_key(data: &[u8], path: &Path) -> Result<RsaPrivateKey> {
    let text = String::from_utf8_lossy(data);
    let mut tags = Vec::new();
    let mut decode_error = None;

    for chunk in pem_chunks(&text) {
        let block = match pem::parse(chunk) {
            Ok(block) => block,
            Err(e) => {
                debug!(error = %e, "skipping undecodable PEM block");
                if decode_error.is_none() {
                    decode_error = Some(e.to_string());
                }
                continue;
            }
        };

        if PRIVATE_KEY_TAGS.contains(&block.tag()) {
            debug!(tag = block.tag(), skipped = tags.len(), "found private key block");
            return decode_rsa_key(&block, path);
        }
        tags.push(block.tag().to_string());
    }

    if tags.is_empty() {
        return Err(Error::KeyDecode {
            path: path.to_path_buf(),
            reason: decode_error.unwrap_or_else(|| "no PEM block found".to_string()),
        });
    }

    Err(Error::KeyFormat {
        path: path.to_path_buf(),
        reason: format!("no private key block (found {})", tags.join(", ")),
    })
}

/// Split `text` at every BEGIN marker; each piece holds at most one block.
fn pem_chunks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = text.match_indices(BEGIN_MARKER).map(|(i, _)| i).collect();
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

fn decode_rsa_key(block: &pem::Pem, path: &Path) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_der(block.contents()).or_else(|pkcs1_err| {
        RsaPrivateKey::from_pkcs8_der(block.contents()).map_err(|pkcs8_err| Error::KeyFormat {
            path: path.to_path_buf(),
            reason: format!(
                "not an RSA private key (tried PKCS1: {pkcs1_err}; PKCS8: {pkcs8_err})"
            ),
        })
    })
}
