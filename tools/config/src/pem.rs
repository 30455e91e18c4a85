// Licensed under the Apache-2.0 license

//! Turns a PEM public key into the raw point bytes stored in the image.

use anyhow::{anyhow, Result};
use p384::elliptic_curve::sec1::ToEncodedPoint;
use p384::pkcs8::DecodePublicKey;
use p384::PublicKey;

/// Byte length of an uncompressed P-384 point without the SEC1 tag.
pub const RAW_KEY_LEN: usize = 96;

/// Decode a PEM SPKI public key to its uncompressed X||Y coordinates.
pub fn public_key_bytes(pem: &str) -> Result<[u8; RAW_KEY_LEN]> {
    let key = PublicKey::from_public_key_pem(pem)
        .map_err(|e| anyhow!("not a P-384 public key: {}", e))?;
    let point = key.to_encoded_point(false);
    // Drop the leading SEC1 uncompressed-point tag byte.
    let raw = point.as_bytes()[1..].try_into()?;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p384::pkcs8::{EncodePublicKey, LineEnding};
    use p384::SecretKey;

    /// PEM of the public key for scalar 1, i.e. the curve's base point.
    fn base_point_pem() -> String {
        let mut scalar = [0u8; 48];
        scalar[47] = 1;
        let secret = SecretKey::from_slice(&scalar).unwrap();
        secret
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap()
    }

    #[test]
    fn test_pem_to_raw_point() {
        let raw = public_key_bytes(&base_point_pem()).unwrap();
        // X starts with the well-known leading bytes of the P-384 generator.
        assert_eq!(raw[..8], [0xaa, 0x87, 0xca, 0x22, 0xbe, 0x8b, 0x05, 0x37]);
    }

    #[test]
    fn test_rejects_non_key_input() {
        assert!(public_key_bytes("not a key").is_err());
        assert!(public_key_bytes("").is_err());
    }
}
