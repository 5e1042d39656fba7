//! Representation of a shared secret, either raw bytes or a base32 string.
//!
//! Every secret the crate touches goes through [`Secret::to_bytes`], so the
//! RFC 4648 rules live in exactly one place: decoding is padding-tolerant,
//! and a secret that decodes to zero bytes is rejected rather than fed to
//! the HMAC.
//!
//! # Examples
//!
//! ```
//! use totp_keeper::Secret;
//!
//! let secret = Secret::Encoded("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string());
//! assert_eq!(secret.to_bytes().unwrap(), b"12345678901234567890");
//! ```

use base32::{self, Alphabet};

use constant_time_eq::constant_time_eq;

/// Different ways secret parsing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretParseError {
    /// Invalid base32 input.
    ParseBase32,
    /// The secret decodes to zero bytes.
    Empty,
}

impl std::error::Error for SecretParseError {}

impl std::fmt::Display for SecretParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretParseError::ParseBase32 => write!(f, "Could not decode base32 secret."),
            SecretParseError::Empty => write!(f, "Secret decodes to zero bytes."),
        }
    }
}

/// Shared secret between this store and the service that issued it.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize, zeroize::ZeroizeOnDrop))]
pub enum Secret {
    /// Non-encoded "raw" secret.
    Raw(Vec<u8>),
    /// Base32 encoded secret.
    Encoded(String),
}

impl PartialEq for Secret {
    /// Compares the decoded byte values, so a `Raw` secret can equal its
    /// `Encoded` form. Undecodable secrets compare unequal to everything.
    fn eq(&self, other: &Self) -> bool {
        match (self.to_bytes(), other.to_bytes()) {
            (Ok(a), Ok(b)) => constant_time_eq(&a, &b),
            _ => false,
        }
    }
}

#[cfg(feature = "gen_secret")]
#[cfg_attr(docsrs, doc(cfg(feature = "gen_secret")))]
impl Default for Secret {
    fn default() -> Self {
        Secret::generate_secret()
    }
}

impl Secret {
    /// Decode to the raw key bytes the HMAC runs over.
    ///
    /// Trailing `=` padding is stripped before decoding; RFC 4648 base32 in
    /// the wild comes both padded and unpadded.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SecretParseError> {
        let bytes = match self {
            Secret::Raw(s) => s.to_vec(),
            Secret::Encoded(s) => {
                let unpadded = s.trim_end_matches('=');
                match base32::decode(Alphabet::Rfc4648 { padding: false }, unpadded) {
                    Some(bytes) => bytes,
                    None => return Err(SecretParseError::ParseBase32),
                }
            }
        };
        if bytes.is_empty() {
            return Err(SecretParseError::Empty);
        }
        Ok(bytes)
    }

    /// Try to transform a `Secret::Encoded` into a `Secret::Raw`.
    pub fn to_raw(&self) -> Result<Self, SecretParseError> {
        Ok(Secret::Raw(self.to_bytes()?))
    }

    /// Try to transform a `Secret::Raw` into a `Secret::Encoded`.
    pub fn to_encoded(&self) -> Self {
        match self {
            Secret::Raw(s) => {
                Secret::Encoded(base32::encode(Alphabet::Rfc4648 { padding: false }, s))
            }
            Secret::Encoded(_) => self.clone(),
        }
    }

    /// Generate a CSPRNG binary value of 160 bits,
    /// the recommended size from [rfc-4226](https://www.rfc-editor.org/rfc/rfc4226#section-4).
    ///
    /// > The length of the shared secret MUST be at least 128 bits.
    /// > This document RECOMMENDs a shared secret length of 160 bits.
    #[cfg(feature = "gen_secret")]
    #[cfg_attr(docsrs, doc(cfg(feature = "gen_secret")))]
    pub fn generate_secret() -> Secret {
        use rand::Rng;

        let mut rng = rand::rng();
        let mut secret: [u8; 20] = Default::default();
        rng.fill(&mut secret[..]);
        Secret::Raw(secret.to_vec())
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Secret::Raw(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Secret::Encoded(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Secret, SecretParseError};

    const BASE32: &str = "OBWGC2LOFVZXI4TJNZTS243FMNZGK5BNGEZDG";
    const BYTES: [u8; 23] = [
        0x70, 0x6c, 0x61, 0x69, 0x6e, 0x2d, 0x73, 0x74, 0x72, 0x69, 0x6e, 0x67, 0x2d, 0x73, 0x65,
        0x63, 0x72, 0x65, 0x74, 0x2d, 0x31, 0x32, 0x33,
    ];
    const BYTES_DISPLAY: &str = "706c61696e2d737472696e672d7365637265742d313233";

    #[test]
    fn secret_display() {
        let secret_raw = Secret::Raw(BYTES.to_vec());
        let secret_base32 = Secret::Encoded(BASE32.to_string());
        assert_eq!(secret_raw.to_string(), BYTES_DISPLAY.to_string());
        assert_eq!(secret_base32.to_string(), BASE32.to_string());
    }

    #[test]
    fn secret_convert_base32_raw() {
        let secret_raw = Secret::Raw(BYTES.to_vec());
        let secret_base32 = Secret::Encoded(BASE32.to_string());

        assert_eq!(&secret_raw.to_encoded(), &secret_base32);
        assert_eq!(&secret_raw.to_raw().unwrap(), &secret_raw);

        assert_eq!(&secret_base32.to_raw().unwrap(), &secret_raw);
        assert_eq!(&secret_base32.to_encoded(), &secret_base32);
    }

    #[test]
    fn secret_as_bytes() {
        assert_eq!(
            Secret::Raw(BYTES.to_vec()).to_bytes().unwrap(),
            BYTES.to_vec()
        );
        assert_eq!(
            Secret::Encoded(BASE32.to_string()).to_bytes().unwrap(),
            BYTES.to_vec()
        );
    }

    #[test]
    fn secret_tolerates_padding() {
        let padded = Secret::Encoded("MFRGG===".to_string());
        let unpadded = Secret::Encoded("MFRGG".to_string());
        assert_eq!(padded.to_bytes().unwrap(), b"abc");
        assert_eq!(padded, unpadded);
    }

    #[test]
    fn secret_invalid_base32() {
        let sec = Secret::Encoded("mn8y lowercase spaces".to_string());
        assert_eq!(sec.to_bytes().unwrap_err(), SecretParseError::ParseBase32);
        let non_ascii = Secret::Encoded("💖".to_string());
        assert_eq!(
            non_ascii.to_bytes().unwrap_err(),
            SecretParseError::ParseBase32
        );
    }

    #[test]
    fn secret_rejects_zero_bytes() {
        assert_eq!(
            Secret::Encoded(String::new()).to_bytes().unwrap_err(),
            SecretParseError::Empty
        );
        assert_eq!(
            Secret::Encoded("====".to_string()).to_bytes().unwrap_err(),
            SecretParseError::Empty
        );
        assert_eq!(
            Secret::Raw(Vec::new()).to_bytes().unwrap_err(),
            SecretParseError::Empty
        );
    }

    #[test]
    fn invalid_secrets_never_equal() {
        let bad = Secret::Encoded("!!!".to_string());
        assert_ne!(bad.clone(), bad.clone());
        assert_ne!(bad, Secret::Raw(BYTES.to_vec()));
    }

    #[test]
    #[cfg(feature = "gen_secret")]
    fn secret_gen_secret() {
        let sec = Secret::generate_secret();

        assert!(matches!(sec, Secret::Raw(_)));
        assert_eq!(sec.to_bytes().unwrap().len(), 20);
    }
}
