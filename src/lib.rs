//! Core of a TOTP authenticator: a persistent store of named shared secrets
//! plus an [RFC 6238](https://tools.ietf.org/html/rfc6238) code engine.
//!
//! The two halves are deliberately independent. [`SecretStore`] owns the
//! name to base32-secret mapping and its on-disk JSON record; [`TotpEngine`]
//! is a pure computation over a secret and a timestamp. A presentation layer
//! (window, CLI, whatever drives the one-second refresh) looks a secret up,
//! hands it to the engine together with the current unix time, and renders
//! the returned code and countdown.
//!
//! # Examples
//!
//! ```rust
//! use totp_keeper::TotpEngine;
//!
//! let engine = TotpEngine::default();
//! // base32 of the RFC 6238 reference secret "12345678901234567890"
//! let totp = engine
//!     .compute("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ", 59)
//!     .unwrap();
//! assert_eq!(totp.code, "287082");
//! assert_eq!(totp.seconds_remaining, 1);
//! ```
//!
//! ```rust
//! use totp_keeper::SecretStore;
//!
//! let store = SecretStore::load("totp_accounts.json");
//! for name in store.list() {
//!     println!("{}", name);
//! }
//! ```

mod secret;
mod store;
mod store_error;

pub use secret::{Secret, SecretParseError};
pub use store::SecretStore;
pub use store_error::StoreError;

use core::fmt;

use hmac::Mac;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

type HmacSha1 = hmac::Hmac<sha1::Sha1>;
type HmacSha256 = hmac::Hmac<sha2::Sha256>;
type HmacSha512 = hmac::Hmac<sha2::Sha512>;

/// Number of code digits every stock authenticator app expects.
pub const DEFAULT_DIGITS: usize = 6;

/// Validity window of a single code, in seconds.
pub const DEFAULT_STEP: u64 = 30;

/// HMAC algorithm used to derive codes.
///
/// SHA-1 is the de-facto authenticator-app standard and the only value the
/// default engine configuration uses; the other two are kept as the
/// extension point for ecosystems that negotiated them explicitly. Several
/// widespread apps silently fall back to SHA-1, so changing this is rarely
/// what you want.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Algorithm {
    SHA1,
    SHA256,
    SHA512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::SHA1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::SHA1 => f.write_str("SHA1"),
            Algorithm::SHA256 => f.write_str("SHA256"),
            Algorithm::SHA512 => f.write_str("SHA512"),
        }
    }
}

impl Algorithm {
    fn hash<D>(mut digest: D, data: &[u8]) -> Vec<u8>
    where
        D: Mac,
    {
        digest.update(data);
        digest.finalize().into_bytes().to_vec()
    }

    fn sign(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
        match self {
            Algorithm::SHA1 => Algorithm::hash(HmacSha1::new_from_slice(key).unwrap(), data),
            Algorithm::SHA256 => Algorithm::hash(HmacSha256::new_from_slice(key).unwrap(), data),
            Algorithm::SHA512 => Algorithm::hash(HmacSha512::new_from_slice(key).unwrap(), data),
        }
    }
}

/// Current unix time in whole seconds.
///
/// Fractional seconds are truncated, so two calls within the same second
/// land in the same TOTP window.
pub fn unix_time() -> Result<u64, SystemTimeError> {
    let t = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    Ok(t)
}

/// One computed code together with how long it stays valid.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TotpCode {
    /// Zero-padded decimal code, `digits` characters long.
    pub code: String,
    /// Seconds until the next window starts, in `[1, step]`.
    ///
    /// At an exact window boundary this is the full `step`: the code just
    /// became current and has its whole lifetime ahead of it.
    pub seconds_remaining: u64,
}

/// Stateless TOTP computation over base32-encoded secrets.
///
/// The engine holds only configuration values, never a secret, so a single
/// instance can be shared freely between threads and used for any number of
/// accounts. [`TotpEngine::default`] is the configuration the whole
/// authenticator ecosystem agrees on (SHA-1, 6 digits, 30 seconds); the
/// fields are public for the rare setup that needs something else.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TotpEngine {
    pub algorithm: Algorithm,
    pub digits: usize,
    pub step: u64,
}

impl Default for TotpEngine {
    fn default() -> Self {
        TotpEngine {
            algorithm: Algorithm::SHA1,
            digits: DEFAULT_DIGITS,
            step: DEFAULT_STEP,
        }
    }
}

impl TotpEngine {
    /// Engine with explicit parameters. Prefer [`TotpEngine::default`]
    /// unless the other side of the enrollment negotiated otherwise.
    pub fn new(algorithm: Algorithm, digits: usize, step: u64) -> TotpEngine {
        TotpEngine {
            algorithm,
            digits,
            step,
        }
    }

    /// HMAC of the window counter for `time` under `key`.
    fn sign(&self, key: &[u8], time: u64) -> Vec<u8> {
        self.algorithm
            .sign(key, (time / self.step).to_be_bytes().as_ref())
    }

    /// Compute the code valid at `at` (unix seconds) for a base32 `secret`.
    ///
    /// Fails when the secret is not valid RFC 4648 base32 or decodes to
    /// zero bytes. Trailing `=` padding on the secret is tolerated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use totp_keeper::TotpEngine;
    ///
    /// let totp = TotpEngine::default()
    ///     .compute("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ", 1111111109)
    ///     .unwrap();
    /// assert_eq!(totp.code, "081804");
    /// ```
    pub fn compute(&self, secret: &str, at: u64) -> Result<TotpCode, SecretParseError> {
        let key = Secret::Encoded(secret.to_string()).to_bytes()?;
        let digest: &[u8] = &self.sign(&key, at);
        let offset = (digest.last().unwrap() & 15) as usize;
        let value =
            u32::from_be_bytes(digest[offset..offset + 4].try_into().unwrap()) & 0x7fff_ffff;
        let code = format!("{1:00$}", self.digits, value % 10_u32.pow(self.digits as u32));
        Ok(TotpCode {
            code,
            seconds_remaining: self.seconds_remaining(at),
        })
    }

    /// Seconds the window containing `at` has left, in `[1, step]`.
    pub fn seconds_remaining(&self, at: u64) -> u64 {
        self.step - at % self.step
    }

    /// Timestamp of the first second of the window after the one
    /// containing `at`.
    pub fn next_step(&self, at: u64) -> u64 {
        (at / self.step + 1) * self.step
    }

    /// Build the `otpauth://` URI that transfers `secret` into an
    /// authenticator app, usually by way of a QR code.
    ///
    /// Issuer, account name and secret are percent-encoded, so any of them
    /// may contain `:`, `/`, `&` or spaces without breaking the scanner on
    /// the other end.
    ///
    /// ```rust
    /// use totp_keeper::TotpEngine;
    ///
    /// let uri = TotpEngine::default().provisioning_uri(
    ///     "alice@example.com",
    ///     "Example",
    ///     "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ",
    /// );
    /// assert_eq!(
    ///     uri,
    ///     "otpauth://totp/Example:alice%40example.com?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ&issuer=Example"
    /// );
    /// ```
    pub fn provisioning_uri(&self, account_name: &str, issuer: &str, secret: &str) -> String {
        format!(
            "otpauth://totp/{0}:{1}?secret={2}&issuer={0}",
            urlencoding::encode(issuer),
            urlencoding::encode(account_name),
            urlencoding::encode(secret),
        )
    }

    /// Render the provisioning URI as a PNG QR code.
    ///
    /// The secret is validated first so an undecodable secret is rejected
    /// here rather than by the phone scanning the image.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid secret, or if the URI is too long to
    /// fit a QR code (it never is for realistic account names).
    #[cfg(feature = "qr")]
    #[cfg_attr(docsrs, doc(cfg(feature = "qr")))]
    pub fn provisioning_qr_png(
        &self,
        account_name: &str,
        issuer: &str,
        secret: &str,
    ) -> Result<Vec<u8>, String> {
        Secret::Encoded(secret.to_string())
            .to_bytes()
            .map_err(|e| e.to_string())?;
        qrcodegen_image::draw_png(&self.provisioning_uri(account_name, issuer, secret))
    }

    /// Render the provisioning URI as a base64-encoded PNG, ready to embed
    /// in HTML without an intermediate file.
    ///
    /// # Errors
    ///
    /// Same failure cases as [`TotpEngine::provisioning_qr_png`].
    #[cfg(feature = "qr")]
    #[cfg_attr(docsrs, doc(cfg(feature = "qr")))]
    pub fn provisioning_qr_base64(
        &self,
        account_name: &str,
        issuer: &str,
        secret: &str,
    ) -> Result<String, String> {
        Secret::Encoded(secret.to_string())
            .to_bytes()
            .map_err(|e| e.to_string())?;
        qrcodegen_image::draw_base64(&self.provisioning_uri(account_name, issuer, secret))
    }
}
