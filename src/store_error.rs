use std::io;

use crate::SecretParseError;

/// Ways a [`SecretStore`](crate::SecretStore) operation can fail.
///
/// A `Persistence` error from a mutating operation means the disk write
/// failed *after* the in-memory change was committed; the entry the caller
/// just added or removed is not silently lost.
#[derive(Debug)]
pub enum StoreError {
    /// An account with this (normalized) name already exists.
    DuplicateName(String),
    /// No account with this name exists.
    NotFound(String),
    /// The account name is empty after trimming.
    EmptyName,
    /// The secret is not usable: it fails base32 decoding or decodes to
    /// zero bytes.
    InvalidSecret(SecretParseError),
    /// Reading or writing the persisted record failed.
    Persistence(io::Error),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::InvalidSecret(e) => Some(e),
            StoreError::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateName(name) => {
                write!(f, "An account named \"{}\" already exists", name)
            }
            StoreError::NotFound(name) => {
                write!(f, "No account named \"{}\"", name)
            }
            StoreError::EmptyName => write!(f, "Account name can't be empty"),
            StoreError::InvalidSecret(e) => write!(f, "Invalid secret: {}", e),
            StoreError::Persistence(e) => write!(f, "Could not persist the account record: {}", e),
        }
    }
}

impl From<SecretParseError> for StoreError {
    fn from(e: SecretParseError) -> Self {
        StoreError::InvalidSecret(e)
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Persistence(e)
    }
}

#[cfg(test)]
mod tests {
    use super::StoreError;
    use crate::SecretParseError;

    #[test]
    fn duplicate_name() {
        let error = StoreError::DuplicateName("GITHUB".to_string());
        assert_eq!(
            error.to_string(),
            "An account named \"GITHUB\" already exists"
        )
    }

    #[test]
    fn not_found() {
        let error = StoreError::NotFound("GITLAB".to_string());
        assert_eq!(error.to_string(), "No account named \"GITLAB\"")
    }

    #[test]
    fn empty_name() {
        assert_eq!(
            StoreError::EmptyName.to_string(),
            "Account name can't be empty"
        )
    }

    #[test]
    fn invalid_secret() {
        let error = StoreError::from(SecretParseError::ParseBase32);
        assert_eq!(
            error.to_string(),
            "Invalid secret: Could not decode base32 secret."
        )
    }

    #[test]
    fn persistence() {
        let error = StoreError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert_eq!(
            error.to_string(),
            "Could not persist the account record: read-only"
        )
    }
}
