use thiserror::Error;

/// Errors returned by fallible map operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key was empty. Empty keys can never be hashed or stored.
    #[error("Key must have length greater than 0")]
    InvalidKey,
    /// A [`Config`](crate::Config) failed validation.
    #[error("Invalid table configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::InvalidKey.to_string(),
            "Key must have length greater than 0"
        );
        assert_eq!(
            Error::InvalidConfig("load factor must be in (0, 1]").to_string(),
            "Invalid table configuration: load factor must be in (0, 1]"
        );
    }
}
