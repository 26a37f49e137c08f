//! Error type shared by the fallible map operations.

use thiserror::Error;

/// Errors reported by [`TreeMap`](crate::TreeMap).
///
/// Lookups other than [`at`](crate::TreeMap::at) report absence through
/// `None`, an end cursor or a zero count and never produce an error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested key is not present in the map.
    #[error("key not found")]
    KeyNotFound,

    /// The allocator could not provide memory for a new tree node.
    #[error("failed to allocate {size} bytes for a tree node")]
    AllocationFailed {
        /// Size of the node allocation that failed, in bytes.
        size: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_display() {
        assert_eq!(Error::KeyNotFound.to_string(), "key not found");
        assert_eq!(
            Error::AllocationFailed { size: 48 }.to_string(),
            "failed to allocate 48 bytes for a tree node"
        );
    }

    #[test]
    fn test_error_trait() {
        let error = Error::KeyNotFound;
        let _: &dyn std::error::Error = &error;
    }
}
