//! Error handling for the stowage library
//!
//! Every fallible container operation reports one of the kinds below instead
//! of aborting. Bounds and lookup failures are ordinary, recoverable results;
//! allocation failures are reported after the container has been left in its
//! previous state.

use thiserror::Error;

/// Main error type for the stowage library
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StowageError {
    /// Index or position beyond the valid bounds of a container
    #[error("Out of range: index {index}, length {len}")]
    OutOfRange {
        /// The offending index (or end of the offending range)
        index: usize,
        /// The length the index was checked against
        len: usize,
    },

    /// Key or value-match lookup failure
    #[error("Not found: {what}")]
    NotFound {
        /// Description of what was looked up
        what: String,
    },

    /// Push into a full queue whose auto-grow policy is disabled
    #[error("Capacity exceeded: container is full at {capacity} elements")]
    CapacityExceeded {
        /// The fixed capacity that was exhausted
        capacity: usize,
    },

    /// Growth or copy could not acquire memory
    #[error("Allocation failed: requested {size} bytes")]
    AllocationFailure {
        /// Number of bytes requested
        size: usize,
    },

    /// Argument rejected before any state was touched
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message describing the rejected argument
        message: String,
    },

    /// Numeric conversion on non-numeric content
    #[error("Parse failure: cannot read {input:?} as {target}")]
    ParseFailure {
        /// The content that failed to parse
        input: String,
        /// The numeric type that was requested
        target: &'static str,
    },

    /// Data access through a cursor that is not positioned on an element
    #[error("Cursor is not positioned on an element")]
    CursorNotPositioned,

    /// Configuration rejected by validation, or unreadable/unwritable
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },
}

impl StowageError {
    /// Create an out of range error
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::OutOfRange { index, len }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a capacity exceeded error
    pub fn capacity_exceeded(capacity: usize) -> Self {
        Self::CapacityExceeded { capacity }
    }

    /// Create an allocation failure error
    pub fn allocation_failure(size: usize) -> Self {
        Self::AllocationFailure { size }
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Create a parse failure error
    pub fn parse_failure<S: Into<String>>(input: S, target: &'static str) -> Self {
        Self::ParseFailure { input: input.into(), target }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors describe the state of the data (a miss, a full
    /// queue, a failed allocation) rather than a misuse of the API.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::CapacityExceeded { .. } => true,
            Self::AllocationFailure { .. } => true,
            Self::ParseFailure { .. } => true,
            Self::OutOfRange { .. } => false,
            Self::InvalidArgument { .. } => false,
            Self::CursorNotPositioned => false,
            Self::Configuration { .. } => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "bounds",
            Self::NotFound { .. } => "lookup",
            Self::CapacityExceeded { .. } => "capacity",
            Self::AllocationFailure { .. } => "memory",
            Self::InvalidArgument { .. } => "argument",
            Self::ParseFailure { .. } => "parse",
            Self::CursorNotPositioned => "cursor",
            Self::Configuration { .. } => "config",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, StowageError>;

/// Assert that an index addresses an existing element
#[inline]
pub fn check_bounds(index: usize, len: usize) -> Result<()> {
    if index >= len {
        Err(StowageError::out_of_range(index, len))
    } else {
        Ok(())
    }
}

/// Assert that `count` elements starting at `start` lie within `len`
#[inline]
pub fn check_range(start: usize, count: usize, len: usize) -> Result<()> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        Some(end) => Err(StowageError::out_of_range(end, len)),
        None => Err(StowageError::out_of_range(usize::MAX, len)),
    }
}

/// Assert that two equal-length windows do not overlap
#[inline]
pub fn check_disjoint(a: usize, b: usize, count: usize) -> Result<()> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if count > 0 && lo + count > hi {
        return Err(StowageError::invalid_argument(format!(
            "windows at {} and {} of length {} overlap",
            a, b, count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StowageError::invalid_argument("empty delimiter");
        assert_eq!(err.category(), "argument");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_bounds_checking() {
        assert!(check_bounds(5, 10).is_ok());
        assert!(check_bounds(10, 10).is_err());
        assert!(check_bounds(0, 0).is_err());
        assert!(check_bounds(usize::MAX, usize::MAX).is_err());
    }

    #[test]
    fn test_range_checking() {
        assert!(check_range(2, 8, 10).is_ok());
        assert!(check_range(10, 0, 10).is_ok());
        assert!(check_range(0, 0, 0).is_ok());
        assert_eq!(check_range(8, 5, 10), Err(StowageError::out_of_range(13, 10)));
        assert!(check_range(usize::MAX, 2, 10).is_err());
    }

    #[test]
    fn test_disjoint_checking() {
        assert!(check_disjoint(0, 5, 5).is_ok());
        assert!(check_disjoint(5, 0, 5).is_ok());
        assert!(check_disjoint(0, 4, 5).is_err());
        assert!(check_disjoint(3, 3, 1).is_err());
        assert!(check_disjoint(3, 3, 0).is_ok());
    }

    #[test]
    fn test_all_error_kinds() {
        let cases = [
            (StowageError::out_of_range(5, 3), "bounds", false),
            (StowageError::not_found("key"), "lookup", true),
            (StowageError::capacity_exceeded(8), "capacity", true),
            (StowageError::allocation_failure(1024), "memory", true),
            (StowageError::invalid_argument("x"), "argument", false),
            (StowageError::parse_failure("abc", "f64"), "parse", true),
            (StowageError::CursorNotPositioned, "cursor", false),
            (StowageError::configuration("bad factor"), "config", false),
        ];

        for (err, category, recoverable) in cases {
            assert_eq!(err.category(), category);
            assert_eq!(err.is_recoverable(), recoverable);
        }
    }

    #[test]
    fn test_error_display() {
        let display = StowageError::out_of_range(10, 5).to_string();
        assert!(display.contains("Out of range"));
        assert!(display.contains("10"));
        assert!(display.contains('5'));

        let display = StowageError::parse_failure("pi", "f64").to_string();
        assert!(display.contains("\"pi\""));
        assert!(display.contains("f64"));

        let display = StowageError::capacity_exceeded(16).to_string();
        assert!(display.contains("16"));
    }
}
