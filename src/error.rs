//! # Error Types
//!
//! This module defines all error types for the abcpool parser.
//!
//! Only two conditions ever stop a parse: invalid arguments and an exhausted
//! event pool. Everything else (malformed header values, unknown body
//! characters, too many voices) is absorbed by the parser so it always makes
//! forward progress.
//!
//! ## Error Types
//! - `InvalidArgument` - missing sheet, missing input, or a sheet without arenas
//! - `PoolExhausted` - an arena reached its capacity while committing an event
//! - `Config` - the YAML configuration could not be read or understood
//! - `Io` - file access from the demo binary
//!
//! ## Usage
//! ```rust
//! use abcpool::{AbcError, Sheet};
//!
//! let mut sheet = Sheet::new(1, 2);
//! match sheet.parse("C D E F") {
//!     Ok(()) => println!("parsed"),
//!     Err(AbcError::PoolExhausted { voice, capacity }) => {
//!         eprintln!("voice {} is full after {} events", voice, capacity);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbcError {
    /// A required argument was missing.
    ///
    /// Reported before any state is touched.
    ///
    /// # Example
    /// ```
    /// # use abcpool::AbcError;
    /// let err = AbcError::InvalidArgument("input text is missing");
    /// assert_eq!(err.to_string(), "Invalid argument: input text is missing");
    /// assert_eq!(err.code(), -1);
    /// ```
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The arena of a voice is full.
    ///
    /// Every event committed before this point is still valid.
    ///
    /// # Example
    /// ```
    /// # use abcpool::AbcError;
    /// let err = AbcError::PoolExhausted { voice: 0, capacity: 512 };
    /// assert_eq!(err.to_string(), "Event pool exhausted for voice 0 (capacity 512)");
    /// assert_eq!(err.code(), -2);
    /// ```
    #[error("Event pool exhausted for voice {voice} (capacity {capacity})")]
    PoolExhausted { voice: usize, capacity: usize },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl AbcError {
    /// Numeric status code for callers that work with integer results.
    /// Success is `0` and is never produced here.
    pub fn code(&self) -> i32 {
        match self {
            AbcError::InvalidArgument(_) => -1,
            AbcError::PoolExhausted { .. } => -2,
            AbcError::Config(_) => -3,
            AbcError::Io(_) => -4,
        }
    }
}

impl From<std::io::Error> for AbcError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_yaml::Error> for AbcError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Config(error.to_string())
    }
}
