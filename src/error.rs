/// Error types for the ip2loc library
use crate::rangedb::AddressFamily;
use std::fmt;
use std::io;

/// Failure while reading or decoding bytes from a [`ByteSource`](crate::source::ByteSource)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A positioned read could not return the requested span
    Truncated {
        /// 0-based offset of the failed read
        offset: u64,
        /// Number of bytes requested
        len: usize,
    },

    /// Underlying I/O failure
    Io(String),

    /// Bytes were read but do not form a valid value
    Malformed(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { offset, len } => {
                write!(f, "Truncated read: {} bytes at offset {}", len, offset)
            }
            DecodeError::Io(msg) => write!(f, "I/O error: {}", msg),
            DecodeError::Malformed(msg) => write!(f, "Malformed data: {}", msg),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        DecodeError::Io(err.to_string())
    }
}

/// Errors raised while opening a database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// The file could not be opened or mapped
    Io(String),

    /// The header could not be read in full
    Truncated {
        /// 0-based offset of the failed read
        offset: u64,
        /// Number of bytes requested
        len: usize,
    },

    /// The header was read but is inconsistent
    Malformed(String),

    /// Schema id outside the known 1..=24 range
    UnknownSchema(u8),
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenError::Io(msg) => write!(f, "I/O error: {}", msg),
            OpenError::Truncated { offset, len } => write!(
                f,
                "Header unreadable: {} bytes at offset {} not available",
                len, offset
            ),
            OpenError::Malformed(msg) => write!(f, "Invalid database header: {}", msg),
            OpenError::UnknownSchema(id) => write!(f, "Unknown database schema: {}", id),
        }
    }
}

impl std::error::Error for OpenError {}

impl From<io::Error> for OpenError {
    fn from(err: io::Error) -> Self {
        OpenError::Io(err.to_string())
    }
}

impl From<DecodeError> for OpenError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Truncated { offset, len } => OpenError::Truncated { offset, len },
            DecodeError::Io(msg) => OpenError::Io(msg),
            DecodeError::Malformed(msg) => OpenError::Malformed(msg),
        }
    }
}

/// Errors returned by a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Text does not parse as an IPv4 or IPv6 address
    InvalidAddress(String),

    /// The database has no ranges for this address family
    UnsupportedFamily(AddressFamily),

    /// None of the requested fields exist in this database
    Unsupported,

    /// Search finished without a covering range
    NoMatch,

    /// Read or decode failure while searching or decoding fields
    Decode(DecodeError),

    /// The serialized access worker has been closed
    NotRunning,

    /// A composed source had nothing to query
    NoSource,

    /// An instance could not be constructed (pooled sources)
    Open(OpenError),
}

impl LookupError {
    /// Outcomes a [`MultiSource`](crate::multi::MultiSource) skips over
    /// instead of aborting the composed query.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            LookupError::Unsupported | LookupError::UnsupportedFamily(_) | LookupError::NoMatch
        )
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidAddress(text) => write!(f, "Invalid IP address: {:?}", text),
            LookupError::UnsupportedFamily(family) => {
                write!(f, "Unsupported IP address type: {}", family)
            }
            LookupError::Unsupported => write!(
                f,
                "Requested fields are unavailable in this database"
            ),
            LookupError::NoMatch => write!(f, "No matching IP range found"),
            LookupError::Decode(err) => write!(f, "Decode error: {}", err),
            LookupError::NotRunning => write!(f, "Database service not running"),
            LookupError::NoSource => write!(f, "No database to query"),
            LookupError::Open(err) => write!(f, "Database unavailable: {}", err),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Decode(e) => Some(e),
            LookupError::Open(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for LookupError {
    fn from(err: DecodeError) -> Self {
        LookupError::Decode(err)
    }
}

impl From<OpenError> for LookupError {
    fn from(err: OpenError) -> Self {
        LookupError::Open(err)
    }
}
