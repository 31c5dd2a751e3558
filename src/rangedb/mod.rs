//! Range database reader
//!
//! Decoding and search for sorted IP range databases in the IP2Location BIN
//! layout: a fixed header, one range table per address family, an optional
//! skip-index per family, and a pool of length-prefixed strings referenced by
//! 4-byte pointers from the range rows.
//!
//! ## Architecture
//!
//! - **types**: address families, field kinds, query masks and keys
//! - **header**: fixed header parsing into [`DatabaseMeta`]
//! - **schema**: static per-schema column table and offset resolution
//! - **decode**: little-endian integers, floats and length-prefixed strings
//! - **search**: skip-index bounds, binary search and row decoding

pub mod decode;
pub mod header;
pub mod schema;
pub mod search;
pub mod types;

// Re-export key types
pub use header::{BuildDate, DatabaseMeta, FamilyTable, HEADER_SIZE, MAX_SCHEMA_ID};
pub use schema::Schema;
pub use search::lookup;
pub use types::{AddressFamily, FieldKind, IpKey, QueryMask};
