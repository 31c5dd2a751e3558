//! ip2loc - Embedded lookup engine for IP2Location-style range databases
//!
//! ip2loc resolves IPv4 and IPv6 addresses to geolocation and network
//! attributes (country, region, city, ISP, coordinates, time zone, mobile
//! network identifiers, elevation, usage type) by binary-searching the
//! sorted range tables of a BIN database file. Databases are read-only and
//! decoded lazily; only the fields a query asks for are read.
//!
//! # Quick Start
//!
//! ```no_run
//! use ip2loc::{Database, FieldKind, QueryMask};
//!
//! let db = Database::open_path("IP2LOCATION-LITE-DB11.BIN")?;
//!
//! let record = db.query("8.8.8.8", QueryMask::ALL)?;
//! println!("{} / {}", record.country_code, record.city);
//!
//! // Decode only what you need
//! let mask = QueryMask::of(FieldKind::Latitude) | FieldKind::Longitude;
//! let record = db.query("2001:4860:4860::8888", mask)?;
//! println!("{}, {}", record.latitude, record.longitude);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Sharing between threads
//!
//! A [`Database`] over memory-mapped or in-memory bytes is `Sync` and can be
//! queried concurrently behind an `Arc`. Two wrappers cover the other cases:
//!
//! - [`SerializedAccess`] runs any `Send` source on one worker thread and
//!   answers queries strictly in arrival order.
//! - [`InstancePool`] lends one independently constructed source per query.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  BIN File Format                     │
//! ├──────────────────────────────────────┤
//! │  1. Header (schema, counts, bases)   │
//! │  2. IPv4 / IPv6 range tables         │
//! │  3. Optional skip-indexes            │
//! │  4. Length-prefixed string pool      │
//! └──────────────────────────────────────┘
//!          ↓ header + schema decoded once
//! ┌──────────────────────────────────────┐
//! │  Database (immutable, shareable)     │
//! │  skip-index → binary search → fields │
//! └──────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
/// Result cache
pub mod cache;
/// Database handles and opening
pub mod database;
/// Error types for opening, decoding and lookups
pub mod error;
/// Multi-database composition
pub mod multi;
/// Instance pooling
pub mod pool;
/// Range database format and search
pub mod rangedb;
/// Lookup results
pub mod record;
/// Single-worker serialized access
pub mod serialized;
pub mod source;

// Re-exports for Rust consumers

pub use crate::cache::{CacheStats, CachedSource};
pub use crate::database::{open_dir, Database, DatabaseOpener, LookupSource, OpenOptions};
pub use crate::error::{DecodeError, LookupError, OpenError};
pub use crate::multi::MultiSource;
pub use crate::pool::{ErrorSource, InstancePool};
pub use crate::rangedb::{AddressFamily, DatabaseMeta, FieldKind, IpKey, QueryMask, Schema};
pub use crate::record::{FieldValue, ResultRecord};
pub use crate::serialized::SerializedAccess;
pub use crate::source::{ByteSource, FileSource, MmapSource};

// Version information
/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
