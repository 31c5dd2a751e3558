//! Database header parsing
//!
//! The header is the first 29 bytes of the file. Positions below are 0-based:
//!
//! ```text
//! 0       schema id (1..=24)
//! 1       column count (including the ipfrom column)
//! 2..5    build year - 2000, month, day
//! 5..9    IPv4 row count          (u32 LE)
//! 9..13   IPv4 table base address (u32 LE, 1-based file address)
//! 13..17  IPv6 row count          (u32 LE)
//! 17..21  IPv6 table base address (u32 LE, 1-based file address)
//! 21..25  IPv4 skip-index base    (u32 LE, 1-based, 0 = absent)
//! 25..29  IPv6 skip-index base    (u32 LE, 1-based, 0 = absent)
//! ```

use super::types::AddressFamily;
use crate::error::{DecodeError, OpenError};
use crate::source::ByteSource;
use std::fmt;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = std::mem::size_of::<RawHeader>();

/// Highest schema id with a known field layout
pub const MAX_SCHEMA_ID: u8 = 24;

/// On-disk header layout
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
struct RawHeader {
    schema_id: u8,
    column_count: u8,
    year: u8,
    month: u8,
    day: u8,
    ipv4_count: U32,
    ipv4_base: U32,
    ipv6_count: U32,
    ipv6_base: U32,
    ipv4_index: U32,
    ipv6_index: U32,
}

/// Build date as stored in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BuildDate {
    /// Full year (stored offset by 2000)
    pub year: u16,
    /// Month, 1..=12 on well-formed files
    pub month: u8,
    /// Day of month
    pub day: u8,
}

impl fmt::Display for BuildDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Range table location for one address family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyTable {
    /// Number of range rows
    pub row_count: u32,
    /// 1-based address of the first row
    pub base_address: u32,
    /// 1-based address of the skip-index (0 = absent)
    pub index_address: u32,
}

impl FamilyTable {
    /// Returns true if the database stores ranges for this family
    pub fn is_present(&self) -> bool {
        self.row_count > 0
    }

    /// Returns true if a skip-index accompanies the table
    pub fn has_index(&self) -> bool {
        self.index_address > 0
    }
}

/// Decoded database header. Immutable once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseMeta {
    /// Schema id (1..=24)
    pub schema_id: u8,
    /// Columns per row, including the ipfrom column
    pub column_count: u8,
    /// Build date
    pub build_date: BuildDate,
    /// IPv4 range table
    pub ipv4: FamilyTable,
    /// IPv6 range table
    pub ipv6: FamilyTable,
}

impl DatabaseMeta {
    /// Read and validate the header at the start of `source`.
    ///
    /// # Errors
    ///
    /// * [`OpenError::Truncated`] if fewer than [`HEADER_SIZE`] bytes are available
    /// * [`OpenError::UnknownSchema`] for a schema id outside 1..=24
    /// * [`OpenError::Malformed`] for a column count of zero or a present
    ///   table with a zero base address
    pub fn read<S: ByteSource + ?Sized>(source: &S) -> Result<Self, OpenError> {
        let mut buf = [0u8; HEADER_SIZE];
        source.read_at(0, &mut buf)?;
        let raw = RawHeader::read_from_bytes(&buf[..]).map_err(|_| DecodeError::Truncated {
            offset: 0,
            len: HEADER_SIZE,
        })?;

        let meta = DatabaseMeta {
            schema_id: raw.schema_id,
            column_count: raw.column_count,
            build_date: BuildDate {
                year: 2000 + u16::from(raw.year),
                month: raw.month,
                day: raw.day,
            },
            ipv4: FamilyTable {
                row_count: raw.ipv4_count.get(),
                base_address: raw.ipv4_base.get(),
                index_address: raw.ipv4_index.get(),
            },
            ipv6: FamilyTable {
                row_count: raw.ipv6_count.get(),
                base_address: raw.ipv6_base.get(),
                index_address: raw.ipv6_index.get(),
            },
        };
        meta.validate()?;
        Ok(meta)
    }

    fn validate(&self) -> Result<(), OpenError> {
        if self.schema_id == 0 || self.schema_id > MAX_SCHEMA_ID {
            return Err(OpenError::UnknownSchema(self.schema_id));
        }
        if self.column_count == 0 {
            return Err(OpenError::Malformed("column count is zero".to_string()));
        }
        for family in [AddressFamily::V4, AddressFamily::V6] {
            let table = self.table(family);
            if table.is_present() && table.base_address == 0 {
                return Err(OpenError::Malformed(format!(
                    "{} table has {} rows but no base address",
                    family, table.row_count
                )));
            }
        }
        Ok(())
    }

    /// Range table for `family`
    pub fn table(&self, family: AddressFamily) -> &FamilyTable {
        match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        }
    }

    /// Byte width of one range row for `family`
    ///
    /// IPv4: `column_count * 4`. IPv6: `16 + (column_count - 1) * 4`.
    pub fn row_width(&self, family: AddressFamily) -> u64 {
        let columns = u64::from(self.column_count);
        match family {
            AddressFamily::V4 => columns * 4,
            AddressFamily::V6 => 16 + (columns - 1) * 4,
        }
    }
}
