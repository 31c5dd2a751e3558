//! Field layout per schema
//!
//! Each of the 24 schema variants stores a different subset of fields at
//! different column positions. [`COLUMN_TABLE`] maps `(field kind, schema id)`
//! to the 1-based column holding that field's 4-byte value, or 0 when the
//! schema does not carry the field. Column 1 is always the `ipfrom` key.
//!
//! [`Schema::resolve`] turns one column of this table into byte offsets once
//! per opened database.

use super::types::{FieldKind, QueryMask};
use crate::error::OpenError;

/// Column positions indexed by `[field kind][schema id]`; index 0 is unused.
#[rustfmt::skip]
pub const COLUMN_TABLE: [[u8; 25]; FieldKind::COUNT] = [
    // schema:  -  1  2  3  4  5  6  7  8  9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24
    /* country_code */         [0, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2],
    /* country_name */         [0, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2],
    /* region */               [0, 0, 0, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3],
    /* city */                 [0, 0, 0, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4],
    /* isp */                  [0, 0, 3, 0, 5, 0, 7, 5, 7, 0, 8, 0, 9, 0, 9, 0, 9, 0, 9, 7, 9, 0, 9, 7, 9],
    /* latitude */             [0, 0, 0, 0, 0, 5, 5, 0, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5],
    /* longitude */            [0, 0, 0, 0, 0, 6, 6, 0, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6],
    /* domain */               [0, 0, 0, 0, 0, 0, 0, 6, 8, 0, 9, 0,10, 0,10, 0,10, 0,10, 8,10, 0,10, 8,10],
    /* zip_code */             [0, 0, 0, 0, 0, 0, 0, 0, 0, 7, 7, 7, 7, 0, 7, 7, 7, 0, 7, 0, 7, 7, 7, 0, 7],
    /* time_zone */            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 8, 7, 8, 8, 8, 7, 8, 0, 8, 8, 8, 0, 8],
    /* net_speed */            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8,11, 0,11, 8,11, 0,11, 0,11, 0,11],
    /* idd_code */             [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9,12, 0,12, 0,12, 9,12, 0,12],
    /* area_code */            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,10,13, 0,13, 0,13,10,13, 0,13],
    /* weather_station_code */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9,14, 0,14, 0,14, 0,14],
    /* weather_station_name */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,10,15, 0,15, 0,15, 0,15],
    /* mcc */                  [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9,16, 0,16, 9,16],
    /* mnc */                  [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,10,17, 0,17,10,17],
    /* mobile_brand */         [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,11,18, 0,18,11,18],
    /* elevation */            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,11,19, 0,19],
    /* usage_type */           [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,12,20],
];

/// 1-based column of `kind` in `schema_id`, or 0 if absent (or unknown schema).
#[inline]
pub const fn column(schema_id: u8, kind: FieldKind) -> u8 {
    if schema_id as usize >= COLUMN_TABLE[0].len() {
        return 0;
    }
    COLUMN_TABLE[kind.index()][schema_id as usize]
}

/// Widest column used by `schema_id`; the minimum valid column count.
pub fn required_columns(schema_id: u8) -> u8 {
    FieldKind::ALL
        .iter()
        .map(|kind| column(schema_id, *kind))
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Resolved per-database field layout.
///
/// `offset(kind)` is `(column - 1) * 4`, the distance of the field's column
/// from the start of a 4-byte-column row, or 0 if the field is absent. Since
/// column 1 is the key, a present field never resolves to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    offsets: [u32; FieldKind::COUNT],
    supported: QueryMask,
}

impl Schema {
    /// Resolve the layout of `schema_id` for a database with `column_count` columns.
    ///
    /// # Errors
    ///
    /// [`OpenError::UnknownSchema`] outside 1..=24, [`OpenError::Malformed`] if a
    /// field's column lies beyond `column_count`.
    pub fn resolve(schema_id: u8, column_count: u8) -> Result<Self, OpenError> {
        if schema_id == 0 || schema_id as usize >= COLUMN_TABLE[0].len() {
            return Err(OpenError::UnknownSchema(schema_id));
        }

        let mut offsets = [0u32; FieldKind::COUNT];
        let mut supported = QueryMask::NONE;
        for kind in FieldKind::ALL {
            let col = column(schema_id, kind);
            if col == 0 {
                continue;
            }
            if col > column_count {
                return Err(OpenError::Malformed(format!(
                    "schema {} stores {} in column {} but rows have {} columns",
                    schema_id, kind, col, column_count
                )));
            }
            offsets[kind.index()] = u32::from(col - 1) << 2;
            supported.insert(kind);
        }

        Ok(Schema { offsets, supported })
    }

    /// Byte offset of `kind` within a row, 0 if absent
    #[inline]
    pub fn offset(&self, kind: FieldKind) -> u32 {
        self.offsets[kind.index()]
    }

    /// Fields this schema stores
    pub fn supported(&self) -> QueryMask {
        self.supported
    }

    /// Present fields of `mask` with their offsets
    pub fn fields(&self, mask: QueryMask) -> impl Iterator<Item = (FieldKind, u32)> + '_ {
        (mask & self.supported)
            .iter()
            .map(move |kind| (kind, self.offsets[kind.index()]))
    }
}
