//! Index-accelerated binary search over the sorted range table
//!
//! Each family's table is a run of fixed-width rows sorted by `ipfrom`. Row
//! `i` covers `[ipfrom(i), ipfrom(i + 1))`, so the table stores one trailing
//! sentinel key past the last real row. Boundary addresses bind to the row
//! they start. The family maximum is folded onto `max - 1` before searching,
//! since no half-open row can contain it.
//!
//! When the header names a skip-index for the family, the top 16 bits of the
//! address select an 8-byte slot holding `(low_row, high_row)`, narrowing the
//! search before any row is read.

use super::decode::{parse_elevation, read_f32, read_key, read_string, read_u32};
use super::header::{DatabaseMeta, FamilyTable};
use super::schema::Schema;
use super::types::{AddressFamily, FieldKind, IpKey, QueryMask};
use crate::error::{DecodeError, LookupError};
use crate::record::ResultRecord;
use crate::source::ByteSource;
use tracing::trace;

/// Offset of the country name from the shared country pointer
const COUNTRY_NAME_STRIDE: u64 = 3;

/// Size of one skip-index slot
const INDEX_SLOT_SIZE: u64 = 8;

/// Search and decode `key` against one opened database.
///
/// # Errors
///
/// * [`LookupError::Unsupported`] if `mask` selects none of the schema's fields
/// * [`LookupError::UnsupportedFamily`] if the table for `key`'s family is empty
/// * [`LookupError::NoMatch`] if no row covers the address
/// * [`LookupError::Decode`] on any read or decode failure; no partial record
///   is returned
pub fn lookup<S: ByteSource + ?Sized>(
    meta: &DatabaseMeta,
    schema: &Schema,
    source: &S,
    key: IpKey,
    mask: QueryMask,
) -> Result<ResultRecord, LookupError> {
    if !mask.intersects(schema.supported()) {
        return Err(LookupError::Unsupported);
    }

    let family = key.family();
    let table = meta.table(family);
    if !table.is_present() {
        return Err(LookupError::UnsupportedFamily(family));
    }

    let width = meta.row_width(family);
    let row = find_row(source, table, width, key)?;
    decode_row(source, schema, family, row, mask)
}

/// Locate the 0-based byte position of the row covering `key`.
pub fn find_row<S: ByteSource + ?Sized>(
    source: &S,
    table: &FamilyTable,
    width: u64,
    key: IpKey,
) -> Result<u64, LookupError> {
    let family = key.family();
    let (mut low, mut high) = search_bounds(source, table, key)?;
    trace!(%family, low, high, "search bounds");

    let max = family.max_address();
    let ip = key.value().min(max - 1);
    let base = u64::from(table.base_address) - 1;

    while low <= high {
        let mid = low + (high - low) / 2;
        let row = base + mid * width;

        let ipfrom = read_key(source, row, family)?;
        if ip < ipfrom {
            if mid == 0 {
                break;
            }
            high = mid - 1;
            continue;
        }

        // Upper bound is the next row's ipfrom; only read once the lower bound holds
        let ipto = read_key(source, row + width, family)?;
        if ip >= ipto {
            low = mid + 1;
            continue;
        }

        trace!(%family, row = mid, "matched range row");
        return Ok(row);
    }

    Err(LookupError::NoMatch)
}

/// Inclusive row bounds for the binary search.
///
/// Without a skip-index the bounds are `[0, row_count]`.
pub fn search_bounds<S: ByteSource + ?Sized>(
    source: &S,
    table: &FamilyTable,
    key: IpKey,
) -> Result<(u64, u64), DecodeError> {
    let row_count = u64::from(table.row_count);
    if !table.has_index() {
        return Ok((0, row_count));
    }

    let slot = u64::from(table.index_address) - 1 + key.index_slot() * INDEX_SLOT_SIZE;
    let low = u64::from(read_u32(source, slot)?);
    let high = u64::from(read_u32(source, slot + 4)?);
    if low > high || high > row_count {
        return Err(DecodeError::Malformed(format!(
            "skip-index slot {} holds rows [{}, {}] for a table of {} rows",
            key.index_slot(),
            low,
            high,
            row_count
        )));
    }
    Ok((low, high))
}

/// Start of the float a coordinate pointer refers to. Coordinate pointers sit
/// one byte past the value; string pointers address the length byte itself.
fn coordinate_position(pointer: u64) -> Result<u64, DecodeError> {
    pointer
        .checked_sub(1)
        .ok_or_else(|| DecodeError::Malformed("coordinate pointer is zero".to_string()))
}

/// Decode the fields selected by `mask` from the row at `row`.
fn decode_row<S: ByteSource + ?Sized>(
    source: &S,
    schema: &Schema,
    family: AddressFamily,
    row: u64,
    mask: QueryMask,
) -> Result<ResultRecord, LookupError> {
    // Column offsets assume a 4-byte key; wider keys shift every column
    let columns = row + family.key_width() - 4;

    let mut record = ResultRecord::default();
    for (kind, offset) in schema.fields(mask) {
        let pointer = u64::from(read_u32(source, columns + u64::from(offset))?);
        match kind {
            FieldKind::CountryName => {
                record.set_text(kind, read_string(source, pointer + COUNTRY_NAME_STRIDE)?);
            }
            FieldKind::Latitude | FieldKind::Longitude => {
                record.set_coordinate(kind, read_f32(source, coordinate_position(pointer)?)?);
            }
            FieldKind::Elevation => {
                let text = read_string(source, pointer)?;
                record.set_elevation(parse_elevation(&text)?);
            }
            _ => record.set_text(kind, read_string(source, pointer)?),
        }
    }
    Ok(record)
}
