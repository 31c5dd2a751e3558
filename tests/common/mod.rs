//! Synthetic BIN database writer shared by the integration tests
#![allow(dead_code)]

use ip2loc::rangedb::schema::{column, required_columns};
use ip2loc::FieldKind;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 0-based position of the first range table
pub const TABLE_START: usize = 64;

const INDEX_SLOTS: usize = 1 << 16;

/// Builder for a database in the BIN layout.
///
/// Every row is identified by a two-letter tag. The tag is the row's country
/// code; every other field is derived from it with [`text_for`],
/// [`latitude_for`], [`longitude_for`] and [`elevation_for`].
#[derive(Debug, Clone)]
pub struct Fixture {
    schema_id: u8,
    ipv4: Vec<(u32, String)>,
    ipv6: Vec<(u128, String)>,
    index: bool,
    elevation_text: Option<String>,
}

impl Fixture {
    pub fn new(schema_id: u8) -> Self {
        Self {
            schema_id,
            ipv4: Vec::new(),
            ipv6: Vec::new(),
            index: false,
            elevation_text: None,
        }
    }

    /// IPv4 rows as `(ipfrom, tag)`, ascending
    pub fn ipv4(mut self, rows: &[(u32, &str)]) -> Self {
        self.ipv4 = rows.iter().map(|(k, t)| (*k, t.to_string())).collect();
        self
    }

    /// IPv6 rows as `(ipfrom, tag)`, ascending
    pub fn ipv6(mut self, rows: &[(u128, &str)]) -> Self {
        self.ipv6 = rows.iter().map(|(k, t)| (*k, t.to_string())).collect();
        self
    }

    /// Emit skip-indexes for every present family
    pub fn with_index(mut self, enabled: bool) -> Self {
        self.index = enabled;
        self
    }

    /// Store `text` as every row's elevation payload
    pub fn elevation_text(mut self, text: &str) -> Self {
        self.elevation_text = Some(text.to_string());
        self
    }

    pub fn columns(&self) -> u8 {
        required_columns(self.schema_id)
    }

    pub fn build(&self) -> Vec<u8> {
        let columns = usize::from(self.columns());
        let w4 = columns * 4;
        let w6 = 16 + (columns - 1) * 4;

        let v4_at = TABLE_START;
        let v4_len = table_len(self.ipv4.len(), w4);
        let v6_at = v4_at + v4_len;
        let v6_len = table_len(self.ipv6.len(), w6);

        let mut cursor = v6_at + v6_len;
        let mut reserve_index = |present: bool| {
            if self.index && present {
                let at = cursor;
                cursor += INDEX_SLOTS * 8;
                Some(at)
            } else {
                None
            }
        };
        let v4_index = reserve_index(!self.ipv4.is_empty());
        let v6_index = reserve_index(!self.ipv6.is_empty());

        let mut data = vec![0u8; cursor];

        // String pool after the fixed regions
        let pointers4: Vec<Vec<u32>> = self
            .ipv4
            .iter()
            .map(|(_, tag)| self.write_strings(&mut data, tag, columns))
            .collect();
        let pointers6: Vec<Vec<u32>> = self
            .ipv6
            .iter()
            .map(|(_, tag)| self.write_strings(&mut data, tag, columns))
            .collect();

        for (i, ((from, _), pointers)) in self.ipv4.iter().zip(&pointers4).enumerate() {
            write_row(&mut data, v4_at + i * w4, &from.to_le_bytes(), pointers);
        }
        if !self.ipv4.is_empty() {
            let sentinel = v4_at + self.ipv4.len() * w4;
            put(&mut data, sentinel, &u32::MAX.to_le_bytes());
        }

        for (i, ((from, _), pointers)) in self.ipv6.iter().zip(&pointers6).enumerate() {
            write_row(&mut data, v6_at + i * w6, &from.to_le_bytes(), pointers);
        }
        if !self.ipv6.is_empty() {
            let sentinel = v6_at + self.ipv6.len() * w6;
            put(&mut data, sentinel, &u128::MAX.to_le_bytes());
        }

        if let Some(at) = v4_index {
            let froms: Vec<u128> = self.ipv4.iter().map(|(k, _)| u128::from(*k)).collect();
            write_index(&mut data, at, &froms, 16);
        }
        if let Some(at) = v6_index {
            let froms: Vec<u128> = self.ipv6.iter().map(|(k, _)| *k).collect();
            write_index(&mut data, at, &froms, 112);
        }

        let address = |present: bool, at: usize| if present { at as u32 + 1 } else { 0 };
        data[0] = self.schema_id;
        data[1] = columns as u8;
        data[2] = 24;
        data[3] = 1;
        data[4] = 2;
        let words = [
            self.ipv4.len() as u32,
            address(!self.ipv4.is_empty(), v4_at),
            self.ipv6.len() as u32,
            address(!self.ipv6.is_empty(), v6_at),
            v4_index.map_or(0, |at| at as u32 + 1),
            v6_index.map_or(0, |at| at as u32 + 1),
        ];
        for (i, word) in words.iter().enumerate() {
            put(&mut data, 5 + i * 4, &word.to_le_bytes());
        }
        data
    }

    /// Append one row's values to the pool; returns pointers indexed by column
    fn write_strings(&self, data: &mut Vec<u8>, tag: &str, columns: usize) -> Vec<u32> {
        assert_eq!(tag.len(), 2, "tags double as two-letter country codes");
        let mut pointers = vec![0u32; columns + 1];
        for kind in FieldKind::ALL {
            let col = usize::from(column(self.schema_id, kind));
            if col == 0 || pointers[col] != 0 {
                continue;
            }
            pointers[col] = data.len() as u32;
            if matches!(kind, FieldKind::Latitude | FieldKind::Longitude) {
                // Coordinate pointers sit one byte past the float
                pointers[col] += 1;
            }
            match kind {
                FieldKind::CountryCode | FieldKind::CountryName => {
                    push_string(data, tag.as_bytes());
                    push_string(data, text_for(tag, FieldKind::CountryName).as_bytes());
                }
                FieldKind::Latitude => data.extend_from_slice(&latitude_for(tag).to_le_bytes()),
                FieldKind::Longitude => data.extend_from_slice(&longitude_for(tag).to_le_bytes()),
                FieldKind::Elevation => {
                    let text = self
                        .elevation_text
                        .clone()
                        .unwrap_or_else(|| text_for(tag, kind));
                    push_string(data, text.as_bytes());
                }
                _ => push_string(data, text_for(tag, kind).as_bytes()),
            }
        }
        pointers
    }
}

fn table_len(rows: usize, width: usize) -> usize {
    if rows == 0 {
        0
    } else {
        (rows + 1) * width
    }
}

fn put(data: &mut [u8], at: usize, bytes: &[u8]) {
    data[at..at + bytes.len()].copy_from_slice(bytes);
}

fn push_string(data: &mut Vec<u8>, bytes: &[u8]) {
    data.push(bytes.len() as u8);
    data.extend_from_slice(bytes);
}

fn write_row(data: &mut [u8], at: usize, key: &[u8], pointers: &[u32]) {
    put(data, at, key);
    for (c, pointer) in pointers.iter().enumerate().skip(2) {
        put(data, at + key.len() + (c - 2) * 4, &pointer.to_le_bytes());
    }
}

/// Row holding `ip`: the last row whose ipfrom is not above it
fn row_of(froms: &[u128], ip: u128) -> u32 {
    froms.iter().rposition(|from| *from <= ip).unwrap_or(0) as u32
}

fn write_index(data: &mut [u8], at: usize, froms: &[u128], shift: u32) {
    let span = (1u128 << shift) - 1;
    for slot in 0..INDEX_SLOTS {
        let start = (slot as u128) << shift;
        let low = row_of(froms, start);
        let high = row_of(froms, start | span);
        put(data, at + slot * 8, &low.to_le_bytes());
        put(data, at + slot * 8 + 4, &high.to_le_bytes());
    }
}

fn tag_sum(tag: &str) -> u32 {
    tag.bytes().map(u32::from).sum()
}

/// Text a fixture stores for `kind` on the row tagged `tag`
pub fn text_for(tag: &str, kind: FieldKind) -> String {
    match kind {
        FieldKind::CountryCode => tag.to_string(),
        FieldKind::CountryName => format!("Land of {}", tag),
        FieldKind::Elevation => elevation_for(tag).to_string(),
        _ => format!("{} {}", tag, kind.name()),
    }
}

pub fn latitude_for(tag: &str) -> f32 {
    (tag_sum(tag) % 90) as f32 + 0.25
}

pub fn longitude_for(tag: &str) -> f32 {
    -((tag_sum(tag) % 180) as f32) - 0.5
}

pub fn elevation_for(tag: &str) -> f64 {
    f64::from(tag_sum(tag))
}

/// Rows `[0,100) AA, [100,200) BB, [200,max] CC`
pub fn three_rows_v4() -> Vec<(u32, &'static str)> {
    vec![(0, "AA"), (100, "BB"), (200, "CC")]
}

/// Write `bytes` to a fresh temporary file
pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Write `bytes` to `dir/name`, creating parent directories
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}
