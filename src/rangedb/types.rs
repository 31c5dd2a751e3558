//! Range database type definitions
//!
//! Address families, field kinds, field masks and parsed query keys.

use crate::error::LookupError;
use std::fmt;
use std::net::IpAddr;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// 32-bit addresses, 4-byte keys
    V4,
    /// 128-bit addresses, 16-byte keys
    V6,
}

impl AddressFamily {
    /// Width in bytes of an `ipfrom` key in a range row
    pub const fn key_width(self) -> u64 {
        match self {
            AddressFamily::V4 => 4,
            AddressFamily::V6 => 16,
        }
    }

    /// Largest representable address
    pub const fn max_address(self) -> u128 {
        match self {
            AddressFamily::V4 => u32::MAX as u128,
            AddressFamily::V6 => u128::MAX,
        }
    }

    /// Shift that leaves the top 16 bits of an address (skip-index slot)
    const fn index_shift(self) -> u32 {
        match self {
            AddressFamily::V4 => 16,
            AddressFamily::V6 => 112,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// Attribute stored per range row.
///
/// The discriminant is the bit position in a [`QueryMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldKind {
    /// Two-letter country code
    CountryCode = 0,
    /// Full country name
    CountryName,
    /// Region or state
    Region,
    /// City
    City,
    /// Internet service provider
    Isp,
    /// Latitude (single precision)
    Latitude,
    /// Longitude (single precision)
    Longitude,
    /// Domain name
    Domain,
    /// Zip / postal code
    ZipCode,
    /// UTC offset, e.g. `-07:00`
    TimeZone,
    /// Connection speed class
    NetSpeed,
    /// International direct dialing code
    IddCode,
    /// Area code
    AreaCode,
    /// Weather station code
    WeatherStationCode,
    /// Weather station name
    WeatherStationName,
    /// Mobile country code
    Mcc,
    /// Mobile network code
    Mnc,
    /// Mobile carrier brand
    MobileBrand,
    /// Elevation in meters
    Elevation,
    /// Usage type (COM, ISP, MOB, ...)
    UsageType,
}

impl FieldKind {
    /// Number of field kinds
    pub const COUNT: usize = 20;

    /// Every field kind in bit order
    pub const ALL: [FieldKind; FieldKind::COUNT] = [
        FieldKind::CountryCode,
        FieldKind::CountryName,
        FieldKind::Region,
        FieldKind::City,
        FieldKind::Isp,
        FieldKind::Latitude,
        FieldKind::Longitude,
        FieldKind::Domain,
        FieldKind::ZipCode,
        FieldKind::TimeZone,
        FieldKind::NetSpeed,
        FieldKind::IddCode,
        FieldKind::AreaCode,
        FieldKind::WeatherStationCode,
        FieldKind::WeatherStationName,
        FieldKind::Mcc,
        FieldKind::Mnc,
        FieldKind::MobileBrand,
        FieldKind::Elevation,
        FieldKind::UsageType,
    ];

    /// Position of this kind in tables and masks
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name
    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::CountryCode => "country_code",
            FieldKind::CountryName => "country_name",
            FieldKind::Region => "region",
            FieldKind::City => "city",
            FieldKind::Isp => "isp",
            FieldKind::Latitude => "latitude",
            FieldKind::Longitude => "longitude",
            FieldKind::Domain => "domain",
            FieldKind::ZipCode => "zip_code",
            FieldKind::TimeZone => "time_zone",
            FieldKind::NetSpeed => "net_speed",
            FieldKind::IddCode => "idd_code",
            FieldKind::AreaCode => "area_code",
            FieldKind::WeatherStationCode => "weather_station_code",
            FieldKind::WeatherStationName => "weather_station_name",
            FieldKind::Mcc => "mcc",
            FieldKind::Mnc => "mnc",
            FieldKind::MobileBrand => "mobile_brand",
            FieldKind::Elevation => "elevation",
            FieldKind::UsageType => "usage_type",
        }
    }

    /// Look up a kind by its snake_case name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        FieldKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bit-set over [`FieldKind`]s selecting which attributes to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueryMask(u32);

impl QueryMask {
    /// No fields
    pub const NONE: QueryMask = QueryMask(0);

    /// Every field kind
    pub const ALL: QueryMask = QueryMask((1 << FieldKind::COUNT) - 1);

    /// Mask holding a single kind
    #[inline]
    pub const fn of(kind: FieldKind) -> Self {
        QueryMask(1 << kind as u32)
    }

    /// Raw bits (bit `n` is `FieldKind` with discriminant `n`)
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping bits with no field kind
    pub const fn from_bits_truncate(bits: u32) -> Self {
        QueryMask(bits & QueryMask::ALL.0)
    }

    /// Returns true if `kind` is selected
    #[inline]
    pub const fn contains(self, kind: FieldKind) -> bool {
        self.0 & (1 << kind as u32) != 0
    }

    /// Returns true if no kind is selected
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the masks share at least one kind
    pub const fn intersects(self, other: QueryMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Add a kind
    pub fn insert(&mut self, kind: FieldKind) {
        self.0 |= 1 << kind as u32;
    }

    /// Selected kinds in bit order
    pub fn iter(self) -> impl Iterator<Item = FieldKind> {
        FieldKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl From<FieldKind> for QueryMask {
    fn from(kind: FieldKind) -> Self {
        QueryMask::of(kind)
    }
}

impl BitOr for QueryMask {
    type Output = QueryMask;

    fn bitor(self, rhs: QueryMask) -> QueryMask {
        QueryMask(self.0 | rhs.0)
    }
}

impl BitOr<FieldKind> for QueryMask {
    type Output = QueryMask;

    fn bitor(self, rhs: FieldKind) -> QueryMask {
        self | QueryMask::of(rhs)
    }
}

impl BitOrAssign for QueryMask {
    fn bitor_assign(&mut self, rhs: QueryMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for QueryMask {
    type Output = QueryMask;

    fn bitand(self, rhs: QueryMask) -> QueryMask {
        QueryMask(self.0 & rhs.0)
    }
}

impl FromIterator<FieldKind> for QueryMask {
    fn from_iter<I: IntoIterator<Item = FieldKind>>(iter: I) -> Self {
        let mut mask = QueryMask::NONE;
        for kind in iter {
            mask.insert(kind);
        }
        mask
    }
}

impl FromStr for QueryMask {
    type Err = String;

    /// Parse a comma-separated list of field names; `all` selects everything.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mask = QueryMask::NONE;
        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if name.eq_ignore_ascii_case("all") {
                mask |= QueryMask::ALL;
                continue;
            }
            let kind = FieldKind::from_name(name)
                .ok_or_else(|| format!("Unknown field: {}", name))?;
            mask.insert(kind);
        }
        if mask.is_empty() {
            return Err("No fields selected".to_string());
        }
        Ok(mask)
    }
}

/// Parsed query address.
///
/// IPv4 addresses (including IPv4-mapped IPv6 text) are 32-bit keys; everything
/// else is a 128-bit key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpKey {
    /// IPv4 address as a host-order integer
    V4(u32),
    /// IPv6 address as a host-order integer
    V6(u128),
}

impl IpKey {
    /// Parse textual IPv4 or IPv6. Surrounding whitespace is not accepted.
    pub fn parse(text: &str) -> Result<Self, LookupError> {
        text.parse::<IpAddr>()
            .map(IpKey::from)
            .map_err(|_| LookupError::InvalidAddress(text.to_string()))
    }

    /// Address family of this key
    pub const fn family(self) -> AddressFamily {
        match self {
            IpKey::V4(_) => AddressFamily::V4,
            IpKey::V6(_) => AddressFamily::V6,
        }
    }

    /// Numeric value widened to 128 bits
    pub const fn value(self) -> u128 {
        match self {
            IpKey::V4(v) => v as u128,
            IpKey::V6(v) => v,
        }
    }

    /// Skip-index slot number (top 16 bits of the address)
    pub const fn index_slot(self) -> u64 {
        (self.value() >> self.family().index_shift()) as u64
    }
}

impl From<IpAddr> for IpKey {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => IpKey::V4(u32::from(v4)),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => IpKey::V4(u32::from(v4)),
                None => IpKey::V6(u128::from(v6)),
            },
        }
    }
}
