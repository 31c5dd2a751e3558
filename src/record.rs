//! Lookup results

use crate::rangedb::{FieldKind, QueryMask};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Attributes decoded for one matched range.
///
/// Fields that were not requested, or that the database schema does not
/// store, keep their zero value (`""` or `0.0`). [`ResultRecord::populated`]
/// tells which fields were actually decoded, so a legitimate `0.0` latitude
/// is distinguishable from an absent one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    /// Two-letter country code
    pub country_code: String,
    /// Country name
    pub country_name: String,
    /// Region or state
    pub region: String,
    /// City
    pub city: String,
    /// Internet service provider
    pub isp: String,
    /// Latitude
    pub latitude: f32,
    /// Longitude
    pub longitude: f32,
    /// Domain name
    pub domain: String,
    /// Zip / postal code
    pub zip_code: String,
    /// UTC offset
    pub time_zone: String,
    /// Connection speed class
    pub net_speed: String,
    /// International dialing code
    pub idd_code: String,
    /// Area code
    pub area_code: String,
    /// Weather station code
    pub weather_station_code: String,
    /// Weather station name
    pub weather_station_name: String,
    /// Mobile country code
    pub mcc: String,
    /// Mobile network code
    pub mnc: String,
    /// Mobile carrier brand
    pub mobile_brand: String,
    /// Elevation in meters
    pub elevation: f64,
    /// Usage type
    pub usage_type: String,
    populated: QueryMask,
}

/// Borrowed view of one decoded field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// String field
    Text(&'a str),
    /// Latitude or longitude
    Coordinate(f32),
    /// Elevation
    Float(f64),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Coordinate(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl ResultRecord {
    /// Fields decoded into this record
    pub fn populated(&self) -> QueryMask {
        self.populated
    }

    /// Value of `kind` if it was decoded
    pub fn get(&self, kind: FieldKind) -> Option<FieldValue<'_>> {
        if !self.populated.contains(kind) {
            return None;
        }
        Some(match kind {
            FieldKind::Latitude => FieldValue::Coordinate(self.latitude),
            FieldKind::Longitude => FieldValue::Coordinate(self.longitude),
            FieldKind::Elevation => FieldValue::Float(self.elevation),
            _ => FieldValue::Text(self.text_slot(kind)?),
        })
    }

    /// Decoded fields in bit order
    pub fn fields(&self) -> impl Iterator<Item = (FieldKind, FieldValue<'_>)> + '_ {
        self.populated
            .iter()
            .filter_map(move |kind| self.get(kind).map(|value| (kind, value)))
    }

    pub(crate) fn set_text(&mut self, kind: FieldKind, value: String) {
        if let Some(slot) = self.text_slot_mut(kind) {
            *slot = value;
            self.populated.insert(kind);
        }
    }

    pub(crate) fn set_coordinate(&mut self, kind: FieldKind, value: f32) {
        match kind {
            FieldKind::Latitude => self.latitude = value,
            FieldKind::Longitude => self.longitude = value,
            _ => return,
        }
        self.populated.insert(kind);
    }

    pub(crate) fn set_elevation(&mut self, value: f64) {
        self.elevation = value;
        self.populated.insert(FieldKind::Elevation);
    }

    fn text_slot(&self, kind: FieldKind) -> Option<&str> {
        let slot = match kind {
            FieldKind::CountryCode => &self.country_code,
            FieldKind::CountryName => &self.country_name,
            FieldKind::Region => &self.region,
            FieldKind::City => &self.city,
            FieldKind::Isp => &self.isp,
            FieldKind::Domain => &self.domain,
            FieldKind::ZipCode => &self.zip_code,
            FieldKind::TimeZone => &self.time_zone,
            FieldKind::NetSpeed => &self.net_speed,
            FieldKind::IddCode => &self.idd_code,
            FieldKind::AreaCode => &self.area_code,
            FieldKind::WeatherStationCode => &self.weather_station_code,
            FieldKind::WeatherStationName => &self.weather_station_name,
            FieldKind::Mcc => &self.mcc,
            FieldKind::Mnc => &self.mnc,
            FieldKind::MobileBrand => &self.mobile_brand,
            FieldKind::UsageType => &self.usage_type,
            FieldKind::Latitude | FieldKind::Longitude | FieldKind::Elevation => return None,
        };
        Some(slot.as_str())
    }

    fn text_slot_mut(&mut self, kind: FieldKind) -> Option<&mut String> {
        Some(match kind {
            FieldKind::CountryCode => &mut self.country_code,
            FieldKind::CountryName => &mut self.country_name,
            FieldKind::Region => &mut self.region,
            FieldKind::City => &mut self.city,
            FieldKind::Isp => &mut self.isp,
            FieldKind::Domain => &mut self.domain,
            FieldKind::ZipCode => &mut self.zip_code,
            FieldKind::TimeZone => &mut self.time_zone,
            FieldKind::NetSpeed => &mut self.net_speed,
            FieldKind::IddCode => &mut self.idd_code,
            FieldKind::AreaCode => &mut self.area_code,
            FieldKind::WeatherStationCode => &mut self.weather_station_code,
            FieldKind::WeatherStationName => &mut self.weather_station_name,
            FieldKind::Mcc => &mut self.mcc,
            FieldKind::Mnc => &mut self.mnc,
            FieldKind::MobileBrand => &mut self.mobile_brand,
            FieldKind::UsageType => &mut self.usage_type,
            FieldKind::Latitude | FieldKind::Longitude | FieldKind::Elevation => return None,
        })
    }
}

impl Serialize for ResultRecord {
    /// Serializes decoded fields only, keyed by their snake_case names.
    /// Empty strings are skipped.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (kind, value) in self.fields() {
            match value {
                FieldValue::Text("") => {}
                FieldValue::Text(s) => map.serialize_entry(kind.name(), s)?,
                FieldValue::Coordinate(v) => map.serialize_entry(kind.name(), &v)?,
                FieldValue::Float(v) => map.serialize_entry(kind.name(), &v)?,
            }
        }
        map.end()
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .fields()
            .map(|(kind, _)| kind.name().len())
            .max()
            .unwrap_or(0);
        for (kind, value) in self.fields() {
            writeln!(f, "{:<width$} : {}", kind.name(), value, width = width)?;
        }
        Ok(())
    }
}
