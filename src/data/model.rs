use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;

use super::error::DataError;

/// Bucket used for establishments whose city is missing or unparseable.
pub const UNKNOWN_CITY: &str = "Unknown";

// ---------------------------------------------------------------------------
// RecordId – the primary key
// ---------------------------------------------------------------------------

/// Primary key of an establishment (`ID` column).
///
/// Integer ids sort numerically and come before any non-integer id, which
/// sort lexicographically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub struct RecordId {
    raw: String,
    numeric: Option<i64>,
}

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl From<String> for RecordId {
    fn from(raw: String) -> Self {
        let numeric = raw.trim().parse::<i64>().ok();
        RecordId { raw, numeric }
    }
}

impl From<&str> for RecordId {
    fn from(raw: &str) -> Self {
        RecordId::from(raw.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::from(id.to_string())
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.raw.cmp(&other.raw)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

// ---------------------------------------------------------------------------
// City normalisation
// ---------------------------------------------------------------------------

/// Title-case a string: the first letter of every alphabetic run is
/// upper-cased and the rest lower-cased (`"NORTH adams"` → `"North Adams"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Normalise a raw city value. `None` for missing, blank or `nan` cities.
pub fn normalize_city(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let city = title_case(trimmed);
    if city == "Nan" {
        return None;
    }
    Some(city)
}

// ---------------------------------------------------------------------------
// Record – one establishment row
// ---------------------------------------------------------------------------

/// One licensed establishment. Columns not listed here are ignored on load;
/// unparseable numbers load as missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    #[serde(rename = "ID")]
    pub id: RecordId,
    pub business_name: String,
    pub establishment_city: Option<String>,
    pub license_type: Option<String>,
    #[serde(rename = "PMT_AMOUNT", deserialize_with = "csv::invalid_option")]
    pub pmt_amount: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub longitude: Option<f64>,
}

impl Record {
    /// Title-cased city, or `None` when the city is missing.
    pub fn city(&self) -> Option<String> {
        normalize_city(self.establishment_city.as_deref())
    }

    /// Title-cased city, falling back to [`UNKNOWN_CITY`].
    pub fn city_or_unknown(&self) -> String {
        self.city().unwrap_or_else(|| UNKNOWN_CITY.to_string())
    }

    /// License type with surrounding whitespace removed; `None` when blank.
    pub fn license(&self) -> Option<&str> {
        self.license_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// `(latitude, longitude)` when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }

    /// Turn `NaN`/infinite numbers into missing values. Returns how many
    /// fields were dropped.
    pub(crate) fn drop_non_finite(&mut self) -> usize {
        let mut dropped = 0;
        for field in [&mut self.pmt_amount, &mut self.latitude, &mut self.longitude] {
            if field.is_some_and(|v| !v.is_finite()) {
                *field = None;
                dropped += 1;
            }
        }
        dropped
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All establishments, sorted ascending by id. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    /// Sort records by id and reject duplicate ids.
    pub fn from_records(origin: &str, mut records: Vec<Record>) -> Result<Self, DataError> {
        records.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(pair) = records.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(DataError::unavailable(
                origin,
                format!("duplicate ID {}", pair[0].id),
            ));
        }
        Ok(Table { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Number of establishments.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
