use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use encoding_rs::{Encoding, UTF_8};

use super::error::DataError;
use super::model::{Record, Table};

/// Columns every dataset must provide. Any other column is ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "ID",
    "business_name",
    "establishment_city",
    "license_type",
    "PMT_AMOUNT",
    "latitude",
    "longitude",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ---------------------------------------------------------------------------
// DataSource – where the CSV comes from
// ---------------------------------------------------------------------------

/// Location of the establishment CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    /// `http(s)://` strings are URLs, anything else is a local path.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::File(PathBuf::from(s))
        }
    }

    /// Identity used as the cache key.
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// Fetch, decode and parse the dataset. One attempt, no retries.
    pub fn load(&self, encoding: &'static Encoding) -> Result<Table, DataError> {
        let origin = self.id();
        let bytes = self.fetch()?;
        log::debug!("Fetched {} bytes from {origin}", bytes.len());
        let text = decode(&origin, &bytes, encoding)?;
        let table = parse_csv(&origin, &text)?;
        log::info!("Loaded {} establishments from {origin}", table.len());
        Ok(table)
    }

    fn fetch(&self) -> Result<Vec<u8>, DataError> {
        match self {
            DataSource::Url(url) => {
                let response = reqwest::blocking::get(url)
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| DataError::unavailable(url.as_str(), e))?;
                let body = response
                    .bytes()
                    .map_err(|e| DataError::unavailable(url.as_str(), e))?;
                Ok(body.to_vec())
            }
            DataSource::File(path) => {
                std::fs::read(path).map_err(|e| DataError::unavailable(self.id(), e))
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{url}"),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding + parsing
// ---------------------------------------------------------------------------

/// Strict decode: any byte sequence that is invalid in `encoding` is an
/// error rather than a replacement character.
fn decode(origin: &str, bytes: &[u8], encoding: &'static Encoding) -> Result<String, DataError> {
    let bytes = if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| DataError::DecodeError {
            origin: origin.to_string(),
            encoding: encoding.name(),
        })
}

/// Parse decoded CSV text into a [`Table`].
pub fn parse_csv(origin: &str, text: &str) -> Result<Table, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DataError::unavailable(origin, format!("reading CSV headers: {e}")))?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(DataError::unavailable(
            origin,
            format!("CSV missing columns: {}", missing.join(", ")),
        ));
    }

    let mut records = Vec::new();
    let mut dropped = 0;
    for (row_no, result) in reader.deserialize::<Record>().enumerate() {
        let mut record =
            result.map_err(|e| DataError::unavailable(origin, format!("CSV row {row_no}: {e}")))?;
        dropped += record.drop_non_finite();
        records.push(record);
    }
    if dropped > 0 {
        log::warn!("{origin}: treated {dropped} non-finite numeric values as missing");
    }

    Table::from_records(origin, records)
}

// ---------------------------------------------------------------------------
// TableCache – load once per source
// ---------------------------------------------------------------------------

/// Loaded tables keyed by source identity. Failed loads are not cached and
/// entries live until the cache is dropped.
pub struct TableCache {
    encoding: &'static Encoding,
    tables: Mutex<HashMap<String, Arc<Table>>>,
}

impl TableCache {
    pub fn new(encoding: &'static Encoding) -> Self {
        TableCache {
            encoding,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached table for `source`, loading it on first use.
    ///
    /// The lock is not held while loading. If two callers race on the same
    /// source, both load and the first table inserted wins.
    pub fn get_or_load(&self, source: &DataSource) -> Result<Arc<Table>, DataError> {
        let key = source.id();
        if let Some(table) = self.lock().get(&key) {
            log::debug!("Table cache hit for {key}");
            return Ok(Arc::clone(table));
        }
        let loaded = Arc::new(source.load(self.encoding)?);
        let mut tables = self.lock();
        Ok(Arc::clone(tables.entry(key).or_insert(loaded)))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Table>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use encoding_rs::WINDOWS_1252;

    use super::*;

    const HEADER: &str = "ID,business_name,establishment_city,license_type,PMT_AMOUNT,latitude,longitude,extra";

    fn latin1_fixture() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(HEADER.as_bytes());
        bytes.extend_from_slice(b"\n3,Green Leaf,CHICOP\xC9E,Medicine Retailers,1500,42.15,-72.6,x\n");
        bytes.extend_from_slice(b"1,Bay Cultivation,boston,Medicine Cultivators,1000,42.36,-71.06,y\n");
        bytes.extend_from_slice(b"2,Nowhere Inc,,Medicine Retailers,n/a,,,z\n");
        bytes
    }

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn parse_distinguishes_urls_and_paths() {
        assert_eq!(
            DataSource::parse(" https://example.org/data.csv "),
            DataSource::Url("https://example.org/data.csv".to_string())
        );
        assert_eq!(
            DataSource::parse("data/cannabis.csv"),
            DataSource::File(PathBuf::from("data/cannabis.csv"))
        );
    }

    #[test]
    fn loads_latin1_file_sorted_by_id() {
        let file = write_temp(&latin1_fixture());
        let table = DataSource::File(file.path().to_path_buf())
            .load(WINDOWS_1252)
            .unwrap();

        let ids: Vec<&str> = table.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(table.records()[2].city().as_deref(), Some("Chicopée"));
        assert_eq!(table.records()[0].city().as_deref(), Some("Boston"));
    }

    #[test]
    fn blank_and_invalid_fields_load_as_missing() {
        let file = write_temp(&latin1_fixture());
        let table = DataSource::File(file.path().to_path_buf())
            .load(WINDOWS_1252)
            .unwrap();
        let nowhere = &table.records()[1];
        assert_eq!(nowhere.establishment_city, None);
        assert_eq!(nowhere.pmt_amount, None);
        assert!(!nowhere.has_coordinates());
    }

    #[test]
    fn strict_utf8_rejects_latin1_bytes() {
        let file = write_temp(&latin1_fixture());
        let err = DataSource::File(file.path().to_path_buf())
            .load(UTF_8)
            .unwrap_err();
        assert!(matches!(err, DataError::DecodeError { encoding: "UTF-8", .. }));
    }

    #[test]
    fn utf8_bom_is_skipped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(HEADER.as_bytes());
        bytes.extend_from_slice("\n1,Café,Salem,Medicine Retailers,10,42.5,-70.9,\n".as_bytes());
        let table = decode("bom", &bytes, UTF_8)
            .and_then(|text| parse_csv("bom", &text))
            .unwrap();
        assert_eq!(table.records()[0].business_name, "Café");
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = parse_csv("test", "ID,business_name\n1,A\n").unwrap_err();
        match err {
            DataError::DataUnavailable { reason, .. } => {
                assert!(reason.contains("establishment_city"));
                assert!(reason.contains("PMT_AMOUNT"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_coordinates_are_dropped() {
        let text = format!("{HEADER}\n1,A,Boston,Medicine Retailers,10,NaN,-71.0,\n");
        let table = parse_csv("test", &text).unwrap();
        assert_eq!(table.records()[0].latitude, None);
        assert_eq!(table.records()[0].longitude, Some(-71.0));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::File(dir.path().join("absent.csv"));
        assert!(matches!(
            source.load(WINDOWS_1252),
            Err(DataError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn cache_returns_same_table_without_refetching() {
        let file = write_temp(&latin1_fixture());
        let source = DataSource::File(file.path().to_path_buf());
        let cache = TableCache::new(WINDOWS_1252);

        let first = cache.get_or_load(&source).unwrap();
        std::fs::write(file.path(), b"not a csv at all").unwrap();
        let second = cache.get_or_load(&source).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_loads_share_one_entry() {
        let cache = Arc::new(TableCache::new(WINDOWS_1252));
        let file = write_temp(&latin1_fixture());
        let source = DataSource::File(file.path().to_path_buf());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let source = source.clone();
                std::thread::spawn(move || cache.get_or_load(&source).map(|t| t.len()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 3);
        }
        assert_eq!(cache.len(), 1);
        let first = cache.get_or_load(&source).unwrap();
        assert!(Arc::ptr_eq(&first, &cache.get_or_load(&source).unwrap()));
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.csv");
        let source = DataSource::File(path.clone());
        let cache = TableCache::new(WINDOWS_1252);

        assert!(cache.get_or_load(&source).is_err());
        assert!(cache.is_empty());

        std::fs::write(&path, latin1_fixture()).unwrap();
        let table = cache.get_or_load(&source).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn reloading_produces_identical_tables() {
        let file = write_temp(&latin1_fixture());
        let source = DataSource::File(file.path().to_path_buf());
        assert_eq!(
            source.load(WINDOWS_1252).unwrap(),
            source.load(WINDOWS_1252).unwrap()
        );
    }
}
