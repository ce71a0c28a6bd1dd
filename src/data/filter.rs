use std::collections::HashSet;
use std::iter::Copied;
use std::slice;

use indexmap::IndexSet;

use super::model::{normalize_city, Record};

// ---------------------------------------------------------------------------
// Filter predicate: the user's current selection
// ---------------------------------------------------------------------------

/// Selected license types and cities plus the payment ceiling.
///
/// Both sets keep the order in which the user picked their values. Cities
/// are stored title-cased, so spellings of one city collapse into a single
/// entry. An empty set selects nothing: a multi-select with no choices shows
/// no rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub license_types: IndexSet<String>,
    pub cities: IndexSet<String>,
    pub max_payment: f64,
}

impl FilterCriteria {
    pub fn new<L, C, S1, S2>(license_types: L, cities: C, max_payment: f64) -> Self
    where
        L: IntoIterator<Item = S1>,
        C: IntoIterator<Item = S2>,
        S1: Into<String>,
        S2: Into<String>,
    {
        FilterCriteria {
            license_types: license_types.into_iter().map(Into::into).collect(),
            cities: cities
                .into_iter()
                .filter_map(|c| {
                    let c: String = c.into();
                    normalize_city(Some(&c))
                })
                .collect(),
            max_payment,
        }
    }

    /// Whether every clause can possibly match something.
    pub fn has_selection(&self) -> bool {
        !self.license_types.is_empty() && !self.cities.is_empty() && self.max_payment > 0.0
    }
}

// ---------------------------------------------------------------------------
// FilteredView – borrowed rows that passed the filter
// ---------------------------------------------------------------------------

/// Rows of a [`Table`](super::model::Table) that satisfy a [`FilterCriteria`],
/// in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn iter(&self) -> Copied<slice::Iter<'_, &'a Record>> {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'v, 'a> IntoIterator for &'v FilteredView<'a> {
    type Item = &'a Record;
    type IntoIter = Copied<slice::Iter<'v, &'a Record>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Keep the rows that match every clause of `criteria`:
///
/// * title-cased city is one of the selected cities (compared title-cased)
/// * payment is present and at most `max_payment`
/// * license type is one of the selected license types
/// * both latitude and longitude are present
///
/// `rows` may be a table or an earlier view; applying the same criteria to
/// its own output changes nothing.
pub fn apply<'a, I>(rows: I, criteria: &FilterCriteria) -> FilteredView<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    if criteria.cities.is_empty() || criteria.license_types.is_empty() {
        return FilteredView::default();
    }

    let cities: HashSet<String> = criteria
        .cities
        .iter()
        .filter_map(|c| normalize_city(Some(c)))
        .collect();

    let records: Vec<&Record> = rows
        .into_iter()
        .filter(|r| r.city().is_some_and(|c| cities.contains(&c)))
        .filter(|r| r.pmt_amount.is_some_and(|p| p <= criteria.max_payment))
        .filter(|r| r.license().is_some_and(|l| criteria.license_types.contains(l)))
        .filter(|r| r.has_coordinates())
        .collect();

    log::debug!(
        "Filter kept {} rows ({} cities, {} license types, max payment {})",
        records.len(),
        criteria.cities.len(),
        criteria.license_types.len(),
        criteria.max_payment
    );
    FilteredView { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;
    use crate::data::model::Table;

    const RETAIL: &str = "Medicine Retailers";
    const CULTIVATE: &str = "Medicine Cultivators";
    const BOSTON: Option<(f64, f64)> = Some((42.0, -71.0));

    fn worked_example() -> Table {
        Table::from_records(
            "test",
            vec![
                record(1, Some("Boston"), RETAIL, 1000.0, BOSTON),
                record(2, Some("Boston"), RETAIL, 2000.0, BOSTON),
                record(3, Some("Worcester"), CULTIVATE, 500.0, None),
            ],
        )
        .unwrap()
    }

    fn mixed_table() -> Table {
        let mut records = vec![
            record(1, Some("BOSTON"), RETAIL, 900.0, BOSTON),
            record(2, Some("cambridge"), CULTIVATE, 1200.0, Some((42.37, -71.1))),
            record(3, Some("Lowell"), RETAIL, 1500.0, Some((42.6, -71.3))),
            record(4, None, RETAIL, 100.0, BOSTON),
            record(5, Some("Boston"), CULTIVATE, 0.0, BOSTON),
            record(6, Some("Cambridge"), RETAIL, 1000.0, None),
            record(7, Some("Lowell"), CULTIVATE, 400.0, Some((42.6, -71.3))),
        ];
        records[6].pmt_amount = None;
        Table::from_records("test", records).unwrap()
    }

    fn ids(view: &FilteredView<'_>) -> Vec<String> {
        view.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn worked_example_keeps_only_first_record() {
        let table = worked_example();
        let criteria =
            FilterCriteria::new([RETAIL, CULTIVATE], ["Boston", "Worcester"], 1500.0);
        assert_eq!(ids(&apply(&table, &criteria)), ["1"]);
    }

    #[test]
    fn empty_selection_matches_nothing() {
        let table = mixed_table();
        let no_cities = FilterCriteria::new([RETAIL], Vec::<String>::new(), f64::MAX);
        let no_types = FilterCriteria::new(Vec::<String>::new(), ["Boston"], f64::MAX);
        assert!(apply(&table, &no_cities).is_empty());
        assert!(apply(&table, &no_types).is_empty());
        assert!(!no_cities.has_selection());
    }

    #[test]
    fn city_comparison_is_case_insensitive() {
        let table = mixed_table();
        let criteria = FilterCriteria::new([RETAIL, CULTIVATE], ["boston", "CAMBRIDGE"], 2000.0);
        assert_eq!(ids(&apply(&table, &criteria)), ["1", "2", "5"]);
    }

    #[test]
    fn every_kept_row_satisfies_all_clauses() {
        let table = mixed_table();
        let selections = [
            FilterCriteria::new([RETAIL], ["Boston", "Lowell"], 1000.0),
            FilterCriteria::new([CULTIVATE], ["Lowell", "Cambridge"], 2000.0),
            FilterCriteria::new([RETAIL, CULTIVATE], ["Boston", "Cambridge", "Lowell"], 0.0),
            FilterCriteria::new([RETAIL, CULTIVATE], ["Boston", "Cambridge", "Lowell"], 1500.0),
        ];
        for criteria in &selections {
            let view = apply(&table, criteria);
            for r in &view {
                assert!(criteria.cities.contains(&r.city().unwrap()));
                assert!(r.pmt_amount.unwrap() <= criteria.max_payment);
                assert!(criteria.license_types.contains(r.license().unwrap()));
                assert!(r.has_coordinates());
            }
            assert_eq!(apply(&view, criteria), view, "filter must be idempotent");
        }
    }

    #[test]
    fn preserves_table_order() {
        let table = mixed_table();
        let criteria =
            FilterCriteria::new([RETAIL, CULTIVATE], ["Lowell", "Cambridge", "Boston"], 2000.0);
        assert_eq!(ids(&apply(&table, &criteria)), ["1", "2", "3", "5"]);
    }

    #[test]
    fn city_spellings_collapse_into_one_entry() {
        let criteria =
            FilterCriteria::new([RETAIL], ["Boston", "BOSTON", "lowell", " boston "], 100.0);
        let cities: Vec<&str> = criteria.cities.iter().map(String::as_str).collect();
        assert_eq!(cities, ["Boston", "Lowell"]);
    }

    #[test]
    fn missing_payment_never_matches() {
        let table = mixed_table();
        let criteria = FilterCriteria::new([CULTIVATE], ["Lowell"], f64::MAX);
        assert!(apply(&table, &criteria).is_empty());
    }
}
