use std::cmp::Reverse;

use indexmap::IndexMap;

use super::error::DataError;
use super::model::{Record, Table};

/// Payments per city, in order of first appearance.
pub type CityPayments = IndexMap<String, Vec<f64>>;

/// Mean payment per city, same key order as the [`CityPayments`] it came from.
pub type CityAverages = IndexMap<String, f64>;

// ---------------------------------------------------------------------------
// CategoryRanking – distinct values ordered by frequency
// ---------------------------------------------------------------------------

/// A distinct category value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCategory {
    pub value: String,
    pub count: usize,
}

/// Distinct values ordered by descending count; equal counts keep the order
/// in which the values were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRanking {
    entries: Vec<RankedCategory>,
}

impl CategoryRanking {
    /// Rank the values yielded by `values`.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // IndexMap position doubles as the first-seen index.
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for value in values {
            *counts.entry(value.into()).or_default() += 1;
        }

        let mut ranked: Vec<(usize, RankedCategory)> = counts
            .into_iter()
            .enumerate()
            .map(|(first_seen, (value, count))| (first_seen, RankedCategory { value, count }))
            .collect();
        ranked.sort_by_key(|(first_seen, entry)| (Reverse(entry.count), *first_seen));

        CategoryRanking {
            entries: ranked.into_iter().map(|(_, entry)| entry).collect(),
        }
    }

    pub fn entries(&self) -> &[RankedCategory] {
        &self.entries
    }

    /// Values only, in rank order.
    pub fn values(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.value.clone()).collect()
    }

    /// Keep only the `n` highest-ranked entries.
    pub fn truncated(mut self, n: usize) -> Self {
        self.entries.truncate(n);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rankings over the whole table
// ---------------------------------------------------------------------------

/// Title-cased cities by frequency. Records without a city are skipped.
pub fn ranked_cities(table: &Table) -> CategoryRanking {
    CategoryRanking::from_values(table.iter().filter_map(Record::city))
}

/// License types by frequency, verbatim. Blank license types are skipped.
pub fn ranked_license_types(table: &Table) -> CategoryRanking {
    CategoryRanking::from_values(table.iter().filter_map(Record::license))
}

/// The `n` cities with the most establishments, with their counts.
pub fn top_cities(table: &Table, n: usize) -> CategoryRanking {
    ranked_cities(table).truncated(n)
}

// ---------------------------------------------------------------------------
// Payment grouping
// ---------------------------------------------------------------------------

/// Group payments by title-cased city. Records without a city land in the
/// [`UNKNOWN_CITY`](super::model::UNKNOWN_CITY) bucket; records without a
/// payment add nothing.
pub fn city_payments<'a, I>(rows: I) -> CityPayments
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut payments = CityPayments::new();
    for record in rows {
        if let Some(amount) = record.pmt_amount {
            payments
                .entry(record.city_or_unknown())
                .or_default()
                .push(amount);
        }
    }
    log::debug!("Grouped payments into {} cities", payments.len());
    payments
}

/// Arithmetic mean per city. A city with no payments is an error rather
/// than a NaN average.
pub fn city_averages(payments: &CityPayments) -> Result<CityAverages, DataError> {
    payments
        .iter()
        .map(|(city, amounts)| {
            if amounts.is_empty() {
                return Err(DataError::EmptyGroup(city.clone()));
            }
            let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
            Ok((city.clone(), mean))
        })
        .collect()
}
