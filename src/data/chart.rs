use std::collections::HashSet;

use super::aggregate::{city_averages, city_payments, top_cities};
use super::error::DataError;
use super::filter::FilteredView;
use super::model::{normalize_city, Table};

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub business_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapData {
    pub points: Vec<MapPoint>,
}

impl MapData {
    /// Mean `(latitude, longitude)` of all points; `None` when there are none.
    pub fn center(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let lat = self.points.iter().map(|p| p.latitude).sum::<f64>() / n;
        let lon = self.points.iter().map(|p| p.longitude).sum::<f64>() / n;
        Some((lat, lon))
    }
}

/// One point per establishment in the view.
pub fn prepare_map_data(view: &FilteredView<'_>) -> MapData {
    let points = view
        .iter()
        .filter_map(|r| {
            let (latitude, longitude) = r.coordinates()?;
            Some(MapPoint {
                business_name: r.business_name.clone(),
                latitude,
                longitude,
            })
        })
        .collect();
    MapData { points }
}

// ---------------------------------------------------------------------------
// Pie – market share of the selected cities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PieSeries {
    pub slices: Vec<PieSlice>,
    /// Slice drawn pulled out of the pie: the first largest count.
    pub emphasis: Option<usize>,
}

impl PieSeries {
    pub fn total(&self) -> usize {
        self.slices.iter().map(|s| s.count).sum()
    }
}

/// Count establishments per requested city, in request order. Cities with
/// no establishments get a zero count. Spellings of a city already requested
/// (`"BOSTON"` after `"Boston"`) are skipped; the first spelling labels the
/// slice.
pub fn prepare_pie_data<S: AsRef<str>>(view: &FilteredView<'_>, cities: &[S]) -> PieSeries {
    let view_cities: Vec<Option<String>> = view.iter().map(|r| r.city()).collect();
    let mut seen = HashSet::new();
    let slices: Vec<PieSlice> = cities
        .iter()
        .filter(|city| match normalize_city(Some(city.as_ref())) {
            Some(normalized) => seen.insert(normalized),
            None => true,
        })
        .map(|city| {
            let wanted = normalize_city(Some(city.as_ref()));
            let count = match wanted {
                Some(_) => view_cities.iter().filter(|c| **c == wanted).count(),
                None => 0,
            };
            PieSlice {
                label: city.as_ref().to_string(),
                count,
            }
        })
        .collect();
    let counts: Vec<usize> = slices.iter().map(|s| s.count).collect();
    PieSeries {
        emphasis: emphasis_index(&counts),
        slices,
    }
}

/// Index of the largest count; the first one wins a tie.
pub fn emphasis_index(counts: &[usize]) -> Option<usize> {
    let max = counts.iter().max()?;
    counts.iter().position(|c| c == max)
}

// ---------------------------------------------------------------------------
// Bars
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn labels(&self) -> Vec<String> {
        self.bars.iter().map(|b| b.label.clone()).collect()
    }
}

/// Average payment per city, cities in order of first appearance.
pub fn prepare_bar_data(view: &FilteredView<'_>) -> Result<BarSeries, DataError> {
    let averages = city_averages(&city_payments(view))?;
    let bars = averages
        .into_iter()
        .map(|(label, value)| Bar { label, value })
        .collect();
    Ok(BarSeries { bars })
}

/// Establishment counts for the `n` biggest cities of the whole table.
pub fn prepare_top_cities(table: &Table, n: usize) -> BarSeries {
    let bars = top_cities(table, n)
        .entries()
        .iter()
        .map(|e| Bar {
            label: e.value.clone(),
            value: e.count as f64,
        })
        .collect();
    BarSeries { bars }
}
