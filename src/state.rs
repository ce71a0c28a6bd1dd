use std::sync::Arc;

use indexmap::IndexSet;

use crate::config::DashboardConfig;
use crate::data::aggregate::{ranked_cities, ranked_license_types, CategoryRanking};
use crate::data::chart::{
    prepare_bar_data, prepare_map_data, prepare_pie_data, prepare_top_cities, BarSeries, MapData,
    PieSeries,
};
use crate::data::error::DataError;
use crate::data::filter::{apply, FilterCriteria};
use crate::data::loader::{DataSource, TableCache};
use crate::data::model::Table;

/// The two multi-select filters in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    LicenseType,
    City,
}

impl Category {
    pub fn title(self) -> &'static str {
        match self {
            Category::LicenseType => "License Type",
            Category::City => "City",
        }
    }
}

/// Which charts the user ticked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartToggles {
    pub map: bool,
    pub pie: bool,
    pub bar: bool,
    pub top_cities: bool,
}

/// Chart-ready data for the current selection.
#[derive(Debug, Clone, Default)]
pub struct Charts {
    pub visible: usize,
    pub map: MapData,
    pub pie: PieSeries,
    pub bar: BarSeries,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    cache: TableCache,

    /// Loaded table (None until a source loads successfully).
    pub table: Option<Arc<Table>>,
    pub source: Option<DataSource>,

    /// Selector options, most common first.
    pub license_options: CategoryRanking,
    pub city_options: CategoryRanking,

    pub criteria: FilterCriteria,
    pub toggles: ChartToggles,

    /// Recomputed on every selection change.
    pub charts: Charts,
    pub top_cities: BarSeries,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig, cache: TableCache) -> Self {
        let criteria = FilterCriteria::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            config.payment.default,
        );
        Self {
            config,
            cache,
            table: None,
            source: None,
            license_options: CategoryRanking::default(),
            city_options: CategoryRanking::default(),
            criteria,
            toggles: ChartToggles::default(),
            charts: Charts::default(),
            top_cities: BarSeries::default(),
            status_message: None,
        }
    }

    /// Load (or reuse) the table for `source` and make it current.
    pub fn load_source(&mut self, source: DataSource) -> Result<(), DataError> {
        match self.cache.get_or_load(&source) {
            Ok(table) => {
                log::info!("Showing {} establishments from {source}", table.len());
                self.source = Some(source);
                self.set_table(table);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {source}: {e}");
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Ingest a table: rebuild selector options and clear the selection.
    pub fn set_table(&mut self, table: Arc<Table>) {
        self.license_options = ranked_license_types(&table);
        self.city_options = ranked_cities(&table);
        self.top_cities = prepare_top_cities(&table, self.config.top_cities);
        self.criteria.license_types.clear();
        self.criteria.cities.clear();
        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the chart data after a selection change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            self.charts = Charts::default();
            return;
        };
        let view = apply(&**table, &self.criteria);
        let cities: Vec<&str> = self.criteria.cities.iter().map(String::as_str).collect();
        let bar = match prepare_bar_data(&view) {
            Ok(bar) => {
                self.status_message = None;
                bar
            }
            Err(e) => {
                log::error!("Cannot build payment averages: {e}");
                self.status_message = Some(format!("Error: {e}"));
                BarSeries::default()
            }
        };
        self.charts = Charts {
            visible: view.len(),
            map: prepare_map_data(&view),
            pie: prepare_pie_data(&view, &cities),
            bar,
        };
    }

    pub fn options(&self, category: Category) -> &CategoryRanking {
        match category {
            Category::LicenseType => &self.license_options,
            Category::City => &self.city_options,
        }
    }

    pub fn selected(&self, category: Category) -> &IndexSet<String> {
        match category {
            Category::LicenseType => &self.criteria.license_types,
            Category::City => &self.criteria.cities,
        }
    }

    fn selected_mut(&mut self, category: Category) -> &mut IndexSet<String> {
        match category {
            Category::LicenseType => &mut self.criteria.license_types,
            Category::City => &mut self.criteria.cities,
        }
    }

    /// Toggle a single value; newly selected values go to the end.
    pub fn toggle(&mut self, category: Category, value: &str) {
        let selected = self.selected_mut(category);
        if !selected.shift_remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every option, most common first.
    pub fn select_all(&mut self, category: Category) {
        let all: IndexSet<String> = self.options(category).values().into_iter().collect();
        *self.selected_mut(category) = all;
        self.refilter();
    }

    pub fn select_none(&mut self, category: Category) {
        self.selected_mut(category).clear();
        self.refilter();
    }

    pub fn set_max_payment(&mut self, max_payment: f64) {
        let range = self.config.payment;
        self.criteria.max_payment = max_payment.clamp(range.min, range.max);
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::WINDOWS_1252;

    use super::*;

    const CSV: &str = "ID,business_name,establishment_city,license_type,PMT_AMOUNT,latitude,longitude
1,Leaf One,Boston,Medicine Retailers,1000,42.36,-71.06
2,Leaf Two,boston,Medicine Retailers,1800,42.35,-71.07
3,Grow Co,Worcester,Medicine Cultivators,500,42.26,-71.80
4,Grow Two,Worcester,Medicine Retailers,600,,
5,Salem Shop,Salem,Medicine Retailers,900,42.52,-70.90
";

    fn state_with_table() -> (AppState, tempfile::NamedTempFile) {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), CSV).unwrap();
        let mut state = AppState::new(DashboardConfig::default(), TableCache::new(WINDOWS_1252));
        state
            .load_source(DataSource::File(file.path().to_path_buf()))
            .unwrap();
        (state, file)
    }

    #[test]
    fn loading_populates_ranked_options() {
        let (state, _file) = state_with_table();
        assert_eq!(
            state.options(Category::City).values(),
            ["Boston", "Worcester", "Salem"]
        );
        assert_eq!(
            state.options(Category::LicenseType).values(),
            ["Medicine Retailers", "Medicine Cultivators"]
        );
        assert_eq!(state.top_cities.labels(), ["Boston", "Worcester", "Salem"]);
        assert_eq!(state.charts.visible, 0);
    }

    #[test]
    fn selections_drive_the_charts() {
        let (mut state, _file) = state_with_table();
        state.select_all(Category::LicenseType);
        state.toggle(Category::City, "Worcester");
        state.toggle(Category::City, "Boston");

        // Default ceiling 1000 drops the 1800 payment; record 4 has no coordinates.
        assert_eq!(state.charts.visible, 2);
        assert_eq!(state.charts.map.points.len(), 2);
        let labels: Vec<&str> = state.charts.pie.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Worcester", "Boston"]);
        assert_eq!(state.charts.bar.labels(), ["Boston", "Worcester"]);

        state.set_max_payment(2000.0);
        assert_eq!(state.charts.visible, 3);
        assert_eq!(state.charts.pie.emphasis, Some(1));
    }

    #[test]
    fn toggling_twice_deselects() {
        let (mut state, _file) = state_with_table();
        state.select_all(Category::LicenseType);
        state.toggle(Category::City, "Salem");
        assert_eq!(state.charts.visible, 1);
        state.toggle(Category::City, "Salem");
        assert!(state.selected(Category::City).is_empty());
        assert_eq!(state.charts.visible, 0);
    }

    #[test]
    fn successful_refilter_clears_stale_error() {
        let (mut state, _file) = state_with_table();
        state.status_message = Some("Error: no payments recorded for city 'Boston'".into());
        state.select_all(Category::LicenseType);
        assert_eq!(state.status_message, None);
    }

    #[test]
    fn payment_is_clamped_to_slider_range() {
        let (mut state, _file) = state_with_table();
        state.set_max_payment(99_999.0);
        assert_eq!(state.criteria.max_payment, 2000.0);
    }

    #[test]
    fn failed_load_keeps_previous_table() {
        let (mut state, _file) = state_with_table();
        let dir = tempfile::tempdir().unwrap();
        let err = state.load_source(DataSource::File(dir.path().join("missing.csv")));
        assert!(err.is_err());
        assert!(state.table.is_some());
        assert!(state.status_message.is_some());
    }
}
