use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::aggregate::aggregate;
use crate::data::cache::SourceCache;
use crate::data::error::LoadError;
use crate::data::filter::{filtered_indices, select, Selection};
use crate::data::metrics::Summary;
use crate::data::model::{AggregateRow, AggregateTable, CleanedTable, Observation};
use crate::geo::MapLayers;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Memoized cleaned tables, keyed by source path.
    cache: SourceCache,

    /// Path of the currently shown source.
    pub source: Option<PathBuf>,

    /// Cleaned table of the current source (None until a load succeeds).
    pub table: Option<Arc<CleanedTable>>,

    /// Counts per (year, common name) over the whole cleaned table.
    pub aggregate: AggregateTable,

    /// Subspecies offered by the sidebar, in encounter order.
    pub categories: Vec<String>,

    /// Slider bounds: min/max year of the aggregate table.
    pub year_bounds: Option<(i32, i32)>,

    /// Current sidebar selection.
    pub selection: Selection,

    /// Indices into `table.rows` passing the selection (cached).
    pub visible_observations: Vec<usize>,

    /// Indices into `aggregate.rows` passing the selection (cached).
    pub visible_aggregate: Vec<usize>,

    pub summary: Summary,

    /// Projected points and heat grid for the visible observations.
    pub map: MapLayers,

    pub color_map: ColorMap,

    /// Layer toggles.
    pub show_markers: bool,
    pub show_heatmap: bool,

    /// Index into `table.rows` of the observation clicked on the map.
    pub picked: Option<usize>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = SourceCache::new(config.rules.clone());
        Self {
            config,
            cache,
            source: None,
            table: None,
            aggregate: AggregateTable::default(),
            categories: Vec::new(),
            year_bounds: None,
            selection: Selection::default(),
            visible_observations: Vec::new(),
            visible_aggregate: Vec::new(),
            summary: Summary::default(),
            map: MapLayers::default(),
            color_map: ColorMap::default(),
            show_markers: true,
            show_heatmap: true,
            picked: None,
            status_message: None,
        }
    }

    /// Load (or fetch from cache) a source and make it current.
    ///
    /// A failed load clears the dashboard and surfaces the error.
    pub fn open_source(&mut self, path: &Path) -> Result<(), LoadError> {
        match self.cache.get_or_load(path) {
            Ok(table) => {
                self.set_table(path.to_path_buf(), table);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                self.clear();
                self.source = Some(path.to_path_buf());
                Err(e)
            }
        }
    }

    /// Drop the cached copy of the current source and read it again.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        let Some(path) = self.source.clone() else {
            return Ok(());
        };
        self.cache.invalidate(&path);
        self.open_source(&path)
    }

    /// Forget every memoized source; the current view stays as is.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        log::info!("source cache cleared");
    }

    pub fn cached_sources(&self) -> usize {
        self.cache.len()
    }

    fn clear(&mut self) {
        self.table = None;
        self.aggregate = AggregateTable::default();
        self.categories.clear();
        self.year_bounds = None;
        self.selection = Selection::default();
        self.color_map = ColorMap::default();
        self.refilter();
    }

    /// Ingest a cleaned table: aggregate, reset the selection to everything,
    /// rebuild colours.
    pub fn set_table(&mut self, path: PathBuf, table: Arc<CleanedTable>) {
        self.aggregate = aggregate(&table.rows);
        self.categories = self.aggregate.categories();
        self.year_bounds = self.aggregate.year_range();
        self.selection = Selection::all(&self.aggregate);
        self.color_map = ColorMap::new(&self.categories);

        log::info!(
            "{} observations, {} aggregate rows, categories {:?}",
            table.len(),
            self.aggregate.len(),
            self.categories
        );

        self.status_message = table.is_empty().then(|| {
            format!("No observations in {} pass the cleaning rules", path.display())
        });
        self.table = Some(table);
        self.source = Some(path);
        // Row indices from the previous table mean nothing here.
        self.picked = None;
        self.refilter();
    }

    /// One render pass worth of derived data: filter both tables, then
    /// recompute the metrics and map layers.
    pub fn refilter(&mut self) {
        self.visible_aggregate = filtered_indices(&self.aggregate.rows, &self.selection);
        self.summary = Summary::from_rows(
            select(&self.aggregate.rows, &self.selection),
            &self.config.rules.canonical_label,
        );

        self.visible_observations = match &self.table {
            Some(t) => filtered_indices(&t.rows, &self.selection),
            None => Vec::new(),
        };

        let coords: Vec<(f64, f64)> = self
            .visible_rows()
            .map(|o| (o.latitude, o.longitude))
            .collect();
        self.map = MapLayers::build(
            &coords,
            self.config.map.heat_resolution,
            self.config.map.heat_radius,
        );

        if let Some(p) = self.picked {
            if !self.visible_observations.contains(&p) {
                self.picked = None;
            }
        }
    }

    /// Visible observations, in table order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Observation> + '_ {
        let rows = self.table.as_deref().map(|t| t.rows.as_slice()).unwrap_or(&[]);
        self.visible_observations.iter().map(move |&i| &rows[i])
    }

    /// Visible aggregate rows, ordered by year.
    pub fn visible_counts(&self) -> impl Iterator<Item = &AggregateRow> + '_ {
        self.visible_aggregate
            .iter()
            .map(move |&i| &self.aggregate.rows[i])
    }

    pub fn picked_observation(&self) -> Option<&Observation> {
        let table = self.table.as_deref()?;
        table.rows.get(self.picked?)
    }

    /// Pick the observation drawn at map position `pos` in `map.points`.
    pub fn pick_map_point(&mut self, pos: Option<usize>) {
        self.picked = pos.and_then(|p| self.visible_observations.get(p).copied());
    }

    pub fn set_year_range(&mut self, start: i32, end: i32) {
        self.selection.start_year = start;
        self.selection.end_year = end;
        self.refilter();
    }

    /// Toggle a single subspecies in the selection.
    pub fn toggle_category(&mut self, name: &str) {
        if !self.selection.categories.remove(name) {
            self.selection.categories.insert(name.to_string());
        }
        self.refilter();
    }

    pub fn select_all(&mut self) {
        self.selection.categories = self.categories.iter().cloned().collect();
        self.refilter();
    }

    pub fn select_none(&mut self) {
        self.selection.categories.clear();
        self.refilter();
    }
}
