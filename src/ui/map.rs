use std::cell::Cell;
use std::collections::HashMap;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Legend, Plot, PlotPoint, PlotPoints, PlotUi, Points, Polygon, Text};

use crate::color::heat_color;
use crate::config::{DashboardConfig, MapSettings, MapStrategy};
use crate::geo::{cluster, Cluster, PlanePoint};
use crate::state::AppState;

const MARKER_LAYER: &str = "Bear Observations";
const HEAT_LAYER: &str = "Heatmap of Bear Observations";
const CLUSTER_COLOR: Color32 = Color32::from_rgb(241, 128, 23);

// ---------------------------------------------------------------------------
// Pluggable marker strategies
// ---------------------------------------------------------------------------

/// Draws the marker layer. The heatmap layer and the plot chrome are shared.
pub trait MapRenderer {
    fn draw_markers(&self, plot_ui: &mut PlotUi, state: &AppState);
}

/// Pick the renderer the config asks for.
pub fn renderer_for(config: &DashboardConfig) -> Box<dyn MapRenderer> {
    match config.map_strategy {
        MapStrategy::Points => Box::new(PointRenderer::new(&config.map)),
        MapStrategy::Cluster => Box::new(ClusterRenderer::new(&config.map)),
    }
}

/// One marker per observation, coloured by subspecies.
pub struct PointRenderer {
    radius: f32,
}

impl PointRenderer {
    pub fn new(settings: &MapSettings) -> Self {
        Self {
            radius: settings.marker_radius,
        }
    }
}

impl MapRenderer for PointRenderer {
    fn draw_markers(&self, plot_ui: &mut PlotUi, state: &AppState) {
        draw_points_by_category(plot_ui, state, None, self.radius);
    }
}

/// Markers merged per grid cell; the cell shrinks as the user zooms in.
pub struct ClusterRenderer {
    radius: f32,
    divisions: f64,
}

impl ClusterRenderer {
    pub fn new(settings: &MapSettings) -> Self {
        Self {
            radius: settings.marker_radius,
            divisions: settings.cluster_divisions.max(1.0),
        }
    }
}

impl MapRenderer for ClusterRenderer {
    fn draw_markers(&self, plot_ui: &mut PlotUi, state: &AppState) {
        let cell = plot_ui.plot_bounds().width() / self.divisions;
        let clusters = cluster(&state.map.points, cell);

        let singles = singleton_mask(&clusters, state.map.points.len());
        draw_points_by_category(plot_ui, state, Some(&singles), self.radius);

        for c in clusters.iter().filter(|c| c.count() > 1) {
            let radius = self.radius * 2.0 + (c.count() as f32).sqrt() * 2.0;
            plot_ui.points(
                Points::new(PlotPoints::new(vec![c.center]))
                    .name(MARKER_LAYER)
                    .color(CLUSTER_COLOR)
                    .filled(true)
                    .radius(radius),
            );
            plot_ui.text(Text::new(
                PlotPoint::new(c.center[0], c.center[1]),
                RichText::new(c.count().to_string()).strong().color(Color32::BLACK),
            ));
        }
    }
}

/// `mask[pos]` is true when the point at `pos` sits alone in its cluster.
fn singleton_mask(clusters: &[Cluster], n_points: usize) -> Vec<bool> {
    let mut mask = vec![false; n_points];
    for c in clusters.iter().filter(|c| c.count() == 1) {
        for &pos in &c.members {
            if let Some(slot) = mask.get_mut(pos) {
                *slot = true;
            }
        }
    }
    mask
}

/// Visible points bucketed by subspecies in one pass, in sidebar order.
/// With `only`, positions whose mask entry is false are skipped.
fn points_by_category<'a>(
    state: &'a AppState,
    only: Option<&[bool]>,
) -> Vec<(&'a str, Vec<PlanePoint>)> {
    let mut buckets: HashMap<&str, Vec<PlanePoint>> = HashMap::new();
    for (pos, obs) in state.visible_rows().enumerate() {
        if only.is_some_and(|mask| !mask.get(pos).copied().unwrap_or(false)) {
            continue;
        }
        if let Some(&point) = state.map.points.get(pos) {
            buckets.entry(obs.common_name.as_str()).or_default().push(point);
        }
    }

    state
        .categories
        .iter()
        .filter_map(|c| buckets.remove(c.as_str()).map(|pts| (c.as_str(), pts)))
        .collect()
}

/// Points grouped by subspecies so each gets a legend entry and colour.
fn draw_points_by_category(plot_ui: &mut PlotUi, state: &AppState, only: Option<&[bool]>, radius: f32) {
    for (category, pts) in points_by_category(state, only) {
        plot_ui.points(
            Points::new(PlotPoints::new(pts))
                .name(category)
                .color(state.color_map.color_for(category))
                .filled(true)
                .radius(radius),
        );
    }
}

fn draw_heatmap(plot_ui: &mut PlotUi, state: &AppState, min_opacity: f32) {
    for cell in state.map.heat.cells() {
        let (x0, y0, x1, y1) = (cell.min[0], cell.min[1], cell.max[0], cell.max[1]);
        plot_ui.polygon(
            Polygon::new(PlotPoints::new(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]))
                .name(HEAT_LAYER)
                .fill_color(heat_color(cell.intensity, min_opacity))
                .stroke(Stroke::NONE),
        );
    }
}

// ---------------------------------------------------------------------------
// Map view
// ---------------------------------------------------------------------------

/// Render the map column: layer toggles, the map plot and the picked
/// observation's details.
pub fn observations_map(ui: &mut Ui, state: &mut AppState, renderer: &dyn MapRenderer) {
    ui.heading("Spatial distribution of Observations");

    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut state.show_markers, MARKER_LAYER);
        ui.checkbox(&mut state.show_heatmap, HEAT_LAYER);
    });

    if state.map.is_empty() {
        ui.label("No observations to map.");
    }

    let min_opacity = state.config.map.min_opacity;
    let detail_height = 60.0;
    let view: &AppState = state;
    // Set from the visible bounds in the build pass, read by the hover label.
    let visible_width = Cell::new(data_width(view));

    let mut plot = Plot::new("observations_map")
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes([false, false])
        .show_grid(false)
        .height((ui.available_height() - detail_height).max(200.0))
        .label_formatter(|_name, value| tooltip(view, value, pick_tolerance(visible_width.get())))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if let Some(b) = view.map.bounds.map(|b| b.expanded(MAP_MARGIN)) {
        plot = plot
            .include_x(b.min[0])
            .include_x(b.max[0])
            .include_y(b.min[1])
            .include_y(b.max[1]);
    }

    let clicked = plot
        .show(ui, |plot_ui| {
            visible_width.set(plot_ui.plot_bounds().width());
            if view.show_heatmap {
                draw_heatmap(plot_ui, view, min_opacity);
            }
            if view.show_markers {
                renderer.draw_markers(plot_ui, view);
            }

            if plot_ui.response().clicked() {
                let tolerance = pick_tolerance(visible_width.get());
                plot_ui
                    .pointer_coordinate()
                    .map(|p| view.map.nearest([p.x, p.y], tolerance))
            } else {
                None
            }
        })
        .inner;

    if let Some(pos) = clicked {
        state.pick_map_point(pos);
    }

    picked_details(ui, state);
}

/// Padding around the observations when the map frames itself, in degrees.
const MAP_MARGIN: f64 = 0.5;

/// Within about 2% of the visible width counts as "on" a marker.
fn pick_tolerance(visible_width: f64) -> f64 {
    visible_width / 50.0
}

/// Extent of the mapped data, used before the plot has reported its bounds.
fn data_width(state: &AppState) -> f64 {
    state
        .map
        .bounds
        .map(|b| b.width().max(b.height()).max(0.05))
        .unwrap_or(0.0)
}

/// Hover label: the year of the nearest observation within `tolerance`,
/// else the coordinates.
fn tooltip(state: &AppState, value: &PlotPoint, tolerance: f64) -> String {
    match state.map.nearest([value.x, value.y], tolerance) {
        Some(pos) => state
            .visible_rows()
            .nth(pos)
            .map(|o| format!("{}\n{}", o.common_name, o.observation_year))
            .unwrap_or_default(),
        None => {
            let (lat, lon) = state.map.projection.unproject([value.x, value.y]);
            format!("{lat:.3}, {lon:.3}")
        }
    }
}

fn picked_details(ui: &mut Ui, state: &AppState) {
    let Some(obs) = state.picked_observation() else {
        ui.weak("Click a marker for details.");
        return;
    };

    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label(RichText::new(&obs.common_name).strong().color(state.color_map.color_for(&obs.common_name)));
        ui.label(format!(
            "{}  ({})  {:.4}, {:.4}",
            obs.observed_on, obs.scientific_name, obs.latitude, obs.longitude
        ));
        if !obs.image_url.is_empty() {
            ui.hyperlink_to("photo", &obs.image_url);
        }
    });
}
